//! Request and response bodies for the HTTP API.
//!
//! Identifiers cross the wire as 24-character hex strings under `id`;
//! keys are camelCase throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use verso_core::domain::{
    Category, Comment, DailyStats, FeaturedImage, MediaItem, PostRef, PostStatus, Preferences,
    Role, SocialLinks, StatTotals, User,
};
use verso_core::query::PostListParams;
use verso_core::service::{
    BookmarkNote, Dashboard, ListedPost, PostDraft, PostEdit, PostPage, PostView,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar_url: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/users`. Accounts created this way carry no
/// credentials and cannot log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Body of `POST /api/posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub markdown: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub featured_image: Option<FeaturedImage>,
    pub media: Option<Vec<MediaItem>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl From<CreatePostRequest> for PostDraft {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            markdown: req.markdown,
            excerpt: req.excerpt,
            category: req.category,
            tags: req.tags.unwrap_or_default(),
            published: req.published.unwrap_or(false),
            scheduled_at: req.scheduled_at,
            featured_image: req.featured_image,
            media: req.media.unwrap_or_default(),
            meta_title: req.meta_title,
            meta_description: req.meta_description,
        }
    }
}

/// Body of `PUT /api/posts/{slug}`. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
}

impl From<UpdatePostRequest> for PostEdit {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            excerpt: req.excerpt,
            category: req.category,
            tags: req.tags,
            published: req.published,
        }
    }
}

/// Body of `POST /api/posts/{slug}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

/// Body of `PUT /api/posts/{slug}/bookmark`; the whole body is
/// optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkRequest {
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl From<BookmarkRequest> for BookmarkNote {
    fn from(req: BookmarkRequest) -> Self {
        Self {
            tags: req.tags.unwrap_or_default(),
            notes: req.notes,
        }
    }
}

/// Query string of `GET /api/analytics/dashboard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar_url: user.avatar_url.clone(),
            bio: user.bio.clone(),
            social_links: user.social_links.clone(),
            preferences: user.preferences.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Body of register and login: a bearer token plus the account it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Author card embedded in post payloads. Listing rows carry the short
/// form; the detail view adds bio and links; comments carry name and
/// avatar only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
}

impl AuthorDto {
    pub fn listing(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
            avatar_url: user.avatar_url.clone(),
            bio: None,
            social_links: None,
        }
    }

    pub fn profile(user: &User) -> Self {
        Self {
            bio: user.bio.clone(),
            social_links: user.social_links.clone(),
            ..Self::listing(user)
        }
    }

    pub fn comment(user: &User) -> Self {
        Self {
            email: None,
            ..Self::listing(user)
        }
    }
}

/// A comment with its author populated. Deleted comments survive as
/// tombstones so replies keep their anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub likes_count: usize,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentDto {
    pub fn new(comment: &Comment, author: Option<&User>) -> Self {
        Self {
            id: comment.id.to_hex(),
            content: comment.content.clone(),
            author: author.map(AuthorDto::comment),
            parent_id: comment.parent_id.map(|id| id.to_hex()),
            likes_count: comment.likes.len(),
            is_deleted: comment.is_deleted,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Listing row: the post minus its body, decorated for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummaryDto {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: Category,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorDto>,
    pub status: PostStatus,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FeaturedImage>,
    pub views: i64,
    pub reading_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub likes_count: usize,
    pub bookmarks_count: usize,
    pub comments_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ListedPost> for PostSummaryDto {
    fn from(row: &ListedPost) -> Self {
        let post = &row.post;
        Self {
            id: post.id.to_hex(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category,
            tags: post.tags.clone(),
            author: row.author.as_ref().map(AuthorDto::listing),
            status: post.status,
            published: post.published,
            published_at: post.published_at,
            scheduled_at: post.scheduled_at,
            featured_image: post.featured_image.clone(),
            views: post.views,
            reading_time: post.reading_time,
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
            is_liked: row.is_liked,
            is_bookmarked: row.is_bookmarked,
            likes_count: post.likes.len(),
            bookmarks_count: post.bookmarks.len(),
            comments_count: post.comments.iter().filter(|c| !c.is_deleted).count(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Full post for the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailDto {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    pub category: Category,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorDto>,
    pub status: PostStatus,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FeaturedImage>,
    pub media: Vec<MediaItem>,
    pub comments: Vec<CommentDto>,
    pub views: i64,
    pub reading_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub likes_count: usize,
    pub bookmarks_count: usize,
    pub comments_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PostView> for PostDetailDto {
    fn from(view: &PostView) -> Self {
        let post = &view.post;
        let comments = post
            .comments
            .iter()
            .map(|c| CommentDto::new(c, view.comment_authors.get(&c.author_id)))
            .collect();
        Self {
            id: post.id.to_hex(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            markdown: post.markdown.clone(),
            category: post.category,
            tags: post.tags.clone(),
            author: view.author.as_ref().map(AuthorDto::profile),
            status: post.status,
            published: post.published,
            published_at: post.published_at,
            scheduled_at: post.scheduled_at,
            featured_image: post.featured_image.clone(),
            media: post.media.clone(),
            comments,
            views: post.views,
            reading_time: post.reading_time,
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
            is_liked: view.is_liked,
            is_bookmarked: view.is_bookmarked,
            likes_count: post.likes.len(),
            bookmarks_count: post.bookmarks.len(),
            comments_count: post.comments.iter().filter(|c| !c.is_deleted).count(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Pagination block attached to listing responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationDto {
    pub current: i64,
    pub total: u64,
    pub count: u64,
    pub limit: i64,
}

/// Echo of the filters that produced a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub status: String,
}

/// Body of `GET /api/posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostSummaryDto>,
    pub pagination: PaginationDto,
    pub filters: FiltersDto,
}

impl PostListResponse {
    pub fn new(page: &PostPage, params: &PostListParams) -> Self {
        Self {
            posts: page.posts.iter().map(PostSummaryDto::from).collect(),
            pagination: PaginationDto {
                current: page.page.number,
                total: page.page.total_pages(page.total),
                count: page.total,
                limit: page.page.size,
            },
            filters: FiltersDto {
                category: params.category,
                tags: params.tags.clone(),
                author: params.author.clone(),
                search: params.search.clone(),
                status: params.status.unwrap_or_default().as_str().to_string(),
            },
        }
    }
}

/// Body of `PUT /api/posts/{slug}/like`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub is_liked: bool,
    pub likes_count: usize,
}

/// Body of `PUT /api/posts/{slug}/bookmark`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub message: String,
    pub is_bookmarked: bool,
    pub bookmarks_count: usize,
}

/// Body of `POST /api/posts/{slug}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub message: String,
    pub comment: CommentDto,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Summed engagement counters for the dashboard window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummaryDto {
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_bookmarks: i64,
}

impl From<StatTotals> for AnalyticsSummaryDto {
    fn from(totals: StatTotals) -> Self {
        Self {
            total_views: totals.views,
            total_likes: totals.likes,
            total_comments: totals.comments,
            total_bookmarks: totals.bookmarks,
        }
    }
}

/// Post reference on analytics payloads. Row labels carry the slug;
/// the dashboard post list is id and title only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRefDto {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl PostRefDto {
    pub fn labeled(post: &PostRef) -> Self {
        Self {
            id: post.id.to_hex(),
            title: post.title.clone(),
            slug: Some(post.slug.clone()),
        }
    }

    pub fn bare(post: &PostRef) -> Self {
        Self {
            slug: None,
            ..Self::labeled(post)
        }
    }
}

/// One daily counter row. The dashboard resolves `post`; the per-post
/// drilldown leaves it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRowDto {
    pub id: String,
    pub post_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostRefDto>,
    pub date: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub bookmarks: i64,
    pub shares: i64,
}

impl AnalyticsRowDto {
    pub fn new(row: &DailyStats, post: Option<&PostRef>) -> Self {
        Self {
            id: row.id.to_hex(),
            post_id: row.post_id.to_hex(),
            post: post.map(PostRefDto::labeled),
            date: row.date,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
            bookmarks: row.bookmarks,
            shares: row.shares,
        }
    }
}

/// Body of `GET /api/analytics/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub summary: AnalyticsSummaryDto,
    pub analytics: Vec<AnalyticsRowDto>,
    pub posts: Vec<PostRefDto>,
}

impl From<&Dashboard> for DashboardResponse {
    fn from(dashboard: &Dashboard) -> Self {
        let analytics = dashboard
            .rows
            .iter()
            .map(|row| {
                let post = dashboard.posts.iter().find(|p| p.id == row.post_id);
                AnalyticsRowDto::new(row, post)
            })
            .collect();
        Self {
            summary: dashboard.totals.into(),
            analytics,
            posts: dashboard.posts.iter().map(PostRefDto::bare).collect(),
        }
    }
}

/// Body of `GET /api/analytics/post/{postId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAnalyticsResponse {
    pub analytics: Vec<AnalyticsRowDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::domain::day_bucket;

    #[test]
    fn user_dto_uses_hex_id_and_camel_case_keys() {
        let user = User::new("Ada Lovelace", "Ada@Example.com");
        let value = serde_json::to_value(UserDto::from(&user)).unwrap();
        assert_eq!(value["id"].as_str().unwrap().len(), 24);
        assert_eq!(value["email"], "ada@example.com");
        assert_eq!(value["role"], "user");
        assert!(value["preferences"]["emailNotifications"].as_bool().unwrap());
        assert!(value.get("passwordHash").is_none());
    }

    #[test]
    fn author_card_tiers_expose_the_right_fields() {
        let mut user = User::new("Grace", "grace@example.com");
        user.bio = Some("Compilers".into());
        user.avatar_url = Some("https://example.com/g.png".into());

        let listing = serde_json::to_value(AuthorDto::listing(&user)).unwrap();
        assert_eq!(listing["email"], "grace@example.com");
        assert!(listing.get("bio").is_none());

        let profile = serde_json::to_value(AuthorDto::profile(&user)).unwrap();
        assert_eq!(profile["bio"], "Compilers");

        let comment = serde_json::to_value(AuthorDto::comment(&user)).unwrap();
        assert!(comment.get("email").is_none());
        assert_eq!(comment["avatarUrl"], "https://example.com/g.png");
    }

    #[test]
    fn comment_dto_resolves_parent_and_author() {
        let author = User::new("Grace", "grace@example.com");
        let parent = Comment::new(author.id, "first".into(), None);
        let reply = Comment::new(author.id, "second".into(), Some(parent.id));

        let dto = CommentDto::new(&reply, Some(&author));
        assert_eq!(dto.parent_id.as_deref(), Some(parent.id.to_hex().as_str()));
        assert_eq!(dto.author.unwrap().name, "Grace");
        assert!(!dto.is_deleted);
    }

    #[test]
    fn dashboard_rows_are_labeled_with_their_post() {
        let author = User::new("Grace", "grace@example.com");
        let post = PostRef {
            id: bson::oid::ObjectId::new(),
            title: "Hello".into(),
            slug: "hello".into(),
        };
        let mut row = DailyStats::new(post.id, author.id, day_bucket(Utc::now()));
        row.views = 4;
        let orphan = DailyStats::new(bson::oid::ObjectId::new(), author.id, row.date);

        let dashboard = Dashboard {
            totals: StatTotals {
                views: 4,
                ..Default::default()
            },
            rows: vec![row, orphan],
            posts: vec![post],
        };
        let response = DashboardResponse::from(&dashboard);

        assert_eq!(response.summary.total_views, 4);
        let label = response.analytics[0].post.as_ref().unwrap();
        assert_eq!(label.slug.as_deref(), Some("hello"));
        assert!(response.analytics[1].post.is_none());
        assert_eq!(response.posts.len(), 1);
        assert!(response.posts[0].slug.is_none());
    }

    #[test]
    fn filters_echo_defaults_status_to_published() {
        let page = PostPage {
            posts: Vec::new(),
            total: 0,
            page: verso_core::query::Page::new(None, None).unwrap(),
        };
        let response = PostListResponse::new(&page, &PostListParams::default());
        assert_eq!(response.filters.status, "published");
        assert_eq!(response.pagination.current, 1);
        assert_eq!(response.pagination.limit, 10);
        assert_eq!(response.pagination.total, 0);
    }
}
