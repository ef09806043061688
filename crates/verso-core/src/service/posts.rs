//! Post lifecycle and listing orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::domain::{
    Caller, Category, FeaturedImage, MediaItem, Post, PostPatch, PostStatus, StatField, User,
    ViewEvent, day_bucket, derive_excerpt,
};
use crate::error::DomainError;
use crate::ports::{AnalyticsRepository, BookmarkRepository, PostRepository, UserRepository};
use crate::query::{Page, PostListParams, PostQuery};
use crate::{reading_time, slug};

/// Author-supplied fields for a new post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub markdown: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub published: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub featured_image: Option<FeaturedImage>,
    pub media: Vec<MediaItem>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Author-supplied changes for an existing post.
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
}

/// Request metadata recorded with a view event.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// One listing row with caller-dependent decorations resolved.
#[derive(Debug, Clone)]
pub struct ListedPost {
    pub post: crate::domain::PostPreview,
    pub author: Option<User>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

/// A page of listings plus what the wire layer needs to render it.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<ListedPost>,
    pub total: u64,
    pub page: Page,
}

/// Full post plus decorations for the detail view.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author: Option<User>,
    /// Lookup table for the embedded comments' authors.
    pub comment_authors: HashMap<ObjectId, User>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

/// Orchestrates post CRUD, listing, and view tracking over the
/// repository ports.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    bookmarks: Arc<dyn BookmarkRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            bookmarks,
            analytics,
        }
    }

    pub async fn list(
        &self,
        params: &PostListParams,
        caller: Option<&Caller>,
    ) -> Result<PostPage, DomainError> {
        // The author parameter filters by name fragment. A fragment that
        // matches nobody yields an empty page, not an unfiltered one.
        let author_id = match params
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            Some(fragment) => match self.users.find_by_name_fragment(fragment).await? {
                Some(user) => Some(user.id),
                None => {
                    return Ok(PostPage {
                        posts: Vec::new(),
                        total: 0,
                        page: Page::new(params.page, params.limit)?,
                    });
                }
            },
            None => None,
        };

        let query = PostQuery::resolve(params, caller, author_id)?;
        let (previews, total) = self.posts.list(&query).await?;
        let authors = self
            .author_table(previews.iter().map(|p| p.author_id))
            .await?;

        let posts = previews
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned();
                let (is_liked, is_bookmarked) = match caller {
                    Some(c) => (
                        post.likes.contains(&c.user_id),
                        post.bookmarks.contains(&c.user_id),
                    ),
                    None => (false, false),
                };
                ListedPost {
                    post,
                    author,
                    is_liked,
                    is_bookmarked,
                }
            })
            .collect();

        Ok(PostPage {
            posts,
            total,
            page: query.page,
        })
    }

    /// Fetch one post by slug, counting the view unless the caller is
    /// the author.
    pub async fn fetch_by_slug(
        &self,
        post_slug: &str,
        caller: Option<&Caller>,
        view: ViewContext,
    ) -> Result<PostView, DomainError> {
        let mut post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        let is_author = caller.is_some_and(|c| c.user_id == post.author_id);
        if !is_author {
            let event = ViewEvent {
                user_id: caller.map(|c| c.user_id),
                viewed_at: Utc::now(),
                ip: view.ip,
                user_agent: view.user_agent,
            };
            self.posts.record_view(post.id, &event).await?;
            self.analytics
                .bump(
                    post.id,
                    post.author_id,
                    day_bucket(event.viewed_at),
                    StatField::Views,
                    1,
                )
                .await?;
            post.views += 1;
        }

        self.decorate(post, caller).await
    }

    pub async fn create(&self, caller: &Caller, draft: PostDraft) -> Result<PostView, DomainError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() || draft.content.trim().is_empty() {
            return Err(DomainError::validation("Title and content are required"));
        }

        let post_slug = slug::derive_slug(&title)?;
        if self.posts.slug_taken(&post_slug, None).await? {
            return Err(DomainError::Duplicate(
                "A post with this title already exists".into(),
            ));
        }

        let now = Utc::now();
        let (status, published_at) = Post::derive_status(draft.published, draft.scheduled_at, now);
        let excerpt = draft
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| derive_excerpt(&draft.content));
        let reading_time = reading_time::estimate_minutes(&draft.content);

        let post = Post {
            id: ObjectId::new(),
            meta_title: Some(draft.meta_title.unwrap_or_else(|| title.clone())),
            meta_description: Some(draft.meta_description.unwrap_or_else(|| excerpt.clone())),
            title,
            slug: post_slug,
            excerpt,
            content: draft.content,
            markdown: draft.markdown,
            category: draft.category.unwrap_or_default(),
            tags: draft.tags,
            author_id: caller.user_id,
            published: status == PostStatus::Published,
            published_at,
            scheduled_at: draft.scheduled_at,
            status,
            featured_image: draft.featured_image,
            media: draft.media,
            likes: Vec::new(),
            bookmarks: Vec::new(),
            comments: Vec::new(),
            views: 0,
            view_history: Vec::new(),
            reading_time,
            created_at: now,
            updated_at: now,
        };
        self.posts.insert(&post).await?;

        self.decorate(post, Some(caller)).await
    }

    pub async fn update(
        &self,
        post_slug: &str,
        caller: &Caller,
        edit: PostEdit,
    ) -> Result<PostView, DomainError> {
        let post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;
        if !caller.may_manage(post.author_id) {
            return Err(DomainError::Forbidden);
        }

        let mut patch = PostPatch::default();
        if let Some(title) = edit.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DomainError::validation("Title cannot be empty"));
            }
            let new_slug = slug::derive_slug(&title)?;
            if new_slug != post.slug {
                if self.posts.slug_taken(&new_slug, Some(post.id)).await? {
                    return Err(DomainError::Duplicate(
                        "A post with this title already exists".into(),
                    ));
                }
                patch.slug = Some(new_slug);
            }
            patch.title = Some(title);
        }
        if let Some(content) = edit.content {
            if content.trim().is_empty() {
                return Err(DomainError::validation("Content cannot be empty"));
            }
            patch.reading_time = Some(reading_time::estimate_minutes(&content));
            patch.content = Some(content);
        }
        patch.excerpt = edit.excerpt;
        patch.category = edit.category;
        patch.tags = edit.tags;
        if let Some(published) = edit.published {
            // Keep `published` and `status` in lockstep.
            patch.published = Some(published);
            if published {
                patch.status = Some(PostStatus::Published);
                if post.published_at.is_none() {
                    patch.published_at = Some(Utc::now());
                }
            } else {
                patch.status = Some(PostStatus::Draft);
            }
        }

        let updated = self
            .posts
            .update(post.id, &patch)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        self.decorate(updated, Some(caller)).await
    }

    pub async fn delete(&self, post_slug: &str, caller: &Caller) -> Result<(), DomainError> {
        let post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;
        if !caller.may_manage(post.author_id) {
            return Err(DomainError::Forbidden);
        }

        // Cascade order: join records, counters, then the post itself.
        self.bookmarks.remove_for_post(post.id).await?;
        self.analytics.remove_for_post(post.id).await?;
        self.posts.delete(post.id).await?;
        Ok(())
    }

    /// Attach the author, comment authors, and caller flags to a post.
    async fn decorate(
        &self,
        post: Post,
        caller: Option<&Caller>,
    ) -> Result<PostView, DomainError> {
        let author = self.users.find_by_id(post.author_id).await?;
        let comment_authors = self
            .author_table(post.comments.iter().map(|c| c.author_id))
            .await?;
        let (is_liked, is_bookmarked) = match caller {
            Some(c) => (
                post.likes.contains(&c.user_id),
                post.bookmarks.contains(&c.user_id),
            ),
            None => (false, false),
        };
        Ok(PostView {
            post,
            author,
            comment_authors,
            is_liked,
            is_bookmarked,
        })
    }

    async fn author_table(
        &self,
        ids: impl Iterator<Item = ObjectId>,
    ) -> Result<HashMap<ObjectId, User>, DomainError> {
        let mut unique: Vec<ObjectId> = ids.collect();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.find_by_ids(&unique).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::StatusParam;
    use crate::service::testkit::{
        TestStore, admin_user, draft_post, moderator_user, named_user, published_post,
    };

    fn service(store: &TestStore) -> PostService {
        PostService::new(
            store.posts(),
            store.users(),
            store.bookmarks(),
            store.analytics(),
        )
    }

    fn caller_for(user: &User) -> Caller {
        Caller::new(user.id, user.role)
    }

    #[tokio::test]
    async fn create_derives_slug_excerpt_and_reading_time() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let svc = service(&store);

        let view = svc
            .create(
                &caller_for(&author),
                PostDraft {
                    title: "My First Post!".into(),
                    content: "word ".repeat(401),
                    published: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(view.post.slug, "my-first-post");
        assert_eq!(view.post.reading_time, 3);
        assert!(view.post.excerpt.ends_with("..."));
        assert_eq!(view.post.status, PostStatus::Published);
        assert!(view.post.published);
        assert!(view.post.published_at.is_some());
        assert_eq!(view.post.meta_title.as_deref(), Some("My First Post!"));
        assert_eq!(view.author.unwrap().id, author.id);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_slug() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let svc = service(&store);
        let caller = caller_for(&author);

        let draft = PostDraft {
            title: "Same Title".into(),
            content: "body".into(),
            ..Default::default()
        };
        svc.create(&caller, draft.clone()).await.unwrap();
        let err = svc.create(&caller, draft).await.unwrap_err();
        assert!(matches!(err, DomainError::Duplicate(_)));
    }

    #[tokio::test]
    async fn create_requires_title_and_content() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let svc = service(&store);

        let err = svc
            .create(
                &caller_for(&author),
                PostDraft {
                    title: "  ".into(),
                    content: "body".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn scheduled_draft_gets_scheduled_status() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let svc = service(&store);
        let at = Utc::now() + chrono::Duration::days(2);

        let view = svc
            .create(
                &caller_for(&author),
                PostDraft {
                    title: "Later".into(),
                    content: "body".into(),
                    published: true,
                    scheduled_at: Some(at),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(view.post.status, PostStatus::Scheduled);
        assert!(!view.post.published);
        assert_eq!(view.post.published_at, Some(at));
    }

    #[tokio::test]
    async fn fetch_counts_views_for_non_authors_only() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let reader = store.add_user(named_user("Bob"));
        let post = store.add_post(published_post(&author, "Hello World"));
        let svc = service(&store);

        // Anonymous and non-author views count.
        let anon = svc
            .fetch_by_slug(&post.slug, None, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(anon.post.views, 1);

        let read = svc
            .fetch_by_slug(&post.slug, Some(&caller_for(&reader)), ViewContext::default())
            .await
            .unwrap();
        assert_eq!(read.post.views, 2);

        // The author's own visit does not.
        let own = svc
            .fetch_by_slug(&post.slug, Some(&caller_for(&author)), ViewContext::default())
            .await
            .unwrap();
        assert_eq!(own.post.views, 2);

        assert_eq!(store.stat_total(post.id, StatField::Views), 2);
        assert_eq!(store.view_history_len(post.id), 2);
    }

    #[tokio::test]
    async fn fetch_unknown_slug_is_not_found() {
        let store = TestStore::new();
        let svc = service(&store);
        let err = svc
            .fetch_by_slug("missing", None, ViewContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_requires_ownership_or_admin() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let other = store.add_user(named_user("Mallory"));
        let admin = store.add_user(admin_user("Root"));
        let post = store.add_post(published_post(&author, "Owned"));
        let svc = service(&store);

        let err = svc
            .update(
                &post.slug,
                &caller_for(&other),
                PostEdit {
                    title: Some("Hijack".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let view = svc
            .update(
                &post.slug,
                &caller_for(&admin),
                PostEdit {
                    title: Some("Moderated Title".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.slug, "moderated-title");
    }

    #[tokio::test]
    async fn moderator_can_manage_others_posts() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let moderator = store.add_user(moderator_user("Mina"));
        let post = store.add_post(published_post(&author, "Flagged"));
        let svc = service(&store);

        svc.delete(&post.slug, &caller_for(&moderator))
            .await
            .unwrap();
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn update_retitle_checks_slug_conflicts() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        store.add_post(published_post(&author, "Taken Title"));
        let post = store.add_post(published_post(&author, "Original"));
        let svc = service(&store);

        let err = svc
            .update(
                &post.slug,
                &caller_for(&author),
                PostEdit {
                    title: Some("Taken Title".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Duplicate(_)));

        // Re-saving the same title maps to the same slug and passes.
        let view = svc
            .update(
                &post.slug,
                &caller_for(&author),
                PostEdit {
                    title: Some("Original".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.slug, "original");
    }

    #[tokio::test]
    async fn update_published_flag_keeps_status_in_lockstep() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let post = store.add_post(draft_post(&author, "Live"));
        let svc = service(&store);

        let view = svc
            .update(
                &post.slug,
                &caller_for(&author),
                PostEdit {
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.status, PostStatus::Published);
        assert!(view.post.published);
        assert!(view.post.published_at.is_some());

        let view = svc
            .update(
                &post.slug,
                &caller_for(&author),
                PostEdit {
                    published: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.status, PostStatus::Draft);
        assert!(!view.post.published);
    }

    #[tokio::test]
    async fn update_content_recomputes_reading_time() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let post = store.add_post(published_post(&author, "Short"));
        let svc = service(&store);

        let view = svc
            .update(
                &post.slug,
                &caller_for(&author),
                PostEdit {
                    content: Some("w ".repeat(600)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.post.reading_time, 3);
    }

    #[tokio::test]
    async fn delete_cascades_bookmarks_and_analytics() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let reader = store.add_user(named_user("Bob"));
        let post = store.add_post(published_post(&author, "Doomed"));
        store.add_bookmark(reader.id, post.id);
        store.seed_stats(post.id, author.id);
        let svc = service(&store);

        svc.delete(&post.slug, &caller_for(&author)).await.unwrap();

        assert_eq!(store.post_count(), 0);
        assert_eq!(store.bookmark_count(), 0);
        assert_eq!(store.stats_count(), 0);
    }

    #[tokio::test]
    async fn delete_by_stranger_is_forbidden() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let other = store.add_user(named_user("Mallory"));
        let post = store.add_post(published_post(&author, "Safe"));
        let svc = service(&store);

        let err = svc
            .delete(&post.slug, &caller_for(&other))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert_eq!(store.post_count(), 1);
    }

    #[tokio::test]
    async fn list_pages_split_at_the_limit() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        for i in 0..25 {
            store.add_post(published_post(&author, &format!("Post {i}")));
        }
        let svc = service(&store);

        let params = PostListParams {
            limit: Some(10),
            page: Some(3),
            ..Default::default()
        };
        let page = svc.list(&params, None).await.unwrap();
        assert_eq!(page.posts.len(), 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.page.total_pages(page.total), 3);
    }

    #[tokio::test]
    async fn list_hides_drafts_from_anonymous_callers() {
        let store = TestStore::new();
        let alice = store.add_user(named_user("Alice"));
        store.add_post(published_post(&alice, "Visible"));
        let draft = store.add_post(draft_post(&alice, "Hidden"));
        let svc = service(&store);

        // Anonymous listing never includes the draft.
        let page = svc.list(&PostListParams::default(), None).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post.slug, "visible");

        // Alice sees it once she widens the status filter.
        let params = PostListParams {
            status: Some(StatusParam::All),
            ..Default::default()
        };
        let page = svc
            .list(&params, Some(&caller_for(&alice)))
            .await
            .unwrap();
        assert!(page.posts.iter().any(|p| p.post.id == draft.id));

        // But by slug the draft is still fetchable.
        let view = svc
            .fetch_by_slug(&draft.slug, None, ViewContext::default())
            .await
            .unwrap();
        assert_eq!(view.post.id, draft.id);
    }

    #[tokio::test]
    async fn list_admin_sees_everything_with_status_all() {
        let store = TestStore::new();
        let alice = store.add_user(named_user("Alice"));
        let admin = store.add_user(admin_user("Root"));
        store.add_post(published_post(&alice, "Live"));
        store.add_post(draft_post(&alice, "Draft One"));
        let svc = service(&store);

        let params = PostListParams {
            status: Some(StatusParam::All),
            ..Default::default()
        };
        let page = svc.list(&params, Some(&caller_for(&admin))).await.unwrap();
        assert_eq!(page.posts.len(), 2);
    }

    #[tokio::test]
    async fn list_unmatched_author_yields_empty_page() {
        let store = TestStore::new();
        let alice = store.add_user(named_user("Alice"));
        store.add_post(published_post(&alice, "Hers"));
        let svc = service(&store);

        let params = PostListParams {
            author: Some("nobody-by-this-name".into()),
            ..Default::default()
        };
        let page = svc.list(&params, None).await.unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn list_resolves_author_case_insensitively() {
        let store = TestStore::new();
        let alice = store.add_user(named_user("Alice Author"));
        let bob = store.add_user(named_user("Bob"));
        store.add_post(published_post(&alice, "Hers"));
        store.add_post(published_post(&bob, "His"));
        let svc = service(&store);

        let params = PostListParams {
            author: Some("alice".into()),
            ..Default::default()
        };
        let page = svc.list(&params, None).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post.slug, "hers");
    }

    #[tokio::test]
    async fn list_search_matches_tags_alone() {
        let store = TestStore::new();
        let author = store.add_user(named_user("Alice"));
        let mut tagged = published_post(&author, "Quiet Launch");
        tagged.tags = vec!["rustlang".into()];
        store.add_post(tagged);
        store.add_post(published_post(&author, "Other News"));
        let svc = service(&store);

        let params = PostListParams {
            search: Some("rustlang".into()),
            ..Default::default()
        };
        let page = svc.list(&params, None).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post.slug, "quiet-launch");
    }

    #[tokio::test]
    async fn list_marks_liked_posts_for_the_caller() {
        let store = TestStore::new();
        let alice = store.add_user(named_user("Alice"));
        let bob = store.add_user(named_user("Bob"));
        let post = store.add_post(published_post(&alice, "Likeable"));
        store.add_like(post.id, bob.id);
        let svc = service(&store);

        let page = svc
            .list(&PostListParams::default(), Some(&caller_for(&bob)))
            .await
            .unwrap();
        assert!(page.posts[0].is_liked);

        let anon = svc.list(&PostListParams::default(), None).await.unwrap();
        assert!(!anon.posts[0].is_liked);
    }
}
