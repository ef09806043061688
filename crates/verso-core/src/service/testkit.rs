//! In-memory repository doubles shared by the service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::domain::{
    Bookmark, Comment, DailyStats, Post, PostPatch, PostPreview, PostRef, PostStatus, Role,
    StatField, StatTotals, User, ViewEvent, day_bucket,
};
use crate::error::RepoError;
use crate::ports::{AnalyticsRepository, BookmarkRepository, PostRepository, UserRepository};
use crate::query::{PostQuery, SortField, SortOrder, Visibility};

#[derive(Default)]
struct Shared {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
    bookmarks: Mutex<Vec<Bookmark>>,
    stats: Mutex<Vec<DailyStats>>,
}

/// One in-memory data set exposed through all four repository ports.
#[derive(Clone, Default)]
pub struct TestStore {
    shared: Arc<Shared>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUsers(self.shared.clone()))
    }

    pub fn posts(&self) -> Arc<dyn PostRepository> {
        Arc::new(MemoryPosts(self.shared.clone()))
    }

    pub fn bookmarks(&self) -> Arc<dyn BookmarkRepository> {
        Arc::new(MemoryBookmarks(self.shared.clone()))
    }

    pub fn analytics(&self) -> Arc<dyn AnalyticsRepository> {
        Arc::new(MemoryAnalytics(self.shared.clone()))
    }

    pub fn add_user(&self, user: User) -> User {
        self.shared.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn add_post(&self, post: Post) -> Post {
        self.shared.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn add_bookmark(&self, user_id: ObjectId, post_id: ObjectId) {
        let bookmark = Bookmark::new(user_id, post_id);
        self.shared.bookmarks.lock().unwrap().push(bookmark);
        if let Some(post) = self
            .shared
            .posts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == post_id)
        {
            post.bookmarks.push(user_id);
        }
    }

    pub fn add_like(&self, post_id: ObjectId, user_id: ObjectId) {
        if let Some(post) = self
            .shared
            .posts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == post_id)
        {
            post.likes.push(user_id);
        }
    }

    pub fn seed_stats(&self, post_id: ObjectId, author_id: ObjectId) {
        let mut row = DailyStats::new(post_id, author_id, day_bucket(Utc::now()));
        row.views = 3;
        self.shared.stats.lock().unwrap().push(row);
    }

    pub fn post_count(&self) -> usize {
        self.shared.posts.lock().unwrap().len()
    }

    pub fn bookmark_count(&self) -> usize {
        self.shared.bookmarks.lock().unwrap().len()
    }

    pub fn stats_count(&self) -> usize {
        self.shared.stats.lock().unwrap().len()
    }

    pub fn stat_total(&self, post_id: ObjectId, field: StatField) -> i64 {
        self.shared
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.post_id == post_id)
            .map(|row| counter(row, field))
            .sum()
    }

    pub fn stat_rows(&self, post_id: ObjectId) -> usize {
        self.shared
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.post_id == post_id)
            .count()
    }

    pub fn view_history_len(&self, post_id: ObjectId) -> usize {
        self.shared
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.view_history.len())
            .unwrap_or(0)
    }

    pub fn find_post(&self, post_id: ObjectId) -> Option<Post> {
        self.shared
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }
}

fn counter(row: &DailyStats, field: StatField) -> i64 {
    match field {
        StatField::Views => row.views,
        StatField::Likes => row.likes,
        StatField::Comments => row.comments,
        StatField::Bookmarks => row.bookmarks,
        StatField::Shares => row.shares,
    }
}

pub fn named_user(name: &str) -> User {
    let email = format!("{}@example.com", slug::slugify(name));
    User::new(name, &email)
}

pub fn admin_user(name: &str) -> User {
    let mut user = named_user(name);
    user.role = Role::Admin;
    user
}

pub fn moderator_user(name: &str) -> User {
    let mut user = named_user(name);
    user.role = Role::Moderator;
    user
}

pub fn published_post(author: &User, title: &str) -> Post {
    let mut post = base_post(author, title);
    post.published = true;
    post.status = PostStatus::Published;
    post.published_at = Some(post.created_at);
    post
}

pub fn draft_post(author: &User, title: &str) -> Post {
    base_post(author, title)
}

fn base_post(author: &User, title: &str) -> Post {
    let now = Utc::now();
    Post {
        id: ObjectId::new(),
        title: title.to_string(),
        slug: crate::slug::derive_slug(title).unwrap(),
        excerpt: format!("{title}..."),
        content: format!("{title} body"),
        markdown: None,
        category: Default::default(),
        tags: Vec::new(),
        author_id: author.id,
        published: false,
        published_at: None,
        scheduled_at: None,
        status: PostStatus::Draft,
        featured_image: None,
        media: Vec::new(),
        likes: Vec::new(),
        bookmarks: Vec::new(),
        comments: Vec::new(),
        views: 0,
        view_history: Vec::new(),
        meta_title: None,
        meta_description: None,
        reading_time: 1,
        created_at: now,
        updated_at: now,
    }
}

fn preview_of(post: &Post) -> PostPreview {
    PostPreview {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        excerpt: post.excerpt.clone(),
        category: post.category,
        tags: post.tags.clone(),
        author_id: post.author_id,
        published: post.published,
        published_at: post.published_at,
        scheduled_at: post.scheduled_at,
        status: post.status,
        featured_image: post.featured_image.clone(),
        likes: post.likes.clone(),
        bookmarks: post.bookmarks.clone(),
        comments: post.comments.clone(),
        views: post.views,
        meta_title: post.meta_title.clone(),
        meta_description: post.meta_description.clone(),
        reading_time: post.reading_time,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

struct MemoryUsers(Arc<Shared>);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        self.0.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<User>, RepoError> {
        let needle = fragment.to_lowercase();
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.name.to_lowercase().contains(&needle))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_recent(&self) -> Result<Vec<User>, RepoError> {
        let mut users: Vec<User> = self.0.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

struct MemoryPosts(Arc<Shared>);

impl MemoryPosts {
    fn matches(post: &Post, query: &PostQuery) -> bool {
        let visible = match &query.visibility {
            Visibility::Published => post.published && post.status == PostStatus::Published,
            Visibility::Status(status) => post.status == *status,
            Visibility::Any => true,
            Visibility::PublishedOrAuthor(author) => {
                (post.published && post.status == PostStatus::Published)
                    || post.author_id == *author
            }
        };
        if !visible {
            return false;
        }
        if let Some(category) = query.category {
            if post.category != category {
                return false;
            }
        }
        if !query.tags.is_empty() && !post.tags.iter().any(|t| query.tags.contains(t)) {
            return false;
        }
        if let Some(author_id) = query.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(search) = &query.search {
            let needle = search.to_lowercase();
            let hit = post.title.to_lowercase().contains(&needle)
                || post.excerpt.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
                || post.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn insert(&self, post: &Post) -> Result<(), RepoError> {
        self.0.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Post>, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<ObjectId>) -> Result<bool, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != exclude))
    }

    async fn list(&self, query: &PostQuery) -> Result<(Vec<PostPreview>, u64), RepoError> {
        let mut rows: Vec<Post> = self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| Self::matches(p, query))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ord = match query.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::PublishedAt => a.published_at.cmp(&b.published_at),
                SortField::Title => a.title.cmp(&b.title),
                SortField::Views => a.views.cmp(&b.views),
                SortField::ReadingTime => a.reading_time.cmp(&b.reading_time),
            };
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        let total = rows.len() as u64;
        let page: Vec<PostPreview> = rows
            .iter()
            .skip(query.page.skip() as usize)
            .take(query.page.size as usize)
            .map(preview_of)
            .collect();
        Ok((page, total))
    }

    async fn refs_by_author(&self, author_id: ObjectId) -> Result<Vec<PostRef>, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.author_id == author_id)
            .map(|p| PostRef {
                id: p.id,
                title: p.title.clone(),
                slug: p.slug.clone(),
            })
            .collect())
    }

    async fn update(&self, id: ObjectId, patch: &PostPatch) -> Result<Option<Post>, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            post.title = title.clone();
        }
        if let Some(slug) = &patch.slug {
            post.slug = slug.clone();
        }
        if let Some(content) = &patch.content {
            post.content = content.clone();
        }
        if let Some(excerpt) = &patch.excerpt {
            post.excerpt = excerpt.clone();
        }
        if let Some(category) = patch.category {
            post.category = category;
        }
        if let Some(tags) = &patch.tags {
            post.tags = tags.clone();
        }
        if let Some(published) = patch.published {
            post.published = published;
        }
        if let Some(status) = patch.status {
            post.status = status;
        }
        if let Some(published_at) = patch.published_at {
            post.published_at = Some(published_at);
        }
        if let Some(reading_time) = patch.reading_time {
            post.reading_time = reading_time;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }

    async fn record_view(&self, id: ObjectId, event: &ViewEvent) -> Result<(), RepoError> {
        if let Some(post) = self.0.posts.lock().unwrap().iter_mut().find(|p| p.id == id) {
            post.views += 1;
            post.view_history.push(event.clone());
        }
        Ok(())
    }

    async fn set_like(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if liked {
            if !post.likes.contains(&user_id) {
                post.likes.push(user_id);
            }
        } else {
            post.likes.retain(|u| *u != user_id);
        }
        Ok(Some(post.clone()))
    }

    async fn set_bookmark(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        bookmarked: bool,
    ) -> Result<Option<Post>, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if bookmarked {
            if !post.bookmarks.contains(&user_id) {
                post.bookmarks.push(user_id);
            }
        } else {
            post.bookmarks.retain(|u| *u != user_id);
        }
        Ok(Some(post.clone()))
    }

    async fn push_comment(&self, id: ObjectId, comment: &Comment) -> Result<(), RepoError> {
        if let Some(post) = self.0.posts.lock().unwrap().iter_mut().find(|p| p.id == id) {
            post.comments.push(comment.clone());
        }
        Ok(())
    }
}

struct MemoryBookmarks(Arc<Shared>);

#[async_trait]
impl BookmarkRepository for MemoryBookmarks {
    async fn find(
        &self,
        user_id: ObjectId,
        post_id: ObjectId,
    ) -> Result<Option<Bookmark>, RepoError> {
        Ok(self
            .0
            .bookmarks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.user_id == user_id && b.post_id == post_id)
            .cloned())
    }

    async fn insert(&self, bookmark: &Bookmark) -> Result<(), RepoError> {
        let mut rows = self.0.bookmarks.lock().unwrap();
        if rows
            .iter()
            .any(|b| b.user_id == bookmark.user_id && b.post_id == bookmark.post_id)
        {
            return Err(RepoError::Constraint("duplicate bookmark".into()));
        }
        rows.push(bookmark.clone());
        Ok(())
    }

    async fn remove(&self, user_id: ObjectId, post_id: ObjectId) -> Result<bool, RepoError> {
        let mut rows = self.0.bookmarks.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| !(b.user_id == user_id && b.post_id == post_id));
        Ok(rows.len() < before)
    }

    async fn remove_for_post(&self, post_id: ObjectId) -> Result<u64, RepoError> {
        let mut rows = self.0.bookmarks.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| b.post_id != post_id);
        Ok((before - rows.len()) as u64)
    }
}

struct MemoryAnalytics(Arc<Shared>);

#[async_trait]
impl AnalyticsRepository for MemoryAnalytics {
    async fn bump(
        &self,
        post_id: ObjectId,
        author_id: ObjectId,
        day: DateTime<Utc>,
        field: StatField,
        delta: i64,
    ) -> Result<(), RepoError> {
        let mut rows = self.0.stats.lock().unwrap();
        let row = match rows
            .iter_mut()
            .find(|r| r.post_id == post_id && r.date == day)
        {
            Some(row) => row,
            None => {
                rows.push(DailyStats::new(post_id, author_id, day));
                rows.last_mut().expect("just pushed")
            }
        };
        match field {
            StatField::Views => row.views += delta,
            StatField::Likes => row.likes += delta,
            StatField::Comments => row.comments += delta,
            StatField::Bookmarks => row.bookmarks += delta,
            StatField::Shares => row.shares += delta,
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn rows_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyStats>, RepoError> {
        let mut rows: Vec<DailyStats> = self
            .0
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|r| post_ids.contains(&r.post_id) && r.date >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn totals_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<StatTotals, RepoError> {
        let rows = self.rows_since(post_ids, since).await?;
        Ok(rows.iter().fold(StatTotals::default(), |mut acc, row| {
            acc.views += row.views;
            acc.likes += row.likes;
            acc.comments += row.comments;
            acc.bookmarks += row.bookmarks;
            acc
        }))
    }

    async fn recent_for_post(
        &self,
        post_id: ObjectId,
        limit: i64,
    ) -> Result<Vec<DailyStats>, RepoError> {
        let mut rows: Vec<DailyStats> = self
            .0
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.post_id == post_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn remove_for_post(&self, post_id: ObjectId) -> Result<u64, RepoError> {
        let mut rows = self.0.stats.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.post_id != post_id);
        Ok((before - rows.len()) as u64)
    }
}
