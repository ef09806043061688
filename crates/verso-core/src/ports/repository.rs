use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::domain::{
    Bookmark, Comment, DailyStats, Post, PostPatch, PostPreview, PostRef, StatField, StatTotals,
    User, ViewEvent,
};
use crate::error::RepoError;
use crate::query::PostQuery;

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, RepoError>;

    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// First user whose name contains `fragment`, case-insensitively.
    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<User>, RepoError>;

    /// Batched lookup for author population.
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, RepoError>;

    /// All users, newest first.
    async fn list_recent(&self) -> Result<Vec<User>, RepoError>;
}

/// Post repository, including the embedded engagement state.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Does a different post (excluding `exclude`) already use `slug`?
    async fn slug_taken(&self, slug: &str, exclude: Option<ObjectId>) -> Result<bool, RepoError>;

    /// One listing page plus the total matching count.
    async fn list(&self, query: &PostQuery) -> Result<(Vec<PostPreview>, u64), RepoError>;

    /// Id/title/slug projections of every post by `author_id`.
    async fn refs_by_author(&self, author_id: ObjectId) -> Result<Vec<PostRef>, RepoError>;

    /// Apply a partial update, returning the post as stored afterwards.
    async fn update(&self, id: ObjectId, patch: &PostPatch) -> Result<Option<Post>, RepoError>;

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError>;

    /// Record one view: bump the counter and append to the history log.
    async fn record_view(&self, id: ObjectId, event: &ViewEvent) -> Result<(), RepoError>;

    /// Add (`true`) or remove (`false`) `user_id` in the like set,
    /// idempotently, returning the post after the write.
    async fn set_like(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, RepoError>;

    /// Same contract as [`Self::set_like`] for the bookmark set.
    async fn set_bookmark(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        bookmarked: bool,
    ) -> Result<Option<Post>, RepoError>;

    async fn push_comment(&self, id: ObjectId, comment: &Comment) -> Result<(), RepoError>;
}

/// Bookmark join-record repository.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn find(&self, user_id: ObjectId, post_id: ObjectId)
    -> Result<Option<Bookmark>, RepoError>;

    async fn insert(&self, bookmark: &Bookmark) -> Result<(), RepoError>;

    async fn remove(&self, user_id: ObjectId, post_id: ObjectId) -> Result<bool, RepoError>;

    /// Cascade helper: drop every bookmark of a deleted post.
    async fn remove_for_post(&self, post_id: ObjectId) -> Result<u64, RepoError>;
}

/// Daily analytics repository.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Upsert the `(post, day)` document and bump one counter by `delta`.
    /// The author id is recorded when the document is first created.
    async fn bump(
        &self,
        post_id: ObjectId,
        author_id: ObjectId,
        day: DateTime<Utc>,
        field: StatField,
        delta: i64,
    ) -> Result<(), RepoError>;

    /// Daily rows for the given posts since `since`, newest first.
    async fn rows_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyStats>, RepoError>;

    /// Counter totals across the given posts since `since`, summed by
    /// the store's aggregation pipeline.
    async fn totals_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<StatTotals, RepoError>;

    /// Up to `limit` most recent daily rows for one post, newest first.
    async fn recent_for_post(
        &self,
        post_id: ObjectId,
        limit: i64,
    ) -> Result<Vec<DailyStats>, RepoError>;

    /// Cascade helper: drop every row of a deleted post.
    async fn remove_for_post(&self, post_id: ObjectId) -> Result<u64, RepoError>;
}
