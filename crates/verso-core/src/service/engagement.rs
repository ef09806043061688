//! Like/bookmark toggles and comment addition.

use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::Utc;

use crate::domain::{
    Bookmark, Caller, Comment, MAX_COMMENT_LENGTH, StatField, User, day_bucket,
};
use crate::error::DomainError;
use crate::ports::{AnalyticsRepository, BookmarkRepository, PostRepository, UserRepository};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy)]
pub struct LikeOutcome {
    pub is_liked: bool,
    pub likes_count: usize,
}

/// Result of a bookmark toggle.
#[derive(Debug, Clone, Copy)]
pub struct BookmarkOutcome {
    pub is_bookmarked: bool,
    pub bookmarks_count: usize,
}

/// Optional annotations stored on the bookmark join record.
#[derive(Debug, Clone, Default)]
pub struct BookmarkNote {
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// A stored comment plus its populated author.
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub author: Option<User>,
}

/// Engagement flows: membership-set toggles with their daily counters,
/// and embedded comments.
pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    bookmarks: Arc<dyn BookmarkRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
    users: Arc<dyn UserRepository>,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            bookmarks,
            analytics,
            users,
        }
    }

    /// Flip the caller's membership in the post's like set. The daily
    /// likes counter moves with the direction of the flip.
    pub async fn toggle_like(
        &self,
        post_slug: &str,
        caller: &Caller,
    ) -> Result<LikeOutcome, DomainError> {
        let post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        let was_liked = post.likes.contains(&caller.user_id);
        let updated = self
            .posts
            .set_like(post.id, caller.user_id, !was_liked)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        let delta = if was_liked { -1 } else { 1 };
        self.analytics
            .bump(
                post.id,
                post.author_id,
                day_bucket(Utc::now()),
                StatField::Likes,
                delta,
            )
            .await?;

        Ok(LikeOutcome {
            is_liked: !was_liked,
            likes_count: updated.likes.len(),
        })
    }

    /// Flip the caller's bookmark. The join record is written before the
    /// membership set; both writes are idempotent, so a retried toggle
    /// converges. The daily counter only counts additions.
    pub async fn toggle_bookmark(
        &self,
        post_slug: &str,
        caller: &Caller,
        note: BookmarkNote,
    ) -> Result<BookmarkOutcome, DomainError> {
        let post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        let existing = self.bookmarks.find(caller.user_id, post.id).await?;
        let bookmarked = if existing.is_some() {
            self.bookmarks.remove(caller.user_id, post.id).await?;
            false
        } else {
            let mut bookmark = Bookmark::new(caller.user_id, post.id);
            bookmark.tags = note.tags;
            bookmark.notes = note.notes;
            self.bookmarks.insert(&bookmark).await?;
            true
        };

        let updated = self
            .posts
            .set_bookmark(post.id, caller.user_id, bookmarked)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        if bookmarked {
            self.analytics
                .bump(
                    post.id,
                    post.author_id,
                    day_bucket(Utc::now()),
                    StatField::Bookmarks,
                    1,
                )
                .await?;
        }

        Ok(BookmarkOutcome {
            is_bookmarked: bookmarked,
            bookmarks_count: updated.bookmarks.len(),
        })
    }

    /// Append a comment to the post. A parent id must name an existing,
    /// non-deleted comment of the same post.
    pub async fn add_comment(
        &self,
        post_slug: &str,
        caller: &Caller,
        content: &str,
        parent_id: Option<ObjectId>,
    ) -> Result<CommentOutcome, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("Comment content is required"));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(DomainError::validation(format!(
                "Comment cannot exceed {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let post = self
            .posts
            .find_by_slug(post_slug)
            .await?
            .ok_or(DomainError::not_found("Post"))?;

        if let Some(parent) = parent_id {
            let parent_exists = post
                .comments
                .iter()
                .any(|c| c.id == parent && !c.is_deleted);
            if !parent_exists {
                return Err(DomainError::validation(
                    "Parent comment does not exist on this post",
                ));
            }
        }

        let comment = Comment::new(caller.user_id, content.to_string(), parent_id);
        self.posts.push_comment(post.id, &comment).await?;
        self.analytics
            .bump(
                post.id,
                post.author_id,
                day_bucket(comment.created_at),
                StatField::Comments,
                1,
            )
            .await?;

        let author = self.users.find_by_id(caller.user_id).await?;
        Ok(CommentOutcome { comment, author })
    }
}
