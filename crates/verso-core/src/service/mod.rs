//! Application services orchestrating the repository ports.

mod analytics;
mod engagement;
mod posts;

#[cfg(test)]
pub(crate) mod testkit;

pub use analytics::{AnalyticsService, DEFAULT_WINDOW_DAYS, Dashboard};
pub use engagement::{
    BookmarkNote, BookmarkOutcome, CommentOutcome, EngagementService, LikeOutcome,
};
pub use posts::{ListedPost, PostDraft, PostEdit, PostPage, PostService, PostView, ViewContext};
