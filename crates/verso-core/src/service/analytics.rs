//! Author-facing analytics views.

use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{Duration, Utc};

use crate::domain::{Caller, DailyStats, PostRef, StatTotals};
use crate::error::DomainError;
use crate::ports::{AnalyticsRepository, PostRepository};

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
const MAX_WINDOW_DAYS: i64 = 365;

/// Rows shown on the per-post drilldown.
const POST_DETAIL_ROWS: i64 = 30;

/// Everything the dashboard renders: summed totals, the daily rows of
/// the window, and the owner's posts for labeling.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub totals: StatTotals,
    pub rows: Vec<DailyStats>,
    pub posts: Vec<PostRef>,
}

pub struct AnalyticsService {
    posts: Arc<dyn PostRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(posts: Arc<dyn PostRepository>, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { posts, analytics }
    }

    /// Dashboard over the caller's own posts for a trailing window of
    /// `days` (default 7).
    pub async fn dashboard(
        &self,
        caller: &Caller,
        days: Option<i64>,
    ) -> Result<Dashboard, DomainError> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(DomainError::validation(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }

        let posts = self.posts.refs_by_author(caller.user_id).await?;
        if posts.is_empty() {
            return Ok(Dashboard {
                totals: StatTotals::default(),
                rows: Vec::new(),
                posts,
            });
        }

        let ids: Vec<ObjectId> = posts.iter().map(|p| p.id).collect();
        let since = Utc::now() - Duration::days(days);
        let rows = self.analytics.rows_since(&ids, since).await?;
        let totals = self.analytics.totals_since(&ids, since).await?;

        Ok(Dashboard {
            totals,
            rows,
            posts,
        })
    }

    /// Recent daily rows for one post; owners and admins only.
    pub async fn post_detail(
        &self,
        caller: &Caller,
        post_id: ObjectId,
    ) -> Result<Vec<DailyStats>, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::not_found("Post"))?;
        if !caller.may_manage(post.author_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(self
            .analytics
            .recent_for_post(post_id, POST_DETAIL_ROWS)
            .await?)
    }
}
