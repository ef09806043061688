//! Typed query model for post listings.
//!
//! Raw query-string parameters are validated and resolved into a
//! [`PostQuery`] here; the storage layer compiles that value into its
//! native filter in exactly one place.

use bson::oid::ObjectId;
use serde::Deserialize;

use crate::domain::{Caller, Category, PostStatus};
use crate::error::DomainError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw listing parameters as they arrive on the wire. Enum-typed fields
/// reject unknown values at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<Category>,
    pub tags: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub status: Option<StatusParam>,
}

/// Accepted values of the `status` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusParam {
    #[default]
    Published,
    Draft,
    Scheduled,
    Archived,
    All,
}

impl StatusParam {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusParam::Published => "published",
            StatusParam::Draft => "draft",
            StatusParam::Scheduled => "scheduled",
            StatusParam::Archived => "archived",
            StatusParam::All => "all",
        }
    }

    /// The concrete status this parameter names, `None` for `all`.
    fn as_status(self) -> Option<PostStatus> {
        match self {
            StatusParam::Published => Some(PostStatus::Published),
            StatusParam::Draft => Some(PostStatus::Draft),
            StatusParam::Scheduled => Some(PostStatus::Scheduled),
            StatusParam::Archived => Some(PostStatus::Archived),
            StatusParam::All => None,
        }
    }
}

/// Whitelisted sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Title,
    Views,
    ReadingTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Which posts a caller may see, resolved from the requested status and
/// the caller's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Live posts only.
    Published,
    /// One explicit status (privileged callers).
    Status(PostStatus),
    /// No status predicate at all (privileged callers asking for `all`).
    Any,
    /// Live posts plus the caller's own, whatever their status.
    PublishedOrAuthor(ObjectId),
}

impl Visibility {
    pub fn resolve(requested: StatusParam, caller: Option<&Caller>) -> Self {
        if requested == StatusParam::Published {
            return Visibility::Published;
        }
        match caller {
            Some(caller) if caller.is_privileged() => match requested.as_status() {
                Some(status) => Visibility::Status(status),
                None => Visibility::Any,
            },
            // A plain account asking for non-published content gets the
            // published-or-own scope; the requested status is ignored.
            Some(caller) => Visibility::PublishedOrAuthor(caller.user_id),
            None => Visibility::Published,
        }
    }
}

/// Validated 1-indexed pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, DomainError> {
        let number = page.unwrap_or(1);
        let size = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if number < 1 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { number, size })
    }

    pub fn skip(&self) -> u64 {
        ((self.number - 1) * self.size) as u64
    }

    /// Page count for `total` matching rows, rounded up.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size as u64)
    }
}

/// Fully resolved listing query.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub visibility: Visibility,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub author_id: Option<ObjectId>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: Page,
}

impl PostQuery {
    /// Resolve raw parameters against the caller. `author_id` is the
    /// pre-resolved author filter; pass `None` when the author parameter
    /// was absent.
    pub fn resolve(
        params: &PostListParams,
        caller: Option<&Caller>,
        author_id: Option<ObjectId>,
    ) -> Result<Self, DomainError> {
        let page = Page::new(params.page, params.limit)?;
        Ok(Self {
            visibility: Visibility::resolve(params.status.unwrap_or_default(), caller),
            category: params.category,
            tags: params.tags.as_deref().map(split_tags).unwrap_or_default(),
            author_id,
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_by: params.sort_by.unwrap_or_default(),
            sort_order: params.sort_order.unwrap_or_default(),
            page,
        })
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
