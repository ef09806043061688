use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest comment accepted on a post.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Characters of content used when no excerpt is supplied.
const EXCERPT_CHARS: usize = 200;

/// Publication lifecycle of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Archived => "archived",
        }
    }
}

/// Editorial category, stored under its display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Introduction,
    #[default]
    Technology,
    Tutorial,
    News,
    #[serde(rename = "Web Development")]
    WebDevelopment,
    Mobile,
    #[serde(rename = "AI/ML")]
    AiMl,
    DevOps,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Introduction => "Introduction",
            Category::Technology => "Technology",
            Category::Tutorial => "Tutorial",
            Category::News => "News",
            Category::WebDevelopment => "Web Development",
            Category::Mobile => "Mobile",
            Category::AiMl => "AI/ML",
            Category::DevOps => "DevOps",
        }
    }

    pub const ALL: [Category; 8] = [
        Category::Introduction,
        Category::Technology,
        Category::Tutorial,
        Category::News,
        Category::WebDevelopment,
        Category::Mobile,
        Category::AiMl,
        Category::DevOps,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Inline media attached to a post body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Cover image shown in listings and social cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A comment embedded in its post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub author_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: ObjectId, content: String, parent_id: Option<ObjectId>) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            content,
            author_id,
            parent_id,
            likes: Vec::new(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One recorded view of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub viewed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Post entity - a blog article with embedded engagement state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: ObjectId,
    pub published: bool,
    #[serde(default, with = "super::bson_datetime_opt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::bson_datetime_opt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FeaturedImage>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub bookmarks: Vec<ObjectId>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub view_history: Vec<ViewEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub reading_time: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Derive lifecycle fields from the requested publish flag and
    /// optional schedule date. A schedule date always wins.
    pub fn derive_status(
        published: bool,
        scheduled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (PostStatus, Option<DateTime<Utc>>) {
        if let Some(at) = scheduled_at {
            (PostStatus::Scheduled, Some(at))
        } else if published {
            (PostStatus::Published, Some(now))
        } else {
            (PostStatus::Draft, None)
        }
    }
}

/// Listing projection of [`Post`]: everything except the heavy body and
/// view-history fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: ObjectId,
    pub published: bool,
    #[serde(default, with = "super::bson_datetime_opt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::bson_datetime_opt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FeaturedImage>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub bookmarks: Vec<ObjectId>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub views: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub reading_time: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Lightweight id/title/slug projection used by the analytics views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
}

/// Partial update produced by the edit flow; `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub status: Option<PostStatus>,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time: Option<u32>,
}

/// Fallback excerpt: the first [`EXCERPT_CHARS`] characters of content,
/// always ellipsized.
pub fn derive_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}
