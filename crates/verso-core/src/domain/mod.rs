//! Domain entities - the core business objects.

mod analytics;
mod bookmark;
mod post;
mod user;

pub use analytics::{DailyStats, StatField, StatTotals, day_bucket};
pub use bookmark::Bookmark;
pub use post::{
    Category, Comment, FeaturedImage, MAX_COMMENT_LENGTH, MediaItem, MediaKind, Post, PostPatch,
    PostPreview, PostRef, PostStatus, ViewEvent, derive_excerpt,
};
pub use user::{Caller, Preferences, Role, SocialLinks, User, normalize_email};

/// Serde adapter storing `Option<DateTime<Utc>>` as a BSON datetime.
pub(crate) mod bson_datetime_opt {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(BsonDateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<BsonDateTime>::deserialize(deserializer)?.map(BsonDateTime::to_chrono))
    }
}
