use bson::oid::ObjectId;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily engagement counters for one post; one document per
/// `(post, UTC day)`, created lazily by the first event of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub author_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub bookmarks: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl DailyStats {
    pub fn new(post_id: ObjectId, author_id: ObjectId, date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            post_id,
            author_id,
            date,
            views: 0,
            likes: 0,
            comments: 0,
            bookmarks: 0,
            shares: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Counter selected by an engagement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Views,
    Likes,
    Comments,
    Bookmarks,
    Shares,
}

impl StatField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::Views => "views",
            StatField::Likes => "likes",
            StatField::Comments => "comments",
            StatField::Bookmarks => "bookmarks",
            StatField::Shares => "shares",
        }
    }
}

/// Summed counters across a window of daily rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatTotals {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub bookmarks: i64,
}

/// UTC midnight of the instant's day; the analytics document key.
pub fn day_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
