//! MongoDB daily-analytics repository.

use async_trait::async_trait;
use bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::Deserialize;

use verso_core::domain::{DailyStats, StatField, StatTotals};
use verso_core::error::RepoError;
use verso_core::ports::AnalyticsRepository;

use super::{POST_ANALYTICS, map_mongo_err};

/// Analytics repository backed by the `postanalytics` collection, one
/// document per `(postId, date)` under a unique index.
pub struct MongoAnalyticsRepository {
    collection: Collection<DailyStats>,
}

impl MongoAnalyticsRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(POST_ANALYTICS),
        }
    }
}

/// `$group` output of [`MongoAnalyticsRepository::totals_since`].
#[derive(Debug, Deserialize)]
struct TotalsRow {
    #[serde(default)]
    views: i64,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    comments: i64,
    #[serde(default)]
    bookmarks: i64,
}

#[async_trait]
impl AnalyticsRepository for MongoAnalyticsRepository {
    async fn bump(
        &self,
        post_id: ObjectId,
        author_id: ObjectId,
        day: DateTime<Utc>,
        field: StatField,
        delta: i64,
    ) -> Result<(), RepoError> {
        let now = BsonDateTime::now();
        let mut inc = Document::new();
        inc.insert(field.as_str(), delta);
        let update = doc! {
            "$inc": inc,
            "$set": { "updatedAt": now },
            "$setOnInsert": {
                "authorId": author_id,
                "createdAt": now,
            },
        };

        self.collection
            .update_one(
                doc! { "postId": post_id, "date": BsonDateTime::from_chrono(day) },
                update,
            )
            .upsert(true)
            .await
            .map(drop)
            .map_err(map_mongo_err)
    }

    async fn rows_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyStats>, RepoError> {
        let filter = doc! {
            "postId": { "$in": post_ids.to_vec() },
            "date": { "$gte": BsonDateTime::from_chrono(since) },
        };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "date": -1 })
            .await
            .map_err(map_mongo_err)?;
        cursor.try_collect().await.map_err(map_mongo_err)
    }

    async fn totals_since(
        &self,
        post_ids: &[ObjectId],
        since: DateTime<Utc>,
    ) -> Result<StatTotals, RepoError> {
        let pipeline = vec![
            doc! { "$match": {
                "postId": { "$in": post_ids.to_vec() },
                "date": { "$gte": BsonDateTime::from_chrono(since) },
            } },
            doc! { "$group": {
                "_id": Bson::Null,
                "views": { "$sum": "$views" },
                "likes": { "$sum": "$likes" },
                "comments": { "$sum": "$comments" },
                "bookmarks": { "$sum": "$bookmarks" },
            } },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(map_mongo_err)?;
        match cursor.try_next().await.map_err(map_mongo_err)? {
            Some(row) => {
                let totals: TotalsRow =
                    bson::from_document(row).map_err(|e| RepoError::Query(e.to_string()))?;
                Ok(StatTotals {
                    views: totals.views,
                    likes: totals.likes,
                    comments: totals.comments,
                    bookmarks: totals.bookmarks,
                })
            }
            None => Ok(StatTotals::default()),
        }
    }

    async fn recent_for_post(
        &self,
        post_id: ObjectId,
        limit: i64,
    ) -> Result<Vec<DailyStats>, RepoError> {
        let cursor = self
            .collection
            .find(doc! { "postId": post_id })
            .sort(doc! { "date": -1 })
            .limit(limit)
            .await
            .map_err(map_mongo_err)?;
        cursor.try_collect().await.map_err(map_mongo_err)
    }

    async fn remove_for_post(&self, post_id: ObjectId) -> Result<u64, RepoError> {
        let result = self
            .collection
            .delete_many(doc! { "postId": post_id })
            .await
            .map_err(map_mongo_err)?;
        Ok(result.deleted_count)
    }
}
