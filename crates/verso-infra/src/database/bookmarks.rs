//! MongoDB bookmark join-record repository.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use verso_core::domain::Bookmark;
use verso_core::error::RepoError;
use verso_core::ports::BookmarkRepository;

use super::{BOOKMARKS, map_mongo_err};

/// Bookmark repository backed by the `bookmarks` collection. A unique
/// `(userId, postId)` index turns racing inserts into constraint errors.
pub struct MongoBookmarkRepository {
    collection: Collection<Bookmark>,
}

impl MongoBookmarkRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(BOOKMARKS),
        }
    }
}

#[async_trait]
impl BookmarkRepository for MongoBookmarkRepository {
    async fn find(
        &self,
        user_id: ObjectId,
        post_id: ObjectId,
    ) -> Result<Option<Bookmark>, RepoError> {
        self.collection
            .find_one(doc! { "userId": user_id, "postId": post_id })
            .await
            .map_err(map_mongo_err)
    }

    async fn insert(&self, bookmark: &Bookmark) -> Result<(), RepoError> {
        self.collection
            .insert_one(bookmark)
            .await
            .map(drop)
            .map_err(map_mongo_err)
    }

    async fn remove(&self, user_id: ObjectId, post_id: ObjectId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "userId": user_id, "postId": post_id })
            .await
            .map_err(map_mongo_err)?;
        Ok(result.deleted_count > 0)
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
