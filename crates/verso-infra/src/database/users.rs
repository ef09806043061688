//! MongoDB user repository.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use verso_core::domain::User;
use verso_core::error::RepoError;
use verso_core::ports::UserRepository;

use super::query::escape_regex;
use super::{USERS, map_mongo_err};

/// User repository backed by the `users` collection.
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USERS),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        self.collection
            .insert_one(user)
            .await
            .map(drop)
            .map_err(map_mongo_err)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(map_mongo_err)
    }

    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<User>, RepoError> {
        let filter = doc! {
            "name": { "$regex": escape_regex(fragment).as_str(), "$options": "i" }
        };
        self.collection
            .find_one(filter)
            .await
            .map_err(map_mongo_err)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await
            .map_err(map_mongo_err)?;
        cursor.try_collect().await.map_err(map_mongo_err)
    }

    async fn list_recent(&self) -> Result<Vec<User>, RepoError> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(map_mongo_err)?;
        cursor.try_collect().await.map_err(map_mongo_err)
    }
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = if local.len() > 1 {
            format!("{}***", &local[..1])
        } else {
            "***".to_string()
        };
        format!("{masked_local}{domain}")
    } else {
        "***".to_string()
    }
}
