//! MongoDB post repository.

use async_trait::async_trait;
use bson::{DateTime as BsonDateTime, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use verso_core::domain::{Comment, Post, PostPatch, PostPreview, PostRef, ViewEvent};
use verso_core::error::RepoError;
use verso_core::ports::PostRepository;
use verso_core::query::PostQuery;

use super::query::{filter_document, preview_projection, sort_document};
use super::{POSTS, map_mongo_err};

/// Post repository backed by the `posts` collection. Comments, likes,
/// bookmarks, and the view log live embedded in the post document.
pub struct MongoPostRepository {
    collection: Collection<Post>,
}

impl MongoPostRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(POSTS),
        }
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, post: &Post) -> Result<(), RepoError> {
        self.collection
            .insert_one(post)
            .await
            .map(drop)
            .map_err(map_mongo_err)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Post>, RepoError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_err)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.collection
            .find_one(doc! { "slug": slug })
            .await
            .map_err(map_mongo_err)
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<ObjectId>) -> Result<bool, RepoError> {
        let mut filter = doc! { "slug": slug };
        if let Some(id) = exclude {
            filter.insert("_id", doc! { "$ne": id });
        }
        let count = self
            .collection
            .count_documents(filter)
            .await
            .map_err(map_mongo_err)?;
        Ok(count > 0)
    }

    async fn list(&self, query: &PostQuery) -> Result<(Vec<PostPreview>, u64), RepoError> {
        let filter = filter_document(query);

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(map_mongo_err)?;

        let cursor = self
            .collection
            .clone_with_type::<PostPreview>()
            .find(filter)
            .sort(sort_document(query))
            .skip(query.page.skip())
            .limit(query.page.size)
            .projection(preview_projection())
            .await
            .map_err(map_mongo_err)?;
        let posts = cursor.try_collect().await.map_err(map_mongo_err)?;

        Ok((posts, total))
    }

    async fn refs_by_author(&self, author_id: ObjectId) -> Result<Vec<PostRef>, RepoError> {
        let cursor = self
            .collection
            .clone_with_type::<PostRef>()
            .find(doc! { "authorId": author_id })
            .projection(doc! { "title": 1, "slug": 1 })
            .await
            .map_err(map_mongo_err)?;
        cursor.try_collect().await.map_err(map_mongo_err)
    }

    async fn update(&self, id: ObjectId, patch: &PostPatch) -> Result<Option<Post>, RepoError> {
        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(title) = &patch.title {
            set.insert("title", title.as_str());
        }
        if let Some(slug) = &patch.slug {
            set.insert("slug", slug.as_str());
        }
        if let Some(content) = &patch.content {
            set.insert("content", content.as_str());
        }
        if let Some(excerpt) = &patch.excerpt {
            set.insert("excerpt", excerpt.as_str());
        }
        if let Some(category) = patch.category {
            set.insert("category", category.as_str());
        }
        if let Some(tags) = &patch.tags {
            set.insert("tags", tags.clone());
        }
        if let Some(published) = patch.published {
            set.insert("published", published);
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }
        if let Some(published_at) = patch.published_at {
            set.insert("publishedAt", BsonDateTime::from_chrono(published_at));
        }
        if let Some(reading_time) = patch.reading_time {
            set.insert("readingTime", reading_time as i32);
        }

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_err)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn record_view(&self, id: ObjectId, event: &ViewEvent) -> Result<(), RepoError> {
        let event = bson::to_bson(event).map_err(|e| RepoError::Query(e.to_string()))?;
        let update = doc! {
            "$inc": { "views": 1 },
            "$push": { "viewHistory": event },
            "$set": { "updatedAt": BsonDateTime::now() },
        };
        self.collection
            .update_one(doc! { "_id": id }, update)
            .await
            .map(drop)
            .map_err(map_mongo_err)
    }

    async fn set_like(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, RepoError> {
        self.toggle_membership(id, "likes", user_id, liked).await
    }

    async fn set_bookmark(
        &self,
        id: ObjectId,
        user_id: ObjectId,
        bookmarked: bool,
    ) -> Result<Option<Post>, RepoError> {
        self.toggle_membership(id, "bookmarks", user_id, bookmarked)
            .await
    }

    async fn push_comment(&self, id: ObjectId, comment: &Comment) -> Result<(), RepoError> {
        let comment = bson::to_bson(comment).map_err(|e| RepoError::Query(e.to_string()))?;
        let update = doc! {
            "$push": { "comments": comment },
            "$set": { "updatedAt": BsonDateTime::now() },
        };
        let result = self
            .collection
            .update_one(doc! { "_id": id }, update)
            .await
            .map_err(map_mongo_err)?;
        if result.matched_count == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

impl MongoPostRepository {
    /// `$addToSet`/`$pull` keep the toggle idempotent even when two
    /// requests race.
    async fn toggle_membership(
        &self,
        id: ObjectId,
        field: &str,
        user_id: ObjectId,
        present: bool,
    ) -> Result<Option<Post>, RepoError> {
        let operator = if present { "$addToSet" } else { "$pull" };
        let mut member = Document::new();
        member.insert(field, user_id);
        let mut update = Document::new();
        update.insert(operator, member);
        update.insert("$set", doc! { "updatedAt": BsonDateTime::now() });

        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_err)
    }
}
