//! MongoDB connection management and repositories.

use std::time::Duration;

use bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use verso_core::error::RepoError;

mod analytics;
mod bookmarks;
mod posts;
mod query;
mod users;

pub use analytics::MongoAnalyticsRepository;
pub use bookmarks::MongoBookmarkRepository;
pub use posts::MongoPostRepository;
pub use users::MongoUserRepository;

pub(crate) const USERS: &str = "users";
pub(crate) const POSTS: &str = "posts";
pub(crate) const BOOKMARKS: &str = "bookmarks";
pub(crate) const POST_ANALYTICS: &str = "postanalytics";

/// Configuration for the MongoDB connection.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub app_name: String,
    pub max_pool_size: u32,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "verso".to_string(),
            app_name: "verso-api".to_string(),
            max_pool_size: 20,
        }
    }
}

impl MongoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            uri: std::env::var("MONGODB_URI").unwrap_or(defaults.uri),
            database: std::env::var("MONGODB_DATABASE").unwrap_or(defaults.database),
            app_name: defaults.app_name,
            max_pool_size: std::env::var("DB_MAX_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_pool_size),
        }
    }
}

/// Connect to MongoDB and verify the connection with a ping.
pub async fn connect(config: &MongoConfig) -> Result<Database, RepoError> {
    tracing::info!(database = %config.database, "Connecting to MongoDB...");

    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(map_mongo_err)?;
    options.app_name = Some(config.app_name.clone());
    options.max_pool_size = Some(config.max_pool_size);
    options.server_selection_timeout = Some(Duration::from_secs(10));

    let client = Client::with_options(options).map_err(map_mongo_err)?;
    let database = client.database(&config.database);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(map_mongo_err)?;

    tracing::info!(
        database = %config.database,
        pool = config.max_pool_size,
        "MongoDB connected"
    );
    Ok(database)
}

/// Create the indexes the queries rely on. Safe to run on every boot;
/// existing indexes are left alone.
pub async fn ensure_indexes(database: &Database) -> Result<(), RepoError> {
    let unique = || IndexOptions::builder().unique(true).build();

    let users = database.collection::<bson::Document>(USERS);
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;

    let posts = database.collection::<bson::Document>(POSTS);
    posts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(unique())
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;
    posts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "status": 1, "publishedAt": -1 })
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;
    posts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "authorId": 1, "createdAt": -1 })
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;

    let bookmarks = database.collection::<bson::Document>(BOOKMARKS);
    bookmarks
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1, "postId": 1 })
                .options(unique())
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;

    let analytics = database.collection::<bson::Document>(POST_ANALYTICS);
    analytics
        .create_index(
            IndexModel::builder()
                .keys(doc! { "postId": 1, "date": 1 })
                .options(unique())
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;
    analytics
        .create_index(
            IndexModel::builder()
                .keys(doc! { "authorId": 1, "date": -1 })
                .build(),
        )
        .await
        .map_err(map_mongo_err)?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}

/// Map a driver error onto the repository error taxonomy.
pub(crate) fn map_mongo_err(err: mongodb::error::Error) -> RepoError {
    if is_duplicate_key(&err) {
        return RepoError::Constraint(err.to_string());
    }
    match *err.kind {
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::DnsResolve { .. } => {
            RepoError::Connection(err.to_string())
        }
        _ => RepoError::Query(err.to_string()),
    }
}

/// MongoDB signals unique-index violations with error code 11000.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}
