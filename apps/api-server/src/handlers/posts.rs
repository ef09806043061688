//! Post handlers: listing, CRUD, and engagement.

use actix_web::{HttpRequest, HttpResponse, web};
use bson::oid::ObjectId;

use verso_core::ports::RateLimiter;
use verso_core::query::PostListParams;
use verso_core::service::ViewContext;
use verso_shared::dto::{
    AddCommentRequest, BookmarkRequest, BookmarkResponse, CommentDto, CommentResponse,
    CreatePostRequest, LikeResponse, PostDetailDto, PostListResponse, UpdatePostRequest,
};
use verso_shared::{ErrorResponse, MessageResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PostListParams>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let params = query.into_inner();
    let page = state.posts.list(&params, identity.caller().as_ref()).await?;

    Ok(HttpResponse::Ok().json(PostListResponse::new(&page, &params)))
}

/// GET /api/posts/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let view = ViewContext {
        ip: req
            .connection_info()
            .realip_remote_addr()
            .map(String::from),
        user_agent: req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    };

    let post = state
        .posts
        .fetch_by_slug(&slug, identity.caller().as_ref(), view)
        .await?;

    Ok(HttpResponse::Ok().json(PostDetailDto::from(&post)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    // Creation quota, keyed by client IP like the scope-level limiters
    let key = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    if let Ok(result) = state.create_post_limiter.check(&key).await {
        if !result.allowed {
            tracing::warn!("Post creation rate limit exceeded for key: {}", key);
            return Ok(HttpResponse::TooManyRequests()
                .insert_header(("Retry-After", result.reset_after.as_secs().to_string()))
                .json(ErrorResponse::new(
                    "Too many post creations, please try again later",
                )));
        }
    }

    let post = state
        .posts
        .create(&identity.caller(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(PostDetailDto::from(&post)))
}

/// PUT /api/posts/{slug}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update(&path.into_inner(), &identity.caller(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(PostDetailDto::from(&post)))
}

/// DELETE /api/posts/{slug}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(&path.into_inner(), &identity.caller())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// PUT /api/posts/{slug}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .engagement
        .toggle_like(&path.into_inner(), &identity.caller())
        .await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        message: if outcome.is_liked {
            "Post liked".to_string()
        } else {
            "Post unliked".to_string()
        },
        is_liked: outcome.is_liked,
        likes_count: outcome.likes_count,
    }))
}

/// PUT /api/posts/{slug}/bookmark
pub async fn toggle_bookmark(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: Option<web::Json<BookmarkRequest>>,
) -> AppResult<HttpResponse> {
    let note = body.map(|b| b.into_inner()).unwrap_or_default();
    let outcome = state
        .engagement
        .toggle_bookmark(&path.into_inner(), &identity.caller(), note.into())
        .await?;

    Ok(HttpResponse::Ok().json(BookmarkResponse {
        message: if outcome.is_bookmarked {
            "Post bookmarked".to_string()
        } else {
            "Bookmark removed".to_string()
        },
        is_bookmarked: outcome.is_bookmarked,
        bookmarks_count: outcome.bookmarks_count,
    }))
}

/// POST /api/posts/{slug}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let parent_id = req
        .parent_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid parent comment ID".to_string()))?;

    let outcome = state
        .engagement
        .add_comment(&path.into_inner(), &identity.caller(), &req.content, parent_id)
        .await?;

    Ok(HttpResponse::Created().json(CommentResponse {
        message: "Comment added successfully".to_string(),
        comment: CommentDto::new(&outcome.comment, outcome.author.as_ref()),
    }))
}
