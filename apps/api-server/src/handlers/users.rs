//! User handlers.

use actix_web::{HttpResponse, web};

use verso_core::domain::{User, normalize_email};
use verso_shared::dto::{CreateUserRequest, UserDto};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/users
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = state.users.list_recent().await?;
    let users: Vec<UserDto> = users.iter().map(UserDto::from).collect();

    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/users
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and email are required".to_string(),
        ));
    }

    if state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let mut user = User::new(req.name.trim(), &req.email);
    user.avatar_url = req.avatar_url;
    state.users.insert(&user).await?;

    Ok(HttpResponse::Created().json(UserDto::from(&user)))
}
