//! Authentication handlers.

use actix_web::{HttpResponse, web};

use verso_core::domain::{User, normalize_email};
use verso_shared::dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Validate input
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    // Check if user already exists
    if state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    // Hash password
    let password_hash = state.passwords.hash(&req.password)?;

    let mut user = User::new(req.name.trim(), &req.email);
    user.password_hash = Some(password_hash);
    user.avatar_url = req.avatar_url;
    state.users.insert(&user).await?;

    // Generate token
    let token = state.tokens.generate_token(user.id, &user.email, user.role)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserDto::from(&user),
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    // Unknown email, credential-less account, and wrong password all
    // answer the same way.
    let user = state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = state.passwords.verify(&req.password, hash)?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.tokens.generate_token(user.id, &user.email, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserDto::from(&user),
    }))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(HttpResponse::Ok().json(UserDto::from(&user)))
}
