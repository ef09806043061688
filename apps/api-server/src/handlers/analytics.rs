//! Analytics handlers.

use actix_web::{HttpResponse, web};
use bson::oid::ObjectId;

use verso_shared::dto::{
    AnalyticsRowDto, DashboardQuery, DashboardResponse, PostAnalyticsResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/analytics/dashboard
pub async fn dashboard(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<DashboardQuery>,
) -> AppResult<HttpResponse> {
    let dashboard = state
        .analytics
        .dashboard(&identity.caller(), query.days)
        .await?;

    Ok(HttpResponse::Ok().json(DashboardResponse::from(&dashboard)))
}

/// GET /api/analytics/post/{postId}
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| AppError::BadRequest("Invalid post ID".to_string()))?;

    let rows = state
        .analytics
        .post_detail(&identity.caller(), post_id)
        .await?;

    Ok(HttpResponse::Ok().json(PostAnalyticsResponse {
        analytics: rows.iter().map(|row| AnalyticsRowDto::new(row, None)).collect(),
    }))
}
