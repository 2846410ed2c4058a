//! Routes for users and credit grants.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use db::{DBService, models::user::User};
use serde::{Deserialize, Serialize};
use services::services::paywall::{GrantedCredit, PaywallService};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub credit_balance: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GrantCreditRequest {
    pub amount: i64,
}

pub async fn create_user(
    State(db): State<DBService>,
    axum::Json(payload): axum::Json<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::create(
        &db.pool,
        &payload.username,
        payload.credit_balance.unwrap_or(0),
    )
    .await
    .map_err(ApiError::Database)?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn grant_credit(
    State(db): State<DBService>,
    Path(user_id): Path<i64>,
    axum::Json(payload): axum::Json<GrantCreditRequest>,
) -> Result<ResponseJson<ApiResponse<GrantedCredit>>, ApiError> {
    let granted = PaywallService::grant_credit(&db.pool, user_id, payload.amount).await?;
    Ok(ResponseJson(ApiResponse::success(granted)))
}

pub fn router() -> Router<DBService> {
    Router::new().nest(
        "/users",
        Router::new()
            .route("/", post(create_user))
            .route("/{user_id}/credits", post(grant_credit)),
    )
}
