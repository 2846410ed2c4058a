//! Routes for card categories and their triage-selected views.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::{
    DBService,
    models::{
        card::Card,
        card_category::{CardCategory, CreateCardCategory},
    },
};
use serde::{Deserialize, Serialize};
use services::services::card::{CardService, CategoryView};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::error::ApiError;

/// Category view with the bucket resolved to its display label.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CategoryViewResponse {
    pub category: CardCategory,
    pub bucket_label: Option<String>,
    pub cards: Vec<Card>,
}

impl From<CategoryView> for CategoryViewResponse {
    fn from(view: CategoryView) -> Self {
        CategoryViewResponse {
            bucket_label: view.bucket.map(|kind| kind.label().to_string()),
            category: view.category,
            cards: view.cards,
        }
    }
}

pub async fn list_categories(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<Vec<CardCategory>>>, ApiError> {
    let categories = CardService::list_categories(&db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub async fn create_category(
    State(db): State<DBService>,
    axum::Json(payload): axum::Json<CreateCardCategory>,
) -> Result<ResponseJson<ApiResponse<CardCategory>>, ApiError> {
    let category = CardService::create_category(&db.pool, &payload.name).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn rename_category(
    State(db): State<DBService>,
    Path(category_id): Path<i64>,
    axum::Json(payload): axum::Json<CreateCardCategory>,
) -> Result<ResponseJson<ApiResponse<CardCategory>>, ApiError> {
    let category = CardService::rename_category(&db.pool, category_id, &payload.name).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(db): State<DBService>,
    Path(category_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    CardService::delete_category(&db.pool, category_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Cards to display for the category, per the triage selection rules.
pub async fn category_view(
    State(db): State<DBService>,
    Path(category_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<CategoryViewResponse>>, ApiError> {
    let view = CardService::view_for_category(&db.pool, category_id, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(view.into())))
}

pub fn router() -> Router<DBService> {
    Router::new().nest(
        "/card-categories",
        Router::new()
            .route("/", get(list_categories).post(create_category))
            .route("/{category_id}", axum::routing::put(rename_category).delete(delete_category))
            .route("/{category_id}/view", get(category_view)),
    )
}
