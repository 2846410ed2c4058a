//! Routes for cards: CRUD, work sessions, completion, and the triage views.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::Utc;
use db::{
    DBService,
    models::card::{Card, CreateCard, UpdateCard},
};
use services::services::{
    card::{CardService, DoneMonth},
    triage::{PriorityBuckets, TimeBuckets},
};
use utils::response::ApiResponse;

use crate::error::ApiError;

pub async fn list_cards(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<Vec<Card>>>, ApiError> {
    let cards = Card::find_all(&db.pool).await.map_err(ApiError::Database)?;
    Ok(ResponseJson(ApiResponse::success(cards)))
}

pub async fn create_card(
    State(db): State<DBService>,
    axum::Json(payload): axum::Json<CreateCard>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let card = CardService::create_card(&db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(card)))
}

pub async fn update_card(
    State(db): State<DBService>,
    Path(card_id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateCard>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let card = CardService::update_card(&db.pool, card_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(card)))
}

pub async fn delete_card(
    State(db): State<DBService>,
    Path(card_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    CardService::delete_card(&db.pool, card_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn begin_session(
    State(db): State<DBService>,
    Path(card_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let card = CardService::begin_session(&db.pool, card_id, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(card)))
}

pub async fn end_session(
    State(db): State<DBService>,
    Path(card_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let card = CardService::end_session(&db.pool, card_id, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(card)))
}

pub async fn complete_card(
    State(db): State<DBService>,
    Path(card_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let done = CardService::complete_card(&db.pool, card_id, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(done)))
}

pub async fn time_buckets(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<TimeBuckets>>, ApiError> {
    let buckets = CardService::time_view(&db.pool, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(buckets)))
}

pub async fn priority_buckets(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<PriorityBuckets>>, ApiError> {
    let buckets = CardService::priority_view(&db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(buckets)))
}

pub async fn done_by_month(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<Vec<DoneMonth>>>, ApiError> {
    let history = CardService::done_history(&db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub fn router() -> Router<DBService> {
    Router::new().nest(
        "/cards",
        Router::new()
            .route("/", get(list_cards).post(create_card))
            .route("/{card_id}", put(update_card).delete(delete_card))
            .route("/{card_id}/begin", post(begin_session))
            .route("/{card_id}/end", post(end_session))
            .route("/{card_id}/complete", post(complete_card))
            .route("/time-buckets", get(time_buckets))
            .route("/priority-buckets", get(priority_buckets))
            .route("/done-by-month", get(done_by_month)),
    )
}
