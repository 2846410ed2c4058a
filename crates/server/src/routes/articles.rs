//! Routes for articles and the credit paywall.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    DBService,
    models::article::{Article, CreateArticle},
};
use serde::{Deserialize, Serialize};
use services::services::paywall::{ArticleView, PaywallService, UnlockedContent};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{error::ApiError, viewer::Viewer};

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UnlockRequest {
    /// Cutoff echoed back from the preview; recomputed server-side when
    /// omitted.
    #[serde(default)]
    pub cut_at: Option<usize>,
}

pub async fn list_articles(
    State(db): State<DBService>,
) -> Result<ResponseJson<ApiResponse<Vec<Article>>>, ApiError> {
    let articles = Article::find_all(&db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(articles)))
}

pub async fn create_article(
    State(db): State<DBService>,
    axum::Json(payload): axum::Json<CreateArticle>,
) -> Result<ResponseJson<ApiResponse<Article>>, ApiError> {
    let article = Article::create(&db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(article)))
}

/// Viewer-aware article rendering: free, paid-for, or truncated preview.
pub async fn get_article(
    State(db): State<DBService>,
    viewer: Viewer,
    Path(article_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<ArticleView>>, ApiError> {
    let view = PaywallService::view(&db.pool, viewer.0, article_id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Unlock the rest of a paid article, charging the viewer on first call.
pub async fn unlock_article(
    State(db): State<DBService>,
    viewer: Viewer,
    Path(article_id): Path<i64>,
    axum::Json(payload): axum::Json<UnlockRequest>,
) -> Result<ResponseJson<ApiResponse<UnlockedContent>>, ApiError> {
    let user_id = viewer.require()?;
    let cut_at = payload.cut_at;
    let unlocked = PaywallService::unlock_remainder(&db.pool, user_id, article_id, cut_at).await?;
    Ok(ResponseJson(ApiResponse::success(unlocked)))
}

pub fn router() -> Router<DBService> {
    Router::new().nest(
        "/articles",
        Router::new()
            .route("/", get(list_articles).post(create_article))
            .route("/{article_id}", get(get_article))
            .route("/{article_id}/unlock", post(unlock_article)),
    )
}
