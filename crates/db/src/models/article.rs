use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Credits required to read past the free preview. 0 means free.
    pub credit: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateArticle {
    pub title: String,
    pub content: String,
    pub credit: Option<i64>,
}

impl Article {
    pub fn is_free(&self) -> bool {
        self.credit == 0
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Article>("SELECT * FROM articles ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateArticle) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Article>(
            r#"INSERT INTO articles (title, content, credit, created_at)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.credit.unwrap_or(0))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
