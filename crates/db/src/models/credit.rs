use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// What a ledger entry was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Type, Serialize, Deserialize, TS, EnumString, Display)]
#[sqlx(type_name = "credit_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CreditSource {
    /// Spent to unlock a paid article.
    ReadArticle,
    /// Manual adjustment (grant or correction).
    Adjustment,
}

/// One row in the credit ledger: a signed amount tied to a user and
/// optionally to an article.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CreditEntry {
    pub id: Uuid,
    pub user_id: i64,
    pub article_id: Option<i64>,
    pub amount: i64,
    pub source: CreditSource,
    pub created_at: DateTime<Utc>,
}

impl CreditEntry {
    pub async fn create<'e, E>(
        executor: E,
        user_id: i64,
        article_id: Option<i64>,
        amount: i64,
        source: CreditSource,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, CreditEntry>(
            r#"INSERT INTO credit_entries (id, user_id, article_id, amount, source, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(article_id)
        .bind(amount)
        .bind(source)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    /// Whether the user already has a spend entry for this article.
    pub async fn exists_for_article(
        pool: &SqlitePool,
        user_id: i64,
        article_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(1) FROM credit_entries
               WHERE user_id = $1 AND article_id = $2 AND source = $3"#,
        )
        .bind(user_id)
        .bind(article_id)
        .bind(CreditSource::ReadArticle)
        .fetch_one(pool)
        .await?;
        Ok(count.0 > 0)
    }

    pub async fn find_by_user_id(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CreditEntry>(
            "SELECT * FROM credit_entries WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
