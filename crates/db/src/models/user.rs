use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Current point balance; every change is mirrored by a ledger entry.
    pub credit_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, username: &str, credit_balance: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, credit_balance, created_at)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(username)
        .bind(credit_balance)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Apply a signed delta to the balance.
    pub async fn adjust_balance<'e, E>(executor: E, id: i64, delta: i64) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE users SET credit_balance = credit_balance + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(executor)
            .await?;
        Ok(())
    }
}
