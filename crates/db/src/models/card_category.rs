use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;

/// Category every new card lands in.
pub const DEFAULT_CATEGORY_ID: i64 = 1;
/// Category holding completed cards.
pub const DONE_CATEGORY_ID: i64 = 2;

/// A named bucket owning zero or more cards. Ids 1 and 2 are reserved.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CardCategory {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCardCategory {
    pub name: String,
}

impl CardCategory {
    pub fn is_protected(id: i64) -> bool {
        id == DEFAULT_CATEGORY_ID || id == DONE_CATEGORY_ID
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CardCategory>("SELECT * FROM card_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CardCategory>("SELECT * FROM card_categories ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CardCategory>(
            r#"INSERT INTO card_categories (name, created_at, updated_at)
               VALUES ($1, $2, $2)
               RETURNING *"#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn rename(pool: &SqlitePool, id: i64, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CardCategory>(
            r#"UPDATE card_categories
               SET name = $2, updated_at = $3
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM card_categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
