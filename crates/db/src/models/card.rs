use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::card_category::DONE_CATEGORY_ID;

/// Priority quadrant of a card, stored as 1-4 in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize, TS, EnumString, Display,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardPriority {
    UrgentImportant = 1,
    ImportantNotUrgent = 2,
    UrgentNotImportant = 3,
    NeitherUrgentNorImportant = 4,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Card {
    pub id: i64,
    pub headline: String,
    pub priority: CardPriority,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Start of the currently open work session, if any.
    pub begin_time: Option<DateTime<Utc>>,
    /// End of the most recent work session.
    pub end_time: Option<DateTime<Utc>>,
    /// Cumulative seconds worked across all sessions.
    pub used_seconds: i64,
    /// Set once the card has been moved to the done category.
    pub done_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCard {
    pub headline: String,
    pub priority: Option<CardPriority>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateCard {
    pub headline: Option<String>,
    pub priority: Option<CardPriority>,
    pub category_id: Option<i64>,
    pub begin_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub used_seconds: Option<i64>,
}

impl Card {
    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    /// Whether the card has an open work session.
    pub fn is_started(&self) -> bool {
        self.begin_time.is_some()
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All cards across all categories, undone and done alike.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>("SELECT * FROM cards ORDER BY updated_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_undone(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            "SELECT * FROM cards WHERE done_at IS NULL ORDER BY updated_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_done(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            "SELECT * FROM cards WHERE done_at IS NOT NULL ORDER BY done_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateCard) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let priority = data.priority.unwrap_or(CardPriority::NeitherUrgentNorImportant);
        let category_id = data.category_id.unwrap_or(super::card_category::DEFAULT_CATEGORY_ID);
        sqlx::query_as::<_, Card>(
            r#"INSERT INTO cards (headline, priority, category_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $4)
               RETURNING *"#,
        )
        .bind(&data.headline)
        .bind(priority)
        .bind(category_id)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        headline: String,
        priority: CardPriority,
        category_id: i64,
        begin_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        used_seconds: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            r#"UPDATE cards
               SET headline = $2, priority = $3, category_id = $4,
                   begin_time = $5, end_time = $6, used_seconds = $7, updated_at = $8
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(headline)
        .bind(priority)
        .bind(category_id)
        .bind(begin_time)
        .bind(end_time)
        .bind(used_seconds)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Open a work session on the card. A second begin while a session is
    /// already open leaves the row untouched, `updated_at` included.
    pub async fn set_begin_time(
        pool: &SqlitePool,
        id: i64,
        begin_time: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Card>(
            r#"UPDATE cards
               SET begin_time = COALESCE(begin_time, $2),
                   updated_at = CASE WHEN begin_time IS NULL THEN $2 ELSE updated_at END
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(begin_time)
        .fetch_one(pool)
        .await
    }

    /// Close the open session, overwriting the cumulative seconds total.
    pub async fn close_session<'e, E>(
        executor: E,
        id: i64,
        used_seconds: i64,
        end_time: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Card>(
            r#"UPDATE cards
               SET begin_time = NULL, end_time = $3, used_seconds = $2, updated_at = $3
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(used_seconds)
        .bind(end_time)
        .fetch_one(executor)
        .await
    }

    /// Insert a completed copy of the card into the done category.
    pub async fn create_done_copy<'e, E>(
        executor: E,
        headline: &str,
        priority: CardPriority,
        used_seconds: i64,
        done_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Card>(
            r#"INSERT INTO cards (headline, priority, category_id, created_at, updated_at, used_seconds, done_at)
               VALUES ($1, $2, $3, $4, $4, $5, $4)
               RETURNING *"#,
        )
        .bind(headline)
        .bind(priority)
        .bind(DONE_CATEGORY_ID)
        .bind(done_at)
        .bind(used_seconds)
        .fetch_one(executor)
        .await
    }

    pub async fn reset_used_seconds<'e, E>(executor: E, id: i64) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE cards SET used_seconds = 0, end_time = NULL WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Reassign every card in one category to another.
    pub async fn move_category<'e, E>(
        executor: E,
        from_category_id: i64,
        to_category_id: i64,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE cards SET category_id = $2 WHERE category_id = $1")
            .bind(from_category_id)
            .bind(to_category_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
