//! Card lifecycle operations: work sessions, completion, category CRUD.

use chrono::{DateTime, Utc};
use db::models::{
    card::{Card, CreateCard, UpdateCard},
    card_category::{CardCategory, DEFAULT_CATEGORY_ID, DONE_CATEGORY_ID},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::triage::{self, BucketKind, PriorityBuckets, TimeBuckets};

/// Literal marker in a headline that makes a card recurring: completing it
/// spins off a done copy and keeps the original for the next round.
pub const REPEAT_MARKER: &str = "重复";

#[derive(Debug, Error)]
pub enum CardServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("card {0} not found")]
    CardNotFound(i64),
    #[error("card category {0} not found")]
    CategoryNotFound(i64),
    #[error("card category {0} is reserved and cannot be changed")]
    ProtectedCategory(i64),
    #[error("used_seconds must be non-negative, got {0}")]
    NegativeUsedSeconds(i64),
}

/// Display list for one category, with the time or priority bucket the
/// category name resolves to, if any.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CategoryView {
    pub category: CardCategory,
    pub bucket: Option<BucketKind>,
    pub cards: Vec<Card>,
}

/// Completed cards for one month, keyed `yyyymm`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DoneMonth {
    pub month: i32,
    pub cards: Vec<Card>,
}

pub struct CardService;

impl CardService {
    pub async fn create_card(
        pool: &SqlitePool,
        data: &CreateCard,
    ) -> Result<Card, CardServiceError> {
        if let Some(category_id) = data.category_id {
            Self::require_category(pool, category_id).await?;
        }
        let card = Card::create(pool, data).await?;
        info!(card_id = card.id, category_id = card.category_id, "card created");
        Ok(card)
    }

    pub async fn update_card(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateCard,
    ) -> Result<Card, CardServiceError> {
        let existing = Self::require_card(pool, id).await?;
        if let Some(category_id) = data.category_id {
            Self::require_category(pool, category_id).await?;
        }
        if let Some(used_seconds) = data.used_seconds {
            if used_seconds < 0 {
                return Err(CardServiceError::NegativeUsedSeconds(used_seconds));
            }
        }
        let headline = data.headline.clone().unwrap_or(existing.headline);
        let priority = data.priority.unwrap_or(existing.priority);
        let category_id = data.category_id.unwrap_or(existing.category_id);
        let begin_time = data.begin_time.or(existing.begin_time);
        let end_time = data.end_time.or(existing.end_time);
        let used_seconds = data.used_seconds.unwrap_or(existing.used_seconds);
        Ok(Card::update(
            pool,
            id,
            headline,
            priority,
            category_id,
            begin_time,
            end_time,
            used_seconds,
        )
        .await?)
    }

    pub async fn delete_card(pool: &SqlitePool, id: i64) -> Result<(), CardServiceError> {
        if Card::delete(pool, id).await? == 0 {
            return Err(CardServiceError::CardNotFound(id));
        }
        Ok(())
    }

    /// Open a work session. A card with a session already open is left as-is.
    pub async fn begin_session(
        pool: &SqlitePool,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Card, CardServiceError> {
        Self::require_card(pool, id).await?;
        let card = Card::set_begin_time(pool, id, now).await?;
        info!(card_id = id, begin_time = %card.begin_time.unwrap_or(now), "session opened");
        Ok(card)
    }

    /// Close the open session, folding the elapsed time into `used_seconds`.
    ///
    /// A card without an open session accrues 0 seconds. A recurring card
    /// (headline contains the repeat marker) additionally spins off a done
    /// copy carrying the accumulated time, with the marker stripped from the
    /// title, and starts the original's counter over.
    pub async fn end_session(
        pool: &SqlitePool,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Card, CardServiceError> {
        let card = Self::require_card(pool, id).await?;
        let elapsed = card
            .begin_time
            .map(|begin| (now - begin).num_seconds().max(0))
            .unwrap_or(0);
        let total = card.used_seconds + elapsed;
        let recurring = card.headline.contains(REPEAT_MARKER);

        let mut tx = pool.begin().await?;
        if recurring {
            let done_headline = card.headline.replace(REPEAT_MARKER, "");
            let done =
                Card::create_done_copy(&mut *tx, &done_headline, card.priority, total, now).await?;
            info!(
                card_id = id,
                done_card_id = done.id,
                used_seconds = total,
                "recurring session closed, done copy created"
            );
        }
        // A recurring card starts its counter over; the copy keeps the total.
        let remaining = if recurring { 0 } else { total };
        let updated = Card::close_session(&mut *tx, id, remaining, now).await?;
        tx.commit().await?;

        info!(card_id = id, used_seconds = updated.used_seconds, "session closed");
        Ok(updated)
    }

    /// Move a card to the done category by creating a completed copy.
    ///
    /// The original is deleted, unless it is recurring, in which case it
    /// stays active (marker intact) and only the stripped-title copy is done.
    pub async fn complete_card(
        pool: &SqlitePool,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Card, CardServiceError> {
        let card = Self::require_card(pool, id).await?;
        let recurring = card.headline.contains(REPEAT_MARKER);
        let done_headline = card.headline.replace(REPEAT_MARKER, "");

        let mut tx = pool.begin().await?;
        let done = Card::create_done_copy(
            &mut *tx,
            &done_headline,
            card.priority,
            card.used_seconds,
            now,
        )
        .await?;
        if recurring {
            Card::reset_used_seconds(&mut *tx, id).await?;
        } else {
            Card::delete(&mut *tx, id).await?;
        }
        tx.commit().await?;

        info!(
            card_id = id,
            done_card_id = done.id,
            recurring,
            "card completed"
        );
        Ok(done)
    }

    /// Completed cards grouped by month, most recent month first.
    pub async fn done_history(pool: &SqlitePool) -> Result<Vec<DoneMonth>, CardServiceError> {
        let done = Card::find_done(pool).await?;
        let months = triage::group_done_by_month(&done);
        Ok(months
            .into_iter()
            .rev()
            .map(|(month, cards)| DoneMonth { month, cards })
            .collect())
    }

    pub async fn time_view(
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> Result<TimeBuckets, CardServiceError> {
        let cards = Card::find_undone(pool).await?;
        Ok(triage::classify_by_time(&cards, now))
    }

    pub async fn priority_view(pool: &SqlitePool) -> Result<PriorityBuckets, CardServiceError> {
        let cards = Card::find_undone(pool).await?;
        Ok(triage::classify_by_priority(&cards))
    }

    /// Display list for one category, per the triage selection rules.
    /// The done category shows the completed cards instead, newest first.
    pub async fn view_for_category(
        pool: &SqlitePool,
        category_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CategoryView, CardServiceError> {
        let category = Self::require_category(pool, category_id).await?;
        let bucket = BucketKind::from_category_name(&category.name);
        let cards = if category.id == DONE_CATEGORY_ID {
            Card::find_done(pool).await?
        } else {
            let undone = Card::find_undone(pool).await?;
            triage::select_view_for_category(&category, &undone, now)
        };
        Ok(CategoryView {
            category,
            bucket,
            cards,
        })
    }

    pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CardCategory>, CardServiceError> {
        Ok(CardCategory::find_all(pool).await?)
    }

    pub async fn create_category(
        pool: &SqlitePool,
        name: &str,
    ) -> Result<CardCategory, CardServiceError> {
        let category = CardCategory::create(pool, name).await?;
        info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn rename_category(
        pool: &SqlitePool,
        id: i64,
        name: &str,
    ) -> Result<CardCategory, CardServiceError> {
        if CardCategory::is_protected(id) {
            return Err(CardServiceError::ProtectedCategory(id));
        }
        Self::require_category(pool, id).await?;
        Ok(CardCategory::rename(pool, id, name).await?)
    }

    /// Delete a category, moving its cards into the default category.
    pub async fn delete_category(pool: &SqlitePool, id: i64) -> Result<(), CardServiceError> {
        if CardCategory::is_protected(id) {
            return Err(CardServiceError::ProtectedCategory(id));
        }
        Self::require_category(pool, id).await?;

        let mut tx = pool.begin().await?;
        let moved = Card::move_category(&mut *tx, id, DEFAULT_CATEGORY_ID).await?;
        CardCategory::delete(&mut *tx, id).await?;
        tx.commit().await?;

        info!(category_id = id, moved_cards = moved, "category deleted");
        Ok(())
    }

    async fn require_card(pool: &SqlitePool, id: i64) -> Result<Card, CardServiceError> {
        Card::find_by_id(pool, id)
            .await?
            .ok_or(CardServiceError::CardNotFound(id))
    }

    async fn require_category(pool: &SqlitePool, id: i64) -> Result<CardCategory, CardServiceError> {
        CardCategory::find_by_id(pool, id)
            .await?
            .ok_or(CardServiceError::CategoryNotFound(id))
    }
}
