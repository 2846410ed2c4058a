//! End-to-end card lifecycle tests against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use db::{
    DBService,
    models::{
        card::{Card, CardPriority, CreateCard, UpdateCard},
        card_category::{CardCategory, DEFAULT_CATEGORY_ID, DONE_CATEGORY_ID},
    },
};
use services::services::{
    card::{CardService, CardServiceError},
    triage::BucketKind,
};

async fn setup() -> DBService {
    DBService::new_in_memory()
        .await
        .expect("in-memory database")
}

fn new_card(headline: &str) -> CreateCard {
    CreateCard {
        headline: headline.to_string(),
        priority: None,
        category_id: None,
    }
}

#[tokio::test]
async fn test_new_card_lands_in_default_category() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("整理书桌"))
        .await
        .unwrap();

    assert_eq!(card.category_id, DEFAULT_CATEGORY_ID);
    assert_eq!(card.priority, CardPriority::NeitherUrgentNorImportant);
    assert_eq!(card.used_seconds, 0);
    assert!(card.begin_time.is_none());
    assert!(card.done_at.is_none());
}

#[tokio::test]
async fn test_create_card_rejects_unknown_category() {
    let db = setup().await;
    let data = CreateCard {
        headline: "孤儿卡片".to_string(),
        priority: None,
        category_id: Some(99),
    };
    let err = CardService::create_card(&db.pool, &data).await.unwrap_err();
    assert!(matches!(err, CardServiceError::CategoryNotFound(99)));
}

#[tokio::test]
async fn test_begin_session_is_idempotent() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("写周报"))
        .await
        .unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let first = CardService::begin_session(&db.pool, card.id, t0).await.unwrap();
    let second = CardService::begin_session(&db.pool, card.id, t0 + Duration::days(10))
        .await
        .unwrap();

    // The open session keeps its original start, and the no-op begin leaves
    // the row alone so the card keeps its place in the time buckets.
    assert_eq!(first.begin_time, second.begin_time);
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_update_card_edits_session_fields() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("写周报"))
        .await
        .unwrap();

    let end = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    let updated = CardService::update_card(
        &db.pool,
        card.id,
        &UpdateCard {
            headline: None,
            priority: None,
            category_id: None,
            begin_time: None,
            end_time: Some(end),
            used_seconds: Some(300),
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.headline, "写周报");
    assert_eq!(updated.end_time, Some(end));
    assert_eq!(updated.used_seconds, 300);
}

#[tokio::test]
async fn test_update_card_rejects_negative_used_seconds() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("写周报"))
        .await
        .unwrap();

    let err = CardService::update_card(
        &db.pool,
        card.id,
        &UpdateCard {
            headline: None,
            priority: None,
            category_id: None,
            begin_time: None,
            end_time: None,
            used_seconds: Some(-30),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CardServiceError::NegativeUsedSeconds(-30)));
}

#[tokio::test]
async fn test_end_session_accumulates_used_seconds() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("写周报"))
        .await
        .unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    CardService::begin_session(&db.pool, card.id, t0).await.unwrap();
    let after_first = CardService::end_session(&db.pool, card.id, t0 + Duration::seconds(90))
        .await
        .unwrap();
    assert_eq!(after_first.used_seconds, 90);
    assert!(after_first.begin_time.is_none());
    assert!(after_first.end_time.is_some());

    // A second session adds on top without double counting.
    let t1 = t0 + Duration::hours(1);
    CardService::begin_session(&db.pool, card.id, t1).await.unwrap();
    let after_second = CardService::end_session(&db.pool, card.id, t1 + Duration::seconds(30))
        .await
        .unwrap();
    assert_eq!(after_second.used_seconds, 120);
}

#[tokio::test]
async fn test_end_session_without_open_session_adds_nothing() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("写周报"))
        .await
        .unwrap();

    let updated = CardService::end_session(&db.pool, card.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(updated.used_seconds, 0);
}

#[tokio::test]
async fn test_end_session_on_recurring_card_spins_off_done_copy() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("背单词（重复）"))
        .await
        .unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
    CardService::begin_session(&db.pool, card.id, t0).await.unwrap();
    let original = CardService::end_session(&db.pool, card.id, t0 + Duration::seconds(600))
        .await
        .unwrap();

    // The original stays active with its counter reset.
    assert!(original.done_at.is_none());
    assert_eq!(original.used_seconds, 0);
    assert_eq!(original.headline, "背单词（重复）");

    let done = Card::find_done(&db.pool).await.unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].headline, "背单词（）");
    assert_eq!(done[0].category_id, DONE_CATEGORY_ID);
    assert_eq!(done[0].used_seconds, 600);
    assert!(done[0].done_at.is_some());
}

#[tokio::test]
async fn test_complete_card_moves_copy_and_deletes_original() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("交房租"))
        .await
        .unwrap();

    let done = CardService::complete_card(&db.pool, card.id, Utc::now())
        .await
        .unwrap();

    assert_eq!(done.category_id, DONE_CATEGORY_ID);
    assert!(done.done_at.is_some());
    assert!(Card::find_by_id(&db.pool, card.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_complete_recurring_card_keeps_original_active() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("复习Python（重复）"))
        .await
        .unwrap();

    let done = CardService::complete_card(&db.pool, card.id, Utc::now())
        .await
        .unwrap();

    assert_eq!(done.headline, "复习Python（）");
    assert_eq!(done.category_id, DONE_CATEGORY_ID);
    assert!(done.done_at.is_some());

    let original = Card::find_by_id(&db.pool, card.id).await.unwrap().unwrap();
    assert_eq!(original.headline, "复习Python（重复）");
    assert!(original.done_at.is_none());
}

#[tokio::test]
async fn test_protected_categories_cannot_be_deleted() {
    let db = setup().await;
    for id in [DEFAULT_CATEGORY_ID, DONE_CATEGORY_ID] {
        let err = CardService::delete_category(&db.pool, id).await.unwrap_err();
        assert!(matches!(err, CardServiceError::ProtectedCategory(_)));
    }
}

#[tokio::test]
async fn test_protected_categories_cannot_be_renamed() {
    let db = setup().await;
    for id in [DEFAULT_CATEGORY_ID, DONE_CATEGORY_ID] {
        let err = CardService::rename_category(&db.pool, id, "改名")
            .await
            .unwrap_err();
        assert!(matches!(err, CardServiceError::ProtectedCategory(_)));
    }
}

#[tokio::test]
async fn test_delete_category_moves_cards_to_default() {
    let db = setup().await;
    let category = CardService::create_category(&db.pool, "读书").await.unwrap();
    let card = CardService::create_card(
        &db.pool,
        &CreateCard {
            headline: "读《呐喊》".to_string(),
            priority: None,
            category_id: Some(category.id),
        },
    )
    .await
    .unwrap();

    CardService::delete_category(&db.pool, category.id).await.unwrap();

    assert!(
        CardCategory::find_by_id(&db.pool, category.id)
            .await
            .unwrap()
            .is_none()
    );
    let moved = Card::find_by_id(&db.pool, card.id).await.unwrap().unwrap();
    assert_eq!(moved.category_id, DEFAULT_CATEGORY_ID);
}

#[tokio::test]
async fn test_view_for_default_category_prefers_urgent_quadrants() {
    let db = setup().await;
    CardService::create_card(
        &db.pool,
        &CreateCard {
            headline: "修线上bug".to_string(),
            priority: Some(CardPriority::UrgentImportant),
            category_id: None,
        },
    )
    .await
    .unwrap();
    CardService::create_card(&db.pool, &new_card("整理照片"))
        .await
        .unwrap();

    let view = CardService::view_for_category(&db.pool, DEFAULT_CATEGORY_ID, Utc::now())
        .await
        .unwrap();
    assert_eq!(view.cards.len(), 1);
    assert_eq!(view.cards[0].headline, "修线上bug");
}

#[tokio::test]
async fn test_view_for_bucket_named_category_resolves_bucket() {
    let db = setup().await;
    let category = CardService::create_category(&db.pool, "日清单").await.unwrap();
    CardService::create_card(&db.pool, &new_card("今日待办"))
        .await
        .unwrap();

    let view = CardService::view_for_category(&db.pool, category.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(view.bucket, Some(BucketKind::Day));
    assert_eq!(view.cards.len(), 1);
}

#[tokio::test]
async fn test_view_for_done_category_lists_completed_cards() {
    let db = setup().await;
    let card = CardService::create_card(&db.pool, &new_card("交房租"))
        .await
        .unwrap();
    CardService::complete_card(&db.pool, card.id, Utc::now())
        .await
        .unwrap();

    let view = CardService::view_for_category(&db.pool, DONE_CATEGORY_ID, Utc::now())
        .await
        .unwrap();
    assert_eq!(view.bucket, None);
    assert_eq!(view.cards.len(), 1);
    assert_eq!(view.cards[0].headline, "交房租");
    assert!(view.cards[0].done_at.is_some());
}

#[tokio::test]
async fn test_done_history_groups_by_month_most_recent_first() {
    let db = setup().await;
    let jan = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
    let mar = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();

    let a = CardService::create_card(&db.pool, &new_card("一月的事"))
        .await
        .unwrap();
    let b = CardService::create_card(&db.pool, &new_card("三月的事"))
        .await
        .unwrap();
    CardService::complete_card(&db.pool, a.id, jan).await.unwrap();
    CardService::complete_card(&db.pool, b.id, mar).await.unwrap();

    let history = CardService::done_history(&db.pool).await.unwrap();
    let months: Vec<i32> = history.iter().map(|m| m.month).collect();
    assert_eq!(months, vec![202603, 202601]);
    assert_eq!(history[0].cards.len(), 1);
    assert_eq!(history[1].cards.len(), 1);
}
