//! Pure triage of cards into time and priority views.
//!
//! Everything here operates on already-loaded card lists; no queries, no side
//! effects. Callers load cards through the models and pass them in.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use db::models::{
    card::{Card, CardPriority},
    card_category::{CardCategory, DEFAULT_CATEGORY_ID},
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Non-negative whole days elapsed between `timestamp` and `now`.
///
/// Absent timestamps and future-dated timestamps both count as 0 days: a
/// future-dated touch reads as "today", never as a negative age.
pub fn days_since(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match timestamp {
        Some(ts) => (now - ts).num_days().max(0),
        None => 0,
    }
}

/// Elapsed-time bucket, by days since the card was last touched.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeBucket {
    Day,
    Week,
    Month,
    Year,
    Decade,
}

impl TimeBucket {
    /// Bucket for an elapsed-day count. Upper bounds are inclusive.
    pub fn for_days(days: i64) -> Self {
        match days {
            d if d <= 1 => TimeBucket::Day,
            d if d <= 7 => TimeBucket::Week,
            d if d <= 30 => TimeBucket::Month,
            d if d <= 365 => TimeBucket::Year,
            _ => TimeBucket::Decade,
        }
    }
}

/// Undone cards partitioned by time since last touch. Each card appears in
/// exactly one bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct TimeBuckets {
    pub day: Vec<Card>,
    pub week: Vec<Card>,
    pub month: Vec<Card>,
    pub year: Vec<Card>,
    pub decade: Vec<Card>,
}

/// Undone cards partitioned by priority quadrant. `started` is additive: it
/// repeats every card with an open session, whatever its quadrant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PriorityBuckets {
    pub urgent_important: Vec<Card>,
    pub important_not_urgent: Vec<Card>,
    pub urgent_not_important: Vec<Card>,
    pub neither_urgent_nor_important: Vec<Card>,
    pub started: Vec<Card>,
}

pub fn classify_by_time(cards: &[Card], now: DateTime<Utc>) -> TimeBuckets {
    let mut buckets = TimeBuckets::default();
    for card in cards.iter().filter(|c| !c.is_done()) {
        let bucket = TimeBucket::for_days(days_since(Some(card.updated_at), now));
        let target = match bucket {
            TimeBucket::Day => &mut buckets.day,
            TimeBucket::Week => &mut buckets.week,
            TimeBucket::Month => &mut buckets.month,
            TimeBucket::Year => &mut buckets.year,
            TimeBucket::Decade => &mut buckets.decade,
        };
        target.push(card.clone());
    }
    buckets
}

pub fn classify_by_priority(cards: &[Card]) -> PriorityBuckets {
    let mut buckets = PriorityBuckets::default();
    for card in cards.iter().filter(|c| !c.is_done()) {
        let target = match card.priority {
            CardPriority::UrgentImportant => &mut buckets.urgent_important,
            CardPriority::ImportantNotUrgent => &mut buckets.important_not_urgent,
            CardPriority::UrgentNotImportant => &mut buckets.urgent_not_important,
            CardPriority::NeitherUrgentNorImportant => &mut buckets.neither_urgent_nor_important,
        };
        target.push(card.clone());
        if card.is_started() {
            buckets.started.push(card.clone());
        }
    }
    buckets
}

/// The nine selectable buckets a category name can refer to.
///
/// Category names are free text; the localized labels below are the only
/// strings given bucket meaning, and only here at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketKind {
    Day,
    Week,
    Month,
    Year,
    Decade,
    UrgentImportant,
    ImportantNotUrgent,
    UrgentNotImportant,
    NeitherUrgentNorImportant,
}

impl BucketKind {
    /// Map a category's display name to a bucket, if it names one.
    pub fn from_category_name(name: &str) -> Option<Self> {
        match name {
            "日清单" => Some(BucketKind::Day),
            "周清单" => Some(BucketKind::Week),
            "月清单" => Some(BucketKind::Month),
            "年清单" => Some(BucketKind::Year),
            "十年清单" => Some(BucketKind::Decade),
            "重要紧急" => Some(BucketKind::UrgentImportant),
            "重要不紧急" => Some(BucketKind::ImportantNotUrgent),
            "紧急不重要" => Some(BucketKind::UrgentNotImportant),
            "不重要不紧急" => Some(BucketKind::NeitherUrgentNorImportant),
            _ => name.parse().ok(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BucketKind::Day => "日清单",
            BucketKind::Week => "周清单",
            BucketKind::Month => "月清单",
            BucketKind::Year => "年清单",
            BucketKind::Decade => "十年清单",
            BucketKind::UrgentImportant => "重要紧急",
            BucketKind::ImportantNotUrgent => "重要不紧急",
            BucketKind::UrgentNotImportant => "紧急不重要",
            BucketKind::NeitherUrgentNorImportant => "不重要不紧急",
        }
    }
}

/// Cards to display for a category.
///
/// The default category shows the union of the two highest-priority quadrants
/// whenever that union is non-empty. Otherwise a category whose name matches
/// a bucket shows that bucket, and any other category shows its own undone
/// cards.
pub fn select_view_for_category(
    category: &CardCategory,
    cards: &[Card],
    now: DateTime<Utc>,
) -> Vec<Card> {
    if category.id == DEFAULT_CATEGORY_ID {
        let priority = classify_by_priority(cards);
        let mut urgent: Vec<Card> = priority.urgent_important;
        urgent.extend(priority.important_not_urgent);
        if !urgent.is_empty() {
            return urgent;
        }
    }

    match BucketKind::from_category_name(&category.name) {
        Some(kind) => match kind {
            BucketKind::Day => classify_by_time(cards, now).day,
            BucketKind::Week => classify_by_time(cards, now).week,
            BucketKind::Month => classify_by_time(cards, now).month,
            BucketKind::Year => classify_by_time(cards, now).year,
            BucketKind::Decade => classify_by_time(cards, now).decade,
            BucketKind::UrgentImportant => classify_by_priority(cards).urgent_important,
            BucketKind::ImportantNotUrgent => classify_by_priority(cards).important_not_urgent,
            BucketKind::UrgentNotImportant => classify_by_priority(cards).urgent_not_important,
            BucketKind::NeitherUrgentNorImportant => {
                classify_by_priority(cards).neither_urgent_nor_important
            }
        },
        None => cards
            .iter()
            .filter(|c| !c.is_done() && c.category_id == category.id)
            .cloned()
            .collect(),
    }
}

/// Group completed cards by the year and month of `done_at`, keyed as a
/// six-digit integer (e.g. 202401). Cards without `done_at` are skipped.
/// Iterate the map in reverse for most-recent-first pagination.
pub fn group_done_by_month(cards: &[Card]) -> BTreeMap<i32, Vec<Card>> {
    let mut months: BTreeMap<i32, Vec<Card>> = BTreeMap::new();
    for card in cards {
        if let Some(done_at) = card.done_at {
            let key = done_at.year() * 100 + done_at.month() as i32;
            months.entry(key).or_default().push(card.clone());
        }
    }
    months
}
