//! Credit-gated access to paid article content.
//!
//! Unpaid viewers see the article up to the end of the first paragraph
//! closing tag inside the first half of the content; unlocking the rest
//! deducts the article's credit cost once per user, recorded in the ledger.

use db::models::{
    article::Article,
    credit::{CreditEntry, CreditSource},
    user::User,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

const PARAGRAPH_CLOSE: &str = "</p>";

#[derive(Debug, Error)]
pub enum PaywallError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("article {0} not found")]
    ArticleNotFound(i64),
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error("insufficient credit: need {required}, balance is {balance}")]
    InsufficientCredit { required: i64, balance: i64 },
    #[error("cutoff position {0} is not a valid content boundary")]
    InvalidCutoff(usize),
    #[error("credit grant must be positive, got {0}")]
    InvalidGrantAmount(i64),
}

/// What a viewer may see of an article.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ArticleView {
    pub article_id: i64,
    pub title: String,
    /// Full or truncated content, depending on payment state.
    pub content: String,
    /// Byte offset where the preview was cut; `None` when the full content
    /// is visible.
    pub cut_at: Option<usize>,
    pub credit: i64,
    pub paid: bool,
}

/// Result of unlocking the rest of an article.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UnlockedContent {
    pub article_id: i64,
    /// Content from the cutoff onward.
    pub remainder: String,
    /// Credits deducted by this call; 0 when the article was free or
    /// already paid for.
    pub charged: i64,
    pub balance: i64,
}

/// Result of topping up a user's balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GrantedCredit {
    pub user_id: i64,
    pub amount: i64,
    pub balance: i64,
}

pub struct PaywallService;

impl PaywallService {
    /// Whether a spend ledger entry already exists for this user/article pair.
    pub async fn has_paid(
        pool: &SqlitePool,
        user_id: i64,
        article_id: i64,
    ) -> Result<bool, PaywallError> {
        Ok(CreditEntry::exists_for_article(pool, user_id, article_id).await?)
    }

    /// The viewer-appropriate rendering of an article. An anonymous viewer
    /// counts as unpaid.
    pub async fn view(
        pool: &SqlitePool,
        viewer_id: Option<i64>,
        article_id: i64,
    ) -> Result<ArticleView, PaywallError> {
        let article = Self::require_article(pool, article_id).await?;
        let paid = match viewer_id {
            Some(user_id) => Self::has_paid(pool, user_id, article_id).await?,
            None => false,
        };
        let (content, cut_at) = visible_content(&article, paid);
        Ok(ArticleView {
            article_id: article.id,
            title: article.title,
            content,
            cut_at,
            credit: article.credit,
            paid,
        })
    }

    /// Return the content past the cutoff, charging the viewer on first
    /// unlock. The ledger check makes the charge idempotent; the deduction
    /// and the ledger row commit in one transaction.
    pub async fn unlock_remainder(
        pool: &SqlitePool,
        user_id: i64,
        article_id: i64,
        cut_at: Option<usize>,
    ) -> Result<UnlockedContent, PaywallError> {
        let article = Self::require_article(pool, article_id).await?;
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(PaywallError::UserNotFound(user_id))?;

        let cut = match cut_at {
            Some(pos) => {
                if pos > article.content.len() || !article.content.is_char_boundary(pos) {
                    return Err(PaywallError::InvalidCutoff(pos));
                }
                pos
            }
            None => preview_cut(&article.content),
        };
        let remainder = article.content[cut..].to_string();

        if article.is_free() || Self::has_paid(pool, user_id, article_id).await? {
            return Ok(UnlockedContent {
                article_id,
                remainder,
                charged: 0,
                balance: user.credit_balance,
            });
        }

        if user.credit_balance < article.credit {
            return Err(PaywallError::InsufficientCredit {
                required: article.credit,
                balance: user.credit_balance,
            });
        }

        let mut tx = pool.begin().await?;
        User::adjust_balance(&mut *tx, user_id, -article.credit).await?;
        CreditEntry::create(
            &mut *tx,
            user_id,
            Some(article_id),
            -article.credit,
            CreditSource::ReadArticle,
        )
        .await?;
        tx.commit().await?;

        info!(
            user_id,
            article_id,
            charged = article.credit,
            "article unlocked"
        );

        Ok(UnlockedContent {
            article_id,
            remainder,
            charged: article.credit,
            balance: user.credit_balance - article.credit,
        })
    }

    /// Top up a user's balance, recording the grant in the ledger.
    pub async fn grant_credit(
        pool: &SqlitePool,
        user_id: i64,
        amount: i64,
    ) -> Result<GrantedCredit, PaywallError> {
        if amount <= 0 {
            return Err(PaywallError::InvalidGrantAmount(amount));
        }
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(PaywallError::UserNotFound(user_id))?;

        let mut tx = pool.begin().await?;
        User::adjust_balance(&mut *tx, user_id, amount).await?;
        CreditEntry::create(&mut *tx, user_id, None, amount, CreditSource::Adjustment).await?;
        tx.commit().await?;

        info!(user_id, amount, "credit granted");
        Ok(GrantedCredit {
            user_id,
            amount,
            balance: user.credit_balance + amount,
        })
    }

    async fn require_article(pool: &SqlitePool, id: i64) -> Result<Article, PaywallError> {
        Article::find_by_id(pool, id)
            .await?
            .ok_or(PaywallError::ArticleNotFound(id))
    }
}

/// Content a viewer may see, with the cutoff offset when truncated.
pub fn visible_content(article: &Article, paid: bool) -> (String, Option<usize>) {
    if article.is_free() || paid {
        return (article.content.clone(), None);
    }
    let cut = preview_cut(&article.content);
    (article.content[..cut].to_string(), Some(cut))
}

/// Byte offset of the preview cutoff: the end of the last `</p>` inside the
/// first half of the content, or the half-way boundary when no paragraph
/// closes there.
fn preview_cut(content: &str) -> usize {
    let half = floor_char_boundary(content, content.len() / 2);
    match content[..half].rfind(PARAGRAPH_CLOSE) {
        Some(idx) => idx + PARAGRAPH_CLOSE.len(),
        None => half,
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    (0..=index.min(s.len()))
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn article(content: &str, credit: i64) -> Article {
        Article {
            id: 1,
            title: "测试文章".to_string(),
            content: content.to_string(),
            credit,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_free_article_is_never_truncated() {
        let a = article("<p>一</p><p>二</p>", 0);
        let (content, cut) = visible_content(&a, false);
        assert_eq!(content, a.content);
        assert_eq!(cut, None);
    }

    #[test]
    fn test_paid_viewer_sees_full_content() {
        let a = article("<p>一</p><p>二</p>", 10);
        let (content, cut) = visible_content(&a, true);
        assert_eq!(content, a.content);
        assert_eq!(cut, None);
    }

    #[test]
    fn test_unpaid_viewer_cut_at_paragraph_boundary() {
        let a = article("<p>aa</p><p>bb</p><p>cc</p><p>dd</p>", 10);
        let (content, cut) = visible_content(&a, false);
        let cut = cut.unwrap();
        assert!(content.ends_with(PARAGRAPH_CLOSE));
        assert_eq!(content, a.content[..cut]);
        // The cut sits inside the first half of the content.
        assert!(cut <= a.content.len() / 2);
    }

    #[test]
    fn test_cut_without_paragraph_falls_back_to_half() {
        let a = article("文字文字文字文字", 5);
        let (content, cut) = visible_content(&a, false);
        let cut = cut.unwrap();
        assert!(a.content.is_char_boundary(cut));
        assert_eq!(content, a.content[..cut]);
        assert!(!content.is_empty());
    }

    #[test]
    fn test_cut_is_char_boundary_safe_with_multibyte_text() {
        // Half of 9 bytes lands mid-character without the boundary guard.
        let a = article("十年十年十", 5);
        let (_, cut) = visible_content(&a, false);
        assert!(a.content.is_char_boundary(cut.unwrap()));
    }

    #[test]
    fn test_floor_char_boundary() {
        let s = "a中b";
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 4), 4);
        assert_eq!(floor_char_boundary(s, 100), s.len());
    }
}
