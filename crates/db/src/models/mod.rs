pub mod article;
pub mod card;
pub mod card_category;
pub mod credit;
pub mod user;
