pub mod articles;
pub mod card_categories;
pub mod cards;
pub mod users;

use axum::Router;
use db::DBService;

pub fn router() -> Router<DBService> {
    Router::new()
        .merge(cards::router())
        .merge(card_categories::router())
        .merge(articles::router())
        .merge(users::router())
}
