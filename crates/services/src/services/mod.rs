pub mod card;
pub mod paywall;
pub mod triage;
