//! Use cases sitting between the HTTP layer and the repositories

pub mod pr;
pub mod team;
pub mod user;

pub use pr::{PrUsecase, MAX_REVIEWERS, REASSIGN_CANDIDATE_POOL};
pub use team::TeamUsecase;
pub use user::UserUsecase;
