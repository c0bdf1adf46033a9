//! Reviewer Core - domain model and use cases for the PR reviewer service
//!
//! This crate holds the pull request / team / user model, the repository
//! contracts that storage backends implement, and the use cases that assign
//! and reassign reviewers on top of them.

pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod usecase;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use models::{PrStatus, PullRequest, PullRequestShort, StatusCounts, Team, User};
pub use repo::{memory::MemoryStore, PrRepo, TeamRepo, UserRepo};
pub use usecase::{PrUsecase, TeamUsecase, UserUsecase};
