/// Repository module
///
/// This module provides the data access layer for the platform.
/// It contains functions for interacting with the database: creating,
/// retrieving and updating hotels, users, providers, services, bookings,
/// payments, refresh tokens and notifications.
///
/// Functions return `anyhow::Result`. Failures that carry meaning for the
/// caller (missing rows, conflicts, illegal status changes) are raised as a
/// [`RepoError`] inside the `anyhow::Error` so the web layer can map them.

use thiserror::Error;

mod hotel_repo;
mod user_repo;
mod provider_repo;
mod service_repo;
mod booking_repo;
mod token_repo;
mod payment_repo;
mod notification_repo;

// Re-export all repository functions
pub use hotel_repo::*;
pub use user_repo::*;
pub use provider_repo::*;
pub use service_repo::*;
pub use booking_repo::*;
pub use token_repo::*;
pub use payment_repo::*;
pub use notification_repo::*;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    Validation(String),
}
