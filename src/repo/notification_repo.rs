use crate::db::DbPool;
use crate::models::Notification;
use crate::schema::notifications;
use chrono::Utc;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug};

use super::RepoError;

/// Stores a notification for later listing
#[instrument(skip(pool, notification), fields(user_id = %notification.get_user_id(), kind = %notification.get_kind()))]
pub fn create_notification(pool: &DbPool, notification: &Notification) -> Result<Notification> {
    let conn = &mut pool.get()?;

    diesel::insert_into(notifications::table)
        .values(notification)
        .execute(conn)?;

    debug!("Stored notification {}", notification.get_id());
    Ok(notification.clone())
}

/// Lists a user's notifications, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The recipient
/// * `unread_only` - Skip notifications that were already read
#[instrument(skip(pool))]
pub fn list_notifications(pool: &DbPool, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
    let conn = &mut pool.get()?;

    let mut query = notifications::table
        .filter(notifications::user_id.eq(user_id.to_string()))
        .into_boxed();
    if unread_only {
        query = query.filter(notifications::read_at.is_null());
    }

    let result = query
        .order(notifications::created_at.desc())
        .load::<Notification>(conn)?;

    debug!("Retrieved {} notifications", result.len());
    Ok(result)
}

/// Marks one of the user's notifications as read
///
/// Marking an already read notification keeps the original read time.
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the notification does not exist or
/// belongs to someone else
#[instrument(skip(pool))]
pub fn mark_notification_read(pool: &DbPool, notification_id: &str, user_id: &str) -> Result<Notification> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let owned = notifications::table
        .filter(notifications::id.eq(notification_id))
        .filter(notifications::user_id.eq(user_id));

    diesel::update(owned.clone().filter(notifications::read_at.is_null()))
        .set(notifications::read_at.eq(Some(now)))
        .execute(conn)?;

    let notification = owned
        .first::<Notification>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("notification"))?;

    Ok(notification)
}
