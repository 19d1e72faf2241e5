use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::{instrument, debug, warn};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::dto::NotificationQueryDto;
use crate::errors::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::Notification;
use crate::notifications::Notifier;
use crate::repo;

/// The caller's own notifications out of the shared broadcast channel
fn own_notifications(
    receiver: broadcast::Receiver<Notification>,
    user_id: String,
) -> impl Stream<Item = Notification> {
    BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(notification) if notification.get_user_id() == user_id => Some(notification),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Notification stream for {} skipped {} messages", user_id, skipped);
            None
        }
    })
}

/// Handler for the caller's stored notifications, newest first
///
/// This function handles GET requests to `/api/notifications`; pass
/// `unread_only=true` to hide read ones.
#[instrument(skip(pool, auth))]
pub async fn list_notifications_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Query(query): Query<NotificationQueryDto>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = repo::list_notifications(&pool, &auth.user.get_id(), query.unread_only)?;
    debug!("Listed {} notifications", notifications.len());
    Ok(Json(notifications))
}

/// Handler for marking a notification read
///
/// This function handles POST requests to `/api/notifications/{id}/read`.
/// Other users' notifications are reported as missing.
#[instrument(skip(pool, auth), fields(notification_id = %id))]
pub async fn mark_notification_read_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let notification = repo::mark_notification_read(&pool, &id, &auth.user.get_id())?;
    Ok(Json(notification))
}

/// Handler for the live notification stream
///
/// This function handles GET requests to `/api/notifications/stream`. Each
/// new notification for the caller is sent as a `notification` event with
/// the notification as JSON. Browsers authenticate with the access token
/// cookie since `EventSource` cannot set headers.
#[instrument(skip(notifier, auth), fields(user_id = %auth.user.get_id()))]
pub async fn notification_stream_handler(
    State(notifier): State<Notifier>,
    auth: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Opening notification stream");

    let events = own_notifications(notifier.subscribe(), auth.user.get_id()).filter_map(|notification| {
        match Event::default().event("notification").json_data(&notification) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!("Failed to encode notification {}: {}", notification.get_id(), e);
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
