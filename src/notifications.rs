/// Live notifications
///
/// Every notification is stored first, then fanned out over a broadcast
/// channel. Stream subscribers filter the channel down to their own user.
/// Delivery problems are logged and never fail the request that caused
/// them.
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::db::DbPool;
use crate::models::{Booking, Notification, NotificationKind, Role};
use crate::repo::{self, UserFilter};

/// Capacity of the broadcast buffer; slow subscribers skip older messages
pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Notifier {
    pool: Arc<DbPool>,
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(pool: Arc<DbPool>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { pool, sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Stores and broadcasts a notification for one user
    ///
    /// ### Returns
    ///
    /// The stored notification, or `None` if it could not be saved
    pub fn notify(
        &self,
        user_id: String,
        kind: NotificationKind,
        message: String,
        booking_id: Option<String>,
    ) -> Option<Notification> {
        let notification = Notification::new(user_id, kind, message, booking_id);

        if let Err(e) = repo::create_notification(&self.pool, &notification) {
            warn!("Failed to store notification: {:#}", e);
            return None;
        }

        // no receivers is not an error
        let receivers = self.sender.send(notification.clone()).unwrap_or(0);
        debug!("Notification {} sent to {} subscribers", notification.get_id(), receivers);
        Some(notification)
    }

    /// Tells the provider's staff about a new booking
    pub fn booking_created(&self, booking: &Booking) {
        let filter = UserFilter {
            role: Some(Role::ServiceProvider),
            service_provider_id: Some(booking.get_service_provider_id()),
            active_only: true,
            ..Default::default()
        };
        let staff = match repo::list_users(&self.pool, &filter) {
            Ok(staff) => staff,
            Err(e) => {
                warn!("Failed to look up provider staff: {:#}", e);
                return;
            }
        };

        let message = format!(
            "New booking: {} x{} on {}",
            booking.get_service_name(),
            booking.get_quantity(),
            booking.get_scheduled_for().format("%Y-%m-%d %H:%M")
        );
        for user in staff {
            self.notify(user.get_id(), NotificationKind::BookingCreated, message.clone(), Some(booking.get_id()));
        }
    }

    /// Tells the guest their booking changed status
    pub fn booking_status_changed(&self, booking: &Booking) {
        self.notify(
            booking.get_guest_id(),
            NotificationKind::BookingStatusChanged,
            format!("Your {} booking is now {}", booking.get_service_name(), booking.get_status()),
            Some(booking.get_id()),
        );
    }

    /// Tells the guest their payment status changed
    pub fn payment_updated(&self, booking: &Booking) {
        self.notify(
            booking.get_guest_id(),
            NotificationKind::PaymentUpdated,
            format!("Payment for your {} booking is {}", booking.get_service_name(), booking.get_payment_status()),
            Some(booking.get_id()),
        );
    }
}
