/// Data models module
///
/// This module defines the core data structures used throughout the platform.
/// It includes database models that map to database tables, the enumerations
/// stored as text columns, and the constructors used to create fresh rows.

#[macro_use]
mod text_enum;
pub use text_enum::ParseEnumError;

mod role;
pub use role::Role;

mod hotel;
pub use hotel::Hotel;

mod user;
pub use user::{User, normalize_email};

mod service_provider;
pub use service_provider::ServiceProvider;

mod service;
pub use service::{Service, ServiceCategory};

mod booking;
pub use booking::{Actor, Booking, BookingStatus, PaymentStatus};

mod refresh_token;
pub use refresh_token::RefreshToken;

mod payment;
pub use payment::{Payment, PaymentMethod};

mod notification;
pub use notification::{Notification, NotificationKind};
