/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// checking the caller's role and tenancy, calling the appropriate repository
/// functions, and returning a properly formatted response.
///
/// Handlers are grouped by the audience they serve.

mod public_handlers;
mod auth_handlers;
mod superadmin_handlers;
mod hotel_handlers;
mod provider_handlers;
mod guest_handlers;
mod payment_handlers;
mod notification_handlers;

// Re-export all handlers
pub use public_handlers::*;
pub use auth_handlers::*;
pub use superadmin_handlers::*;
pub use hotel_handlers::*;
pub use provider_handlers::*;
pub use guest_handlers::*;
pub use payment_handlers::*;
pub use notification_handlers::*;
