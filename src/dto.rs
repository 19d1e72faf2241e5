use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{CategoryRevenue, MonthlyRevenue, RatingSummary, RevenueSummary, ServiceStat, StatusBreakdown};
use crate::errors::ApiError;
use crate::models::{
    BookingStatus, Hotel, PaymentMethod, PaymentStatus, Role, Service, ServiceCategory, ServiceProvider, User,
};
use crate::pricing;

/// Shortest password accepted for any account
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Most units of a service a single booking may ask for
pub const MAX_BOOKING_QUANTITY: i32 = 100;

fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_email(field: &str, value: &str) -> Result<(), ApiError> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !value.contains(' ') => Ok(()),
        _ => Err(ApiError::Validation(format!("{} must be a valid email address", field))),
    }
}

fn require_password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Slugs end up in portal URLs: lowercase letters, digits and inner dashes
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Brand colours are `#rrggbb`
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Guest self-registration into a hotel
#[derive(Deserialize, Debug)]
pub struct RegisterGuestDto {
    pub hotel_slug: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub room_number: String,
    pub checkout_at: DateTime<Utc>,
}

impl RegisterGuestDto {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ApiError> {
        require_email("email", &self.email)?;
        require_password(&self.password)?;
        require_non_empty("full_name", &self.full_name)?;
        require_non_empty("room_number", &self.room_number)?;
        if self.checkout_at <= now {
            return Err(ApiError::Validation("checkout_at must be in the future".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshDto {
    pub refresh_token: String,
}

/// Logout body; browser clients relying on the cookie may omit it
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LogoutDto {
    pub refresh_token: Option<String>,
}

/// A freshly issued token pair
#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Superadmin
// ---------------------------------------------------------------------------

fn default_commission() -> f64 {
    10.0
}

/// A new hotel together with its first admin account
#[derive(Deserialize, Debug)]
pub struct CreateHotelDto {
    pub name: String,
    pub slug: String,
    pub address: String,
    pub contact_email: String,
    #[serde(default = "default_commission")]
    pub platform_commission_percentage: f64,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
}

impl CreateHotelDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("name", &self.name)?;
        if !is_valid_slug(&self.slug) {
            return Err(ApiError::Validation(
                "slug may only contain lowercase letters, digits and dashes".to_string(),
            ));
        }
        require_email("contact_email", &self.contact_email)?;
        pricing::validate_percentage("platform_commission_percentage", self.platform_commission_percentage)?;
        require_email("admin_email", &self.admin_email)?;
        require_password(&self.admin_password)?;
        require_non_empty("admin_name", &self.admin_name)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreatedHotelResponse {
    pub hotel: Hotel,
    pub admin: User,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateHotelSettingsDto {
    pub is_active: Option<bool>,
    pub platform_commission_percentage: Option<f64>,
}

impl UpdateHotelSettingsDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(commission) = self.platform_commission_percentage {
            pricing::validate_percentage("platform_commission_percentage", commission)?;
        }
        Ok(())
    }
}

/// Filters for the superadmin's user list
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct UserQueryDto {
    pub role: Option<Role>,
    pub hotel_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PlatformDashboard {
    pub hotels_total: i64,
    pub hotels_active: i64,
    pub users_by_role: BTreeMap<String, i64>,
    pub bookings: StatusBreakdown,
    pub revenue: RevenueSummary,
    /// Completed-booking revenue keyed by hotel ID
    pub revenue_by_hotel: BTreeMap<String, RevenueSummary>,
}

// ---------------------------------------------------------------------------
// Hotel admin
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Default)]
pub struct UpdateHotelProfileDto {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub brand_color: Option<String>,
}

impl UpdateHotelProfileDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(email) = &self.contact_email {
            require_email("contact_email", email)?;
        }
        if let Some(color) = &self.brand_color {
            if !is_valid_color(color) {
                return Err(ApiError::Validation("brand_color must look like #1a2b3c".to_string()));
            }
        }
        Ok(())
    }
}

/// A new provider with the login its staff will use
#[derive(Deserialize, Debug)]
pub struct CreateProviderDto {
    pub name: String,
    pub category: ServiceCategory,
    pub contact_email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub markup_percentage: f64,
    pub login_email: String,
    pub login_password: String,
}

impl CreateProviderDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("name", &self.name)?;
        require_email("contact_email", &self.contact_email)?;
        pricing::validate_percentage("markup_percentage", self.markup_percentage)?;
        require_email("login_email", &self.login_email)?;
        require_password(&self.login_password)?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateProviderDto {
    pub name: Option<String>,
    pub category: Option<ServiceCategory>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub markup_percentage: Option<f64>,
}

impl UpdateProviderDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(email) = &self.contact_email {
            require_email("contact_email", email)?;
        }
        if let Some(markup) = self.markup_percentage {
            pricing::validate_percentage("markup_percentage", markup)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct UpdateMarkupDto {
    pub markup_percentage: f64,
}

#[derive(Deserialize, Debug)]
pub struct CreateGuestDto {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub room_number: String,
    pub checkout_at: DateTime<Utc>,
}

impl CreateGuestDto {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ApiError> {
        require_email("email", &self.email)?;
        require_password(&self.password)?;
        require_non_empty("full_name", &self.full_name)?;
        require_non_empty("room_number", &self.room_number)?;
        if self.checkout_at <= now {
            return Err(ApiError::Validation("checkout_at must be in the future".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateGuestDto {
    pub full_name: Option<String>,
    pub room_number: Option<String>,
    pub checkout_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl UpdateGuestDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.full_name {
            require_non_empty("full_name", name)?;
        }
        if let Some(room) = &self.room_number {
            require_non_empty("room_number", room)?;
        }
        Ok(())
    }
}

/// Booking list filter; `status` may repeat
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct BookingQueryDto {
    pub status: Vec<BookingStatus>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct HotelDashboard {
    pub bookings: StatusBreakdown,
    pub revenue: RevenueSummary,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub top_services: Vec<ServiceStat>,
    pub ratings: RatingSummary,
    pub active_guests: i64,
    pub active_providers: i64,
}

// ---------------------------------------------------------------------------
// Service provider
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
pub struct CreateServiceDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ServiceCategory,
    pub base_price_cents: i64,
}

impl CreateServiceDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("name", &self.name)?;
        if self.base_price_cents <= 0 {
            return Err(ApiError::Validation("base_price_cents must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateServiceDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub base_price_cents: Option<i64>,
    pub is_available: Option<bool>,
}

impl UpdateServiceDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if matches!(self.base_price_cents, Some(price) if price <= 0) {
            return Err(ApiError::Validation("base_price_cents must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct UpdateBookingStatusDto {
    pub status: BookingStatus,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ProviderDashboard {
    pub bookings: StatusBreakdown,
    /// Base prices of completed bookings
    pub earnings_cents: i64,
    pub completed_bookings: i64,
    pub ratings: RatingSummary,
    pub top_services: Vec<ServiceStat>,
}

// ---------------------------------------------------------------------------
// Guest
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ServiceQueryDto {
    pub category: Option<ServiceCategory>,
}

/// A service as a guest sees it, priced with the hotel's markup
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct GuestServiceView {
    pub id: String,
    pub service_provider_id: String,
    pub provider_name: String,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    /// Price of a single unit. Bookings apply the markup to the whole
    /// base price, so `quantity * unit_price_cents` can be off by rounding.
    pub unit_price_cents: i64,
    pub markup_percentage: f64,
}

impl GuestServiceView {
    pub fn new(service: &Service, provider: &ServiceProvider) -> Result<Self, ApiError> {
        Ok(Self {
            id: service.get_id(),
            service_provider_id: provider.get_id(),
            provider_name: provider.get_name(),
            name: service.get_name(),
            description: service.get_description(),
            category: service.get_category(),
            unit_price_cents: pricing::guest_unit_price(
                service.get_base_price_cents(),
                provider.get_markup_percentage(),
            )?,
            markup_percentage: provider.get_markup_percentage(),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct CreateBookingDto {
    pub service_id: String,
    pub quantity: i32,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateBookingDto {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ApiError> {
        if !(1..=MAX_BOOKING_QUANTITY).contains(&self.quantity) {
            return Err(ApiError::Validation(format!(
                "quantity must be between 1 and {}",
                MAX_BOOKING_QUANTITY
            )));
        }
        if self.scheduled_for < now {
            return Err(ApiError::Validation("scheduled_for must not be in the past".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct RateBookingDto {
    pub rating: i32,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl RateBookingDto {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::InvalidRating(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
pub struct CreatePaymentIntentDto {
    pub booking_id: String,
    pub method: PaymentMethod,
}

/// Outcome reported by the payment gateway
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Succeeded,
    Failed,
    Refunded,
}

impl WebhookStatus {
    pub fn payment_status(self) -> PaymentStatus {
        match self {
            WebhookStatus::Succeeded => PaymentStatus::Paid,
            WebhookStatus::Failed => PaymentStatus::Failed,
            WebhookStatus::Refunded => PaymentStatus::Refunded,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WebhookEventDto {
    pub reference: String,
    pub status: WebhookStatus,
}

// ---------------------------------------------------------------------------
// Notifications and public
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct NotificationQueryDto {
    pub unread_only: bool,
}

/// What the guest portal needs to brand itself
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PublicHotelDto {
    pub name: String,
    pub slug: String,
    pub address: String,
    pub brand_color: Option<String>,
}

impl From<&Hotel> for PublicHotelDto {
    fn from(hotel: &Hotel) -> Self {
        Self {
            name: hotel.get_name(),
            slug: hotel.get_slug(),
            address: hotel.get_address(),
            brand_color: hotel.get_brand_color(),
        }
    }
}
