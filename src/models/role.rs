use diesel::expression::AsExpression;
use diesel::deserialize::FromSqlRow;
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

/// The role a user account acts under
///
/// Every account has exactly one role. Hotel admins, guests and service
/// provider staff are scoped to a single hotel; the superadmin is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    HotelAdmin,
    ServiceProvider,
    Superadmin,
}

text_enum!(Role, "role", {
    Guest => "guest",
    HotelAdmin => "hotel_admin",
    ServiceProvider => "service_provider",
    Superadmin => "superadmin",
});
