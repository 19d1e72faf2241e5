use crate::auth::{AuthUser, Claims};
use crate::db::DbPool;
use crate::models::{Booking, Hotel, Role, Service, ServiceCategory, ServiceProvider, User};
use crate::pricing;
use crate::repo::{self, tests::setup_test_db};
use chrono::{DateTime, Duration, Utc};
use diesel::sql_types::Text;
use diesel::{QueryableByName, RunQueryDsl};
use proptest::prelude::*;

/// Inserts a hotel with 10% platform commission and its admin
pub fn seed_hotel(pool: &DbPool, slug: &str) -> (Hotel, User) {
    let hotel = Hotel::new(
        format!("Hotel {}", slug),
        slug.to_string(),
        "1 Harbour Road".to_string(),
        format!("desk@{}.test", slug),
        10.0,
    );
    let admin = User::new(&format!("admin@{}.test", slug), "hash".to_string(), "Admin".to_string(), Role::HotelAdmin)
        .with_hotel(hotel.get_id());
    repo::create_hotel_with_admin(pool, &hotel, &admin).unwrap();
    (hotel, admin)
}

/// Inserts a provider with the given markup and its staff login
pub fn seed_provider(pool: &DbPool, hotel: &Hotel, name: &str, markup: f64) -> (ServiceProvider, User) {
    let provider = ServiceProvider::new(
        hotel.get_id(),
        name.to_string(),
        ServiceCategory::Laundry,
        format!("{}@providers.test", name.to_lowercase()),
        None,
        markup,
    );
    let login = User::new(
        &format!("staff-{}@{}.test", name.to_lowercase(), hotel.get_slug()),
        "hash".to_string(),
        name.to_string(),
        Role::ServiceProvider,
    )
    .with_hotel(hotel.get_id())
    .with_service_provider(provider.get_id());
    repo::create_provider_with_login(pool, &provider, &login).unwrap();
    (provider, login)
}

/// Inserts an available service
pub fn seed_service(pool: &DbPool, provider: &ServiceProvider, name: &str, category: ServiceCategory, price_cents: i64) -> Service {
    let service = Service::new(provider.get_id(), name.to_string(), format!("{} service", name), category, price_cents);
    repo::create_service(pool, &service).unwrap()
}

/// Inserts a guest staying until the given checkout
pub fn seed_guest(pool: &DbPool, hotel: &Hotel, email: &str, checkout_at: DateTime<Utc>) -> User {
    let guest = User::new(email, "hash".to_string(), "Guest".to_string(), Role::Guest)
        .with_hotel(hotel.get_id())
        .with_stay("101".to_string(), checkout_at);
    repo::create_user(pool, &guest).unwrap()
}

/// Inserts a guest who checks out in three days
pub fn seed_current_guest(pool: &DbPool, hotel: &Hotel, email: &str) -> User {
    seed_guest(pool, hotel, email, Utc::now() + Duration::days(3))
}

/// Prices and inserts a pending booking scheduled for tomorrow
pub fn seed_booking(pool: &DbPool, guest: &User, hotel: &Hotel, provider: &ServiceProvider, service: &Service, quantity: i32) -> Booking {
    let price = pricing::quote(
        service.get_base_price_cents(),
        quantity,
        provider.get_markup_percentage(),
        hotel.get_platform_commission_percentage(),
    )
    .unwrap();
    let booking = Booking::new(guest, hotel.get_id(), service, quantity, Utc::now() + Duration::days(1), None, &price);
    repo::create_booking(pool, &booking).unwrap()
}

/// An authenticated caller as the extractor would produce it
pub fn auth_user(user: &User) -> AuthUser {
    let now = Utc::now().timestamp();
    AuthUser {
        user: user.clone(),
        claims: Claims {
            sub: user.get_id(),
            role: user.get_role(),
            hotel_id: user.get_hotel_id(),
            service_provider_id: user.get_service_provider_id(),
            exp: now + 900,
            iat: now,
            token_type: "access".to_string(),
        },
    }
}

/// Generates a valid percentage in [0, 100] with two decimals
///
/// Uses integer-then-divide so 0.0 and 100.0 are reachable exactly.
pub fn arb_percentage() -> impl Strategy<Value = f64> {
    (0u32..=10_000u32).prop_map(|v| v as f64 / 100.0)
}

/// Generates a percentage outside [0, 100]
pub fn arb_invalid_percentage() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1000.0f64..-0.001f64),
        (100.001f64..1000.0f64),
        Just(f64::NAN),
        Just(f64::INFINITY),
    ]
}

/// Generates a unit price between one cent and ten thousand units
pub fn arb_unit_price() -> impl Strategy<Value = i64> {
    1i64..=1_000_000i64
}

/// Generates printable strings, including spaces, quotes and unicode
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    "\\PC{0,40}"
}

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[test]
fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");

    let expected_tables = [
        "hotels", "users", "service_providers", "services", "bookings",
        "refresh_tokens", "payments", "notifications",
        "__diesel_schema_migrations",
    ];

    for table in expected_tables {
        assert!(table_names.iter().any(|t| t.name == table), "Table '{}' not found in database", table);

        let query = format!("SELECT COUNT(*) FROM {}", table);
        let result = diesel::sql_query(&query).execute(&mut conn);
        assert!(result.is_ok(), "Failed to query table '{}': {:?}", table, result.err());
    }
}

#[test]
fn test_foreign_keys_enforced() {
    let pool = setup_test_db();
    let orphan = User::new("orphan@nowhere.test", "hash".to_string(), "Orphan".to_string(), Role::Guest)
        .with_hotel("missing-hotel".to_string());

    assert!(repo::create_user(&pool, &orphan).is_err());
}
