use super::*;
use crate::models::{Role, Service, User};
use crate::pricing::quote;
use chrono::{TimeZone, Utc};

fn booking(
    service: &Service,
    hotel_id: &str,
    quantity: i32,
    status: BookingStatus,
    month: u32,
) -> Booking {
    let guest = User::new("guest@hotel.test", "h".to_string(), "Guest".to_string(), Role::Guest);
    let price = quote(service.get_base_price_cents(), quantity, 10.0, 50.0).unwrap();
    let mut booking = Booking::new(&guest, hotel_id.to_string(), service, quantity, Utc::now(), None, &price);
    booking.set_status(status);
    booking.set_created_at(Utc.with_ymd_and_hms(2025, month, 15, 12, 0, 0).unwrap());
    booking
}

fn service(name: &str, category: ServiceCategory, price: i64) -> Service {
    Service::new("provider".to_string(), name.to_string(), String::new(), category, price)
}

#[test]
fn test_status_breakdown_counts_every_booking() {
    let laundry = service("Laundry", ServiceCategory::Laundry, 1_000);
    let bookings = vec![
        booking(&laundry, "h1", 1, BookingStatus::Pending, 1),
        booking(&laundry, "h1", 1, BookingStatus::Pending, 1),
        booking(&laundry, "h1", 1, BookingStatus::Completed, 1),
        booking(&laundry, "h1", 1, BookingStatus::Rejected, 1),
    ];

    let breakdown = status_breakdown(&bookings);

    assert_eq!(breakdown.pending, 2);
    assert_eq!(breakdown.completed, 1);
    assert_eq!(breakdown.rejected, 1);
    assert_eq!(breakdown.confirmed, 0);
    assert_eq!(breakdown.total, 4);
}

#[test]
fn test_revenue_summary_only_counts_completed() {
    let spa = service("Massage", ServiceCategory::Spa, 10_000);
    let bookings = vec![
        booking(&spa, "h1", 1, BookingStatus::Completed, 1),
        booking(&spa, "h1", 2, BookingStatus::Completed, 2),
        booking(&spa, "h1", 5, BookingStatus::Cancelled, 2),
        booking(&spa, "h1", 5, BookingStatus::Confirmed, 2),
    ];

    let summary = revenue_summary(&bookings);

    // 10% markup, half of which goes to the platform
    assert_eq!(summary.completed_bookings, 2);
    assert_eq!(summary.provider_earnings_cents, 30_000);
    assert_eq!(summary.markup_cents, 3_000);
    assert_eq!(summary.platform_fees_cents, 1_500);
    assert_eq!(summary.hotel_earnings_cents, 1_500);
    assert_eq!(summary.gross_revenue_cents, 33_000);
}

#[test]
fn test_revenue_by_month_is_chronological() {
    let dining = service("Dinner", ServiceCategory::Dining, 2_000);
    let bookings = vec![
        booking(&dining, "h1", 1, BookingStatus::Completed, 3),
        booking(&dining, "h1", 1, BookingStatus::Completed, 1),
        booking(&dining, "h1", 1, BookingStatus::Completed, 3),
        booking(&dining, "h1", 1, BookingStatus::Pending, 2),
    ];

    let months = revenue_by_month(&bookings);

    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2025-01");
    assert_eq!(months[0].completed_bookings, 1);
    assert_eq!(months[1].month, "2025-03");
    assert_eq!(months[1].completed_bookings, 2);
    assert_eq!(months[1].gross_revenue_cents, 4_400);
}

#[test]
fn test_revenue_by_category_sorted_by_revenue() {
    let laundry = service("Laundry", ServiceCategory::Laundry, 500);
    let transfer = service("Transfer", ServiceCategory::Transportation, 8_000);
    let bookings = vec![
        booking(&laundry, "h1", 3, BookingStatus::Completed, 1),
        booking(&transfer, "h1", 1, BookingStatus::Completed, 1),
    ];

    let categories = revenue_by_category(&bookings);

    assert_eq!(categories[0].category, ServiceCategory::Transportation);
    assert_eq!(categories[1].category, ServiceCategory::Laundry);
    assert_eq!(categories[1].completed_bookings, 1);
}

#[test]
fn test_top_services_ranks_by_bookings_and_skips_cancelled() {
    let laundry = service("Laundry", ServiceCategory::Laundry, 500);
    let spa = service("Spa", ServiceCategory::Spa, 9_000);
    let tour = service("Tour", ServiceCategory::Tours, 3_000);
    let bookings = vec![
        booking(&laundry, "h1", 1, BookingStatus::Pending, 1),
        booking(&laundry, "h1", 1, BookingStatus::Completed, 1),
        booking(&laundry, "h1", 1, BookingStatus::Confirmed, 1),
        booking(&spa, "h1", 1, BookingStatus::Completed, 1),
        booking(&tour, "h1", 1, BookingStatus::Cancelled, 1),
        booking(&tour, "h1", 1, BookingStatus::Rejected, 1),
    ];

    let top = top_services(&bookings, 5);

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].service_name, "Laundry");
    assert_eq!(top[0].bookings, 3);
    assert_eq!(top[0].gross_revenue_cents, 550);
    assert_eq!(top[1].service_name, "Spa");

    assert_eq!(top_services(&bookings, 1).len(), 1);
}

#[test]
fn test_rating_summary() {
    let spa = service("Spa", ServiceCategory::Spa, 9_000);
    assert_eq!(rating_summary(&[]), RatingSummary::default());

    let mut rated = booking(&spa, "h1", 1, BookingStatus::Completed, 1);
    rated.set_rating(Some(5));
    let mut rated_low = booking(&spa, "h1", 1, BookingStatus::Completed, 1);
    rated_low.set_rating(Some(2));
    let unrated = booking(&spa, "h1", 1, BookingStatus::Completed, 1);

    let summary = rating_summary(&[rated, rated_low, unrated]);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.average, Some(3.5));
}

#[test]
fn test_revenue_by_hotel() {
    let spa = service("Spa", ServiceCategory::Spa, 1_000);
    let bookings = vec![
        booking(&spa, "h1", 1, BookingStatus::Completed, 1),
        booking(&spa, "h2", 2, BookingStatus::Completed, 1),
        booking(&spa, "h2", 2, BookingStatus::Pending, 1),
    ];

    let by_hotel = revenue_by_hotel(&bookings);

    assert_eq!(by_hotel.len(), 2);
    assert_eq!(by_hotel["h1"].gross_revenue_cents, 1_100);
    assert_eq!(by_hotel["h2"].gross_revenue_cents, 2_200);
    assert_eq!(by_hotel["h2"].completed_bookings, 1);
}
