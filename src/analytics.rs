/// Dashboard aggregations
///
/// Every function here is a pure fold over booking snapshots. Only
/// `completed` bookings count towards revenue; `cancelled` and `rejected`
/// bookings are left out of service popularity as well.
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Booking, BookingStatus, ServiceCategory};

/// Number of bookings in each status
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub pending: i64,
    pub confirmed: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub rejected: i64,
    pub total: i64,
}

impl StatusBreakdown {
    fn add(&mut self, status: BookingStatus) {
        let slot = match status {
            BookingStatus::Pending => &mut self.pending,
            BookingStatus::Confirmed => &mut self.confirmed,
            BookingStatus::InProgress => &mut self.in_progress,
            BookingStatus::Completed => &mut self.completed,
            BookingStatus::Cancelled => &mut self.cancelled,
            BookingStatus::Rejected => &mut self.rejected,
        };
        *slot += 1;
        self.total += 1;
    }
}

/// Money earned from completed bookings, split by party
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RevenueSummary {
    pub completed_bookings: i64,
    /// What guests paid
    pub gross_revenue_cents: i64,
    pub provider_earnings_cents: i64,
    pub markup_cents: i64,
    pub platform_fees_cents: i64,
    pub hotel_earnings_cents: i64,
}

impl RevenueSummary {
    fn add(&mut self, booking: &Booking) {
        self.completed_bookings += 1;
        self.gross_revenue_cents += booking.get_total_price_cents();
        self.provider_earnings_cents += booking.get_base_price_cents();
        self.markup_cents += booking.get_markup_amount_cents();
        self.platform_fees_cents += booking.get_platform_fee_cents();
        self.hotel_earnings_cents += booking.get_hotel_earnings_cents();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRevenue {
    /// Calendar month as `YYYY-MM`
    pub month: String,
    pub completed_bookings: i64,
    pub gross_revenue_cents: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryRevenue {
    pub category: ServiceCategory,
    pub completed_bookings: i64,
    pub gross_revenue_cents: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceStat {
    pub service_id: String,
    pub service_name: String,
    /// Bookings that were not cancelled or rejected
    pub bookings: i64,
    pub gross_revenue_cents: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

fn completed(bookings: &[Booking]) -> impl Iterator<Item = &Booking> {
    bookings.iter().filter(|b| b.get_status() == BookingStatus::Completed)
}

pub fn status_breakdown(bookings: &[Booking]) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for booking in bookings {
        breakdown.add(booking.get_status());
    }
    breakdown
}

pub fn revenue_summary(bookings: &[Booking]) -> RevenueSummary {
    let mut summary = RevenueSummary::default();
    for booking in completed(bookings) {
        summary.add(booking);
    }
    summary
}

/// Revenue per calendar month of booking creation, oldest month first
pub fn revenue_by_month(bookings: &[Booking]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for booking in completed(bookings) {
        let month = booking.get_created_at().format("%Y-%m").to_string();
        let entry = months.entry(month).or_default();
        entry.0 += 1;
        entry.1 += booking.get_total_price_cents();
    }

    months
        .into_iter()
        .map(|(month, (count, revenue))| MonthlyRevenue {
            month,
            completed_bookings: count,
            gross_revenue_cents: revenue,
        })
        .collect()
}

/// Revenue per service category, highest revenue first
pub fn revenue_by_category(bookings: &[Booking]) -> Vec<CategoryRevenue> {
    let mut categories: BTreeMap<ServiceCategory, (i64, i64)> = BTreeMap::new();
    for booking in completed(bookings) {
        let entry = categories.entry(booking.get_category()).or_default();
        entry.0 += 1;
        entry.1 += booking.get_total_price_cents();
    }

    let mut result: Vec<CategoryRevenue> = categories
        .into_iter()
        .map(|(category, (count, revenue))| CategoryRevenue {
            category,
            completed_bookings: count,
            gross_revenue_cents: revenue,
        })
        .collect();
    // stable sort keeps category order among ties
    result.sort_by(|a, b| b.gross_revenue_cents.cmp(&a.gross_revenue_cents));
    result
}

/// The `limit` most booked services, ties broken by revenue then name
pub fn top_services(bookings: &[Booking], limit: usize) -> Vec<ServiceStat> {
    let mut stats: HashMap<String, ServiceStat> = HashMap::new();
    for booking in bookings {
        let status = booking.get_status();
        if matches!(status, BookingStatus::Cancelled | BookingStatus::Rejected) {
            continue;
        }
        let stat = stats.entry(booking.get_service_id()).or_insert_with(|| ServiceStat {
            service_id: booking.get_service_id(),
            service_name: booking.get_service_name(),
            bookings: 0,
            gross_revenue_cents: 0,
        });
        stat.bookings += 1;
        if status == BookingStatus::Completed {
            stat.gross_revenue_cents += booking.get_total_price_cents();
        }
    }

    let mut result: Vec<ServiceStat> = stats.into_values().collect();
    result.sort_by(|a, b| {
        b.bookings
            .cmp(&a.bookings)
            .then(b.gross_revenue_cents.cmp(&a.gross_revenue_cents))
            .then(a.service_name.cmp(&b.service_name))
    });
    result.truncate(limit);
    result
}

pub fn rating_summary(bookings: &[Booking]) -> RatingSummary {
    let ratings: Vec<i32> = bookings.iter().filter_map(|b| b.get_rating()).collect();
    if ratings.is_empty() {
        return RatingSummary::default();
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    RatingSummary {
        average: Some(sum as f64 / ratings.len() as f64),
        count: ratings.len() as i64,
    }
}

/// Revenue summaries keyed by hotel id
pub fn revenue_by_hotel(bookings: &[Booking]) -> BTreeMap<String, RevenueSummary> {
    let mut hotels: BTreeMap<String, RevenueSummary> = BTreeMap::new();
    for booking in completed(bookings) {
        hotels.entry(booking.get_hotel_id()).or_default().add(booking);
    }
    hotels
}

#[cfg(test)]
mod tests;
