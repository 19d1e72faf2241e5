use super::*;
use crate::models::{Actor, PaymentMethod, ServiceCategory};
use crate::repo::{get_booking, transition_booking};
use crate::repo::tests::setup_test_db;
use crate::test_utils::{seed_booking, seed_current_guest, seed_hotel, seed_provider, seed_service};

fn booked(pool: &DbPool) -> Booking {
    let (hotel, _) = seed_hotel(pool, "seaside");
    let (provider, _) = seed_provider(pool, &hotel, "Wash", 20.0);
    let service = seed_service(pool, &provider, "Pressing", ServiceCategory::Laundry, 1000);
    let guest = seed_current_guest(pool, &hotel, "guest@seaside.test");
    seed_booking(pool, &guest, &hotel, &provider, &service, 1)
}

#[test]
fn test_intent_marks_booking_pending() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    let payment = Payment::new(booking.get_id(), booking.get_total_price_cents(), PaymentMethod::Card);

    create_payment_intent(&pool, &payment).unwrap();

    let stored = get_payment_by_reference(&pool, &payment.get_reference()).unwrap().unwrap();
    assert_eq!(stored.get_amount_cents(), 1200);
    assert_eq!(get_booking(&pool, &booking.get_id()).unwrap().unwrap().get_payment_status(), PaymentStatus::Pending);
    assert_eq!(list_payments_for_booking(&pool, &booking.get_id()).unwrap().len(), 1);
}

#[test]
fn test_intent_for_cancelled_booking() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    transition_booking(&pool, &booking.get_id(), BookingStatus::Cancelled, Actor::Guest).unwrap();

    let payment = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    let err = create_payment_intent(&pool, &payment).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::Conflict(_))));
    assert!(get_payment(&pool, &payment.get_id()).unwrap().is_none());
}

#[test]
fn test_settle_is_idempotent() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    let payment = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    create_payment_intent(&pool, &payment).unwrap();

    let (paid, paid_booking) = settle_payment(&pool, &payment.get_id(), PaymentStatus::Paid).unwrap();
    assert_eq!(paid.get_status(), PaymentStatus::Paid);
    assert_eq!(paid_booking.get_payment_status(), PaymentStatus::Paid);

    let (again, _) = settle_payment(&pool, &payment.get_id(), PaymentStatus::Paid).unwrap();
    assert_eq!(again.get_updated_at(), paid.get_updated_at());

    let second = Payment::new(booking.get_id(), 1200, PaymentMethod::Cash);
    let err = create_payment_intent(&pool, &second).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::Conflict(_))));
}

#[test]
fn test_settle_rejects_backwards_moves() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    let payment = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    create_payment_intent(&pool, &payment).unwrap();
    settle_payment(&pool, &payment.get_id(), PaymentStatus::Paid).unwrap();

    let err = settle_payment(&pool, &payment.get_id(), PaymentStatus::Failed).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::InvalidTransition(_))));

    let (_, refunded) = settle_payment(&pool, &payment.get_id(), PaymentStatus::Refunded).unwrap();
    assert_eq!(refunded.get_payment_status(), PaymentStatus::Refunded);
}

#[test]
fn test_settle_missing_payment() {
    let pool = setup_test_db();
    let err = settle_payment(&pool, "missing", PaymentStatus::Paid).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::NotFound(_))));
}

#[test]
fn test_second_intent_refused_while_first_pending() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    let first = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    create_payment_intent(&pool, &first).unwrap();

    let second = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    let err = create_payment_intent(&pool, &second).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::Conflict(_))));

    // a failed attempt can be retried
    settle_payment(&pool, &first.get_id(), PaymentStatus::Failed).unwrap();
    create_payment_intent(&pool, &second).unwrap();
    assert_eq!(get_booking(&pool, &booking.get_id()).unwrap().unwrap().get_payment_status(), PaymentStatus::Pending);
}

/// A late outcome for an older attempt must not undo or duplicate a capture
#[test]
fn test_stale_attempt_cannot_override_capture() {
    let pool = setup_test_db();
    let booking = booked(&pool);
    let first = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    create_payment_intent(&pool, &first).unwrap();
    settle_payment(&pool, &first.get_id(), PaymentStatus::Failed).unwrap();

    let retry = Payment::new(booking.get_id(), 1200, PaymentMethod::Card);
    create_payment_intent(&pool, &retry).unwrap();
    let (_, paid) = settle_payment(&pool, &retry.get_id(), PaymentStatus::Paid).unwrap();
    assert_eq!(paid.get_payment_status(), PaymentStatus::Paid);

    // the failed attempt succeeding late would charge twice
    let err = settle_payment(&pool, &first.get_id(), PaymentStatus::Paid).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::Conflict(_))));

    // replaying its failure leaves the booking paid
    let (_, still_paid) = settle_payment(&pool, &first.get_id(), PaymentStatus::Failed).unwrap();
    assert_eq!(still_paid.get_payment_status(), PaymentStatus::Paid);
    assert_eq!(get_payment(&pool, &first.get_id()).unwrap().unwrap().get_status(), PaymentStatus::Failed);
}

