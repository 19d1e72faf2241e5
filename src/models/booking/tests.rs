use super::*;

#[test]
fn test_provider_fulfilment_path() {
    assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed, Actor::Provider));
    assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::InProgress, Actor::Provider));
    assert!(BookingStatus::InProgress.can_transition_to(BookingStatus::Completed, Actor::Provider));
    assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Rejected, Actor::Provider));
}

#[test]
fn test_provider_cannot_skip_steps() {
    assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed, Actor::Provider));
    assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::InProgress, Actor::Provider));
    assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Rejected, Actor::Provider));
    assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled, Actor::Provider));
}

#[test]
fn test_guest_and_admin_cancel_before_work_starts() {
    for actor in [Actor::Guest, Actor::HotelAdmin] {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled, actor));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled, actor));
        assert!(!BookingStatus::InProgress.can_transition_to(BookingStatus::Cancelled, actor));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed, actor));
    }
}

#[test]
fn test_terminal_states_have_no_exits() {
    let actors = [Actor::Guest, Actor::Provider, Actor::HotelAdmin];
    for from in BookingStatus::ALL.iter().filter(|s| s.is_terminal()) {
        for to in BookingStatus::ALL {
            for actor in actors {
                assert!(
                    !from.can_transition_to(*to, actor),
                    "{} -> {} should be impossible for {:?}",
                    from,
                    to,
                    actor
                );
            }
        }
    }
}

#[test]
fn test_actor_from_role() {
    assert_eq!(Actor::from_role(Role::Guest), Some(Actor::Guest));
    assert_eq!(Actor::from_role(Role::ServiceProvider), Some(Actor::Provider));
    assert_eq!(Actor::from_role(Role::HotelAdmin), Some(Actor::HotelAdmin));
    assert_eq!(Actor::from_role(Role::Superadmin), None);
}

#[test]
fn test_new_booking_snapshots_price() {
    let guest = User::new("g@h.test", "h".to_string(), "Guest".to_string(), Role::Guest);
    let service = Service::new(
        "provider-1".to_string(),
        "Airport transfer".to_string(),
        "Sedan to the airport".to_string(),
        ServiceCategory::Transportation,
        5_000,
    );
    let price = crate::pricing::quote(service.get_base_price_cents(), 2, 10.0, 20.0).unwrap();

    let booking = Booking::new(&guest, "hotel-1".to_string(), &service, 2, Utc::now(), None, &price);

    assert_eq!(booking.get_status(), BookingStatus::Pending);
    assert_eq!(booking.get_payment_status(), PaymentStatus::Unpaid);
    assert_eq!(booking.get_service_provider_id(), "provider-1");
    assert_eq!(booking.get_service_name(), "Airport transfer");
    assert_eq!(booking.get_base_price_cents(), 10_000);
    assert_eq!(booking.get_markup_amount_cents(), 1_000);
    assert_eq!(booking.get_platform_fee_cents(), 200);
    assert_eq!(booking.get_total_price_cents(), 11_000);
    assert_eq!(booking.get_hotel_earnings_cents(), 800);
}
