use super::*;
use crate::repo::deactivate_provider;
use crate::repo::tests::setup_test_db;
use crate::test_utils::{seed_hotel, seed_provider, seed_service};

#[test]
fn test_create_and_get() {
    let pool = setup_test_db();
    let (hotel, _) = seed_hotel(&pool, "seaside");
    let (provider, _) = seed_provider(&pool, &hotel, "Wash", 20.0);
    let service = seed_service(&pool, &provider, "Pressing", ServiceCategory::Laundry, 500);

    let stored = get_service(&pool, &service.get_id()).unwrap().unwrap();
    assert_eq!(stored, service);
    assert!(get_service(&pool, "missing").unwrap().is_none());
}

#[test]
fn test_non_positive_price_rejected_by_database() {
    let pool = setup_test_db();
    let (hotel, _) = seed_hotel(&pool, "seaside");
    let (provider, _) = seed_provider(&pool, &hotel, "Wash", 20.0);
    let service = Service::new(provider.get_id(), "Free".to_string(), String::new(), ServiceCategory::Laundry, 0);

    assert!(create_service(&pool, &service).is_err());
}

#[test]
fn test_list_for_provider() {
    let pool = setup_test_db();
    let (hotel, _) = seed_hotel(&pool, "seaside");
    let (wash, _) = seed_provider(&pool, &hotel, "Wash", 20.0);
    let (cabs, _) = seed_provider(&pool, &hotel, "Cabs", 20.0);
    seed_service(&pool, &wash, "Pressing", ServiceCategory::Laundry, 500);
    seed_service(&pool, &wash, "Dry cleaning", ServiceCategory::Laundry, 900);
    seed_service(&pool, &cabs, "Airport run", ServiceCategory::Transportation, 4500);

    let services = list_services_for_provider(&pool, &wash.get_id()).unwrap();
    let names: Vec<String> = services.iter().map(|s| s.get_name()).collect();
    assert_eq!(names, vec!["Dry cleaning", "Pressing"]);
}

#[test]
fn test_bookable_services_filtering() {
    let pool = setup_test_db();
    let (hotel, _) = seed_hotel(&pool, "seaside");
    let (other, _) = seed_hotel(&pool, "uptown");
    let (wash, _) = seed_provider(&pool, &hotel, "Wash", 20.0);
    let (cabs, _) = seed_provider(&pool, &hotel, "Cabs", 20.0);
    let (elsewhere, _) = seed_provider(&pool, &other, "Spa", 20.0);

    seed_service(&pool, &wash, "Pressing", ServiceCategory::Laundry, 500);
    let hidden = seed_service(&pool, &wash, "Ironing", ServiceCategory::Laundry, 300);
    seed_service(&pool, &cabs, "Airport run", ServiceCategory::Transportation, 4500);
    seed_service(&pool, &elsewhere, "Massage", ServiceCategory::Spa, 8000);

    update_service(
        &pool,
        &hidden.get_id(),
        ServiceChanges { is_available: Some(false), ..Default::default() },
    )
    .unwrap();

    let all = list_bookable_services(&pool, &hotel.get_id(), None).unwrap();
    let names: Vec<String> = all.iter().map(|(s, _)| s.get_name()).collect();
    assert_eq!(names, vec!["Pressing", "Airport run"]);
    assert_eq!(all[1].1.get_id(), cabs.get_id());

    let laundry = list_bookable_services(&pool, &hotel.get_id(), Some(ServiceCategory::Laundry)).unwrap();
    assert_eq!(laundry.len(), 1);

    deactivate_provider(&pool, &cabs.get_id()).unwrap();
    let after = list_bookable_services(&pool, &hotel.get_id(), Some(ServiceCategory::Transportation)).unwrap();
    assert!(after.is_empty());
}

#[test]
fn test_update_service() {
    let pool = setup_test_db();
    let (hotel, _) = seed_hotel(&pool, "seaside");
    let (provider, _) = seed_provider(&pool, &hotel, "Wash", 20.0);
    let service = seed_service(&pool, &provider, "Pressing", ServiceCategory::Laundry, 500);

    let updated = update_service(
        &pool,
        &service.get_id(),
        ServiceChanges { base_price_cents: Some(650), ..Default::default() },
    )
    .unwrap();
    assert_eq!(updated.get_base_price_cents(), 650);
    assert_eq!(updated.get_name(), "Pressing");

    let err = update_service(&pool, "missing", ServiceChanges { name: Some("x".into()), ..Default::default() }).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::NotFound(_))));
}
