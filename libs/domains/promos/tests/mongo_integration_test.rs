//! MongoDB integration tests for the promos domain
//!
//! Each test starts its own MongoDB container; run with
//! `cargo test -p domain_promos -- --ignored` on a host with Docker.

use chrono::{DateTime, TimeZone, Utc};
use domain_promos::*;
use futures_util::future::join_all;
use test_utils::{TestDataBuilder, TestMongo};

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn draft(builder: &TestDataBuilder, suffix: &str, rides: u32) -> CreateEvent {
    CreateEvent {
        name: builder.name("event", suffix),
        promo_code_amount: PromoAmount {
            minor_units: 75_000,
            currency: "NGN".to_string(),
        },
        number_of_rides_allowed: rides,
        start_date: utc(2024, 1, 1),
        end_date: utc(2024, 1, 31),
        event_location: vec![],
    }
}

async fn setup(mongo: &TestMongo, test_name: &str) -> (PromoService<MongoPromoRepository>, MongoPromoRepository, TestDataBuilder) {
    let builder = TestDataBuilder::from_test_name(test_name);
    let db = mongo.database(&builder.database_name());
    let repo = MongoPromoRepository::new(&db);
    repo.create_indexes().await.unwrap();
    (PromoService::new(repo.clone()), repo, builder)
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_create_then_find_round_trips_the_record() {
    let mongo = TestMongo::new().await;
    let (service, _, builder) = setup(&mongo, "create_then_find").await;

    let created = service
        .create_event_at(draft(&builder, "main", 2), utc(2023, 12, 20))
        .await
        .unwrap();
    let found = service.find_by_code(&created.promo_code).await.unwrap();

    assert_eq!(found, created);
    assert!(!found.is_enabled);
    assert_eq!(found.current_ride_count, 0);
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_unique_index_rejects_duplicate_code() {
    let mongo = TestMongo::new().await;
    let (_, repo, builder) = setup(&mongo, "duplicate_code").await;

    let event = Event::new(draft(&builder, "dup", 1), utc(2023, 12, 20));
    repo.insert(&event).await.unwrap();

    let mut clash = Event::new(draft(&builder, "dup2", 1), utc(2023, 12, 21));
    clash.promo_code = event.promo_code.clone();

    let result = repo.insert(&clash).await;
    assert!(matches!(result, Err(PromoError::DuplicateCode(_))));
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_lists_are_ordered_and_filtered() {
    let mongo = TestMongo::new().await;
    let (service, _, builder) = setup(&mongo, "lists").await;

    let first = service
        .create_event_at(draft(&builder, "first", 1), utc(2023, 12, 1))
        .await
        .unwrap();
    let second = service
        .create_event_at(draft(&builder, "second", 1), utc(2023, 12, 2))
        .await
        .unwrap();
    let third = service
        .create_event_at(draft(&builder, "third", 1), utc(2023, 12, 3))
        .await
        .unwrap();

    service.activate_at(&third.promo_code, utc(2024, 1, 10)).await.unwrap();
    service.activate_at(&first.promo_code, utc(2024, 1, 10)).await.unwrap();

    let all: Vec<String> = service
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.promo_code)
        .collect();
    assert_eq!(all, vec![first.promo_code.clone(), second.promo_code, third.promo_code.clone()]);

    let active: Vec<String> = service
        .list_active_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.promo_code)
        .collect();
    assert_eq!(active, vec![first.promo_code, third.promo_code]);
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_january_scenario_against_storage() {
    let mongo = TestMongo::new().await;
    let (service, _, builder) = setup(&mongo, "january").await;

    let event = service
        .create_event_at(draft(&builder, "jan", 2), utc(2023, 12, 20))
        .await
        .unwrap();
    let code = event.promo_code;

    service.activate_at(&code, utc(2024, 1, 2)).await.unwrap();
    service.activate_at(&code, utc(2024, 1, 2)).await.unwrap();

    assert!(service.check_validity(&code, utc(2024, 1, 15), None).await.unwrap().is_valid());
    assert_eq!(
        service.check_validity(&code, utc(2024, 2, 1), None).await.unwrap().reason(),
        Some(InvalidReason::Expired)
    );
    assert!(matches!(
        service.activate_at(&code, utc(2024, 2, 1)).await,
        Err(PromoError::Expired { .. })
    ));

    service.deactivate(&code).await.unwrap();
    assert_eq!(
        service.check_validity(&code, utc(2024, 1, 15), None).await.unwrap().reason(),
        Some(InvalidReason::Disabled)
    );
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_unknown_codes_are_not_found() {
    let mongo = TestMongo::new().await;
    let (service, _, _) = setup(&mongo, "unknown").await;

    assert!(matches!(service.activate("nope").await, Err(PromoError::NotFound(_))));
    assert!(matches!(service.deactivate("nope").await, Err(PromoError::NotFound(_))));
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_concurrent_redemptions_never_exceed_allowance() {
    let mongo = TestMongo::new().await;
    let (service, repo, builder) = setup(&mongo, "concurrent_redeem").await;

    let event = service
        .create_event_at(draft(&builder, "race", 3), utc(2023, 12, 20))
        .await
        .unwrap();
    repo.set_enabled(&event.promo_code, true).await.unwrap();

    let attempts = (0..10).map(|_| repo.increment_ride_count(&event.promo_code));
    let granted = join_all(attempts)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    assert_eq!(granted, 3);

    let stored = service.find_by_code(&event.promo_code).await.unwrap();
    assert_eq!(stored.current_ride_count, 3);
    assert_eq!(stored.rides_remaining(), 0);
}

#[tokio::test]
#[ignore] // needs Docker
async fn test_disabled_code_cannot_be_incremented() {
    let mongo = TestMongo::new().await;
    let (service, repo, builder) = setup(&mongo, "disabled_increment").await;

    let event = service
        .create_event_at(draft(&builder, "off", 3), utc(2023, 12, 20))
        .await
        .unwrap();

    assert!(repo.increment_ride_count(&event.promo_code).await.unwrap().is_none());
}
