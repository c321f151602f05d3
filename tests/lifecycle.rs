use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use schoolrun::api::{
    MatchingAPI, NewRideRequest, NotificationAPI, RatingAPI, RideAPI, RideRequestAPI, WalletAPI,
};
use schoolrun::auth::{Role, User};
use schoolrun::config::EngineConfig;
use schoolrun::db::{MemoryStore, Store};
use schoolrun::engine::Engine;
use schoolrun::entities::{
    Child, Coordinates, NotificationKind, Profile, RequestStatus, Ride, RideStatus,
};
use schoolrun::error::Error;
use schoolrun::notifications::NotificationSink;

struct Fixture {
    engine: Arc<Engine>,
    store: Arc<MemoryStore>,
    parent: User,
    driver: User,
    child_id: Uuid,
}

async fn seed(store: &MemoryStore) -> (User, User, Uuid) {
    let parent = User::parent(Uuid::new_v4());
    let driver = User::driver(Uuid::new_v4());

    store
        .add_profile(Profile::new(parent.id, "Pat Perera".into(), Role::Parent))
        .await;
    store
        .add_profile(Profile::new(driver.id, "Dinesh Silva".into(), Role::Driver))
        .await;

    let child = Child::new(parent.id, "Chamo Perera".into());
    let child_id = child.id;
    store.add_child(child).await;

    (parent, driver, child_id)
}

async fn fixture_with(config: EngineConfig) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let (parent, driver, child_id) = seed(&store).await;
    let engine = Arc::new(Engine::with_store(store.clone(), config).unwrap());

    Fixture {
        engine,
        store,
        parent,
        driver,
        child_id,
    }
}

async fn fixture() -> Fixture {
    fixture_with(EngineConfig::default()).await
}

fn school_run(child_id: Uuid, price: Option<i64>) -> NewRideRequest {
    NewRideRequest {
        child_id,
        pickup_address: "10 Home St".into(),
        dropoff_address: "School Rd".into(),
        pickup_time: Utc::now() + Duration::minutes(30),
        price,
    }
}

impl Fixture {
    async fn accepted_ride(&self) -> Ride {
        let request = self
            .engine
            .create_request(self.parent.clone(), school_run(self.child_id, Some(1200)))
            .await
            .unwrap();

        self.engine
            .accept_request(self.driver.clone(), request.id)
            .await
            .unwrap()
    }

    /// The code as the parent sees it.
    async fn otp_of(&self, ride_id: Uuid) -> String {
        self.engine
            .find_ride(self.parent.clone(), ride_id)
            .await
            .unwrap()
            .ride
            .otp
    }

    async fn started_ride(&self) -> Ride {
        let ride = self.accepted_ride().await;
        let otp = self.otp_of(ride.id).await;

        self.engine
            .submit_otp(self.driver.clone(), ride.id, otp)
            .await
            .unwrap()
    }

    async fn notification_kinds(&self, user: &User) -> Vec<NotificationKind> {
        self.engine
            .list_notifications(user.clone())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect()
    }
}

#[tokio::test]
async fn school_run_end_to_end() {
    let f = fixture().await;

    let request = f
        .engine
        .create_request(f.parent.clone(), school_run(f.child_id, None))
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Requested);
    assert!(request.price > 0);

    let open = f.engine.list_open_requests(f.driver.clone()).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, request.id);

    let ride = f
        .engine
        .accept_request(f.driver.clone(), request.id)
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Accepted);
    assert_eq!(ride.driver_id, f.driver.id);
    assert_eq!(ride.price, request.price);
    // the driver learns the code from the parent, not from the API
    assert!(ride.otp.is_empty());

    let request = f
        .engine
        .find_request(f.parent.clone(), request.id)
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Accepted);
    assert!(f
        .engine
        .list_open_requests(f.driver.clone())
        .await
        .unwrap()
        .is_empty());

    let otp = f.otp_of(ride.id).await;
    assert!((4..=6).contains(&otp.len()));
    assert!(otp.bytes().all(|b| b.is_ascii_digit()));

    let ride = f
        .engine
        .submit_otp(f.driver.clone(), ride.id, otp)
        .await
        .unwrap();
    assert_eq!(ride.status, RideStatus::InProgress);

    let ride = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(ride.status, RideStatus::Completed);
    assert!(ride.dropoff_time.is_some());

    let wallet = f.engine.find_wallet(f.driver.clone()).await.unwrap();
    assert_eq!(wallet.balance, request.price);
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.transactions[0].ride_id, ride.id);
    assert_eq!(wallet.transactions[0].amount, request.price);

    // newest first
    assert_eq!(
        f.notification_kinds(&f.parent).await,
        vec![
            NotificationKind::RideCompleted,
            NotificationKind::RideStarted,
            NotificationKind::RideAccepted,
        ]
    );
    assert!(f.notification_kinds(&f.driver).await.is_empty());
}

#[tokio::test]
async fn pickup_time_must_be_in_the_future() {
    let f = fixture().await;

    let mut params = school_run(f.child_id, None);
    params.pickup_time = Utc::now() - Duration::minutes(1);

    let err = f
        .engine
        .create_request(f.parent.clone(), params)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(err.field.as_deref(), Some("pickup_time"));

    let result = f
        .engine
        .create_request(f.parent.clone(), school_run(f.child_id, None))
        .await;
    assert_matches!(result, Ok(request) if request.status == RequestStatus::Requested);
}

#[tokio::test]
async fn request_fields_are_validated() {
    let f = fixture().await;

    let mut params = school_run(f.child_id, None);
    params.dropoff_address = "   ".into();
    let err = f
        .engine
        .create_request(f.parent.clone(), params)
        .await
        .unwrap_err();
    assert_eq!(err.field.as_deref(), Some("dropoff_address"));

    let err = f
        .engine
        .create_request(f.parent.clone(), school_run(f.child_id, Some(0)))
        .await
        .unwrap_err();
    assert_eq!(err.field.as_deref(), Some("price"));
}

#[tokio::test]
async fn default_fare_comes_from_configured_range() {
    let f = fixture_with(EngineConfig {
        default_fare_min: 800,
        default_fare_max: 820,
        ..EngineConfig::default()
    })
    .await;

    for _ in 0..20 {
        let request = f
            .engine
            .create_request(f.parent.clone(), school_run(f.child_id, None))
            .await
            .unwrap();
        assert!((800..=820).contains(&request.price));
    }
}

#[tokio::test]
async fn child_must_belong_to_parent() {
    let f = fixture().await;

    let stranger = User::parent(Uuid::new_v4());
    let result = f
        .engine
        .create_request(stranger, school_run(f.child_id, None))
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let result = f
        .engine
        .create_request(f.parent.clone(), school_run(Uuid::new_v4(), None))
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let result = f
        .engine
        .create_request(f.driver.clone(), school_run(f.child_id, None))
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());
}

#[tokio::test]
async fn open_requests_are_for_drivers_and_ordered_by_pickup() {
    let f = fixture().await;

    let mut later = school_run(f.child_id, None);
    later.pickup_time = Utc::now() + Duration::hours(3);
    let mut sooner = school_run(f.child_id, None);
    sooner.pickup_time = Utc::now() + Duration::hours(1);

    let later = f.engine.create_request(f.parent.clone(), later).await.unwrap();
    let sooner = f
        .engine
        .create_request(f.parent.clone(), sooner)
        .await
        .unwrap();

    let open = f.engine.list_open_requests(f.driver.clone()).await.unwrap();
    let ids: Vec<Uuid> = open.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let result = f.engine.list_open_requests(f.parent.clone()).await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let own = f.engine.list_requests(f.parent.clone()).await.unwrap();
    assert_eq!(own.len(), 2);
}

#[tokio::test]
async fn cancel_request_rules() {
    let f = fixture().await;

    let request = f
        .engine
        .create_request(f.parent.clone(), school_run(f.child_id, None))
        .await
        .unwrap();

    let result = f
        .engine
        .cancel_request(User::parent(Uuid::new_v4()), request.id)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let cancelled = f
        .engine
        .cancel_request(f.parent.clone(), request.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);

    let result = f.engine.cancel_request(f.parent.clone(), request.id).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    let result = f.engine.accept_request(f.driver.clone(), request.id).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());
    assert_eq!(f.store.count_rides().await, 0);

    let result = f.engine.cancel_request(f.parent.clone(), Uuid::new_v4()).await;
    assert_matches!(result, Err(err) if err.is_not_found_error());
}

#[tokio::test]
async fn accepted_request_cannot_be_cancelled() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let result = f
        .engine
        .cancel_request(f.parent.clone(), ride.request_id)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_create_exactly_one_ride() {
    let f = fixture().await;

    let request = f
        .engine
        .create_request(f.parent.clone(), school_run(f.child_id, None))
        .await
        .unwrap();

    let request_id = request.id;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = f.engine.clone();
            let driver = User::driver(Uuid::new_v4());
            tokio::spawn(async move { engine.accept_request(driver, request_id).await })
        })
        .collect();

    let mut accepted = 0;
    let mut conflicts = 0;

    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) if err.is_conflict_error() => conflicts += 1,
            Err(err) => panic!("unexpected error: {:?}", err),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(f.store.count_rides().await, 1);
    assert_eq!(
        f.notification_kinds(&f.parent).await,
        vec![NotificationKind::RideAccepted]
    );
}

#[tokio::test]
async fn second_accept_fails_without_second_ride() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let result = f
        .engine
        .accept_request(User::driver(Uuid::new_v4()), ride.request_id)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    let result = f.engine.accept_request(f.driver.clone(), ride.request_id).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    assert_eq!(f.store.count_rides().await, 1);
}

#[tokio::test]
async fn wrong_otp_changes_nothing_and_never_locks_out() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;
    let otp = f.otp_of(ride.id).await;

    let wrong = if otp == "0000" { "1111" } else { "0000" };

    for _ in 0..3 {
        let err = f
            .engine
            .submit_otp(f.driver.clone(), ride.id, wrong.to_string())
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(err.field.as_deref(), Some("otp"));
        assert_eq!(err.message, "Invalid OTP");
    }

    let stored = f.store.find_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RideStatus::Accepted);
    assert_eq!(
        f.notification_kinds(&f.parent).await,
        vec![NotificationKind::RideAccepted]
    );

    let ride = f
        .engine
        .submit_otp(f.driver.clone(), ride.id, otp)
        .await
        .unwrap();
    assert_eq!(ride.status, RideStatus::InProgress);
    assert_eq!(
        f.notification_kinds(&f.parent).await,
        vec![NotificationKind::RideStarted, NotificationKind::RideAccepted]
    );
}

#[tokio::test]
async fn only_assigned_driver_submits_otp() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;
    let otp = f.otp_of(ride.id).await;

    let result = f
        .engine
        .submit_otp(f.parent.clone(), ride.id, otp.clone())
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let result = f
        .engine
        .submit_otp(User::driver(Uuid::new_v4()), ride.id, otp.clone())
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    f.engine
        .submit_otp(f.driver.clone(), ride.id, otp.clone())
        .await
        .unwrap();

    let result = f.engine.submit_otp(f.driver.clone(), ride.id, otp).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());
}

#[tokio::test]
async fn completion_settles_exactly_once() {
    let f = fixture().await;
    let ride = f.started_ride().await;

    let completed = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Completed, None)
        .await
        .unwrap();
    let dropoff_time = completed.dropoff_time;
    assert!(dropoff_time.is_some());

    let result = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Completed, None)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    let wallet = f.engine.find_wallet(f.driver.clone()).await.unwrap();
    assert_eq!(wallet.balance, 1200);
    assert_eq!(wallet.transactions.len(), 1);

    let stored = f.store.find_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.dropoff_time, dropoff_time);

    let completions = f
        .notification_kinds(&f.parent)
        .await
        .into_iter()
        .filter(|k| *k == NotificationKind::RideCompleted)
        .count();
    assert_eq!(completions, 1);
}

#[tokio::test]
async fn completion_requires_a_started_ride_and_the_driver() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let result = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Completed, None)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    let otp = f.otp_of(ride.id).await;
    f.engine
        .submit_otp(f.driver.clone(), ride.id, otp)
        .await
        .unwrap();

    let result = f
        .engine
        .advance_status(f.parent.clone(), ride.id, RideStatus::Completed, None)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let wallet = f.engine.find_wallet(f.driver.clone()).await.unwrap();
    assert_eq!(wallet.balance, 0);
    assert!(wallet.transactions.is_empty());
}

#[tokio::test]
async fn advance_status_rejects_non_terminal_targets() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    for target in [RideStatus::InProgress, RideStatus::Accepted] {
        let err = f
            .engine
            .advance_status(f.driver.clone(), ride.id, target, None)
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(err.field.as_deref(), Some("status"));
    }

    let result = f
        .engine
        .advance_status(
            User::parent(Uuid::new_v4()),
            ride.id,
            RideStatus::Cancelled,
            None,
        )
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());
}

#[tokio::test]
async fn finished_rides_reject_every_target_as_conflict() {
    let f = fixture().await;

    let completed = f.started_ride().await;
    f.engine
        .advance_status(f.driver.clone(), completed.id, RideStatus::Completed, None)
        .await
        .unwrap();

    let cancelled = f.accepted_ride().await;
    f.engine
        .advance_status(f.parent.clone(), cancelled.id, RideStatus::Cancelled, None)
        .await
        .unwrap();

    let targets = [
        RideStatus::Accepted,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    for ride_id in [completed.id, cancelled.id] {
        for target in targets {
            let err = f
                .engine
                .advance_status(f.driver.clone(), ride_id, target, None)
                .await
                .unwrap_err();
            assert!(err.is_conflict_error(), "{:?} -> {:?}", target, err);
            assert_eq!(err.field, None);
        }
    }

    let wallet = f.engine.find_wallet(f.driver.clone()).await.unwrap();
    assert_eq!(wallet.transactions.len(), 1);
}

#[tokio::test]
async fn parent_cancels_accepted_ride() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let ride = f
        .engine
        .advance_status(f.parent.clone(), ride.id, RideStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(ride.status, RideStatus::Cancelled);
    assert!(ride.dropoff_time.is_none());

    assert_eq!(
        f.notification_kinds(&f.parent).await,
        vec![NotificationKind::RideCancelled, NotificationKind::RideAccepted]
    );
    assert_eq!(
        f.notification_kinds(&f.driver).await,
        vec![NotificationKind::RideCancelled]
    );

    // terminal
    let result = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Cancelled, None)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    let otp = f.otp_of(ride.id).await;
    let result = f.engine.submit_otp(f.driver.clone(), ride.id, otp).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());
}

#[tokio::test]
async fn only_driver_cancels_ride_in_progress() {
    let f = fixture().await;
    let ride = f.started_ride().await;

    let result = f
        .engine
        .advance_status(f.parent.clone(), ride.id, RideStatus::Cancelled, None)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let ride = f
        .engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(ride.status, RideStatus::Cancelled);

    let wallet = f.engine.find_wallet(f.driver.clone()).await.unwrap();
    assert!(wallet.transactions.is_empty());
    assert!(f.notification_kinds(&f.driver).await.is_empty());
}

#[tokio::test]
async fn location_is_recorded_for_the_driver_only() {
    let f = fixture().await;
    let ride = f.started_ride().await;

    let here = Coordinates {
        latitude: 6.9271,
        longitude: 79.8612,
    };

    let ride = f
        .engine
        .update_driver_location(f.driver.clone(), ride.id, here)
        .await
        .unwrap();
    assert_eq!(ride.driver_location, Some(here));
    assert_eq!(ride.status, RideStatus::InProgress);

    let result = f
        .engine
        .update_driver_location(f.parent.clone(), ride.id, here)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let school = Coordinates {
        latitude: 6.9,
        longitude: 79.9,
    };
    let ride = f
        .engine
        .advance_status(
            f.driver.clone(),
            ride.id,
            RideStatus::Completed,
            Some(school),
        )
        .await
        .unwrap();
    assert_eq!(ride.driver_location, Some(school));

    let stored = f.store.find_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.driver_location, Some(school));

    let result = f
        .engine
        .update_driver_location(f.driver.clone(), ride.id, here)
        .await;
    assert_matches!(result, Err(err) if err.is_conflict_error());
}

#[tokio::test]
async fn parent_supplied_location_is_ignored() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let ride = f
        .engine
        .advance_status(
            f.parent.clone(),
            ride.id,
            RideStatus::Cancelled,
            Some(Coordinates {
                latitude: 1.0,
                longitude: 1.0,
            }),
        )
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Cancelled);
    assert!(ride.driver_location.is_none());
}

#[tokio::test]
async fn ratings_are_upserted_per_half() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let first = f
        .engine
        .rate_ride(f.driver.clone(), ride.id, 4, Some("on time".into()))
        .await
        .unwrap();
    assert_eq!(first.driver_rating, Some(4));
    assert_eq!(first.parent_rating, None);

    f.engine
        .rate_ride(f.parent.clone(), ride.id, 5, None)
        .await
        .unwrap();
    let updated = f
        .engine
        .rate_ride(f.parent.clone(), ride.id, 3, Some("bit late".into()))
        .await
        .unwrap();

    assert_eq!(updated.id, first.id);
    assert_eq!(updated.parent_rating, Some(3));
    assert_eq!(updated.parent_comment.as_deref(), Some("bit late"));
    assert_eq!(updated.driver_rating, Some(4));
    assert_eq!(updated.driver_comment.as_deref(), Some("on time"));

    let stored = f
        .engine
        .find_rating(f.driver.clone(), ride.id)
        .await
        .unwrap();
    assert_eq!(stored, Some(updated));

    let result = f.engine.rate_ride(f.parent.clone(), ride.id, 6, None).await;
    assert_matches!(result, Err(err) if err.field.as_deref() == Some("rating"));

    let result = f
        .engine
        .rate_ride(User::parent(Uuid::new_v4()), ride.id, 5, None)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());
}

#[tokio::test]
async fn rating_can_be_limited_to_completed_rides() {
    let f = fixture_with(EngineConfig {
        rating_requires_completion: true,
        ..EngineConfig::default()
    })
    .await;

    let ride = f.started_ride().await;

    let result = f.engine.rate_ride(f.parent.clone(), ride.id, 5, None).await;
    assert_matches!(result, Err(err) if err.is_conflict_error());

    f.engine
        .advance_status(f.driver.clone(), ride.id, RideStatus::Completed, None)
        .await
        .unwrap();

    let rating = f
        .engine
        .rate_ride(f.parent.clone(), ride.id, 5, None)
        .await
        .unwrap();
    assert_eq!(rating.parent_rating, Some(5));
}

#[tokio::test]
async fn current_ride_resolution() {
    let f = fixture().await;

    assert_eq!(f.engine.get_current_ride(f.parent.clone()).await.unwrap(), None);

    // a request alone is not a ride
    f.engine
        .create_request(f.parent.clone(), school_run(f.child_id, None))
        .await
        .unwrap();
    assert_eq!(f.engine.get_current_ride(f.parent.clone()).await.unwrap(), None);

    let cancelled = f.accepted_ride().await;
    f.engine
        .advance_status(f.driver.clone(), cancelled.id, RideStatus::Cancelled, None)
        .await
        .unwrap();

    let completed = f.started_ride().await;
    f.engine
        .advance_status(f.driver.clone(), completed.id, RideStatus::Completed, None)
        .await
        .unwrap();

    assert_eq!(f.engine.get_current_ride(f.parent.clone()).await.unwrap(), None);
    assert_eq!(f.engine.get_current_ride(f.driver.clone()).await.unwrap(), None);

    let active = f.accepted_ride().await;

    let for_parent = f.engine.get_current_ride(f.parent.clone()).await.unwrap();
    assert_matches!(for_parent, Some(ride) if ride.id == active.id && !ride.otp.is_empty());

    let for_driver = f.engine.get_current_ride(f.driver.clone()).await.unwrap();
    assert_matches!(for_driver, Some(ride) if ride.id == active.id && ride.otp.is_empty());

    let stranger = User::driver(Uuid::new_v4());
    assert_eq!(f.engine.get_current_ride(stranger).await.unwrap(), None);
}

#[tokio::test]
async fn current_ride_prefers_earliest_pickup() {
    let f = fixture().await;

    let mut later = school_run(f.child_id, Some(1000));
    later.pickup_time = Utc::now() + Duration::hours(5);
    let mut sooner = school_run(f.child_id, Some(1000));
    sooner.pickup_time = Utc::now() + Duration::hours(2);

    let later = f.engine.create_request(f.parent.clone(), later).await.unwrap();
    let sooner = f
        .engine
        .create_request(f.parent.clone(), sooner)
        .await
        .unwrap();

    f.engine
        .accept_request(f.driver.clone(), later.id)
        .await
        .unwrap();
    let expected = f
        .engine
        .accept_request(f.driver.clone(), sooner.id)
        .await
        .unwrap();

    let current = f.engine.get_current_ride(f.driver.clone()).await.unwrap();
    assert_matches!(current, Some(ride) if ride.id == expected.id);
}

#[tokio::test]
async fn ride_view_carries_display_names() {
    let f = fixture().await;
    let ride = f.accepted_ride().await;

    let view = f.engine.find_ride(f.driver.clone(), ride.id).await.unwrap();
    assert_eq!(view.parent_name.as_deref(), Some("Pat Perera"));
    assert_eq!(view.driver_name.as_deref(), Some("Dinesh Silva"));
    assert_eq!(view.child_name.as_deref(), Some("Chamo Perera"));
    assert!(view.ride.otp.is_empty());

    let result = f
        .engine
        .find_ride(User::driver(Uuid::new_v4()), ride.id)
        .await;
    assert_matches!(result, Err(err) if err.is_unauthorized_error());

    let result = f.engine.find_ride(f.driver.clone(), Uuid::new_v4()).await;
    assert_matches!(result, Err(err) if err.is_not_found_error());

    let history = f.engine.list_rides(f.parent.clone()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, ride.id);
}

struct UnreachableSink;

#[async_trait]
impl NotificationSink for UnreachableSink {
    async fn notify(
        &self,
        _user_id: Uuid,
        _title: &str,
        _message: &str,
        _kind: NotificationKind,
        _reference_id: Uuid,
    ) -> Result<(), Error> {
        Err(Error::notification_error("push gateway unreachable"))
    }
}

#[tokio::test]
async fn notification_failure_does_not_undo_transitions() {
    let store = Arc::new(MemoryStore::new());
    let (parent, driver, child_id) = seed(&store).await;

    let engine = Engine::new(
        store.clone(),
        Arc::new(UnreachableSink),
        EngineConfig::default(),
    )
    .unwrap();

    let request = engine
        .create_request(parent.clone(), school_run(child_id, Some(900)))
        .await
        .unwrap();
    let ride = engine
        .accept_request(driver.clone(), request.id)
        .await
        .unwrap();

    let otp = engine
        .find_ride(parent.clone(), ride.id)
        .await
        .unwrap()
        .ride
        .otp;
    engine
        .submit_otp(driver.clone(), ride.id, otp)
        .await
        .unwrap();
    let ride = engine
        .advance_status(driver.clone(), ride.id, RideStatus::Completed, None)
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Completed);
    assert_eq!(engine.find_wallet(driver).await.unwrap().balance, 900);
    assert!(engine.list_notifications(parent).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_engine_config_is_rejected() {
    let store = Arc::new(MemoryStore::new());

    let result = Engine::with_store(
        store,
        EngineConfig {
            otp_length: 3,
            ..EngineConfig::default()
        },
    );

    // Engine is not Debug, so no assert_matches here
    assert!(matches!(result, Err(ref err) if err.is_validation_error()));
}

#[tokio::test]
async fn otp_length_follows_config() {
    let f = fixture_with(EngineConfig {
        otp_length: 6,
        ..EngineConfig::default()
    })
    .await;

    let ride = f.accepted_ride().await;
    assert_eq!(f.otp_of(ride.id).await.len(), 6);
}
