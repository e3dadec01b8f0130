use chrono::{DateTime, Duration, TimeZone, Utc};
use parkline_core::models::{
    BookingPatch, BookingStatus, NewBooking, NewParkingSpace, NewPayment, NewUser, PaymentMethod,
    PaymentStatus, SpacePatch, SpaceStatus, UserPatch, VehicleType,
};
use parkline_core::repository::{
    BookingRepository, PaymentRepository, SpaceRepository, UserRepository,
};
use parkline_core::{CoreError, TimeWindow};
use parkline_shared::Masked;
use parkline_store::{
    DbClient, StoreBookingRepository, StorePaymentRepository, StoreSpaceRepository,
    StoreUserRepository,
};
use uuid::Uuid;

struct Repos {
    users: StoreUserRepository,
    spaces: StoreSpaceRepository,
    bookings: StoreBookingRepository,
    payments: StorePaymentRepository,
}

async fn setup() -> Repos {
    let db = DbClient::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    Repos {
        users: StoreUserRepository::new(db.pool.clone()),
        spaces: StoreSpaceRepository::new(db.pool.clone()),
        bookings: StoreBookingRepository::new(db.pool.clone()),
        payments: StorePaymentRepository::new(db.pool),
    }
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: "Test Driver".to_string(),
        phone: None,
        password_hash: Masked::new("hash".to_string()),
        is_admin: false,
    }
}

fn new_space(number: &str) -> NewParkingSpace {
    NewParkingSpace {
        space_number: number.to_string(),
        location: "Level 1".to_string(),
        floor: Some("1".to_string()),
        section: None,
        hourly_rate_cents: 500,
        is_accessible: false,
        is_ev_charging: true,
    }
}

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn booking(user_id: Uuid, space_id: Uuid, from: i64, to: i64) -> NewBooking {
    NewBooking {
        user_id,
        space_id,
        window: TimeWindow::new(at(from), at(to)).unwrap(),
        vehicle_plate: "ABC123".to_string(),
        vehicle_type: VehicleType::Car,
    }
}

async fn user_and_space(repos: &Repos) -> (Uuid, Uuid) {
    let user = repos.users.create_user(&new_user("driver")).await.unwrap();
    let space = repos.spaces.create_space(&new_space("A1")).await.unwrap();
    (user, space)
}

async fn is_available(repos: &Repos, space: Uuid) -> bool {
    repos.spaces.get_space(space).await.unwrap().unwrap().is_available
}

#[tokio::test]
async fn test_duplicate_username_is_integrity_error() {
    let repos = setup().await;
    repos.users.create_user(&new_user("alice")).await.unwrap();

    let err = repos.users.create_user(&new_user("alice")).await.unwrap_err();
    match err {
        CoreError::Integrity(msg) => assert_eq!(msg, "username or email already exists"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_user_update_and_lookup() {
    let repos = setup().await;
    let id = repos.users.create_user(&new_user("bob")).await.unwrap();

    assert!(!repos.users.update_user(id, &UserPatch::default()).await.unwrap());

    let patch = UserPatch {
        full_name: Some("Robert".to_string()),
        ..Default::default()
    };
    assert!(repos.users.update_user(id, &patch).await.unwrap());

    let user = repos.users.get_user_by_username("bob").await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.full_name, "Robert");
    assert_eq!(user.email, "bob@example.com");
    assert!(repos.users.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_space_number_is_integrity_error() {
    let repos = setup().await;
    repos.spaces.create_space(&new_space("B7")).await.unwrap();

    let err = repos.spaces.create_space(&new_space("B7")).await.unwrap_err();
    assert!(matches!(err, CoreError::Integrity(ref msg) if msg == "space number already exists"));
}

#[tokio::test]
async fn test_space_patch_and_status() {
    let repos = setup().await;
    let id = repos.spaces.create_space(&new_space("C3")).await.unwrap();

    assert!(repos
        .spaces
        .update_space(id, &SpacePatch::status(SpaceStatus::Maintenance))
        .await
        .unwrap());

    let space = repos.spaces.get_space(id).await.unwrap().unwrap();
    assert_eq!(space.status, SpaceStatus::Maintenance);
    assert!(space.is_available);
    assert!(space.is_ev_charging);
    assert!(repos.spaces.list_available_spaces().await.unwrap().is_empty());
    assert_eq!(repos.spaces.list_spaces().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_booking_holds_space() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;

    let id = repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();

    let details = repos.bookings.get_booking(id).await.unwrap().unwrap();
    assert_eq!(details.booking.status, BookingStatus::Active);
    assert_eq!(details.booking.start_time, at(10));
    assert_eq!(details.space_number, "A1");
    assert_eq!(details.username, "driver");

    let space = repos.spaces.get_space(space).await.unwrap().unwrap();
    assert!(!space.is_available);
    assert!(repos.spaces.list_available_spaces().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_abutting_booking_is_accepted() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;

    repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 12, 14)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();

    assert_eq!(repos.bookings.list_active_for_space(space).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_overlapping_booking_is_conflict_and_writes_nothing() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;

    repos.bookings.create_booking(&booking(user, space, 10, 18)).await.unwrap();

    for (from, to) in [(12, 14), (8, 11), (17, 20), (6, 22)] {
        let err = repos
            .bookings
            .create_booking(&booking(user, space, from, to))
            .await
            .unwrap_err();
        match err {
            CoreError::Conflict(msg) => {
                assert!(msg.starts_with("space A1 is not available for the requested period"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(repos.bookings.list_active_for_space(space).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_unknown_space_or_user() {
    let repos = setup().await;
    let (user, _) = user_and_space(&repos).await;

    let err = repos
        .bookings
        .create_booking(&booking(user, Uuid::new_v4(), 10, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let space = repos.spaces.create_space(&new_space("D1")).await.unwrap();
    let err = repos
        .bookings
        .create_booking(&booking(Uuid::new_v4(), space, 10, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_booking_space_under_maintenance() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    repos
        .spaces
        .update_space(space, &SpacePatch::status(SpaceStatus::Maintenance))
        .await
        .unwrap();

    let err = repos
        .bookings
        .create_booking(&booking(user, space, 10, 12))
        .await
        .unwrap_err();
    match err {
        CoreError::Unavailable(msg) => assert_eq!(msg, "space A1 is under maintenance"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_then_rebook_round_trips_availability() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    assert!(is_available(&repos, space).await);
    let first = repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();
    assert!(!is_available(&repos, space).await);

    let cancel = BookingPatch::status(BookingStatus::Cancelled);
    assert!(repos.bookings.update_booking(first, &cancel).await.unwrap());
    assert!(is_available(&repos, space).await);

    repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();
    assert!(!is_available(&repos, space).await);
}

#[tokio::test]
async fn test_terminal_transition_applies_once() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    let id = repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();

    let complete = BookingPatch::status(BookingStatus::Completed);
    assert!(repos.bookings.update_booking(id, &complete).await.unwrap());
    assert!(!repos.bookings.update_booking(id, &complete).await.unwrap());

    let cancel = BookingPatch::status(BookingStatus::Cancelled);
    assert!(!repos.bookings.update_booking(id, &cancel).await.unwrap());

    let details = repos.bookings.get_booking(id).await.unwrap().unwrap();
    assert_eq!(details.booking.status, BookingStatus::Completed);
}

#[tokio::test]
async fn test_release_keeps_space_held_by_other_booking() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    let morning = repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 10, 12)).await.unwrap();

    let cancel = BookingPatch::status(BookingStatus::Cancelled);
    assert!(repos.bookings.update_booking(morning, &cancel).await.unwrap());

    let space = repos.spaces.get_space(space).await.unwrap().unwrap();
    assert!(!space.is_available);
}

#[tokio::test]
async fn test_moving_window_rechecks_overlap() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    let first = repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 12, 14)).await.unwrap();

    // Extending into its own window is fine
    let extend = BookingPatch {
        end_time: Some(at(12)),
        ..Default::default()
    };
    assert!(repos.bookings.update_booking(first, &extend).await.unwrap());

    let clash = BookingPatch {
        end_time: Some(at(13)),
        ..Default::default()
    };
    let err = repos.bookings.update_booking(first, &clash).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let inverted = BookingPatch {
        start_time: Some(at(12)),
        ..Default::default()
    };
    let err = repos.bookings.update_booking(first, &inverted).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let details = repos.bookings.get_booking(first).await.unwrap().unwrap();
    assert_eq!(details.booking.start_time, at(8));
    assert_eq!(details.booking.end_time, at(12));
}

#[tokio::test]
async fn test_update_vehicle_fields() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    let id = repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();

    let patch = BookingPatch {
        vehicle_plate: Some("XYZ789".to_string()),
        vehicle_type: Some(VehicleType::Suv),
        ..Default::default()
    };
    assert!(repos.bookings.update_booking(id, &patch).await.unwrap());
    assert!(!repos.bookings.update_booking(id, &BookingPatch::default()).await.unwrap());
    assert!(!repos.bookings.update_booking(Uuid::new_v4(), &patch).await.unwrap());

    let details = repos.bookings.get_booking(id).await.unwrap().unwrap();
    assert_eq!(details.booking.vehicle_plate, "XYZ789");
    assert_eq!(details.booking.vehicle_type, VehicleType::Suv);
}

#[tokio::test]
async fn test_user_bookings_newest_first() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 20, 22)).await.unwrap();
    repos.bookings.create_booking(&booking(user, space, 12, 14)).await.unwrap();

    let starts: Vec<_> = repos
        .bookings
        .list_user_bookings(user)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.booking.start_time)
        .collect();
    assert_eq!(starts, vec![at(20), at(12), at(8)]);

    let active = repos.bookings.list_active_bookings().await.unwrap();
    assert_eq!(active.first().map(|d| d.booking.start_time), Some(at(8)));
}

#[tokio::test]
async fn test_space_with_bookings_cannot_be_deleted() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();

    let err = repos.spaces.delete_space(space).await.unwrap_err();
    assert!(matches!(err, CoreError::Integrity(_)));

    let empty = repos.spaces.create_space(&new_space("Z9")).await.unwrap();
    assert!(repos.spaces.delete_space(empty).await.unwrap());
    assert!(!repos.spaces.delete_space(empty).await.unwrap());
}

#[tokio::test]
async fn test_payment_transitions_are_conditional() {
    let repos = setup().await;
    let (user, space) = user_and_space(&repos).await;
    let booking_id = repos.bookings.create_booking(&booking(user, space, 8, 10)).await.unwrap();

    let id = repos
        .payments
        .create_payment(&NewPayment {
            booking_id,
            amount_cents: 1000,
            payment_method: PaymentMethod::CreditCard,
        })
        .await
        .unwrap();

    let paid_at = at(11);
    assert!(repos
        .payments
        .transition_payment(id, PaymentStatus::Pending, PaymentStatus::Completed, Some("txn-1"), Some(paid_at))
        .await
        .unwrap());
    assert!(!repos
        .payments
        .transition_payment(id, PaymentStatus::Pending, PaymentStatus::Completed, Some("txn-2"), Some(paid_at))
        .await
        .unwrap());

    let payment = repos.payments.get_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.transaction_id.as_deref(), Some("txn-1"));
    assert_eq!(payment.payment_date, Some(paid_at));

    assert!(repos
        .payments
        .transition_payment(id, PaymentStatus::Completed, PaymentStatus::Refunded, None, None)
        .await
        .unwrap());
    let payment = repos.payments.get_payment(id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
    assert_eq!(payment.transaction_id.as_deref(), Some("txn-1"));

    assert_eq!(repos.payments.list_booking_payments(booking_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_for_unknown_booking() {
    let repos = setup().await;
    let err = repos
        .payments
        .create_payment(&NewPayment {
            booking_id: Uuid::new_v4(),
            amount_cents: 100,
            payment_method: PaymentMethod::Cash,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}
