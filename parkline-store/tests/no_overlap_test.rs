use chrono::{Duration, TimeZone, Utc};
use parkline_core::models::{
    BookingPatch, BookingStatus, NewBooking, NewParkingSpace, NewUser, VehicleType,
};
use parkline_core::repository::{BookingRepository, SpaceRepository, UserRepository};
use parkline_core::{CoreError, TimeWindow};
use parkline_shared::Masked;
use parkline_store::{DbClient, StoreBookingRepository, StoreSpaceRepository, StoreUserRepository};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Book { start: i64, len: i64 },
    Cancel { pick: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..48, 1i64..8).prop_map(|(start, len)| Op::Book { start, len }),
        1 => any::<usize>().prop_map(|pick| Op::Cancel { pick }),
    ]
}

/// Replays a random sequence of bookings and cancellations against one space
/// and then checks that no two active bookings intersect.
async fn replay(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let db = DbClient::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    let users = StoreUserRepository::new(db.pool.clone());
    let spaces = StoreSpaceRepository::new(db.pool.clone());
    let bookings = StoreBookingRepository::new(db.pool.clone());

    let user_id = users
        .create_user(&NewUser {
            username: "prop".to_string(),
            email: "prop@example.com".to_string(),
            full_name: "Prop Test".to_string(),
            phone: None,
            password_hash: Masked::new("hash".to_string()),
            is_admin: false,
        })
        .await
        .unwrap();
    let space_id = spaces
        .create_space(&NewParkingSpace {
            space_number: "P1".to_string(),
            location: "Roof".to_string(),
            floor: None,
            section: None,
            hourly_rate_cents: 500,
            is_accessible: false,
            is_ev_charging: false,
        })
        .await
        .unwrap();

    let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let mut created = Vec::new();

    for op in ops {
        match op {
            Op::Book { start, len } => {
                let window = TimeWindow::new(
                    base + Duration::hours(start),
                    base + Duration::hours(start + len),
                )
                .unwrap();
                let result = bookings
                    .create_booking(&NewBooking {
                        user_id,
                        space_id,
                        window,
                        vehicle_plate: "PROP1".to_string(),
                        vehicle_type: VehicleType::Car,
                    })
                    .await;
                match result {
                    Ok(id) => created.push(id),
                    Err(CoreError::Conflict(_)) => {}
                    Err(other) => return Err(TestCaseError::fail(format!("{:?}", other))),
                }
            }
            Op::Cancel { pick } => {
                if created.is_empty() {
                    continue;
                }
                let id = created[pick % created.len()];
                bookings
                    .update_booking(id, &BookingPatch::status(BookingStatus::Cancelled))
                    .await
                    .map_err(|e| TestCaseError::fail(format!("{:?}", e)))?;
            }
        }
    }

    let active = bookings.list_active_for_space(space_id).await.unwrap();
    for (i, a) in active.iter().enumerate() {
        for b in active.iter().skip(i + 1) {
            let (wa, wb) = (a.window().unwrap(), b.window().unwrap());
            prop_assert!(!wa.overlaps(&wb), "{:?} overlaps {:?}", wa, wb);
        }
    }

    let space = spaces.get_space(space_id).await.unwrap().unwrap();
    prop_assert_eq!(space.is_available, active.is_empty());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn active_bookings_never_overlap(ops in prop::collection::vec(op(), 1..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(replay(ops))?;
    }
}
