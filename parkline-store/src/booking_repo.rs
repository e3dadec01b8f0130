use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::models::{
    Booking, BookingDetails, BookingPatch, BookingStatus, NewBooking, SpaceStatus, VehicleType,
};
use parkline_core::repository::BookingRepository;
use parkline_core::{CoreError, CoreResult};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{corrupt, map_db_error, storage};

pub struct StoreBookingRepository {
    pool: SqlitePool,
}

impl StoreBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    space_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    vehicle_plate: String,
    vehicle_type: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            space_id: row.space_id,
            start_time: row.start_time,
            end_time: row.end_time,
            vehicle_plate: row.vehicle_plate,
            vehicle_type: row.vehicle_type.parse::<VehicleType>().map_err(corrupt)?,
            status: row.status.parse::<BookingStatus>().map_err(corrupt)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailsRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    space_number: String,
    location: String,
    hourly_rate_cents: i64,
    username: String,
    email: String,
}

impl TryFrom<BookingDetailsRow> for BookingDetails {
    type Error = CoreError;

    fn try_from(row: BookingDetailsRow) -> Result<Self, Self::Error> {
        Ok(BookingDetails {
            booking: Booking::try_from(row.booking)?,
            space_number: row.space_number,
            location: row.location,
            hourly_rate_cents: row.hourly_rate_cents,
            username: row.username,
            email: row.email,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, space_id, start_time, end_time, \
     vehicle_plate, vehicle_type, status, created_at";

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.space_id, b.start_time, b.end_time,
           b.vehicle_plate, b.vehicle_type, b.status, b.created_at,
           p.space_number, p.location, p.hourly_rate_cents,
           u.username, u.email
    FROM bookings b
    JOIN parking_spaces p ON p.id = b.space_id
    JOIN users u ON u.id = b.user_id
"#;

fn into_details(rows: Vec<BookingDetailsRow>) -> CoreResult<Vec<BookingDetails>> {
    rows.into_iter().map(BookingDetails::try_from).collect()
}

/// First active booking on `space_id` whose window intersects `[start, end)`.
async fn find_overlap(
    tx: &mut Transaction<'_, Sqlite>,
    space_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> CoreResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
        r#"
        SELECT start_time, end_time FROM bookings
        WHERE space_id = ?1
          AND status = 'active'
          AND start_time < ?3
          AND ?2 < end_time
          AND (?4 IS NULL OR id != ?4)
        ORDER BY start_time
        LIMIT 1
        "#,
    )
    .bind(space_id)
    .bind(start)
    .bind(end)
    .bind(exclude)
    .fetch_optional(&mut **tx)
    .await
    .map_err(storage)
}

fn conflict(space_number: &str, clash: (DateTime<Utc>, DateTime<Utc>)) -> CoreError {
    CoreError::Conflict(format!(
        "space {} is not available for the requested period (booked {} to {})",
        space_number,
        clash.0.to_rfc3339(),
        clash.1.to_rfc3339()
    ))
}

fn unavailable(space_number: &str, status: SpaceStatus) -> CoreError {
    let reason = match status {
        SpaceStatus::Maintenance => "under maintenance".to_string(),
        other => other.to_string(),
    };
    CoreError::Unavailable(format!("space {} is {}", space_number, reason))
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> CoreResult<Uuid> {
        let id = Uuid::new_v4();
        let start = booking.window.start();
        let end = booking.window.end();

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Check and insert in one statement: the write lock is taken before
        // the overlap is evaluated.
        let inserted = sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, space_id, start_time, end_time,
                vehicle_plate, vehicle_type, status, created_at
            )
            SELECT ?1, ?2, p.id, ?4, ?5, ?6, ?7, 'active', ?8
            FROM parking_spaces p
            WHERE p.id = ?3
              AND p.status = 'active'
              AND NOT EXISTS (
                  SELECT 1 FROM bookings b
                  WHERE b.space_id = p.id
                    AND b.status = 'active'
                    AND b.start_time < ?5
                    AND ?4 < b.end_time
              )
            "#,
        )
        .bind(id)
        .bind(booking.user_id)
        .bind(booking.space_id)
        .bind(start)
        .bind(end)
        .bind(&booking.vehicle_plate)
        .bind(booking.vehicle_type.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, "user"))?;

        if inserted.rows_affected() == 0 {
            let space = sqlx::query_as::<_, (String, String)>(
                "SELECT space_number, status FROM parking_spaces WHERE id = ?1",
            )
            .bind(booking.space_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;

            let (space_number, status) = match space {
                Some(space) => space,
                None => {
                    return Err(CoreError::NotFound(format!(
                        "space {} does not exist",
                        booking.space_id
                    )))
                }
            };

            let status = status.parse::<SpaceStatus>().map_err(corrupt)?;
            if status != SpaceStatus::Active {
                warn!("Rejected booking on space {}: status {}", space_number, status);
                return Err(unavailable(&space_number, status));
            }

            return match find_overlap(&mut tx, booking.space_id, start, end, None).await? {
                Some(clash) => {
                    warn!("Rejected overlapping booking on space {}", space_number);
                    Err(conflict(&space_number, clash))
                }
                None => Err(CoreError::Storage(
                    "booking insert matched no rows".to_string(),
                )),
            };
        }

        sqlx::query("UPDATE parking_spaces SET is_available = 0 WHERE id = ?1")
            .bind(booking.space_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        debug!("Inserted booking {} on space {}", id, booking.space_id);
        Ok(id)
    }

    async fn update_booking(&self, id: Uuid, patch: &BookingPatch) -> CoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // No-op write so the transaction holds the write lock from here on.
        let claimed =
            sqlx::query("UPDATE bookings SET status = status WHERE id = ?1 AND status = 'active'")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;

        if claimed.rows_affected() == 0 {
            return Ok(false);
        }

        let current = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;
        let current = Booking::try_from(current)?;

        let start = patch.start_time.unwrap_or(current.start_time);
        let end = patch.end_time.unwrap_or(current.end_time);
        if end <= start {
            return Err(CoreError::Validation(
                "End time must be after start time".to_string(),
            ));
        }

        if patch.moves_window() {
            if let Some(clash) = find_overlap(&mut tx, current.space_id, start, end, Some(id)).await? {
                let space_number = sqlx::query_scalar::<_, String>(
                    "SELECT space_number FROM parking_spaces WHERE id = ?1",
                )
                .bind(current.space_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage)?;

                warn!("Rejected move of booking {} on space {}", id, space_number);
                return Err(conflict(&space_number, clash));
            }
        }

        sqlx::query(
            r#"
            UPDATE bookings SET
                start_time = ?1,
                end_time = ?2,
                vehicle_plate = COALESCE(?3, vehicle_plate),
                vehicle_type = COALESCE(?4, vehicle_type),
                status = COALESCE(?5, status)
            WHERE id = ?6 AND status = 'active'
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(&patch.vehicle_plate)
        .bind(patch.vehicle_type.map(|v| v.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        if patch.releases_space() {
            sqlx::query(
                r#"
                UPDATE parking_spaces SET is_available = NOT EXISTS (
                    SELECT 1 FROM bookings WHERE space_id = ?1 AND status = 'active'
                )
                WHERE id = ?1
                "#,
            )
            .bind(current.space_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        Ok(true)
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<BookingDetails>> {
        let row = sqlx::query_as::<_, BookingDetailsRow>(&format!(
            "{} WHERE b.id = ?1",
            DETAILS_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(BookingDetails::try_from).transpose()
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, BookingDetailsRow>(&format!(
            "{} WHERE b.user_id = ?1 ORDER BY b.start_time DESC",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        into_details(rows)
    }

    async fn list_active_bookings(&self) -> CoreResult<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, BookingDetailsRow>(&format!(
            "{} WHERE b.status = 'active' ORDER BY b.start_time",
            DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        into_details(rows)
    }

    async fn list_active_for_space(&self, space_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE space_id = ?1 AND status = 'active' ORDER BY start_time",
            BOOKING_COLUMNS
        ))
        .bind(space_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
