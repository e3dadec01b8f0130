use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::models::{NewParkingSpace, ParkingSpace, SpacePatch, SpaceStatus};
use parkline_core::repository::SpaceRepository;
use parkline_core::{CoreError, CoreResult};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{corrupt, map_db_error, storage};

pub struct StoreSpaceRepository {
    pool: SqlitePool,
}

impl StoreSpaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SpaceRow {
    id: Uuid,
    space_number: String,
    location: String,
    floor: Option<String>,
    section: Option<String>,
    hourly_rate_cents: i64,
    is_accessible: bool,
    is_ev_charging: bool,
    is_available: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SpaceRow> for ParkingSpace {
    type Error = CoreError;

    fn try_from(row: SpaceRow) -> Result<Self, Self::Error> {
        Ok(ParkingSpace {
            id: row.id,
            space_number: row.space_number,
            location: row.location,
            floor: row.floor,
            section: row.section,
            hourly_rate_cents: row.hourly_rate_cents,
            is_accessible: row.is_accessible,
            is_ev_charging: row.is_ev_charging,
            is_available: row.is_available,
            status: row.status.parse::<SpaceStatus>().map_err(corrupt)?,
            created_at: row.created_at,
        })
    }
}

const SPACE_COLUMNS: &str = "id, space_number, location, floor, section, hourly_rate_cents, \
     is_accessible, is_ev_charging, is_available, status, created_at";

fn into_spaces(rows: Vec<SpaceRow>) -> CoreResult<Vec<ParkingSpace>> {
    rows.into_iter().map(ParkingSpace::try_from).collect()
}

#[async_trait]
impl SpaceRepository for StoreSpaceRepository {
    async fn create_space(&self, space: &NewParkingSpace) -> CoreResult<Uuid> {
        if space.hourly_rate_cents < 0 {
            return Err(CoreError::Validation(
                "Hourly rate cannot be negative".to_string(),
            ));
        }

        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO parking_spaces (
                id, space_number, location, floor, section,
                hourly_rate_cents, is_accessible, is_ev_charging,
                is_available, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, 'active', ?9)
            "#,
        )
        .bind(id)
        .bind(&space.space_number)
        .bind(&space.location)
        .bind(&space.floor)
        .bind(&space.section)
        .bind(space.hourly_rate_cents)
        .bind(space.is_accessible)
        .bind(space.is_ev_charging)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "space number"))?;

        Ok(id)
    }

    async fn get_space(&self, id: Uuid) -> CoreResult<Option<ParkingSpace>> {
        let row = sqlx::query_as::<_, SpaceRow>(&format!(
            "SELECT {} FROM parking_spaces WHERE id = ?1",
            SPACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(ParkingSpace::try_from).transpose()
    }

    async fn list_spaces(&self) -> CoreResult<Vec<ParkingSpace>> {
        let rows = sqlx::query_as::<_, SpaceRow>(&format!(
            "SELECT {} FROM parking_spaces ORDER BY space_number",
            SPACE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        into_spaces(rows)
    }

    async fn list_available_spaces(&self) -> CoreResult<Vec<ParkingSpace>> {
        let rows = sqlx::query_as::<_, SpaceRow>(&format!(
            "SELECT {} FROM parking_spaces \
             WHERE is_available = 1 AND status = 'active' \
             ORDER BY space_number",
            SPACE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        into_spaces(rows)
    }

    async fn update_space(&self, id: Uuid, patch: &SpacePatch) -> CoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        if matches!(patch.hourly_rate_cents, Some(rate) if rate < 0) {
            return Err(CoreError::Validation(
                "Hourly rate cannot be negative".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE parking_spaces SET
                space_number = COALESCE(?1, space_number),
                location = COALESCE(?2, location),
                floor = COALESCE(?3, floor),
                section = COALESCE(?4, section),
                hourly_rate_cents = COALESCE(?5, hourly_rate_cents),
                is_accessible = COALESCE(?6, is_accessible),
                is_ev_charging = COALESCE(?7, is_ev_charging),
                status = COALESCE(?8, status)
            WHERE id = ?9
            "#,
        )
        .bind(&patch.space_number)
        .bind(&patch.location)
        .bind(&patch.floor)
        .bind(&patch.section)
        .bind(patch.hourly_rate_cents)
        .bind(patch.is_accessible)
        .bind(patch.is_ev_charging)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "space number"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_space(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM parking_spaces WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_foreign_key_violation() {
                        return CoreError::Integrity(format!("space {} still has bookings", id));
                    }
                }
                storage(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
