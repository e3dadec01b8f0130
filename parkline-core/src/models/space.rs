use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Operational status of a space, set by administrators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpaceStatus {
    Active,
    Maintenance,
    Reserved,
    Inactive,
}

impl SpaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceStatus::Active => "active",
            SpaceStatus::Maintenance => "maintenance",
            SpaceStatus::Reserved => "reserved",
            SpaceStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SpaceStatus::Active),
            "maintenance" => Ok(SpaceStatus::Maintenance),
            "reserved" => Ok(SpaceStatus::Reserved),
            "inactive" => Ok(SpaceStatus::Inactive),
            other => Err(CoreError::Validation(format!("Unknown space status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: Uuid,
    pub space_number: String,
    pub location: String,
    pub floor: Option<String>,
    pub section: Option<String>,
    pub hourly_rate_cents: i64,
    pub is_accessible: bool,
    pub is_ev_charging: bool,
    /// Current occupancy. Owned by the booking lifecycle, never patched directly.
    pub is_available: bool,
    pub status: SpaceStatus,
    pub created_at: DateTime<Utc>,
}

impl ParkingSpace {
    pub fn is_bookable(&self) -> bool {
        self.status == SpaceStatus::Active
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParkingSpace {
    pub space_number: String,
    pub location: String,
    pub floor: Option<String>,
    pub section: Option<String>,
    pub hourly_rate_cents: i64,
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default)]
    pub is_ev_charging: bool,
}

/// Admin-editable fields. `is_available` is intentionally absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpacePatch {
    pub space_number: Option<String>,
    pub location: Option<String>,
    pub floor: Option<String>,
    pub section: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub is_accessible: Option<bool>,
    pub is_ev_charging: Option<bool>,
    pub status: Option<SpaceStatus>,
}

impl SpacePatch {
    pub fn status(status: SpaceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.space_number.is_none()
            && self.location.is_none()
            && self.floor.is_none()
            && self.section.is_none()
            && self.hourly_rate_cents.is_none()
            && self.is_accessible.is_none()
            && self.is_ev_charging.is_none()
            && self.status.is_none()
    }
}
