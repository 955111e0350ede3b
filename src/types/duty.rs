//! Duty status and the per-day segments built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four FMCSA duty statuses (§3, Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyStatus {
    OffDuty,
    Sleeper,
    Driving,
    OnDutyNotDriving,
}

/// A single gap-free segment of a day's duty-status timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutySegment {
    pub status: DutyStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub remarks: String,
}

impl DutySegment {
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}
