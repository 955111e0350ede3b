//! Stops and the implicit drive intervals between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Location;

/// The kind of stop inserted by the Planner (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopType {
    Current,
    Pickup,
    Dropoff,
    Fuel,
    // `rename_all` only inserts `_` before an uppercase letter, not around a
    // digit, so these two need an explicit literal rename to match spec.md
    // §3's `BREAK_30MIN` / `BREAK_10HR` wire tokens exactly.
    #[serde(rename = "BREAK_30MIN")]
    Break30Min,
    #[serde(rename = "BREAK_10HR")]
    Break10Hr,
}

impl StopType {
    /// Minutes the stop dwells for, per the §4.B constants table. `Current`
    /// has zero duration; `Break10Hr` is the one case the Planner computes
    /// dynamically is not here — it is always exactly 600 minutes.
    pub fn fixed_duration_minutes(self) -> i64 {
        match self {
            StopType::Current => 0,
            StopType::Pickup | StopType::Dropoff => 60,
            StopType::Fuel => 30,
            StopType::Break30Min => 30,
            StopType::Break10Hr => 600,
        }
    }
}

/// An ordered stop on the itinerary. Immutable once the Planner emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub sequence: u32,
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub location: Location,
    pub arrival: DateTime<Utc>,
    pub departure: DateTime<Utc>,
    pub duration_minutes: i64,
    pub description: String,
    pub cumulative_miles: f64,
    pub miles_from_previous: f64,
}

/// The implicit driving interval between two consecutive stops. Not stored —
/// derived on demand by the Day Projector and Duty-Timeline Builder.
#[derive(Debug, Clone)]
pub struct DriveInterval<'a> {
    pub from: &'a Stop,
    pub to: &'a Stop,
}

impl<'a> DriveInterval<'a> {
    pub fn start(&self) -> DateTime<Utc> {
        self.from.departure
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.to.arrival
    }

    pub fn miles(&self) -> f64 {
        (self.to.cumulative_miles - self.from.cumulative_miles).max(0.0)
    }
}

/// Build the drive intervals implicit between consecutive stops.
pub fn drive_intervals(stops: &[Stop]) -> Vec<DriveInterval<'_>> {
    stops
        .windows(2)
        .map(|pair| DriveInterval {
            from: &pair[0],
            to: &pair[1],
        })
        .collect()
}
