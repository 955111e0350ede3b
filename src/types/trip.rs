//! Trip input — the planner's sole entry-point payload.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::Location;
use crate::error::PlanError;

/// Inputs to [`crate::planner::plan`].
///
/// `planned_start` is carried as a UTC instant plus an IANA `timezone`; the
/// local calendar used for day boundaries throughout the Day Projector and
/// Duty-Timeline Builder (§4.C, §4.D) is `planned_start` converted into
/// `timezone`. This is the only timezone the system ever consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    pub current: Location,
    pub pickup: Location,
    pub dropoff: Location,
    pub cycle_hours_used: f64,
    pub planned_start: DateTime<Utc>,
    pub timezone: Tz,
}

impl TripInput {
    /// Structural validation per §7 `InvalidInput`. Coordinate ranges are
    /// enforced by [`Location::new`] for locations built in-process, but a
    /// `TripInput` deserialized from the CLI's JSON input never goes through
    /// that constructor, so each location is re-checked here before anything
    /// else runs; then the fields that only make sense in combination — the
    /// cycle-hours bound and the pickup/dropoff distinctness invariant from
    /// §3 — are checked.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.current.validate()?;
        self.pickup.validate()?;
        self.dropoff.validate()?;
        if !(0.0..=70.0).contains(&self.cycle_hours_used) {
            return Err(PlanError::InvalidInput(format!(
                "cycleHoursUsed {} out of range [0, 70]",
                self.cycle_hours_used
            )));
        }
        if self.pickup.same_coordinates(&self.dropoff) {
            return Err(PlanError::InvalidInput(
                "pickup and dropoff must not be the same location".to_string(),
            ));
        }
        Ok(())
    }

    /// The local calendar date `planned_start` falls on, per §4.C.
    pub fn local_start(&self) -> chrono::DateTime<Tz> {
        self.planned_start.with_timezone(&self.timezone)
    }
}
