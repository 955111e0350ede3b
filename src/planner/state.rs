//! The simulation state record and its two mutating operations.
//!
//! Per DESIGN NOTES §9 ("implicit current time advanced by scattered
//! mutation"), every counter advancement in the whole Planner funnels
//! through exactly these two operations so their effect on each counter is
//! spelled out once and tested once.

use chrono::{DateTime, Utc};

use crate::types::StopType;

/// Mutable simulation state threaded through one `plan()` call. Value-typed
/// and owned exclusively by the Planner for the duration of that call — see
/// §5, "the Planner owns its state exclusively for its lifetime".
#[derive(Debug, Clone)]
pub struct SimState {
    /// Monotonic clock along the plan.
    pub now: DateTime<Utc>,
    pub cum_miles: f64,
    /// Driving hours since the last 10-hour reset.
    pub day_driving: f64,
    /// On-duty hours (driving + non-driving) since the last 10-hour reset.
    pub day_on_duty: f64,
    /// Driving hours since the last 30-minute break or 10-hour reset.
    pub since_break: f64,
    /// Miles since the last fuel stop.
    pub since_fuel: f64,
}

impl SimState {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: start,
            cum_miles: 0.0,
            day_driving: 0.0,
            day_on_duty: 0.0,
            since_break: 0.0,
            since_fuel: 0.0,
        }
    }

    /// Advance the clock by `hours` of driving over `miles`. Updates every
    /// counter driving affects (§4.B "Driving-power accounting").
    pub fn drive_for(&mut self, hours: f64, miles: f64) {
        self.now += chrono::Duration::milliseconds((hours * 3_600_000.0).round() as i64);
        self.cum_miles += miles;
        self.day_driving += hours;
        self.day_on_duty += hours;
        self.since_break += hours;
        self.since_fuel += miles;
    }

    /// Dwell at a stop of `stop_type` for `minutes`, applying the reset
    /// semantics for that stop kind (§4.B "Reset semantics").
    pub fn dwell_at(&mut self, stop_type: StopType, minutes: i64) {
        self.now += chrono::Duration::minutes(minutes);

        match stop_type {
            StopType::Current => {}
            StopType::Pickup | StopType::Dropoff => {
                self.day_on_duty += minutes as f64 / 60.0;
            }
            StopType::Fuel => {
                self.day_on_duty += minutes as f64 / 60.0;
                self.since_fuel = 0.0;
            }
            StopType::Break30Min => {
                self.since_break = 0.0;
            }
            StopType::Break10Hr => {
                self.day_driving = 0.0;
                self.day_on_duty = 0.0;
                self.since_break = 0.0;
            }
        }
    }
}
