//! Per-day duty log produced by the Duty-Timeline Builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DutySegment;

/// Hour totals by duty status for one [`DailyLog`]. The four fields sum to
/// 24.00h within ±0.02h (§3 invariant).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    pub driving: f64,
    pub on_duty_not_driving: f64,
    pub off_duty: f64,
    pub sleeper: f64,
}

impl DailyTotals {
    pub fn sum(&self) -> f64 {
        self.driving + self.on_duty_not_driving + self.off_duty + self.sleeper
    }
}

/// One midnight-to-midnight record in the driver's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub day_number: u32,
    pub date: NaiveDate,
    pub start_location: String,
    pub end_location: String,
    pub totals: DailyTotals,
    pub miles: f64,
    pub segments: Vec<DutySegment>,
}
