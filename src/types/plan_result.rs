//! The top-level result returned by [`crate::planner::plan`].

use serde::{Deserialize, Serialize};

use super::{DailyLog, Stop};
use crate::services::map_provider::RouteGeometry;

/// Overall feasibility reported alongside a successful plan. `NonCompliant`
/// is unreachable from a successful [`PlanResult`] — a trip that would
/// exceed the cycle fails the feasibility gate (§4.B) before simulation and
/// never produces one. See DESIGN.md for the `Warning` threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    NonCompliant,
}

/// Trip-wide route summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub total_distance_miles: f64,
    pub total_duration_hours: f64,
    pub driving_hours: f64,
    pub on_duty_hours: f64,
    pub off_duty_hours: f64,
    pub compliance_status: ComplianceStatus,
    pub geometry: RouteGeometry,
    pub break_count_30_min: u32,
    pub fuel_stop_count: u32,
    pub break_count_10_hr: u32,
}

/// The full output of planning a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub route: RouteSummary,
    pub stops: Vec<Stop>,
    pub daily_logs: Vec<DailyLog>,
    pub days_required: u32,
}
