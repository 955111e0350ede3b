//! The Planner: the driving-with-breaks state machine (§4.B).

mod state;

pub use state::SimState;

use tracing::{debug, info};

use crate::day_projector;
use crate::duty_timeline;
use crate::error::{MapError, PlanError};
use crate::services::map_provider::{MapProvider, PoiKind, RouteGeometry};
use crate::types::{
    ComplianceStatus, DailyLog, Location, PlanResult, RouteSummary, Stop, StopType, TripInput,
};

/// Fraction of `CYCLE_HOURS_CAP` slack below which a feasible trip is still
/// reported `WARNING` rather than `COMPLIANT` — close enough to the cap that
/// a small real-world delay could tip it into infeasible. Not specified by
/// regulation; see DESIGN.md.
const WARNING_SLACK_FRACTION: f64 = 0.10;

/// HOS constants for the 70-hour/8-day cycle (§4.B). Declared as a single
/// table so regulatory tuning never touches the state machine itself.
pub mod hos {
    pub const MAX_DRIVING_HOURS_PER_DAY: f64 = 11.0;
    pub const MAX_ON_DUTY_HOURS_PER_DAY: f64 = 14.0;
    pub const DRIVING_HOURS_BEFORE_BREAK: f64 = 8.0;
    pub const OFF_DUTY_RESET_MINUTES: i64 = 600;
    pub const CYCLE_HOURS_CAP: f64 = 70.0;
    pub const AVERAGE_SPEED_MPH: f64 = 55.0;
    pub const FUEL_STOP_INTERVAL_MILES: f64 = 1000.0;
    pub const FUEL_STOP_DURATION_MINUTES: i64 = 30;
    pub const PICKUP_DROPOFF_DURATION_MINUTES: i64 = 60;
    pub const BREAK_30MIN_DURATION_MINUTES: i64 = 30;
}

/// Structural validation only (§7 `InvalidInput`) — no `MapProvider` call.
/// Backs the CLI's `validate` subcommand, letting a caller reject obviously
/// bad input before spending a network round trip.
pub fn validate(input: &TripInput) -> Result<(), PlanError> {
    input.validate()
}

/// Run the feasibility gate against an already-fetched base route duration,
/// without needing a `MapProvider` handle. Exposed so callers that already
/// hold route data (e.g. a cached quote) can pre-check feasibility.
pub fn check_feasibility(cycle_hours_used: f64, base_route_duration_hours: f64) -> Result<(), PlanError> {
    let available = hos::CYCLE_HOURS_CAP - cycle_hours_used;
    if available < base_route_duration_hours {
        return Err(PlanError::InfeasibleCycle {
            needed: base_route_duration_hours,
            available,
        });
    }
    Ok(())
}

/// Accumulates `Stop`s in strict sequence order, tracking cumulative miles.
struct StopBuilder {
    stops: Vec<Stop>,
}

impl StopBuilder {
    fn new() -> Self {
        Self { stops: Vec::new() }
    }

    fn push(&mut self, state: &SimState, stop_type: StopType, location: Location, duration_minutes: i64, description: &str) {
        let previous_miles = self.stops.last().map(|s| s.cumulative_miles).unwrap_or(0.0);
        let arrival = state.now;
        let departure = arrival + chrono::Duration::minutes(duration_minutes);
        self.stops.push(Stop {
            sequence: self.stops.len() as u32,
            stop_type,
            location,
            arrival,
            departure,
            duration_minutes,
            description: description.to_string(),
            cumulative_miles: state.cum_miles,
            miles_from_previous: (state.cum_miles - previous_miles).max(0.0),
        });
    }
}

/// Run the Planner: validate, check feasibility, then simulate leg0 and
/// leg1, inserting every mandatory break and fuel stop (§4.B).
pub async fn plan_stops(
    input: &TripInput,
    provider: &dyn MapProvider,
) -> Result<Vec<Stop>, PlanError> {
    Ok(simulate(input, provider).await?.0)
}

/// Run the Planner and project + build the full daily-log timeline,
/// producing the top-level [`PlanResult`] (§6).
pub async fn plan(input: &TripInput, provider: &dyn MapProvider) -> Result<PlanResult, PlanError> {
    let (stops, base_distance_miles, base_duration_hours, base_geometry) = simulate(input, provider).await?;

    let projected = day_projector::project(&stops, input.timezone);

    let mut daily_logs: Vec<DailyLog> = Vec::with_capacity(projected.len());
    for (day_number, (date, slices)) in projected.iter().enumerate() {
        daily_logs.push(duty_timeline::build_daily_log(
            (day_number + 1) as u32,
            *date,
            slices,
            input.timezone,
        )?);
    }

    // Three buckets, not the four of DailyTotals: SLEEPER is folded into
    // off-duty here since the trip-wide summary only distinguishes driving,
    // on-duty-not-driving, and everything else (see DESIGN.md).
    let driving_hours: f64 = daily_logs.iter().map(|d| d.totals.driving).sum();
    let on_duty_hours: f64 = daily_logs.iter().map(|d| d.totals.on_duty_not_driving).sum();
    let off_duty_hours: f64 = daily_logs.iter().map(|d| d.totals.off_duty + d.totals.sleeper).sum();

    let break_count_30_min = stops.iter().filter(|s| s.stop_type == StopType::Break30Min).count() as u32;
    let break_count_10_hr = stops.iter().filter(|s| s.stop_type == StopType::Break10Hr).count() as u32;
    let fuel_stop_count = stops.iter().filter(|s| s.stop_type == StopType::Fuel).count() as u32;

    let available = hos::CYCLE_HOURS_CAP - input.cycle_hours_used;
    let slack = available - base_duration_hours;
    let compliance_status = if slack <= hos::CYCLE_HOURS_CAP * WARNING_SLACK_FRACTION {
        ComplianceStatus::Warning
    } else {
        ComplianceStatus::Compliant
    };

    duty_timeline::assert_day_count_matches(&daily_logs, &stops, input.timezone);
    let days_required = daily_logs.len() as u32;

    let total_duration_hours = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (last.departure - first.arrival).num_seconds() as f64 / 3600.0,
        _ => base_duration_hours,
    };

    Ok(PlanResult {
        route: RouteSummary {
            total_distance_miles: stops.last().map(|s| s.cumulative_miles).unwrap_or(base_distance_miles),
            total_duration_hours,
            driving_hours,
            on_duty_hours,
            off_duty_hours,
            compliance_status,
            geometry: base_geometry,
            break_count_30_min,
            fuel_stop_count,
            break_count_10_hr,
        },
        stops,
        daily_logs,
        days_required,
    })
}

/// Shared simulation core for [`plan_stops`] and [`plan`]: validate, check
/// feasibility, then simulate leg0 and leg1. Returns the stop list alongside
/// the base route's own distance/duration/geometry for the overall
/// [`RouteSummary`].
async fn simulate(
    input: &TripInput,
    provider: &dyn MapProvider,
) -> Result<(Vec<Stop>, f64, f64, RouteGeometry), PlanError> {
    input.validate()?;

    let base_route = provider
        .route(&[input.current.clone(), input.pickup.clone(), input.dropoff.clone()])
        .await
        .map_err(PlanError::MapError)?;

    if base_route.legs.len() != 2 {
        return Err(PlanError::MapError(MapError::Transport(format!(
            "expected 2 legs from a 3-waypoint route, got {}",
            base_route.legs.len()
        ))));
    }

    check_feasibility(input.cycle_hours_used, base_route.duration_hours)?;

    // leg1 gets its own dedicated route fetch: the Planner needs geometry
    // scoped to pickup→dropoff alone to interpolate break/fuel locations
    // (§4.B "Location selection for inserted stops"), and the combined
    // base-route geometry does not expose a leg boundary to slice on.
    let leg1_route = provider
        .route(&[input.pickup.clone(), input.dropoff.clone()])
        .await
        .map_err(PlanError::MapError)?;

    let mut state = SimState::new(input.planned_start);
    let mut builder = StopBuilder::new();

    builder.push(&state, StopType::Current, input.current.clone(), 0, "Trip start");

    // leg0 (current -> pickup): one atomic drive using the route's own
    // reported duration/distance, no break logic applied (§4.B step 2).
    let leg0 = base_route.legs[0];
    state.drive_for(leg0.duration_hours, leg0.distance_miles);
    builder.push(
        &state,
        StopType::Pickup,
        input.pickup.clone(),
        hos::PICKUP_DROPOFF_DURATION_MINUTES,
        "Load pickup (1 hour)",
    );
    state.dwell_at(StopType::Pickup, hos::PICKUP_DROPOFF_DURATION_MINUTES);

    drive_leg1_with_breaks(&mut state, &mut builder, input, provider, &leg1_route).await?;

    builder.push(
        &state,
        StopType::Dropoff,
        input.dropoff.clone(),
        hos::PICKUP_DROPOFF_DURATION_MINUTES,
        "Load delivery (1 hour)",
    );
    state.dwell_at(StopType::Dropoff, hos::PICKUP_DROPOFF_DURATION_MINUTES);

    info!(
        stops = builder.stops.len(),
        miles = state.cum_miles,
        "plan complete"
    );

    Ok((builder.stops, base_route.distance_miles, base_route.duration_hours, base_route.geometry))
}

/// The inner loop: traverse leg1 (pickup -> dropoff), inserting every
/// mandatory break and fuel stop in strict priority order until the leg is
/// exhausted (§4.B "Inner loop").
async fn drive_leg1_with_breaks(
    state: &mut SimState,
    builder: &mut StopBuilder,
    input: &TripInput,
    provider: &dyn MapProvider,
    leg1_route: &crate::services::map_provider::RouteResponse,
) -> Result<(), PlanError> {
    let total_leg1_miles = leg1_route.distance_miles;
    let mut remaining = total_leg1_miles;

    while remaining > 0.0 {
        let distance_covered_in_leg = total_leg1_miles - remaining;

        if state.since_break >= hos::DRIVING_HOURS_BEFORE_BREAK {
            let location = locate_inserted_stop(
                state,
                provider,
                leg1_route,
                distance_covered_in_leg,
                total_leg1_miles,
                PoiKind::Rest,
            )
            .await;
            builder.push(
                state,
                StopType::Break30Min,
                location,
                hos::BREAK_30MIN_DURATION_MINUTES,
                "Mandatory 30-minute break",
            );
            state.dwell_at(StopType::Break30Min, hos::BREAK_30MIN_DURATION_MINUTES);
            continue;
        }

        if state.day_driving >= hos::MAX_DRIVING_HOURS_PER_DAY || state.day_on_duty >= hos::MAX_ON_DUTY_HOURS_PER_DAY {
            let location = locate_inserted_stop(
                state,
                provider,
                leg1_route,
                distance_covered_in_leg,
                total_leg1_miles,
                PoiKind::Lodging,
            )
            .await;
            builder.push(
                state,
                StopType::Break10Hr,
                location,
                hos::OFF_DUTY_RESET_MINUTES,
                "Mandatory 10-hour off-duty rest period",
            );
            state.dwell_at(StopType::Break10Hr, hos::OFF_DUTY_RESET_MINUTES);
            continue;
        }

        if state.since_fuel >= hos::FUEL_STOP_INTERVAL_MILES {
            let location = locate_inserted_stop(
                state,
                provider,
                leg1_route,
                distance_covered_in_leg,
                total_leg1_miles,
                PoiKind::Fuel,
            )
            .await;
            builder.push(
                state,
                StopType::Fuel,
                location,
                hos::FUEL_STOP_DURATION_MINUTES,
                "Refueling stop",
            );
            state.dwell_at(StopType::Fuel, hos::FUEL_STOP_DURATION_MINUTES);
            continue;
        }

        let h_drv = (hos::DRIVING_HOURS_BEFORE_BREAK - state.since_break)
            .min(hos::MAX_DRIVING_HOURS_PER_DAY - state.day_driving)
            .min(hos::MAX_ON_DUTY_HOURS_PER_DAY - state.day_on_duty);
        let miles_drv = (h_drv * hos::AVERAGE_SPEED_MPH)
            .min(hos::FUEL_STOP_INTERVAL_MILES - state.since_fuel)
            .min(remaining);
        let h_actual = miles_drv / hos::AVERAGE_SPEED_MPH;

        debug!(h_actual, miles_drv, remaining, "driving leg1 segment");
        state.drive_for(h_actual, miles_drv);
        remaining = (remaining - miles_drv).max(0.0);
    }

    Ok(())
}

async fn locate_inserted_stop(
    state: &SimState,
    provider: &dyn MapProvider,
    leg1_route: &crate::services::map_provider::RouteResponse,
    distance_covered_in_leg: f64,
    total_leg1_miles: f64,
    kind: PoiKind,
) -> Location {
    let _ = state;
    let (lat, lng) = provider.point_along(&leg1_route.geometry, distance_covered_in_leg, total_leg1_miles);
    provider.find_nearest_poi(lat, lng, kind).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::map_provider::DeterministicMapProvider;
    use crate::types::Location;

    fn loc(addr: &str, lat: f64, lng: f64) -> Location {
        Location::new(addr, lat, lng).unwrap()
    }

    fn trip(cycle_hours_used: f64) -> TripInput {
        TripInput {
            current: loc("current", 34.0, -118.0),
            pickup: loc("pickup", 36.0, -119.0),
            dropoff: loc("dropoff", 40.0, -74.0),
            cycle_hours_used,
            planned_start: "2025-01-01T06:00:00Z".parse().unwrap(),
            timezone: chrono_tz::UTC,
        }
    }

    #[tokio::test]
    async fn short_trip_emits_current_pickup_dropoff_only() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 55.0, 1.0);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0].stop_type, StopType::Current);
        assert_eq!(stops[1].stop_type, StopType::Pickup);
        assert_eq!(stops[2].stop_type, StopType::Dropoff);
        assert_eq!(stops[1].duration_minutes, 60);
        assert_eq!(stops[2].duration_minutes, 60);
    }

    #[tokio::test]
    async fn long_leg1_inserts_30_min_break_after_8_hours() {
        // 600 miles at 55 mph ~ 10.9h driving, must break after 8h (440mi).
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 600.0, 10.9);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        let break_count = stops.iter().filter(|s| s.stop_type == StopType::Break30Min).count();
        assert_eq!(break_count, 1);
        assert_eq!(
            stops.iter().filter(|s| s.stop_type == StopType::Break10Hr).count(),
            0
        );
    }

    #[tokio::test]
    async fn very_long_leg1_inserts_fuel_and_both_break_kinds() {
        // 1200 miles: crosses the 1000-mile fuel threshold and the 11h driving cap.
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 1200.0, 21.8);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        assert!(stops.iter().any(|s| s.stop_type == StopType::Fuel));
        assert!(stops.iter().any(|s| s.stop_type == StopType::Break30Min));
        assert!(stops.iter().any(|s| s.stop_type == StopType::Break10Hr));
    }

    #[tokio::test]
    async fn infeasible_cycle_is_rejected_before_simulation() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 1650.0, 30.0);
        let err = plan_stops(&trip(45.0), &provider).await.unwrap_err();
        match err {
            PlanError::InfeasibleCycle { needed, available } => {
                assert!((needed - 30.0).abs() < 1e-9);
                assert!((available - 25.0).abs() < 1e-9);
            }
            other => panic!("expected InfeasibleCycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pickup_equals_dropoff_is_rejected_before_any_map_call() {
        let mut input = trip(0.0);
        input.dropoff = input.pickup.clone();
        // A provider with no scripted legs would error on `route()` if ever
        // called — proving validation happens first.
        let provider = DeterministicMapProvider::new();
        let err = plan_stops(&input, &provider).await.unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn stop_sequence_is_dense_and_time_ordered() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 50.0, 1.0).with_leg("pickup", "dropoff", 1200.0, 21.8);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        for (idx, stop) in stops.iter().enumerate() {
            assert_eq!(stop.sequence, idx as u32);
        }
        for pair in stops.windows(2) {
            assert!(pair[0].arrival <= pair[1].arrival);
            assert!(pair[0].departure <= pair[1].arrival);
        }
    }

    #[tokio::test]
    async fn cumulative_miles_is_nondecreasing() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 50.0, 1.0).with_leg("pickup", "dropoff", 1200.0, 21.8);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();
        for pair in stops.windows(2) {
            assert!(pair[1].cumulative_miles >= pair[0].cumulative_miles);
        }
    }

    #[tokio::test]
    async fn fuel_stops_never_exceed_1000_miles_apart() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 2500.0, 45.0);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        let mut last_fuel_miles = 0.0;
        for stop in &stops {
            if stop.stop_type == StopType::Fuel {
                assert!(stop.cumulative_miles - last_fuel_miles <= 1000.0 + 1e-6);
                last_fuel_miles = stop.cumulative_miles;
            }
        }
    }

    #[tokio::test]
    async fn since_break_never_exceeds_8_hours_at_driving_completion() {
        let provider = DeterministicMapProvider::new().with_leg("current", "pickup", 0.0, 0.0).with_leg("pickup", "dropoff", 2500.0, 45.0);
        let stops = plan_stops(&trip(0.0), &provider).await.unwrap();

        let mut since_break_hours = 0.0;
        let mut prev_cumulative = 0.0;
        for stop in &stops {
            let delta_miles = stop.cumulative_miles - prev_cumulative;
            if stop.stop_type != StopType::Break30Min && stop.stop_type != StopType::Break10Hr {
                since_break_hours += delta_miles / hos::AVERAGE_SPEED_MPH;
            } else {
                since_break_hours = 0.0;
            }
            assert!(since_break_hours <= 8.0 + 1e-6, "{since_break_hours}");
            prev_cumulative = stop.cumulative_miles;
        }
    }
}
