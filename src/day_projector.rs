//! The Day Projector: slice the stop/drive event stream into per-date
//! windows on local-midnight boundaries (§4.C).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::types::{drive_intervals, Stop};

/// A stop intersected with one local calendar date.
#[derive(Debug, Clone)]
pub struct StopSlice<'a> {
    pub stop: &'a Stop,
    pub date: NaiveDate,
    pub day_arrival: DateTime<Utc>,
    pub day_departure: DateTime<Utc>,
}

/// The drive between two consecutive stops, intersected with one local
/// calendar date. Carries the *full* interval's duration and mileage so the
/// Duty-Timeline Builder can attribute miles proportionally across a
/// midnight crossing (§4.D).
#[derive(Debug, Clone)]
pub struct DriveSlice<'a> {
    pub from: &'a Stop,
    pub to: &'a Stop,
    pub date: NaiveDate,
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
}

impl<'a> DriveSlice<'a> {
    pub fn slice_duration_hours(&self) -> f64 {
        (self.day_end - self.day_start).num_seconds() as f64 / 3600.0
    }

    pub fn full_duration_hours(&self) -> f64 {
        (self.to.arrival - self.from.departure).num_seconds() as f64 / 3600.0
    }

    pub fn full_distance_miles(&self) -> f64 {
        (self.to.cumulative_miles - self.from.cumulative_miles).max(0.0)
    }
}

/// Everything projected onto one local calendar date.
#[derive(Debug, Clone, Default)]
pub struct DaySlices<'a> {
    pub stop_slices: Vec<StopSlice<'a>>,
    pub drive_slices: Vec<DriveSlice<'a>>,
}

/// Project `stops` onto local calendar dates in `timezone`, producing one
/// [`DaySlices`] per date touched by the plan, in date order.
pub fn project(stops: &[Stop], timezone: Tz) -> BTreeMap<NaiveDate, DaySlices<'_>> {
    let mut by_date: BTreeMap<NaiveDate, DaySlices<'_>> = BTreeMap::new();

    for stop in stops {
        for (date, start, end) in windows_covering(stop.arrival, stop.departure, timezone) {
            by_date.entry(date).or_default().stop_slices.push(StopSlice {
                stop,
                date,
                day_arrival: start,
                day_departure: end,
            });
        }
    }

    for interval in drive_intervals(stops) {
        for (date, start, end) in windows_covering(interval.start(), interval.end(), timezone) {
            by_date.entry(date).or_default().drive_slices.push(DriveSlice {
                from: interval.from,
                to: interval.to,
                date,
                day_start: start,
                day_end: end,
            });
        }
    }

    debug!(dates = by_date.len(), stops = stops.len(), "projected stops onto calendar dates");
    by_date
}

/// Return the local calendar midnight at `date` in `timezone`, as a UTC
/// instant. DST transitions can make a local midnight ambiguous or
/// nonexistent; either way one definite instant is picked rather than
/// failing the whole projection over a single day's wall-clock quirk.
fn local_midnight(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is always a valid time");
    let local = match timezone.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => timezone.from_utc_datetime(&naive),
    };
    local.with_timezone(&Utc)
}

/// Split `[start, end)` into per-local-date `(date, slice_start, slice_end)`
/// triples, intersected with each date's midnight-to-midnight window.
/// Zero-length slices are discarded (§4.C).
fn windows_covering(start: DateTime<Utc>, end: DateTime<Utc>, timezone: Tz) -> Vec<(NaiveDate, DateTime<Utc>, DateTime<Utc>)> {
    if end <= start {
        return Vec::new();
    }

    let first_date = start.with_timezone(&timezone).date_naive();
    let last_date = end.with_timezone(&timezone).date_naive();

    let mut slices = Vec::new();
    let mut date = first_date;
    loop {
        let window_start = local_midnight(date, timezone);
        let window_end = local_midnight(date.succ_opt().expect("date overflow"), timezone);

        let slice_start = start.max(window_start);
        let slice_end = end.min(window_end);
        if slice_end > slice_start {
            slices.push((date, slice_start, slice_end));
        }

        if date >= last_date {
            break;
        }
        date = date.succ_opt().expect("date overflow");
    }

    slices
}
