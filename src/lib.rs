//! HOS-aware long-haul trip planner core.
//!
//! Four collaborating components, leaves first: the [`services::map_provider`]
//! capability port, the [`planner`] driving-with-breaks state machine, the
//! [`day_projector`] midnight-slicer, and the [`duty_timeline`] builder that
//! turns a day's slices into a gap-free duty-status log.

pub mod day_projector;
pub mod duty_timeline;
pub mod error;
pub mod planner;
pub mod services;
pub mod types;

pub use error::{MapError, PlanError};
pub use planner::{check_feasibility, plan, plan_stops, validate};
pub use services::map_provider::{DeterministicMapProvider, HttpMapProvider, HttpMapProviderConfig, MapProvider};
pub use types::*;
