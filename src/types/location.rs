//! Geographic location type.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A geocoded point: a human-readable address plus its coordinates.
///
/// Invariant: `-90.0 <= lat <= 90.0` and `-180.0 <= lng <= 180.0`. Construct
/// through [`Location::new`] to enforce it; the `Default`/struct-literal path
/// is only used internally once a value has already been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(address: impl Into<String>, lat: f64, lng: f64) -> Result<Self, PlanError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PlanError::InvalidInput(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(PlanError::InvalidInput(format!(
                "longitude {lng} out of range [-180, 180]"
            )));
        }
        Ok(Self {
            address: address.into(),
            lat,
            lng,
        })
    }

    /// True when two locations refer to the same coordinate (used to reject
    /// `pickup == dropoff` trips; addresses are ignored, only coordinates
    /// matter per §3).
    pub fn same_coordinates(&self, other: &Location) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }

    /// Re-check the coordinate-range invariant. `Location::new` enforces it
    /// at construction time, but a `Location` deserialized straight off the
    /// wire (the CLI's `TripInput` JSON path) never goes through `new`, so
    /// [`TripInput::validate`](super::TripInput::validate) calls this on
    /// every location it carries before simulation starts.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(PlanError::InvalidInput(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(PlanError::InvalidInput(format!(
                "longitude {} out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        let loc = Location::new("Fresno, CA", 36.7783, -119.4179).unwrap();
        assert_eq!(loc.lat, 36.7783);
    }

    #[test]
    fn rejects_latitude_out_of_range() {
        let err = Location::new("nowhere", 91.0, 0.0).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
    }

    #[test]
    fn rejects_longitude_out_of_range() {
        let err = Location::new("nowhere", 0.0, -181.0).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
    }

    #[test]
    fn boundary_coordinates_are_valid() {
        assert!(Location::new("north pole", 90.0, 180.0).is_ok());
        assert!(Location::new("south pole", -90.0, -180.0).is_ok());
    }

    #[test]
    fn same_coordinates_ignores_address() {
        let a = Location::new("A", 1.0, 2.0).unwrap();
        let b = Location::new("B", 1.0, 2.0).unwrap();
        assert!(a.same_coordinates(&b));
    }

    #[test]
    fn validate_catches_out_of_range_coordinates_built_by_literal() {
        // Bypasses `new` the way a deserialized `Location` would.
        let bad = Location {
            address: "nowhere".to_string(),
            lat: 95.0,
            lng: 0.0,
        };
        assert!(matches!(bad.validate(), Err(PlanError::InvalidInput(_))));
    }

    #[test]
    fn validate_accepts_a_location_built_through_new() {
        assert!(Location::new("Fresno, CA", 36.7783, -119.4179).unwrap().validate().is_ok());
    }
}
