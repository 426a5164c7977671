//! Great-circle distance between coordinates.
//!
//! Distances feed the dispatch ranking only; they are never billed, so the
//! spherical Haversine model is accurate enough.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the Haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in decimal
/// degrees.
///
/// Inputs are expected within `[-90, 90]` latitude and `[-180, 180]`
/// longitude; out-of-range values are not rejected here.
///
/// # Examples
/// ```
/// use reciclai::domain::distance_km;
///
/// let sao_paulo_to_rio = distance_km(-23.5505, -46.6333, -22.9068, -43.1729);
/// assert!((sao_paulo_to_rio - 358.0).abs() < 5.0);
/// ```
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Reasons a coordinate cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse textual components such as query-string values.
    ///
    /// # Examples
    /// ```
    /// use reciclai::domain::Coordinate;
    ///
    /// let here = Coordinate::parse("-5.1136", " -42.8487 ").expect("numeric input");
    /// assert_eq!(here.latitude(), -5.1136);
    /// assert!(Coordinate::parse("north", "-42.8").is_err());
    /// ```
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, CoordinateError> {
        Self::new(
            parse_component("latitude", latitude)?,
            parse_component("longitude", longitude)?,
        )
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Haversine distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

fn parse_component(field: &'static str, raw: &str) -> Result<f64, CoordinateError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CoordinateError::NotANumber {
            field,
            value: raw.to_owned(),
        })
}

fn check_range(field: &'static str, value: f64, bound: f64) -> Result<(), CoordinateError> {
    if !value.is_finite() {
        return Err(CoordinateError::NotANumber {
            field,
            value: value.to_string(),
        });
    }
    if !(-bound..=bound).contains(&value) {
        return Err(CoordinateError::OutOfRange {
            field,
            value,
            min: -bound,
            max: bound,
        });
    }
    Ok(())
}
