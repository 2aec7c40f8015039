//! Request and response types for the F1 analytics API.

use serde::{Deserialize, Serialize};

use crate::pace::PacePoint;

/// Query parameters for the driver career ranking
#[derive(Debug, Default, Deserialize)]
pub struct DriversQuery {
    /// Minimum career races; defaults to the configured floor.
    pub min_races: Option<u32>,
    /// Number of drivers to return.
    pub top: Option<usize>,
}

/// Query parameters for constructor pit-stop summaries
#[derive(Debug, Default, Deserialize)]
pub struct PitsQuery {
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub top: Option<usize>,
}

/// Query parameters for circuit overtaking scores
#[derive(Debug, Default, Deserialize)]
pub struct CircuitsQuery {
    pub min_races: Option<u32>,
}

/// Query parameters for race pace traces
#[derive(Debug, Default, Deserialize)]
pub struct PaceQuery {
    /// Comma-separated driver ids; defaults to the top finishers.
    pub drivers: Option<String>,
    pub window: Option<usize>,
}

/// One driver's smoothed lap trace, labelled for display
#[derive(Debug, Serialize)]
pub struct PaceSeries {
    pub driver_id: i64,
    pub driver_name: String,
    pub points: Vec<PacePoint>,
}

/// Smoothed race pace for a set of drivers
#[derive(Debug, Serialize)]
pub struct PaceResponse {
    pub race_id: i64,
    pub window: usize,
    pub series: Vec<PaceSeries>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
