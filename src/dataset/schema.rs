//! Typed records for the three input tables.
//!
//! Every table is normalized to one of these fixed shapes at load time, so
//! aggregators never have to probe for optional columns.

use serde::Serialize;

/// One driver's outcome in one race.
///
/// `position_order` is always >= 1; `grid` of 0 denotes a pit-lane start.
#[derive(Debug, Clone)]
pub struct RaceResult {
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub grid: i64,
    pub position_order: i64,
    pub points: f64,
    pub status_id: i64,
    pub year: i32,
    pub round: i32,
    pub race_name: String,
    pub driver_name: String,
    pub constructor_name: String,
}

/// One driver's time on one lap of one race.
#[derive(Debug, Clone)]
pub struct LapTime {
    pub race_id: i64,
    pub driver_id: i64,
    pub lap: i64,
    pub milliseconds: i64,
}

/// One pit-stop event.
#[derive(Debug, Clone)]
pub struct PitStop {
    pub race_id: i64,
    pub driver_id: i64,
    pub stop: i64,
    pub milliseconds: i64,
}

/// Columns each table must carry. Loading fails fast naming the first
/// absent column; extra columns are ignored.
pub const RESULT_COLUMNS: [&str; 12] = [
    "raceId",
    "driverId",
    "constructorId",
    "grid",
    "positionOrder",
    "points",
    "statusId",
    "year",
    "round",
    "race_name",
    "driver_name",
    "constructor_name",
];

pub const LAP_TIME_COLUMNS: [&str; 4] = ["raceId", "driverId", "lap", "milliseconds"];

pub const PIT_STOP_COLUMNS: [&str; 4] = ["raceId", "driverId", "stop", "milliseconds"];

/// Headline counts over the loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub races: usize,
    pub drivers: usize,
    pub first_season: i32,
    pub last_season: i32,
    pub result_rows: usize,
    pub lap_rows: usize,
    pub pit_stop_rows: usize,
}
