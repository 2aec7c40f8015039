//! Input tables: typed records, CSV loading, and the cached store.

pub mod loader;
pub mod schema;
pub mod store;

pub use loader::DataError;
pub use schema::{DatasetSummary, LapTime, PitStop, RaceResult};
pub use store::TableStore;

use std::collections::HashSet;

/// Headline counts over the loaded tables.
pub fn summarize(results: &[RaceResult], laps: &[LapTime], pit_stops: &[PitStop]) -> DatasetSummary {
    let races: HashSet<i64> = results.iter().map(|r| r.race_id).collect();
    let drivers: HashSet<i64> = results.iter().map(|r| r.driver_id).collect();
    let first_season = results.iter().map(|r| r.year).min().unwrap_or(0);
    let last_season = results.iter().map(|r| r.year).max().unwrap_or(0);

    DatasetSummary {
        races: races.len(),
        drivers: drivers.len(),
        first_season,
        last_season,
        result_rows: results.len(),
        lap_rows: laps.len(),
        pit_stop_rows: pit_stops.len(),
    }
}
