//! CSV loading with schema validation.
//!
//! Reads the cleaned result/lap/pit tables into typed records. The upstream
//! preparation step writes `\N` for missing values; the reader treats that
//! token as null and rows with a null or invalid required field are dropped
//! and counted.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use super::schema::{
    LapTime, PitStop, RaceResult, LAP_TIME_COLUMNS, PIT_STOP_COLUMNS, RESULT_COLUMNS,
};

/// Loading failures, split so consumers can degrade on missing input
/// instead of treating every failure the same way.
#[derive(Debug, Error)]
pub enum DataError {
    /// The table file is absent. Dependent views render an empty state.
    #[error("{table} table unavailable: {path}")]
    MissingInput { table: &'static str, path: String },

    /// The file exists but lacks a required column (older schema, wrong file).
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    /// The file could not be parsed as CSV at all.
    #[error("{table} table could not be read: {message}")]
    Malformed { table: &'static str, message: String },
}

/// Load the results table into typed rows.
///
/// Rows with a null required field or a finishing order below 1 are dropped.
pub fn load_results(path: &Path) -> Result<Vec<RaceResult>, DataError> {
    let table = "results";
    let df = read_table(path, table)?;
    require_columns(&df, table, &RESULT_COLUMNS)?;

    let race_ids = int_column(&df, table, "raceId")?;
    let driver_ids = int_column(&df, table, "driverId")?;
    let constructor_ids = int_column(&df, table, "constructorId")?;
    let grids = int_column(&df, table, "grid")?;
    let position_orders = int_column(&df, table, "positionOrder")?;
    let points = float_column(&df, table, "points")?;
    let status_ids = int_column(&df, table, "statusId")?;
    let years = int_column(&df, table, "year")?;
    let rounds = int_column(&df, table, "round")?;
    let race_names = str_column(&df, table, "race_name")?;
    let driver_names = str_column(&df, table, "driver_name")?;
    let constructor_names = str_column(&df, table, "constructor_name")?;

    let mut rows = Vec::with_capacity(df.height());
    let mut dropped = 0usize;

    for i in 0..df.height() {
        let row = (|| {
            Some(RaceResult {
                race_id: race_ids.get(i)?,
                driver_id: driver_ids.get(i)?,
                constructor_id: constructor_ids.get(i)?,
                grid: grids.get(i)?,
                position_order: position_orders.get(i)?,
                points: points.get(i)?,
                status_id: status_ids.get(i)?,
                year: years.get(i)? as i32,
                round: rounds.get(i)? as i32,
                race_name: race_names.get(i)?.to_string(),
                driver_name: driver_names.get(i)?.to_string(),
                constructor_name: constructor_names.get(i)?.to_string(),
            })
        })();

        match row {
            Some(row) if row.position_order >= 1 && row.grid >= 0 => rows.push(row),
            _ => dropped += 1,
        }
    }

    log_dropped(table, dropped);
    Ok(rows)
}

/// Load the lap times table into typed rows.
///
/// Rows with a null required field or a non-positive lap time are dropped.
pub fn load_lap_times(path: &Path) -> Result<Vec<LapTime>, DataError> {
    let table = "lap_times";
    let df = read_table(path, table)?;
    require_columns(&df, table, &LAP_TIME_COLUMNS)?;

    let race_ids = int_column(&df, table, "raceId")?;
    let driver_ids = int_column(&df, table, "driverId")?;
    let laps = int_column(&df, table, "lap")?;
    let milliseconds = int_column(&df, table, "milliseconds")?;

    let mut rows = Vec::with_capacity(df.height());
    let mut dropped = 0usize;

    for i in 0..df.height() {
        let row = (|| {
            Some(LapTime {
                race_id: race_ids.get(i)?,
                driver_id: driver_ids.get(i)?,
                lap: laps.get(i)?,
                milliseconds: milliseconds.get(i)?,
            })
        })();

        match row {
            Some(row) if row.milliseconds > 0 => rows.push(row),
            _ => dropped += 1,
        }
    }

    log_dropped(table, dropped);
    Ok(rows)
}

/// Load the pit stops table into typed rows.
///
/// Some exports carry a `year` column; it is ignored, since the year is
/// joined from results when profiles are built. Rows with a null required
/// field or a non-positive duration are dropped.
pub fn load_pit_stops(path: &Path) -> Result<Vec<PitStop>, DataError> {
    let table = "pit_stops";
    let df = read_table(path, table)?;
    require_columns(&df, table, &PIT_STOP_COLUMNS)?;

    let race_ids = int_column(&df, table, "raceId")?;
    let driver_ids = int_column(&df, table, "driverId")?;
    let stops = int_column(&df, table, "stop")?;
    let milliseconds = int_column(&df, table, "milliseconds")?;

    let mut rows = Vec::with_capacity(df.height());
    let mut dropped = 0usize;

    for i in 0..df.height() {
        let row = (|| {
            Some(PitStop {
                race_id: race_ids.get(i)?,
                driver_id: driver_ids.get(i)?,
                stop: stops.get(i)?,
                milliseconds: milliseconds.get(i)?,
            })
        })();

        match row {
            Some(row) if row.milliseconds > 0 => rows.push(row),
            _ => dropped += 1,
        }
    }

    log_dropped(table, dropped);
    Ok(rows)
}

/// Read a CSV into a frame with `\N` treated as null.
fn read_table(path: &Path, table: &'static str) -> Result<DataFrame, DataError> {
    if !path.exists() {
        return Err(DataError::MissingInput {
            table,
            path: path.display().to_string(),
        });
    }

    let parse_options = CsvParseOptions::default()
        .with_null_values(Some(NullValues::AllColumnsSingle("\\N".into())));

    CsvReadOptions::default()
        .with_has_header(true)
        // Scan the whole file: points switches from integral to fractional
        // values mid-history, which breaks prefix-based inference.
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| DataError::Malformed {
            table,
            message: e.to_string(),
        })
}

/// Fail fast naming the first required column the frame lacks.
fn require_columns(
    df: &DataFrame,
    table: &'static str,
    required: &'static [&'static str],
) -> Result<(), DataError> {
    for &column in required {
        if df.column(column).is_err() {
            return Err(DataError::MissingColumn { table, column });
        }
    }
    Ok(())
}

fn int_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Int64Chunked, DataError> {
    df.column(name)
        .and_then(|col| col.cast(&DataType::Int64))
        .and_then(|col| col.i64().cloned())
        .map_err(|e| DataError::Malformed {
            table,
            message: format!("column '{}': {}", name, e),
        })
}

fn float_column(
    df: &DataFrame,
    table: &'static str,
    name: &str,
) -> Result<Float64Chunked, DataError> {
    df.column(name)
        .and_then(|col| col.cast(&DataType::Float64))
        .and_then(|col| col.f64().cloned())
        .map_err(|e| DataError::Malformed {
            table,
            message: format!("column '{}': {}", name, e),
        })
}

fn str_column(df: &DataFrame, table: &'static str, name: &str) -> Result<StringChunked, DataError> {
    df.column(name)
        .and_then(|col| col.cast(&DataType::String))
        .and_then(|col| col.str().cloned())
        .map_err(|e| DataError::Malformed {
            table,
            message: format!("column '{}': {}", name, e),
        })
}

fn log_dropped(table: &'static str, dropped: usize) {
    if dropped > 0 {
        warn!("{}: dropped {} rows with null or invalid required fields", table, dropped);
    }
}
