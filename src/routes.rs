//! API route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::championship::{calculate_battle, ChampionshipBattle};
use crate::circuits::{calculate_circuit_scores, CircuitOvertakingScore};
use crate::config::AppConfig;
use crate::dataset::{summarize, DataError, DatasetSummary, TableStore};
use crate::drivers::{calculate_driver_stats, driver_names, get_top_drivers, DriverCareerStats};
use crate::enrich::{enrich_results, FinishPolicy};
use crate::pace::{calculate_rolling_pace, get_top_finishers, DEFAULT_PACE_DRIVERS};
use crate::pits::{calculate_pit_profiles, summarize_pit_stops, ConstructorPitSummary};
use crate::types::{
    CircuitsQuery, DriversQuery, ErrorResponse, HealthResponse, PaceQuery, PaceResponse,
    PaceSeries, PitsQuery,
};

/// Application state shared across handlers.
pub struct AppState {
    pub store: TableStore,
    pub config: AppConfig,
    pub policy: FinishPolicy,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        let status = match err {
            // Absent tables are an operational condition, not a server bug.
            DataError::MissingInput { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Dataset summary endpoint.
pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetSummary>, ApiError> {
    let results = state.store.results()?;
    let laps = state.store.lap_times()?;
    let pit_stops = state.store.pit_stops()?;

    Ok(Json(summarize(&results, &laps, &pit_stops)))
}

/// Driver career ranking endpoint.
pub async fn drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DriversQuery>,
) -> Result<Json<Vec<DriverCareerStats>>, ApiError> {
    let results = state.store.results()?;
    let enriched = enrich_results(&results, &state.policy);
    let stats = calculate_driver_stats(&enriched);

    let min_races = query
        .min_races
        .unwrap_or(state.config.analytics.min_career_races);
    let top = query.top.unwrap_or(state.config.analytics.top_drivers);

    Ok(Json(get_top_drivers(&stats, min_races, top)))
}

/// Constructor pit-stop summary endpoint.
pub async fn pits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PitsQuery>,
) -> Result<Json<Vec<ConstructorPitSummary>>, ApiError> {
    let year_from = query.year_from.unwrap_or(state.config.analytics.era_start);
    let year_to = query.year_to.unwrap_or(state.config.analytics.era_end);
    if year_from > year_to {
        return Err(ApiError::bad_request("year_from must not exceed year_to"));
    }

    let pit_stops = state.store.pit_stops()?;
    let results = state.store.results()?;
    let profiles =
        calculate_pit_profiles(&pit_stops, &results, state.config.analytics.pit_cutoff_ms);

    let top = query.top.unwrap_or(state.config.analytics.top_constructors);

    Ok(Json(summarize_pit_stops(&profiles, year_from, year_to, top)))
}

/// Circuit overtaking ranking endpoint.
pub async fn circuits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CircuitsQuery>,
) -> Result<Json<Vec<CircuitOvertakingScore>>, ApiError> {
    let results = state.store.results()?;
    let enriched = enrich_results(&results, &state.policy);

    let min_races = query
        .min_races
        .unwrap_or(state.config.analytics.min_circuit_races);

    Ok(Json(calculate_circuit_scores(&enriched, min_races)))
}

/// Championship battle endpoint.
pub async fn championship(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<ChampionshipBattle>, ApiError> {
    let results = state.store.results()?;
    let enriched = enrich_results(&results, &state.policy);

    Ok(Json(calculate_battle(
        &enriched,
        year,
        state.config.analytics.top_contenders,
    )))
}

/// Race pace endpoint.
pub async fn pace(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<i64>,
    Query(query): Query<PaceQuery>,
) -> Result<Json<PaceResponse>, ApiError> {
    let laps = state.store.lap_times()?;
    let results = state.store.results()?;

    let drivers = match &query.drivers {
        Some(raw) => parse_driver_ids(raw)?,
        None => get_top_finishers(&results, race_id, DEFAULT_PACE_DRIVERS),
    };
    let window = query
        .window
        .unwrap_or(state.config.analytics.pace_window)
        .max(1);

    let traces = calculate_rolling_pace(
        &laps,
        race_id,
        &drivers,
        window,
        state.config.analytics.pace_outlier_factor,
    );
    let names = driver_names(&results);

    let series = traces
        .into_iter()
        .map(|trace| {
            let driver_name = names
                .get(&trace.driver_id)
                .cloned()
                .unwrap_or_else(|| format!("Driver {}", trace.driver_id));
            PaceSeries {
                driver_id: trace.driver_id,
                driver_name,
                points: trace.points,
            }
        })
        .collect();

    Ok(Json(PaceResponse {
        race_id,
        window,
        series,
    }))
}

fn parse_driver_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::bad_request(format!("Invalid driver id: {}", part)))
        })
        .collect()
}
