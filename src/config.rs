//! Configuration for the F1 analytics service.

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Input table paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_results_path")]
    pub results_path: String,
    #[serde(default = "default_lap_times_path")]
    pub lap_times_path: String,
    #[serde(default = "default_pit_stops_path")]
    pub pit_stops_path: String,
}

fn default_results_path() -> String {
    "data/clean_results.csv".to_string()
}

fn default_lap_times_path() -> String {
    "data/clean_lap_times.csv".to_string()
}

fn default_pit_stops_path() -> String {
    "data/clean_pit_stops.csv".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            results_path: default_results_path(),
            lap_times_path: default_lap_times_path(),
            pit_stops_path: default_pit_stops_path(),
        }
    }
}

/// Analytic thresholds
///
/// One canonical value per metric; call sites take these as parameters
/// instead of hard-coding their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Status ids counted as a classified finish.
    #[serde(default = "default_finished_status_ids")]
    pub finished_status_ids: Vec<i64>,
    /// Pit stops at or above this duration are repair/penalty length.
    #[serde(default = "default_pit_cutoff_ms")]
    pub pit_cutoff_ms: i64,
    /// Year range where pit-stop durations are comparable (hybrid era).
    #[serde(default = "default_era_start")]
    pub era_start: i32,
    #[serde(default = "default_era_end")]
    pub era_end: i32,
    /// Circuits below this many distinct races are excluded from rankings.
    #[serde(default = "default_min_circuit_races")]
    pub min_circuit_races: u32,
    /// Drivers below this many races are excluded from comparative views.
    #[serde(default = "default_min_career_races")]
    pub min_career_races: u32,
    #[serde(default = "default_pace_window")]
    pub pace_window: usize,
    #[serde(default = "default_pace_outlier_factor")]
    pub pace_outlier_factor: f64,
    #[serde(default = "default_top_constructors")]
    pub top_constructors: usize,
    #[serde(default = "default_top_drivers")]
    pub top_drivers: usize,
    #[serde(default = "default_top_contenders")]
    pub top_contenders: usize,
}

fn default_finished_status_ids() -> Vec<i64> {
    std::iter::once(1).chain(11..=19).collect()
}

fn default_pit_cutoff_ms() -> i64 {
    40_000
}

fn default_era_start() -> i32 {
    2014
}

fn default_era_end() -> i32 {
    2020
}

fn default_min_circuit_races() -> u32 {
    10
}

fn default_min_career_races() -> u32 {
    50
}

fn default_pace_window() -> usize {
    3
}

fn default_pace_outlier_factor() -> f64 {
    1.3
}

fn default_top_constructors() -> usize {
    10
}

fn default_top_drivers() -> usize {
    10
}

fn default_top_contenders() -> usize {
    3
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            finished_status_ids: default_finished_status_ids(),
            pit_cutoff_ms: default_pit_cutoff_ms(),
            era_start: default_era_start(),
            era_end: default_era_end(),
            min_circuit_races: default_min_circuit_races(),
            min_career_races: default_min_career_races(),
            pace_window: default_pace_window(),
            pace_outlier_factor: default_pace_outlier_factor(),
            top_constructors: default_top_constructors(),
            top_drivers: default_top_drivers(),
            top_contenders: default_top_contenders(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (F1A_SERVER__PORT, etc.)
            .add_source(
                config::Environment::with_prefix("F1A")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_thresholds() {
        let analytics = AnalyticsConfig::default();

        assert_eq!(analytics.pit_cutoff_ms, 40_000);
        assert_eq!(analytics.min_circuit_races, 10);
        assert_eq!(analytics.pace_window, 3);
        assert!((analytics.pace_outlier_factor - 1.3).abs() < 1e-9);
        assert_eq!(analytics.era_start, 2014);
        assert_eq!(analytics.era_end, 2020);
        assert_eq!(
            analytics.finished_status_ids,
            vec![1, 11, 12, 13, 14, 15, 16, 17, 18, 19]
        );
    }

    #[test]
    fn test_default_paths() {
        let data = DataConfig::default();

        assert_eq!(data.results_path, "data/clean_results.csv");
        assert_eq!(data.lap_times_path, "data/clean_lap_times.csv");
        assert_eq!(data.pit_stops_path, "data/clean_pit_stops.csv");
    }
}
