//! CLI commands for f1-analytics.
//!
//! Supports API server mode, one-shot analysis commands, and report output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::championship::{calculate_battle, ChampionshipBattle};
use crate::config::AppConfig;
use crate::dataset::{summarize, DatasetSummary, TableStore};
use crate::drivers::{calculate_driver_stats, driver_names, get_top_drivers, DriverCareerStats};
use crate::enrich::{enrich_results, FinishPolicy};
use crate::pace::{calculate_rolling_pace, get_top_finishers, DEFAULT_PACE_DRIVERS};
use crate::report::write_reports;
use crate::types::{PaceResponse, PaceSeries};

#[derive(Parser)]
#[command(name = "f1-analytics")]
#[command(version, about = "F1 analytics: historical race data API and CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// Print dataset summary counts
    Summary {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Rank drivers by career points
    Drivers {
        /// Minimum career races
        #[arg(long)]
        min_races: Option<u32>,

        /// Number of drivers to show
        #[arg(short, long)]
        top: Option<usize>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show the championship battle for a season
    Championship {
        /// Season year
        #[arg(value_name = "YEAR")]
        year: i32,

        /// Number of contenders to track
        #[arg(short, long)]
        top: Option<usize>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Chart smoothed lap pace for one race
    Pace {
        /// Race id
        #[arg(value_name = "RACE_ID")]
        race_id: i64,

        /// Driver ids (defaults to the top finishers)
        #[arg(short, long, value_delimiter = ',')]
        drivers: Vec<i64>,

        /// Trailing window in laps
        #[arg(short, long)]
        window: Option<usize>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Write the markdown intelligence reports
    Report {
        /// Output directory
        #[arg(short, long, default_value = "reports")]
        out: PathBuf,
    },
}

/// Load configuration and open the table store.
fn open_store() -> anyhow::Result<(AppConfig, TableStore, FinishPolicy)> {
    let config = AppConfig::load()?;
    let store = TableStore::from_config(&config.data);
    let policy = FinishPolicy::new(config.analytics.finished_status_ids.iter().copied());

    Ok((config, store, policy))
}

/// Print dataset summary counts.
pub async fn run_summary(format: String) -> anyhow::Result<()> {
    let (_config, store, _policy) = open_store()?;

    let results = store.results()?;
    let laps = store.lap_times()?;
    let pit_stops = store.pit_stops()?;
    let summary = summarize(&results, &laps, &pit_stops);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "table" => print_summary_table(&summary),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn print_summary_table(summary: &DatasetSummary) {
    println!("=== Dataset Summary ===");
    println!("  Seasons:       {}-{}", summary.first_season, summary.last_season);
    println!("  Races:         {}", summary.races);
    println!("  Drivers:       {}", summary.drivers);
    println!("  Result rows:   {}", summary.result_rows);
    println!("  Lap rows:      {}", summary.lap_rows);
    println!("  Pit stop rows: {}", summary.pit_stop_rows);
}

/// Rank drivers by career points.
pub async fn run_drivers(
    min_races: Option<u32>,
    top: Option<usize>,
    format: String,
) -> anyhow::Result<()> {
    let (config, store, policy) = open_store()?;

    let results = store.results()?;
    let enriched = enrich_results(&results, &policy);
    let stats = calculate_driver_stats(&enriched);
    let ranked = get_top_drivers(
        &stats,
        min_races.unwrap_or(config.analytics.min_career_races),
        top.unwrap_or(config.analytics.top_drivers),
    );

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&ranked)?),
        "table" => print_drivers_table(&ranked),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
    }

    Ok(())
}

fn print_drivers_table(ranked: &[DriverCareerStats]) {
    if ranked.is_empty() {
        println!("No data for this selection.");
        return;
    }

    println!("=== Driver Career Rankings ===");
    println!(
        "  {:<24} {:>6} {:>8} {:>5} {:>7} {:>8}",
        "Driver", "Races", "Points", "Wins", "Win %", "Avg fin"
    );
    for s in ranked {
        println!(
            "  {:<24} {:>6} {:>8.1} {:>5} {:>6.1}% {:>8.2}",
            s.driver_name,
            s.total_races,
            s.total_points,
            s.wins,
            s.win_rate * 100.0,
            s.avg_finish
        );
    }
}

/// Show the championship battle for a season.
pub async fn run_championship(
    year: i32,
    top: Option<usize>,
    format: String,
) -> anyhow::Result<()> {
    let (config, store, policy) = open_store()?;

    let results = store.results()?;
    let enriched = enrich_results(&results, &policy);
    let battle = calculate_battle(
        &enriched,
        year,
        top.unwrap_or(config.analytics.top_contenders),
    );

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&battle)?),
        "table" => print_championship_table(&battle),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&battle)?);
        }
    }

    Ok(())
}

fn print_championship_table(battle: &ChampionshipBattle) {
    if battle.contenders.is_empty() {
        println!("No data for this selection.");
        return;
    }

    println!("=== {} Championship ===", battle.year);
    for contender in &battle.contenders {
        println!(
            "  {:<24} {:>6.1} pts over {} rounds",
            contender.driver_name,
            contender.season_points,
            contender.rounds.len()
        );
    }

    if !battle.leader_gaps.is_empty() {
        println!();
        println!("  Leader vs runner-up by round:");
        for gap in &battle.leader_gaps {
            match gap.gap {
                Some(points) => println!("    Round {:>2}: {:+.1}", gap.round, points),
                None => println!("    Round {:>2}: -", gap.round),
            }
        }
    }
}

/// Chart smoothed lap pace for one race.
pub async fn run_pace(
    race_id: i64,
    drivers: Vec<i64>,
    window: Option<usize>,
    format: String,
) -> anyhow::Result<()> {
    let (config, store, _policy) = open_store()?;

    let laps = store.lap_times()?;
    let results = store.results()?;

    let drivers = if drivers.is_empty() {
        get_top_finishers(&results, race_id, DEFAULT_PACE_DRIVERS)
    } else {
        drivers
    };
    let window = window.unwrap_or(config.analytics.pace_window).max(1);

    let traces = calculate_rolling_pace(
        &laps,
        race_id,
        &drivers,
        window,
        config.analytics.pace_outlier_factor,
    );
    let names = driver_names(&results);
    let series: Vec<PaceSeries> = traces
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
    let response = PaceResponse {
        race_id,
        window,
        series,
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&response)?),
        "table" => print_pace_table(&response),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn print_pace_table(response: &PaceResponse) {
    if response.series.is_empty() {
        println!("No data for this selection.");
        return;
    }

    println!(
        "=== Race {} pace, {}-lap window ===",
        response.race_id, response.window
    );
    for series in &response.series {
        println!();
        println!("  {} (driver {})", series.driver_name, series.driver_id);
        for point in &series.points {
            println!("    Lap {:>2}: {:>8.3}s", point.lap, point.seconds);
        }
    }
}

/// Write the markdown intelligence reports.
pub async fn run_report(out: PathBuf) -> anyhow::Result<()> {
    let (config, store, policy) = open_store()?;

    eprintln!("Reading tables from: {}", config.data.results_path);
    let written = write_reports(&store, &config, &policy, &out)?;
    for path in written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
