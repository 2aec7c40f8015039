//! Markdown intelligence reports.
//!
//! Renders the same aggregations the API serves into two static documents,
//! one on driver form and one on race strategy. The pit section degrades to
//! a note when the pit-stop table is absent; everything else still renders.

use anyhow::Context;
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::circuits::calculate_circuit_scores;
use crate::config::{AnalyticsConfig, AppConfig};
use crate::dataset::{DataError, TableStore};
use crate::drivers::{calculate_driver_stats, get_top_drivers, DriverCareerStats};
use crate::enrich::{enrich_results, EnrichedResult, FinishPolicy};
use crate::pits::{calculate_pit_profiles, summarize_pit_stops, ConstructorPitSummary};

/// Render both reports into `out_dir` and return the written paths.
pub fn write_reports(
    store: &TableStore,
    config: &AppConfig,
    policy: &FinishPolicy,
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create report directory {}", out_dir.display()))?;

    let results = store
        .results()
        .context("Results table is required for reports")?;
    let enriched = enrich_results(&results, policy);

    let mut written = Vec::new();
    for (name, body) in [
        (
            "driver_intelligence.md",
            driver_intelligence(&enriched, &config.analytics)?,
        ),
        (
            "strategy_intelligence.md",
            strategy_intelligence(store, &enriched, &config.analytics)?,
        ),
    ] {
        let path = out_dir.join(name);
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Career rankings: points, finishing consistency, win rate.
fn driver_intelligence(
    rows: &[EnrichedResult],
    analytics: &AnalyticsConfig,
) -> anyhow::Result<String> {
    let stats = calculate_driver_stats(rows);
    let mut out = String::new();

    writeln!(out, "# Driver Intelligence Report")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated {} from {} race results.",
        Utc::now().format("%Y-%m-%d"),
        rows.len()
    )?;

    writeln!(out)?;
    writeln!(
        out,
        "## Career points (minimum {} races)",
        analytics.min_career_races
    )?;
    writeln!(out)?;
    writeln!(out, "| Driver | Races | Points | Wins | Podiums | Win % |")?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for s in get_top_drivers(&stats, analytics.min_career_races, analytics.top_drivers) {
        writeln!(
            out,
            "| {} | {} | {:.1} | {} | {} | {:.1}% |",
            s.driver_name,
            s.total_races,
            s.total_points,
            s.wins,
            s.podiums,
            s.win_rate * 100.0
        )?;
    }

    // Lowest spread of finishing positions first. Single-race careers have
    // no spread and are left out.
    let mut consistent: Vec<(&DriverCareerStats, f64)> = stats
        .iter()
        .filter(|s| s.total_races >= analytics.min_career_races)
        .filter_map(|s| s.consistency.map(|sigma| (s, sigma)))
        .collect();
    consistent.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.driver_id.cmp(&b.0.driver_id)));
    consistent.truncate(analytics.top_drivers);

    writeln!(out)?;
    writeln!(out, "## Most consistent finishers")?;
    writeln!(out)?;
    writeln!(out, "| Driver | Races | Finish spread | Avg finish |")?;
    writeln!(out, "|---|---|---|---|")?;
    for (s, sigma) in consistent {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.2} |",
            s.driver_name, s.total_races, sigma, s.avg_finish
        )?;
    }

    let mut sharpest: Vec<&DriverCareerStats> = stats
        .iter()
        .filter(|s| s.total_races >= analytics.min_career_races)
        .collect();
    sharpest.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then(a.driver_id.cmp(&b.driver_id))
    });
    sharpest.truncate(analytics.top_drivers);

    writeln!(out)?;
    writeln!(out, "## Best win rate")?;
    writeln!(out)?;
    writeln!(out, "| Driver | Races | Wins | Win % |")?;
    writeln!(out, "|---|---|---|---|")?;
    for s in sharpest {
        writeln!(
            out,
            "| {} | {} | {} | {:.1}% |",
            s.driver_name,
            s.total_races,
            s.wins,
            s.win_rate * 100.0
        )?;
    }

    Ok(out)
}

/// Pit-stop pace by constructor plus circuit overtaking rankings.
fn strategy_intelligence(
    store: &TableStore,
    rows: &[EnrichedResult],
    analytics: &AnalyticsConfig,
) -> anyhow::Result<String> {
    let mut out = String::new();

    writeln!(out, "# Strategy Intelligence Report")?;
    writeln!(out)?;
    writeln!(out, "Generated {}.", Utc::now().format("%Y-%m-%d"))?;

    writeln!(out)?;
    writeln!(
        out,
        "## Pit stop pace, {}-{}",
        analytics.era_start, analytics.era_end
    )?;
    writeln!(out)?;
    match pit_summaries(store, analytics) {
        Ok(summaries) if summaries.is_empty() => {
            writeln!(out, "No pit stops recorded in this range.")?;
        }
        Ok(summaries) => {
            writeln!(out, "| Constructor | Stops | Median (s) | Q1 (s) | Q3 (s) |")?;
            writeln!(out, "|---|---|---|---|---|")?;
            for s in &summaries {
                writeln!(
                    out,
                    "| {} | {} | {:.3} | {:.3} | {:.3} |",
                    s.constructor_name, s.stops, s.median_seconds, s.q1_seconds, s.q3_seconds
                )?;
            }
        }
        Err(DataError::MissingInput { table, .. }) => {
            warn!("{} table unavailable, skipping pit section", table);
            writeln!(out, "Pit stop data unavailable; section skipped.")?;
        }
        Err(err) => return Err(err.into()),
    }

    let circuits = calculate_circuit_scores(rows, analytics.min_circuit_races);

    writeln!(out)?;
    writeln!(
        out,
        "## Overtaking by circuit (minimum {} races)",
        analytics.min_circuit_races
    )?;
    writeln!(out)?;
    if circuits.is_empty() {
        writeln!(out, "No circuit clears the minimum race count.")?;
    } else {
        writeln!(out, "| Circuit | Avg positions changed | Races |")?;
        writeln!(out, "|---|---|---|")?;
        for c in &circuits {
            writeln!(
                out,
                "| {} | {:.2} | {} |",
                c.race_name, c.overtaking_score, c.races_held
            )?;
        }
    }

    Ok(out)
}

fn pit_summaries(
    store: &TableStore,
    analytics: &AnalyticsConfig,
) -> Result<Vec<ConstructorPitSummary>, DataError> {
    let pit_stops = store.pit_stops()?;
    let results = store.results()?;
    let profiles = calculate_pit_profiles(&pit_stops, &results, analytics.pit_cutoff_ms);

    Ok(summarize_pit_stops(
        &profiles,
        analytics.era_start,
        analytics.era_end,
        analytics.top_constructors,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RaceResult;
    use std::io::Write;

    fn result(race_id: i64, driver_id: i64, position_order: i64, points: f64) -> RaceResult {
        RaceResult {
            race_id,
            driver_id,
            constructor_id: 1,
            grid: 2,
            position_order,
            points,
            status_id: 1,
            year: 2019,
            round: race_id as i32,
            race_name: "Melbourne GP".to_string(),
            driver_name: format!("Driver {}", driver_id),
            constructor_name: "Mercedes".to_string(),
        }
    }

    fn analytics_for_tests() -> AnalyticsConfig {
        AnalyticsConfig {
            min_career_races: 1,
            ..AnalyticsConfig::default()
        }
    }

    #[test]
    fn test_driver_report_sections() {
        let rows = enrich_results(
            &[
                result(1, 44, 1, 25.0),
                result(2, 44, 2, 18.0),
                result(1, 5, 4, 12.0),
                result(2, 5, 6, 8.0),
            ],
            &FinishPolicy::default(),
        );

        let report = driver_intelligence(&rows, &analytics_for_tests()).unwrap();

        assert!(report.contains("# Driver Intelligence Report"));
        assert!(report.contains("## Career points (minimum 1 races)"));
        assert!(report.contains("## Most consistent finishers"));
        assert!(report.contains("## Best win rate"));
        assert!(report.contains("| Driver 44 | 2 | 43.0 | 1 | 2 | 50.0% |"));
    }

    #[test]
    fn test_strategy_report_degrades_without_pit_table() {
        let dir = tempfile::tempdir().unwrap();
        let results_path = dir.path().join("results.csv");
        let mut file = fs::File::create(&results_path).unwrap();
        writeln!(
            file,
            "raceId,driverId,constructorId,grid,positionOrder,points,statusId,year,round,race_name,driver_name,constructor_name"
        )
        .unwrap();
        writeln!(
            file,
            "1,44,1,2,1,25.0,1,2019,1,Melbourne GP,Driver 44,Mercedes"
        )
        .unwrap();
        drop(file);

        let store = TableStore::new(
            &results_path,
            dir.path().join("lap_times.csv"),
            dir.path().join("pit_stops.csv"),
        );
        let rows = enrich_results(&store.results().unwrap(), &FinishPolicy::default());

        let report = strategy_intelligence(&store, &rows, &analytics_for_tests()).unwrap();

        assert!(report.contains("Pit stop data unavailable; section skipped."));
        // One race never clears the ten-race circuit floor.
        assert!(report.contains("No circuit clears the minimum race count."));
    }

    #[test]
    fn test_write_reports_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let results_path = dir.path().join("results.csv");
        let mut file = fs::File::create(&results_path).unwrap();
        writeln!(
            file,
            "raceId,driverId,constructorId,grid,positionOrder,points,statusId,year,round,race_name,driver_name,constructor_name"
        )
        .unwrap();
        writeln!(
            file,
            "1,44,1,2,1,25.0,1,2019,1,Melbourne GP,Driver 44,Mercedes"
        )
        .unwrap();
        drop(file);

        let store = TableStore::new(
            &results_path,
            dir.path().join("lap_times.csv"),
            dir.path().join("pit_stops.csv"),
        );
        let config = AppConfig::default();
        let out_dir = dir.path().join("reports");

        let written =
            write_reports(&store, &config, &FinishPolicy::default(), &out_dir).unwrap();

        assert_eq!(written.len(), 2);
        assert!(out_dir.join("driver_intelligence.md").exists());
        assert!(out_dir.join("strategy_intelligence.md").exists());
    }
}
