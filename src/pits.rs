//! Constructor pit-stop profiles and summaries.

use serde::Serialize;
use std::collections::HashMap;

use crate::dataset::{PitStop, RaceResult};

/// One pit-stop event attributed to a constructor.
#[derive(Debug, Clone, Serialize)]
pub struct ConstructorPitProfile {
    pub race_id: i64,
    pub driver_id: i64,
    pub stop: i64,
    pub constructor_name: String,
    pub year: i32,
    pub seconds: f64,
}

/// Distributional summary of one constructor's stops.
#[derive(Debug, Clone, Serialize)]
pub struct ConstructorPitSummary {
    pub constructor_name: String,
    pub stops: u32,
    pub median_seconds: f64,
    pub q1_seconds: f64,
    pub q3_seconds: f64,
}

/// Join pit stops to constructor identity and normalize durations.
///
/// The constructor and year come from the `(raceId, driverId)` result row;
/// unattributed pit stops (no matching result) are excluded. Stops at or
/// above `cutoff_ms` are excluded as repair or penalty length, not
/// representative of crew performance.
pub fn calculate_pit_profiles(
    pit_stops: &[PitStop],
    results: &[RaceResult],
    cutoff_ms: i64,
) -> Vec<ConstructorPitProfile> {
    let mut teams: HashMap<(i64, i64), (&str, i32)> = HashMap::new();
    for row in results {
        teams
            .entry((row.race_id, row.driver_id))
            .or_insert((&row.constructor_name, row.year));
    }

    pit_stops
        .iter()
        .filter(|stop| stop.milliseconds < cutoff_ms)
        .filter_map(|stop| {
            let (constructor_name, year) = teams.get(&(stop.race_id, stop.driver_id))?;
            Some(ConstructorPitProfile {
                race_id: stop.race_id,
                driver_id: stop.driver_id,
                stop: stop.stop,
                constructor_name: constructor_name.to_string(),
                year: *year,
                seconds: stop.milliseconds as f64 / 1000.0,
            })
        })
        .collect()
}

/// Summaries for the top N constructors by stop volume within a year range.
///
/// Output is ordered fastest median first.
pub fn summarize_pit_stops(
    profiles: &[ConstructorPitProfile],
    year_from: i32,
    year_to: i32,
    top_n: usize,
) -> Vec<ConstructorPitSummary> {
    let mut durations: HashMap<&str, Vec<f64>> = HashMap::new();
    for profile in profiles {
        if profile.year >= year_from && profile.year <= year_to {
            durations
                .entry(profile.constructor_name.as_str())
                .or_default()
                .push(profile.seconds);
        }
    }

    // Keep the top N constructors by volume before summarizing.
    let mut by_volume: Vec<(&str, Vec<f64>)> = durations.into_iter().collect();
    by_volume.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
    by_volume.truncate(top_n);

    let mut summaries: Vec<ConstructorPitSummary> = by_volume
        .into_iter()
        .map(|(constructor_name, mut seconds)| {
            seconds.sort_by(f64::total_cmp);
            ConstructorPitSummary {
                constructor_name: constructor_name.to_string(),
                stops: seconds.len() as u32,
                median_seconds: percentile(&seconds, 0.5),
                q1_seconds: percentile(&seconds, 0.25),
                q3_seconds: percentile(&seconds, 0.75),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        a.median_seconds
            .total_cmp(&b.median_seconds)
            .then_with(|| a.constructor_name.cmp(&b.constructor_name))
    });
    summaries
}

/// Linear-interpolation percentile over sorted values. `values` must be
/// non-empty and sorted ascending.
fn percentile(values: &[f64], p: f64) -> f64 {
    let idx = p * (values.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        values[lo] + (values[hi] - values[lo]) * (idx - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pit_stop(race_id: i64, driver_id: i64, stop: i64, milliseconds: i64) -> PitStop {
        PitStop {
            race_id,
            driver_id,
            stop,
            milliseconds,
        }
    }

    fn result(race_id: i64, driver_id: i64, constructor_name: &str, year: i32) -> RaceResult {
        RaceResult {
            race_id,
            driver_id,
            constructor_id: 1,
            grid: 1,
            position_order: 1,
            points: 0.0,
            status_id: 1,
            year,
            round: 1,
            race_name: "Test Grand Prix".to_string(),
            driver_name: "Driver".to_string(),
            constructor_name: constructor_name.to_string(),
        }
    }

    #[test]
    fn test_join_and_seconds() {
        let results = vec![result(841, 153, "Sauber", 2011)];
        let stops = vec![pit_stop(841, 153, 1, 26898)];

        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].constructor_name, "Sauber");
        assert_eq!(profiles[0].year, 2011);
        assert!((profiles[0].seconds - 26.898).abs() < 1e-9);
    }

    #[test]
    fn test_unattributed_stops_excluded() {
        let results = vec![result(841, 153, "Sauber", 2011)];
        let stops = vec![pit_stop(841, 153, 1, 25000), pit_stop(841, 999, 1, 25000)];

        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].driver_id, 153);
    }

    #[test]
    fn test_cutoff_excludes_long_stops() {
        let results = vec![result(1, 1, "Mercedes", 2016)];
        let stops = vec![
            pit_stop(1, 1, 1, 22000),
            pit_stop(1, 1, 2, 40_000),
            pit_stop(1, 1, 3, 180_000),
        ];

        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        assert_eq!(profiles.len(), 1);
        for profile in &profiles {
            assert!(profile.seconds < 40.0);
            assert!(!profile.constructor_name.is_empty());
        }
    }

    #[test]
    fn test_summary_quartiles() {
        let results = vec![result(1, 1, "Mercedes", 2016)];
        let stops = vec![
            pit_stop(1, 1, 1, 20_000),
            pit_stop(1, 1, 2, 22_000),
            pit_stop(1, 1, 3, 24_000),
            pit_stop(1, 1, 4, 26_000),
            pit_stop(1, 1, 5, 28_000),
        ];
        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        let summaries = summarize_pit_stops(&profiles, 2014, 2020, 10);

        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.stops, 5);
        assert!((s.median_seconds - 24.0).abs() < 1e-9);
        assert!((s.q1_seconds - 22.0).abs() < 1e-9);
        assert!((s.q3_seconds - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_year_range_and_volume() {
        let results = vec![
            result(1, 1, "Mercedes", 2016),
            result(2, 2, "Ferrari", 2016),
            result(3, 3, "Williams", 2005),
        ];
        let stops = vec![
            pit_stop(1, 1, 1, 21_000),
            pit_stop(1, 1, 2, 23_000),
            pit_stop(2, 2, 1, 22_000),
            // Outside the hybrid era; must not appear.
            pit_stop(3, 3, 1, 19_000),
        ];
        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        let summaries = summarize_pit_stops(&profiles, 2014, 2020, 1);

        // Only the highest-volume constructor survives top_n = 1.
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].constructor_name, "Mercedes");
        assert_eq!(summaries[0].stops, 2);
    }

    #[test]
    fn test_summary_ordered_fastest_first() {
        let results = vec![result(1, 1, "Mercedes", 2016), result(1, 2, "Haas", 2016)];
        let stops = vec![
            pit_stop(1, 1, 1, 30_000),
            pit_stop(1, 2, 1, 21_000),
        ];
        let profiles = calculate_pit_profiles(&stops, &results, 40_000);

        let summaries = summarize_pit_stops(&profiles, 2014, 2020, 10);

        assert_eq!(summaries[0].constructor_name, "Haas");
        assert_eq!(summaries[1].constructor_name, "Mercedes");
    }

    #[test]
    fn test_empty_selection_is_empty_output() {
        let summaries = summarize_pit_stops(&[], 2014, 2020, 10);

        assert!(summaries.is_empty());
    }
}
