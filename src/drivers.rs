//! Career statistics per driver.

use serde::Serialize;
use std::collections::HashMap;

use crate::dataset::RaceResult;
use crate::enrich::EnrichedResult;

/// Career-level statistics for one driver.
#[derive(Debug, Clone, Serialize)]
pub struct DriverCareerStats {
    pub driver_id: i64,
    pub driver_name: String,
    pub total_races: u32,
    pub total_points: f64,
    pub wins: u32,
    pub podiums: u32,
    pub dnfs: u32,
    pub avg_finish: f64,
    pub avg_position_gain: f64,
    /// Sample standard deviation of finishing order. None for a single
    /// race; serializes as null.
    pub consistency: Option<f64>,
    pub win_rate: f64,
    pub podium_rate: f64,
    pub dnf_rate: f64,
    pub points_per_race: f64,
}

#[derive(Default)]
struct DriverAccumulator {
    driver_name: String,
    races: u32,
    points: f64,
    wins: u32,
    podiums: u32,
    dnfs: u32,
    finish_sum: f64,
    finish_sq_sum: f64,
    gain_sum: f64,
}

impl DriverAccumulator {
    fn add(&mut self, row: &EnrichedResult) {
        self.races += 1;
        self.points += row.points;
        self.wins += row.is_win as u32;
        self.podiums += row.is_podium as u32;
        self.dnfs += row.is_dnf as u32;
        let finish = row.position_order as f64;
        self.finish_sum += finish;
        self.finish_sq_sum += finish * finish;
        self.gain_sum += row.position_gain as f64;
    }

    fn finalize(self, driver_id: i64) -> DriverCareerStats {
        let n = self.races as f64;
        let consistency = if self.races > 1 {
            // Sample variance; clamp the tiny negatives that summation
            // order can produce.
            let variance =
                ((self.finish_sq_sum - self.finish_sum * self.finish_sum / n) / (n - 1.0)).max(0.0);
            Some(variance.sqrt())
        } else {
            None
        };

        DriverCareerStats {
            driver_id,
            driver_name: self.driver_name,
            total_races: self.races,
            total_points: self.points,
            wins: self.wins,
            podiums: self.podiums,
            dnfs: self.dnfs,
            avg_finish: self.finish_sum / n,
            avg_position_gain: self.gain_sum / n,
            consistency,
            win_rate: self.wins as f64 / n,
            podium_rate: self.podiums as f64 / n,
            dnf_rate: self.dnfs as f64 / n,
            points_per_race: self.points / n,
        }
    }
}

/// Group enriched results by driver and compute career statistics.
///
/// Every distinct driver in the input produces exactly one row; minimum-race
/// filtering is left to callers. Output is ordered by driver id.
pub fn calculate_driver_stats(rows: &[EnrichedResult]) -> Vec<DriverCareerStats> {
    let mut groups: HashMap<i64, DriverAccumulator> = HashMap::new();

    for row in rows {
        let acc = groups.entry(row.driver_id).or_default();
        if acc.races == 0 {
            acc.driver_name = row.driver_name.clone();
        }
        acc.add(row);
    }

    let mut stats: Vec<DriverCareerStats> = groups
        .into_iter()
        .map(|(driver_id, acc)| acc.finalize(driver_id))
        .collect();
    stats.sort_by_key(|s| s.driver_id);
    stats
}

/// Top N drivers by career points among those above a minimum race count.
pub fn get_top_drivers(
    stats: &[DriverCareerStats],
    min_races: u32,
    n: usize,
) -> Vec<DriverCareerStats> {
    let mut qualified: Vec<DriverCareerStats> = stats
        .iter()
        .filter(|s| s.total_races >= min_races)
        .cloned()
        .collect();
    qualified.sort_by(|a, b| {
        b.total_points
            .total_cmp(&a.total_points)
            .then(a.driver_id.cmp(&b.driver_id))
    });
    qualified.truncate(n);
    qualified
}

/// Distinct driver id to display name mapping.
pub fn driver_names(results: &[RaceResult]) -> HashMap<i64, String> {
    let mut names = HashMap::new();
    for row in results {
        names
            .entry(row.driver_id)
            .or_insert_with(|| row.driver_name.clone());
    }
    names
}
