//! Rolling lap-pace series with outlier suppression.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::dataset::{LapTime, RaceResult};

/// Default number of drivers charted when a request names none.
pub const DEFAULT_PACE_DRIVERS: usize = 5;

/// One smoothed pace sample.
#[derive(Debug, Clone, Serialize)]
pub struct PacePoint {
    pub lap: i64,
    pub seconds: f64,
}

/// Smoothed pace trace for one driver in one race.
#[derive(Debug, Clone, Serialize)]
pub struct DriverPace {
    pub driver_id: i64,
    pub points: Vec<PacePoint>,
}

/// Trailing moving average over lap seconds. Yields nothing until the
/// window is full; a moving average needs all of its samples.
struct RollingWindow {
    window: usize,
    buffer: VecDeque<f64>,
    sum: f64,
}

impl RollingWindow {
    fn new(window: usize) -> Self {
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    fn push(&mut self, value: f64) -> Option<f64> {
        self.buffer.push_back(value);
        self.sum += value;
        if self.buffer.len() > self.window {
            if let Some(evicted) = self.buffer.pop_front() {
                self.sum -= evicted;
            }
        }
        (self.buffer.len() == self.window).then(|| self.sum / self.window as f64)
    }
}

/// Smoothed pace per driver for one race.
///
/// Laps are sorted per driver; a trailing window of size `window` (0 is
/// treated as 1) produces the rolling series, so the first `window - 1`
/// laps of each driver are omitted. Rows whose rolling value exceeds
/// `outlier_factor` times the median of all rolling values in the subset
/// are then dropped. That heuristic strips most pit-inflated laps but is
/// not a pit-stop detector: it can miss slow pit laps and drop legitimately
/// slow clean ones.
pub fn calculate_rolling_pace(
    laps: &[LapTime],
    race_id: i64,
    drivers: &[i64],
    window: usize,
    outlier_factor: f64,
) -> Vec<DriverPace> {
    let window = window.max(1);
    let wanted: HashSet<i64> = drivers.iter().copied().collect();

    let mut per_driver: HashMap<i64, Vec<(i64, f64)>> = HashMap::new();
    for lap in laps {
        if lap.race_id == race_id && wanted.contains(&lap.driver_id) {
            per_driver
                .entry(lap.driver_id)
                .or_default()
                .push((lap.lap, lap.milliseconds as f64 / 1000.0));
        }
    }

    let mut series: Vec<DriverPace> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();
    for &driver_id in drivers {
        if !seen.insert(driver_id) {
            continue;
        }
        let Some(mut rows) = per_driver.remove(&driver_id) else {
            continue;
        };
        rows.sort_by_key(|&(lap, _)| lap);

        let mut rolling = RollingWindow::new(window);
        let points: Vec<PacePoint> = rows
            .into_iter()
            .filter_map(|(lap, seconds)| {
                rolling
                    .push(seconds)
                    .map(|seconds| PacePoint { lap, seconds })
            })
            .collect();

        series.push(DriverPace { driver_id, points });
    }

    let rolling_values: Vec<f64> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.seconds))
        .collect();
    if let Some(median) = median(&rolling_values) {
        let cutoff = median * outlier_factor;
        for s in &mut series {
            s.points.retain(|p| p.seconds <= cutoff);
        }
    }

    series
}

/// Driver ids of the top `n` finishers of one race, best finish first.
pub fn get_top_finishers(results: &[RaceResult], race_id: i64, n: usize) -> Vec<i64> {
    let mut finishers: Vec<(i64, i64)> = results
        .iter()
        .filter(|r| r.race_id == race_id)
        .map(|r| (r.position_order, r.driver_id))
        .collect();
    finishers.sort();
    finishers.into_iter().take(n).map(|(_, id)| id).collect()
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(driver_id: i64, lap: i64, milliseconds: i64) -> LapTime {
        LapTime {
            race_id: 1,
            driver_id,
            lap,
            milliseconds,
        }
    }

    fn constant_laps(driver_id: i64, count: i64, milliseconds: i64) -> Vec<LapTime> {
        (1..=count).map(|n| lap(driver_id, n, milliseconds)).collect()
    }

    #[test]
    fn test_first_window_minus_one_laps_omitted() {
        let laps = constant_laps(1, 5, 90_000);

        let series = calculate_rolling_pace(&laps, 1, &[1], 3, 1.3);

        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].lap, 3);
        assert_eq!(points[2].lap, 5);
    }

    #[test]
    fn test_constant_series_stays_constant() {
        let laps = constant_laps(1, 10, 91_500);

        let series = calculate_rolling_pace(&laps, 1, &[1], 3, 1.3);

        assert_eq!(series[0].points.len(), 8);
        for point in &series[0].points {
            assert!((point.seconds - 91.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pit_inflated_laps_dropped() {
        let mut laps = constant_laps(1, 10, 90_000);
        // Lap 6 includes a stop and is far above clean pace.
        laps[5].milliseconds = 200_000;

        let series = calculate_rolling_pace(&laps, 1, &[1], 3, 1.3);

        // Windows touching the pit lap average 126.7s against a 90s median
        // and are suppressed.
        let laps_kept: Vec<i64> = series[0].points.iter().map(|p| p.lap).collect();
        assert_eq!(laps_kept, vec![3, 4, 5, 9, 10]);
        for point in &series[0].points {
            assert!((point.seconds - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_window_one_is_raw_series() {
        let laps = constant_laps(1, 4, 88_000);

        let series = calculate_rolling_pace(&laps, 1, &[1], 1, 1.3);

        assert_eq!(series[0].points.len(), 4);
        assert_eq!(series[0].points[0].lap, 1);
    }

    #[test]
    fn test_window_zero_treated_as_one() {
        let laps = constant_laps(1, 3, 88_000);

        let series = calculate_rolling_pace(&laps, 1, &[1], 0, 1.3);

        assert_eq!(series[0].points.len(), 3);
    }

    #[test]
    fn test_subset_and_race_filters() {
        let mut laps = constant_laps(1, 5, 90_000);
        laps.extend(constant_laps(2, 5, 92_000));
        // Another race entirely.
        laps.push(LapTime {
            race_id: 2,
            driver_id: 1,
            lap: 1,
            milliseconds: 95_000,
        });

        let series = calculate_rolling_pace(&laps, 1, &[2], 3, 1.3);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].driver_id, 2);
    }

    #[test]
    fn test_series_follow_requested_driver_order() {
        let mut laps = constant_laps(1, 5, 90_000);
        laps.extend(constant_laps(2, 5, 92_000));

        let series = calculate_rolling_pace(&laps, 1, &[2, 1], 3, 1.3);

        let ids: Vec<i64> = series.iter().map(|s| s.driver_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_unsorted_laps_are_sorted_before_smoothing() {
        let laps = vec![
            lap(1, 3, 90_000),
            lap(1, 1, 90_000),
            lap(1, 2, 90_000),
            lap(1, 4, 90_000),
        ];

        let series = calculate_rolling_pace(&laps, 1, &[1], 2, 1.3);

        let laps_kept: Vec<i64> = series[0].points.iter().map(|p| p.lap).collect();
        assert_eq!(laps_kept, vec![2, 3, 4]);
    }

    #[test]
    fn test_get_top_finishers() {
        let result = |driver_id: i64, position_order: i64| RaceResult {
            race_id: 1,
            driver_id,
            constructor_id: 1,
            grid: 1,
            position_order,
            points: 0.0,
            status_id: 1,
            year: 2019,
            round: 1,
            race_name: "Test Grand Prix".to_string(),
            driver_name: "Driver".to_string(),
            constructor_name: "Team".to_string(),
        };
        let results = vec![result(30, 3), result(10, 1), result(20, 2), result(40, 4)];

        let top = get_top_finishers(&results, 1, 3);

        assert_eq!(top, vec![10, 20, 30]);
    }
}
