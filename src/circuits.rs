//! Circuit overtaking scores.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::enrich::EnrichedResult;

/// Overtaking activity at one circuit.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitOvertakingScore {
    pub race_name: String,
    /// Mean absolute position gain per classified result.
    pub overtaking_score: f64,
    pub races_held: u32,
}

#[derive(Default)]
struct CircuitAccumulator {
    abs_gain_sum: f64,
    rows: u64,
    race_ids: HashSet<i64>,
}

/// Score circuits by average positions changed per result.
///
/// Pit-lane starts (grid 0) are excluded before averaging. Circuits with
/// fewer than `min_races` distinct races are dropped from the output, not
/// merely flagged: low-sample scores are too noisy to rank. Output is
/// ordered by score descending.
pub fn calculate_circuit_scores(
    rows: &[EnrichedResult],
    min_races: u32,
) -> Vec<CircuitOvertakingScore> {
    let mut groups: HashMap<&str, CircuitAccumulator> = HashMap::new();

    for row in rows {
        if row.grid == 0 {
            continue;
        }
        let acc = groups.entry(row.race_name.as_str()).or_default();
        acc.abs_gain_sum += row.position_gain.unsigned_abs() as f64;
        acc.rows += 1;
        acc.race_ids.insert(row.race_id);
    }

    let mut scores: Vec<CircuitOvertakingScore> = groups
        .into_iter()
        .filter(|(_, acc)| acc.race_ids.len() >= min_races as usize)
        .map(|(race_name, acc)| CircuitOvertakingScore {
            race_name: race_name.to_string(),
            overtaking_score: acc.abs_gain_sum / acc.rows as f64,
            races_held: acc.race_ids.len() as u32,
        })
        .collect();

    scores.sort_by(|a, b| {
        b.overtaking_score
            .total_cmp(&a.overtaking_score)
            .then_with(|| a.race_name.cmp(&b.race_name))
    });
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RaceResult;
    use crate::enrich::{enrich_results, FinishPolicy};

    fn result(race_id: i64, race_name: &str, grid: i64, position_order: i64) -> RaceResult {
        RaceResult {
            race_id,
            driver_id: race_id * 10 + position_order,
            constructor_id: 1,
            grid,
            position_order,
            points: 0.0,
            status_id: 1,
            year: 2019,
            round: 1,
            race_name: race_name.to_string(),
            driver_name: "Driver".to_string(),
            constructor_name: "Team".to_string(),
        }
    }

    fn circuit_rows(race_name: &str, races: i64) -> Vec<RaceResult> {
        // One row per race: grid 5, finish 2, so |gain| = 3 everywhere.
        (0..races)
            .map(|i| result(i + 1, race_name, 5, 2))
            .collect()
    }

    fn scores_for(rows: &[RaceResult], min_races: u32) -> Vec<CircuitOvertakingScore> {
        calculate_circuit_scores(&enrich_results(rows, &FinishPolicy::default()), min_races)
    }

    #[test]
    fn test_below_floor_excluded() {
        let rows = circuit_rows("Circuit X", 9);

        let scores = scores_for(&rows, 10);

        assert!(scores.is_empty());
    }

    #[test]
    fn test_at_floor_included() {
        let rows = circuit_rows("Circuit X", 10);

        let scores = scores_for(&rows, 10);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].race_name, "Circuit X");
        assert_eq!(scores[0].races_held, 10);
        assert!((scores[0].overtaking_score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_absolute_gain() {
        // Gains +3 and -5: mean of |gain| is 4.
        let rows = vec![
            result(1, "Circuit X", 5, 2),
            result(2, "Circuit X", 3, 8),
        ];

        let scores = scores_for(&rows, 1);

        assert!((scores[0].overtaking_score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_pit_lane_starts_excluded() {
        let mut rows = circuit_rows("Circuit X", 10);
        // A pit-lane start with a huge nominal delta must not move the score.
        rows.push(result(99, "Circuit X", 0, 20));

        let scores = scores_for(&rows, 10);

        assert!((scores[0].overtaking_score - 3.0).abs() < 1e-9);
        // The extra row is also not a distinct race for the floor.
        assert_eq!(scores[0].races_held, 10);
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(result(i + 1, "Processional", 2, 1));
            rows.push(result(i + 101, "Overtaking Festival", 10, 1));
        }

        let scores = scores_for(&rows, 10);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].race_name, "Overtaking Festival");
        assert!(scores[0].overtaking_score > scores[1].overtaking_score);
    }
}
