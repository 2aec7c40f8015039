//! Derived per-result fields.
//!
//! Turns raw result rows into enriched rows carrying the position delta and
//! the win/podium/DNF flags every aggregator reads.

use std::collections::HashSet;

use crate::dataset::RaceResult;

/// Status ids that count as a classified finish.
///
/// The default covers "Finished" (1) and the lapped finishes "+1 Lap"
/// through "+9 Laps" (11..19). The set is injectable because any other
/// status scheme would be silently misclassified by a hard-coded constant.
#[derive(Debug, Clone)]
pub struct FinishPolicy {
    finished: HashSet<i64>,
}

impl FinishPolicy {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            finished: ids.into_iter().collect(),
        }
    }

    pub fn is_finished(&self, status_id: i64) -> bool {
        self.finished.contains(&status_id)
    }
}

impl Default for FinishPolicy {
    fn default() -> Self {
        Self::new(std::iter::once(1).chain(11..=19))
    }
}

/// Result row plus derived analytics fields.
#[derive(Debug, Clone)]
pub struct EnrichedResult {
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub grid: i64,
    pub position_order: i64,
    pub points: f64,
    pub status_id: i64,
    pub year: i32,
    pub round: i32,
    pub race_name: String,
    pub driver_name: String,
    pub constructor_name: String,
    /// Grid position minus finishing order; 0 for pit-lane starts so they
    /// never read as deliberate position loss.
    pub position_gain: i64,
    pub is_win: bool,
    pub is_podium: bool,
    pub is_dnf: bool,
}

/// Derive per-result fields, one output row per input row.
pub fn enrich_results(rows: &[RaceResult], policy: &FinishPolicy) -> Vec<EnrichedResult> {
    rows.iter()
        .map(|row| EnrichedResult {
            race_id: row.race_id,
            driver_id: row.driver_id,
            constructor_id: row.constructor_id,
            grid: row.grid,
            position_order: row.position_order,
            points: row.points,
            status_id: row.status_id,
            year: row.year,
            round: row.round,
            race_name: row.race_name.clone(),
            driver_name: row.driver_name.clone(),
            constructor_name: row.constructor_name.clone(),
            position_gain: if row.grid > 0 {
                row.grid - row.position_order
            } else {
                0
            },
            is_win: row.position_order == 1,
            is_podium: row.position_order <= 3,
            is_dnf: !policy.is_finished(row.status_id),
        })
        .collect()
}
