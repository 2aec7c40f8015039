//! Season championship point progressions.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::enrich::EnrichedResult;

/// Points scored by one driver in one round, with the running season total.
#[derive(Debug, Clone, Serialize)]
pub struct RoundPoints {
    pub round: i32,
    pub points: f64,
    pub cumulative: f64,
}

/// One contender's season progression.
#[derive(Debug, Clone, Serialize)]
pub struct PointsProgression {
    pub driver_id: i64,
    pub driver_name: String,
    pub season_points: f64,
    pub rounds: Vec<RoundPoints>,
}

/// Leader-versus-runner-up gap for one round. `gap` is None when either
/// driver has no result for the round; misalignment is reported, never
/// zero-filled.
#[derive(Debug, Clone, Serialize)]
pub struct RoundGap {
    pub round: i32,
    pub gap: Option<f64>,
}

/// Top-contender view of one season.
#[derive(Debug, Clone, Serialize)]
pub struct ChampionshipBattle {
    pub year: i32,
    pub contenders: Vec<PointsProgression>,
    pub leader_gaps: Vec<RoundGap>,
}

/// Compute the championship battle for one season.
///
/// The top `top_n` drivers by season points (ties break by driver id) get a
/// round-ordered cumulative progression. Cumulative sums never cross season
/// or driver boundaries. The gap series covers the union of the top two
/// drivers' rounds.
pub fn calculate_battle(rows: &[EnrichedResult], year: i32, top_n: usize) -> ChampionshipBattle {
    let mut totals: HashMap<i64, f64> = HashMap::new();
    let mut names: HashMap<i64, &str> = HashMap::new();
    let mut rounds: HashMap<i64, BTreeMap<i32, f64>> = HashMap::new();

    for row in rows.iter().filter(|r| r.year == year) {
        *totals.entry(row.driver_id).or_insert(0.0) += row.points;
        names.entry(row.driver_id).or_insert(row.driver_name.as_str());
        *rounds
            .entry(row.driver_id)
            .or_default()
            .entry(row.round)
            .or_insert(0.0) += row.points;
    }

    let mut ranked: Vec<(i64, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(top_n);

    let contenders: Vec<PointsProgression> = ranked
        .iter()
        .map(|&(driver_id, season_points)| {
            let mut cumulative = 0.0;
            let progression: Vec<RoundPoints> = rounds[&driver_id]
                .iter()
                .map(|(&round, &points)| {
                    cumulative += points;
                    RoundPoints {
                        round,
                        points,
                        cumulative,
                    }
                })
                .collect();
            PointsProgression {
                driver_id,
                driver_name: names[&driver_id].to_string(),
                season_points,
                rounds: progression,
            }
        })
        .collect();

    let leader_gaps = match contenders.as_slice() {
        [leader, runner_up, ..] => round_gaps(leader, runner_up),
        _ => Vec::new(),
    };

    ChampionshipBattle {
        year,
        contenders,
        leader_gaps,
    }
}

fn round_gaps(leader: &PointsProgression, runner_up: &PointsProgression) -> Vec<RoundGap> {
    let leader_cum: BTreeMap<i32, f64> = leader
        .rounds
        .iter()
        .map(|r| (r.round, r.cumulative))
        .collect();
    let runner_cum: BTreeMap<i32, f64> = runner_up
        .rounds
        .iter()
        .map(|r| (r.round, r.cumulative))
        .collect();

    let all_rounds: BTreeSet<i32> = leader_cum.keys().chain(runner_cum.keys()).copied().collect();

    all_rounds
        .into_iter()
        .map(|round| RoundGap {
            round,
            gap: match (leader_cum.get(&round), runner_cum.get(&round)) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            },
        })
        .collect()
}
