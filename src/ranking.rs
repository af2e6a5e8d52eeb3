// 🏆 Ranking Engine - resolved match history → deterministic ranking table
//
// Per team:
//   window → recency weights → opponent adjustment → percentiles
//   → composite → games-played penalty → total order
//
// Pure function of (history, identities, config): same input, same table.

use crate::config::RankingConfig;
use crate::entities::TeamIdentity;
use crate::error::ValidationError;
use crate::history::{GameResult, TeamPerspectiveRecord};
use crate::quality::QualityReport;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, info_span};

// ============================================================================
// SAMPLE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleStatus {
    /// Fewer than `provisional_games` eligible games
    Provisional,

    /// At least `provisional_games`, fewer than `full_sample_games`
    LimitedSample,

    FullSample,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Provisional => "Provisional",
            SampleStatus::LimitedSample => "LimitedSample",
            SampleStatus::FullSample => "FullSample",
        }
    }
}

// ============================================================================
// RANKING ROW
// ============================================================================

/// One row of the ranking table. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRankingRow {
    pub rank: usize,
    pub team_id: String,
    pub display_name: String,
    pub power_score: f64,
    pub power_score_adjusted: f64,
    pub penalty: f64,
    pub off_norm: f64,
    pub def_norm: f64,
    pub sos_norm: f64,
    pub games_played: u32,
    pub status: SampleStatus,

    // Record over the windowed games
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

/// Output of [`RankingEngine::rank`]
#[derive(Debug, Clone, Default)]
pub struct RankingTable {
    /// Sorted, rank 1 first
    pub rows: Vec<TeamRankingRow>,

    /// Date the window was measured back from
    pub evaluation_date: Option<NaiveDate>,

    pub quality: QualityReport,
}

// ============================================================================
// PER-TEAM AGGREGATE
// ============================================================================

/// Raw (pre-adjustment) numbers for one team's windowed games
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamAggregate {
    pub team_id: String,
    pub games_played: u32,
    pub off_raw: f64,
    pub def_raw: f64,

    /// Opponent of each kept game, oldest first
    pub opponents: Vec<String>,

    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl TeamAggregate {
    /// Aggregate a team's games, already windowed and in chronological order
    pub fn from_games(team_id: &str, games: &[&TeamPerspectiveRecord], half_life_games: f64) -> Self {
        let weights = recency_weights(games.len(), half_life_games);
        let mut aggregate = TeamAggregate {
            team_id: team_id.to_string(),
            games_played: games.len() as u32,
            ..TeamAggregate::default()
        };

        for (game, weight) in games.iter().zip(&weights) {
            aggregate.off_raw += weight * f64::from(game.goals_for);
            aggregate.def_raw += weight * f64::from(game.goals_against);
            aggregate.opponents.push(game.opponent_id.clone());
            aggregate.goals_for = aggregate.goals_for.saturating_add(game.goals_for);
            aggregate.goals_against = aggregate.goals_against.saturating_add(game.goals_against);
            match game.result {
                GameResult::Win => aggregate.wins += 1,
                GameResult::Loss => aggregate.losses += 1,
                GameResult::Draw => aggregate.draws += 1,
            }
        }

        aggregate
    }
}

// ============================================================================
// RANKING ENGINE
// ============================================================================

pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        RankingEngine { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank every team that appears in `history`.
    ///
    /// `sos_signal`, when given, replaces the adjusted-offense proxy as the
    /// strength-of-schedule input (teams missing from it get its median).
    pub fn rank(
        &self,
        history: &[TeamPerspectiveRecord],
        identities: &BTreeMap<String, TeamIdentity>,
        sos_signal: Option<&BTreeMap<String, f64>>,
    ) -> Result<RankingTable, ValidationError> {
        self.config.validate()?;

        let span = info_span!("rank", rows = history.len());
        let _guard = span.enter();

        let mut quality = QualityReport::new();
        let evaluation_date = self.config.evaluation_date.or_else(|| latest_date(history));

        // Team order (team_id ascending) is the stable input order used for
        // percentile tie-breaks.
        let mut by_team: BTreeMap<&str, Vec<&TeamPerspectiveRecord>> = BTreeMap::new();
        for row in history {
            by_team.entry(row.team_id.as_str()).or_default().push(row);
        }

        // Steps 1-2
        let aggregates: Vec<TeamAggregate> = by_team
            .iter()
            .map(|(team_id, rows)| {
                let kept = self.window(team_id, rows, evaluation_date, &mut quality);
                TeamAggregate::from_games(team_id, &kept, self.config.half_life_games)
            })
            .collect();

        // Step 3
        let (off_adj, def_adj) = opponent_adjusted(&aggregates);

        // Step 4
        let off_norm = percentile_scores(&off_adj);
        let center = median(&off_adj).unwrap_or(1.0);
        let defense_quality: Vec<f64> = def_adj.iter().map(|d| center - d).collect();
        let def_norm = percentile_scores(&defense_quality);
        let sos_norm = match sos_signal {
            Some(signal) if !signal.is_empty() => percentile_scores(&sos_inputs(&aggregates, signal)),
            _ => percentile_scores(&off_adj),
        };

        // Steps 5-7
        let mut rows: Vec<TeamRankingRow> = aggregates
            .iter()
            .enumerate()
            .map(|(i, aggregate)| {
                let display_name = match identities.get(&aggregate.team_id) {
                    Some(identity) => identity.display_name.clone(),
                    None => {
                        quality.violation(
                            aggregate.team_id.as_str(),
                            "team has history but no identity, using team_id as display name",
                        );
                        aggregate.team_id.clone()
                    }
                };
                self.score_row(aggregate, display_name, off_norm[i], def_norm[i], sos_norm[i])
            })
            .collect();

        // Step 8
        rows.sort_by(compare_rows);
        for (position, row) in rows.iter_mut().enumerate() {
            row.rank = position + 1;
        }

        info!(
            teams = rows.len(),
            evaluation_date = ?evaluation_date,
            provisional = rows.iter().filter(|r| r.status == SampleStatus::Provisional).count(),
            "ranking complete"
        );

        Ok(RankingTable {
            rows,
            evaluation_date,
            quality,
        })
    }

    /// Dated games inside `[evaluation_date - window_days, evaluation_date]`,
    /// at most `max_recent_games` of the most recent, oldest first.
    fn window<'a>(
        &self,
        team_id: &str,
        rows: &[&'a TeamPerspectiveRecord],
        evaluation_date: Option<NaiveDate>,
        quality: &mut QualityReport,
    ) -> Vec<&'a TeamPerspectiveRecord> {
        let undated = rows.iter().filter(|r| r.date.is_none()).count();
        if undated > 0 {
            quality.warn(
                team_id,
                format!("{} game(s) without a usable date excluded from the window", undated),
            );
        }

        let Some(end) = evaluation_date else {
            return Vec::new();
        };
        let start = end - Duration::days(self.config.window_days);

        let mut kept: Vec<&TeamPerspectiveRecord> = rows
            .iter()
            .copied()
            .filter(|r| matches!(r.date, Some(d) if d >= start && d <= end))
            .collect();

        let dated = rows.len() - undated;
        if kept.is_empty() && dated > 0 {
            quality.warn(
                team_id,
                format!(
                    "all {} dated game(s) fall outside the window {} to {}",
                    dated, start, end
                ),
            );
        }

        // stable: same-day games keep their input order
        kept.sort_by_key(|r| r.date);

        if kept.len() > self.config.max_recent_games {
            kept.drain(..kept.len() - self.config.max_recent_games);
        }

        debug!(team_id, eligible = kept.len(), "windowed");
        kept
    }

    fn score_row(
        &self,
        aggregate: &TeamAggregate,
        display_name: String,
        off_norm: f64,
        def_norm: f64,
        sos_norm: f64,
    ) -> TeamRankingRow {
        let config = &self.config;
        let power_score =
            round2(config.w_off * off_norm + config.w_def * def_norm + config.w_sos * sos_norm);
        let penalty = games_penalty(aggregate.games_played, config);
        let power_score_adjusted = round2((power_score - penalty).max(0.0));

        TeamRankingRow {
            rank: 0,
            team_id: aggregate.team_id.clone(),
            display_name,
            power_score,
            power_score_adjusted,
            penalty: round2(penalty),
            off_norm,
            def_norm,
            sos_norm,
            games_played: aggregate.games_played,
            status: sample_status(aggregate.games_played, config),
            wins: aggregate.wins,
            losses: aggregate.losses,
            draws: aggregate.draws,
            goals_for: aggregate.goals_for,
            goals_against: aggregate.goals_against,
        }
    }
}

// ============================================================================
// STEP FUNCTIONS
// ============================================================================

fn latest_date(history: &[TeamPerspectiveRecord]) -> Option<NaiveDate> {
    history.iter().filter_map(|r| r.date).max()
}

/// Exponential-decay weights for `n` games, oldest first, summing to 1.
///
/// The newest game has raw weight 1; each step back multiplies by
/// `2^(-1/half_life_games)`.
pub fn recency_weights(n: usize, half_life_games: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let decay = std::f64::consts::LN_2 / half_life_games;
    let raw: Vec<f64> = (0..n)
        .map(|i| (-decay * (n - 1 - i) as f64).exp())
        .collect();
    let total: f64 = raw.iter().sum();

    raw.into_iter().map(|w| w / total).collect()
}

/// Adjusted offense and defense per aggregate, same order.
///
/// Opponent strength is the mean raw offense of the opponents faced; the
/// league average is taken over teams with at least one game. Offense scales
/// by opp/league, defense (goals conceded) by league/opp. Any zero or
/// undefined denominator leaves the value unadjusted.
pub fn opponent_adjusted(aggregates: &[TeamAggregate]) -> (Vec<f64>, Vec<f64>) {
    let raw_offense: HashMap<&str, f64> = aggregates
        .iter()
        .map(|a| (a.team_id.as_str(), a.off_raw))
        .collect();

    let active: Vec<f64> = aggregates
        .iter()
        .filter(|a| a.games_played > 0)
        .map(|a| a.off_raw)
        .collect();
    let league_avg = mean(&active);

    let mut offense = Vec::with_capacity(aggregates.len());
    let mut defense = Vec::with_capacity(aggregates.len());

    for aggregate in aggregates {
        let opponent_strengths: Vec<f64> = aggregate
            .opponents
            .iter()
            .map(|id| raw_offense.get(id.as_str()).copied().unwrap_or(0.0))
            .collect();
        let opponent_avg = mean(&opponent_strengths);

        let (off_factor, def_factor) = match (opponent_avg, league_avg) {
            (Some(opp), Some(league)) => (ratio_or_one(opp, league), ratio_or_one(league, opp)),
            _ => (1.0, 1.0),
        };

        offense.push(aggregate.off_raw * off_factor);
        defense.push(aggregate.def_raw * def_factor);
    }

    (offense, defense)
}

fn ratio_or_one(numerator: f64, denominator: f64) -> f64 {
    let ratio = numerator / denominator;
    if denominator != 0.0 && ratio.is_finite() {
        ratio
    } else {
        1.0
    }
}

/// Fractional-rank percentile of each value mapped onto 1-100.
///
/// Rank is 1-based position in ascending order; equal values are ordered by
/// their position in `values`, never by value, so every entry gets a distinct
/// rank. Score = rank/n × 99 + 1, rounded to 2 decimals.
pub fn percentile_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut scores = vec![0.0; n];
    for (position, &index) in order.iter().enumerate() {
        let percentile = (position + 1) as f64 / n as f64;
        scores[index] = round2(percentile * 99.0 + 1.0);
    }
    scores
}

/// SOS input per aggregate from an upstream signal; gaps take its median
fn sos_inputs(aggregates: &[TeamAggregate], signal: &BTreeMap<String, f64>) -> Vec<f64> {
    let known: Vec<f64> = signal.values().copied().filter(|v| v.is_finite()).collect();
    let fill = median(&known).unwrap_or(0.0);

    aggregates
        .iter()
        .map(|a| match signal.get(&a.team_id) {
            Some(v) if v.is_finite() => *v,
            _ => fill,
        })
        .collect()
}

pub fn sample_status(games_played: u32, config: &RankingConfig) -> SampleStatus {
    if games_played < config.provisional_games {
        SampleStatus::Provisional
    } else if games_played < config.full_sample_games {
        SampleStatus::LimitedSample
    } else {
        SampleStatus::FullSample
    }
}

/// Games-played penalty.
///
/// Provisional: missing games below the provisional tier at the strong rate,
/// plus (with `cascade_tiers`) the whole mild tier as if sitting exactly at
/// the provisional threshold. Limited: missing games below full sample at the
/// mild rate. Full sample: nothing.
pub fn games_penalty(games_played: u32, config: &RankingConfig) -> f64 {
    let low = config.provisional_games;
    let high = config.full_sample_games;

    if games_played < low {
        let strong = f64::from(low - games_played) * config.strong_penalty_per_game;
        if config.cascade_tiers {
            strong + f64::from(high - low) * config.mild_penalty_per_game
        } else {
            strong
        }
    } else if games_played < high {
        f64::from(high - games_played) * config.mild_penalty_per_game
    } else {
        0.0
    }
}

/// Descending by (adjusted, off, def, sos, games), then ascending team_id
fn compare_rows(a: &TeamRankingRow, b: &TeamRankingRow) -> Ordering {
    b.power_score_adjusted
        .total_cmp(&a.power_score_adjusted)
        .then_with(|| b.off_norm.total_cmp(&a.off_norm))
        .then_with(|| b.def_norm.total_cmp(&a.def_norm))
        .then_with(|| b.sos_norm.total_cmp(&a.sos_norm))
        .then_with(|| b.games_played.cmp(&a.games_played))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
