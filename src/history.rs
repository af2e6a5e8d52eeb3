// 📜 Match History Builder - two-sided match records → per-team perspective rows
//
// Every surviving record yields exactly two rows, one from each side:
//   (home, away, date, home_score, away_score) and its mirror.

use crate::quality::QualityReport;
use crate::resolver::Resolution;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, info_span};

// ============================================================================
// MATCH RECORD
// ============================================================================

/// One observed match, names exactly as the source wrote them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_name: String,
    pub away_name: String,
    pub home_score: u32,
    pub away_score: u32,

    /// None when the source date could not be parsed
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl MatchRecord {
    pub fn new(
        home_name: &str,
        away_name: &str,
        home_score: u32,
        away_score: u32,
        date: Option<NaiveDate>,
    ) -> Self {
        MatchRecord {
            home_name: home_name.to_string(),
            away_name: away_name.to_string(),
            home_score,
            away_score,
            date,
            competition: None,
            venue: None,
        }
    }

    /// Builder pattern: add optional competition label
    pub fn with_competition(mut self, competition: &str) -> Self {
        self.competition = Some(competition.to_string());
        self
    }

    /// Builder pattern: add optional venue label
    pub fn with_venue(mut self, venue: &str) -> Self {
        self.venue = Some(venue.to_string());
        self
    }

    /// Orientation-free identity of the game: the same fixture reported with
    /// home and away swapped gives the same key.
    fn fixture_key(&self) -> (Option<NaiveDate>, &str, u32, &str, u32) {
        if self.home_name <= self.away_name {
            (self.date, self.home_name.as_str(), self.home_score, self.away_name.as_str(), self.away_score)
        } else {
            (self.date, self.away_name.as_str(), self.away_score, self.home_name.as_str(), self.home_score)
        }
    }
}

// ============================================================================
// PERSPECTIVE ROW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

impl GameResult {
    pub fn from_goals(goals_for: u32, goals_against: u32) -> Self {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Draw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::Win => "W",
            GameResult::Loss => "L",
            GameResult::Draw => "D",
        }
    }
}

/// One game seen from one team's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPerspectiveRecord {
    pub team_id: String,
    pub opponent_id: String,
    pub date: Option<NaiveDate>,
    pub goals_for: u32,
    pub goals_against: u32,
    pub result: GameResult,
    #[serde(default)]
    pub competition: Option<String>,
}

impl TeamPerspectiveRecord {
    /// The same game from the opponent's side
    pub fn mirror(&self) -> TeamPerspectiveRecord {
        TeamPerspectiveRecord {
            team_id: self.opponent_id.clone(),
            opponent_id: self.team_id.clone(),
            date: self.date,
            goals_for: self.goals_against,
            goals_against: self.goals_for,
            result: GameResult::from_goals(self.goals_against, self.goals_for),
            competition: self.competition.clone(),
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Output of [`build_history`]
#[derive(Debug, Clone, Default)]
pub struct History {
    pub rows: Vec<TeamPerspectiveRecord>,

    /// Input records that produced rows
    pub records_used: usize,

    pub quality: QualityReport,
}

/// Drop repeat reports of the same game, keeping the first.
///
/// Two records are the same game when date, names and scores agree once
/// orientation is ignored.
pub fn dedupe_matches(records: &[MatchRecord], quality: &mut QualityReport) -> Vec<MatchRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        if seen.insert(record.fixture_key()) {
            kept.push(record.clone());
        } else {
            quality.warn(
                format!("record {}", position),
                format!(
                    "duplicate of an earlier record: {} {}-{} {}",
                    record.home_name, record.home_score, record.away_score, record.away_name
                ),
            );
        }
    }

    kept
}

/// Expand match records into perspective rows using an already computed
/// resolution. Records with a side missing from the mapping are dropped and
/// reported as invariant violations.
pub fn build_history(records: &[MatchRecord], resolution: &Resolution) -> History {
    let span = info_span!("build_history", records = records.len());
    let _guard = span.enter();

    let mut history = History {
        rows: Vec::with_capacity(records.len() * 2),
        ..History::default()
    };

    for (position, record) in records.iter().enumerate() {
        let home = resolution.team_id(&record.home_name);
        let away = resolution.team_id(&record.away_name);

        let (Some(home_id), Some(away_id)) = (home, away) else {
            let missing = if home.is_none() {
                &record.home_name
            } else {
                &record.away_name
            };
            history.quality.violation(
                format!("record {}", position),
                format!("raw name '{}' missing from mapping, record dropped", missing),
            );
            continue;
        };

        let row = TeamPerspectiveRecord {
            team_id: home_id.to_string(),
            opponent_id: away_id.to_string(),
            date: record.date,
            goals_for: record.home_score,
            goals_against: record.away_score,
            result: GameResult::from_goals(record.home_score, record.away_score),
            competition: record.competition.clone(),
        };
        let mirror = row.mirror();

        history.rows.push(row);
        history.rows.push(mirror);
        history.records_used += 1;
    }

    info!(
        rows = history.rows.len(),
        dropped = records.len() - history.records_used,
        "history built"
    );

    history
}

// ============================================================================
// TESTS
// ============================================================================
