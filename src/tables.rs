// 📂 Tables - CSV in, CSV out
//
// Input readers are forgiving per record: a malformed score becomes 0, an
// unparsable date becomes None, an unreadable row is skipped. Each recovery is
// a DataQualityWarning. Only I/O failures and missing headers are errors.

use crate::entities::{AliasEntry, MasterTeam, NameMappingEntry, UnmatchedName};
use crate::history::MatchRecord;
use crate::quality::QualityReport;
use crate::ranking::TeamRankingRow;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::info;

/// Date layouts accepted in match files, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Highest score taken at face value; anything above is a data-entry error
pub const MAX_SCORE: u32 = 99;

/// Match years outside this range are treated as typos
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1990..=2100;

// ============================================================================
// MATCH ROWS
// ============================================================================

/// A match row as it sits in the file, before any cleanup
#[derive(Debug, Clone, Deserialize)]
struct MatchRow {
    #[serde(default)]
    home_name: String,
    #[serde(default)]
    away_name: String,
    #[serde(default)]
    home_score: String,
    #[serde(default)]
    away_score: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    competition: Option<String>,
    #[serde(default)]
    venue: Option<String>,
}

/// Matches read from a source, plus whatever had to be patched up on the way
#[derive(Debug, Clone, Default)]
pub struct LoadedMatches {
    pub records: Vec<MatchRecord>,
    pub quality: QualityReport,
}

pub fn read_matches<R: Read>(reader: R) -> Result<LoadedMatches> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut loaded = LoadedMatches::default();

    // header line is line 1
    for (i, result) in rdr.deserialize::<MatchRow>().enumerate() {
        let line = i + 2;
        match result {
            Ok(row) => {
                if let Some(record) = clean_match_row(row, line, &mut loaded.quality) {
                    loaded.records.push(record);
                }
            }
            Err(e) => loaded
                .quality
                .warn(format!("line {}", line), format!("unreadable match row skipped: {}", e)),
        }
    }

    Ok(loaded)
}

pub fn load_matches(path: &Path) -> Result<LoadedMatches> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open match file {}", path.display()))?;
    let loaded = read_matches(file)?;
    info!(path = %path.display(), records = loaded.records.len(), "loaded matches");
    Ok(loaded)
}

fn clean_match_row(row: MatchRow, line: usize, quality: &mut QualityReport) -> Option<MatchRecord> {
    let subject = format!("line {}", line);
    let home_name = row.home_name.trim();
    let away_name = row.away_name.trim();

    if home_name.is_empty() || away_name.is_empty() {
        quality.warn(subject, "match row without both team names skipped");
        return None;
    }

    let home_score = parse_score(&row.home_score).unwrap_or_else(|| {
        quality.warn(
            subject.as_str(),
            format!("home_score '{}' is not a valid score, using 0", row.home_score),
        );
        0
    });
    let away_score = parse_score(&row.away_score).unwrap_or_else(|| {
        quality.warn(
            subject.as_str(),
            format!("away_score '{}' is not a valid score, using 0", row.away_score),
        );
        0
    });

    let date = match parse_date(&row.date) {
        Some(date) if PLAUSIBLE_YEARS.contains(&date.year()) => Some(date),
        Some(date) => {
            quality.warn(
                subject.as_str(),
                format!("date {} is implausible, game excluded from windows", date),
            );
            None
        }
        None => {
            quality.warn(
                subject.as_str(),
                format!("date '{}' could not be parsed, game excluded from windows", row.date),
            );
            None
        }
    };

    Some(MatchRecord {
        home_name: home_name.to_string(),
        away_name: away_name.to_string(),
        home_score,
        away_score,
        date,
        competition: non_empty(row.competition),
        venue: non_empty(row.venue),
    })
}

/// Whole number in `0..=MAX_SCORE`; "3.0" is accepted, "3.5", "-1", "500"
/// and "" are not
pub fn parse_score(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(score) = raw.parse::<u32>() {
        return (score <= MAX_SCORE).then_some(score);
    }

    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(MAX_SCORE) {
        Some(value as u32)
    } else {
        None
    }
}

/// Parse a match date in any of [`DATE_FORMATS`]; timestamps keep their date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // "2025-03-01T10:00:00Z", "2025-03-01 10:00"
    raw.get(..10)
        .filter(|_| raw.len() > 10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// MASTER LIST / ALIASES
// ============================================================================

pub fn read_master<R: Read>(reader: R) -> Result<Vec<MasterTeam>> {
    let mut teams: Vec<MasterTeam> = read_strict(reader, "master list")?;
    for team in &mut teams {
        team.club = non_empty(team.club.take());
    }
    Ok(teams)
}

pub fn load_master(path: &Path) -> Result<Vec<MasterTeam>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open master list {}", path.display()))?;
    read_master(file)
}

pub fn read_aliases<R: Read>(reader: R) -> Result<Vec<AliasEntry>> {
    read_strict(reader, "alias table")
}

pub fn load_aliases(path: &Path) -> Result<Vec<AliasEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open alias table {}", path.display()))?;
    read_aliases(file)
}

/// Curated tables are small and hand-maintained: any bad row is an error
fn read_strict<R: Read, T: DeserializeOwned>(reader: R, what: &str) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let row: T = result.with_context(|| format!("Failed to read {} line {}", what, i + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// OUTPUT TABLES
// ============================================================================

pub fn write_table<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to serialize row")?;
    }
    wtr.flush().context("Failed to flush table")?;
    Ok(())
}

fn save_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

pub fn save_rankings(path: &Path, rows: &[TeamRankingRow]) -> Result<()> {
    save_table(path, rows)
}

pub fn save_mapping(path: &Path, rows: &[NameMappingEntry]) -> Result<()> {
    save_table(path, rows)
}

pub fn save_unmatched(path: &Path, rows: &[UnmatchedName]) -> Result<()> {
    save_table(path, rows)
}

// ============================================================================
// TESTS
// ============================================================================
