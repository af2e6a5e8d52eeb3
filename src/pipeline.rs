// 🏁 Pipeline - match records + master list → rankings and mapping audit
//
// resolve names → (dedupe) → perspective rows → rank
//
// Pure over its inputs: the same input and config always produce the same
// output. Only structural problems (bad master list, bad alias table, bad
// config) abort a run; everything else lands in the quality report.

use crate::config::PipelineConfig;
use crate::entities::{AliasEntry, MasterTeam, NameMappingEntry, TeamRegistry, UnmatchedName};
use crate::error::ValidationError;
use crate::history::{build_history, dedupe_matches, MatchRecord, TeamPerspectiveRecord};
use crate::quality::QualityReport;
use crate::ranking::{RankingEngine, TeamRankingRow};
use crate::resolver::IdentityResolver;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, info_span};

#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    /// Scopes external ids, e.g. "2015-boys-gold"
    pub division_key: String,
    pub matches: Vec<MatchRecord>,
    pub master: Vec<MasterTeam>,
    pub aliases: Vec<AliasEntry>,

    /// Externally computed schedule strength by team_id
    pub sos_signal: Option<BTreeMap<String, f64>>,
}

impl PipelineInput {
    pub fn new(division_key: &str, matches: Vec<MatchRecord>, master: Vec<MasterTeam>) -> Self {
        PipelineInput {
            division_key: division_key.to_string(),
            matches,
            master,
            ..PipelineInput::default()
        }
    }

    /// Builder pattern: add a manual alias table
    pub fn with_aliases(mut self, aliases: Vec<AliasEntry>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Builder pattern: add a schedule-strength signal
    pub fn with_sos_signal(mut self, sos_signal: BTreeMap<String, f64>) -> Self {
        self.sos_signal = Some(sos_signal);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub rankings: Vec<TeamRankingRow>,
    pub mapping: Vec<NameMappingEntry>,
    pub unmatched: Vec<UnmatchedName>,
    pub history: Vec<TeamPerspectiveRecord>,
    pub quality: QualityReport,
    pub evaluation_date: Option<NaiveDate>,
}

pub fn run(input: &PipelineInput, config: &PipelineConfig) -> Result<PipelineOutput, ValidationError> {
    let span = info_span!(
        "pipeline",
        division = %input.division_key,
        matches = input.matches.len(),
        master = input.master.len()
    );
    let _guard = span.enter();

    config.validate()?;

    let registry = TeamRegistry::from_master(&input.master)?;
    let resolver = IdentityResolver::new(registry, &input.division_key, &config.resolver);

    let names = input
        .matches
        .iter()
        .flat_map(|m| [m.home_name.as_str(), m.away_name.as_str()]);
    let resolution = resolver.resolve(names, &input.aliases)?;

    let mut quality = QualityReport::new();
    let deduped;
    let records: &[MatchRecord] = if config.dedupe_matches {
        deduped = dedupe_matches(&input.matches, &mut quality);
        &deduped
    } else {
        &input.matches
    };

    let history = build_history(records, &resolution);

    let engine = RankingEngine::new(config.ranking.clone());
    let table = engine.rank(
        &history.rows,
        &resolution.identities,
        input.sos_signal.as_ref(),
    )?;

    quality.merge(resolution.quality.clone());
    quality.merge(history.quality);
    quality.merge(table.quality);

    info!(
        teams = table.rows.len(),
        mapped = resolution.entries.len(),
        unmatched = resolution.unmatched.len(),
        quality = %quality.summary(),
        "pipeline finished"
    );

    Ok(PipelineOutput {
        rankings: table.rows,
        mapping: resolution.mapping_table(),
        unmatched: resolution.unmatched,
        history: history.rows,
        quality,
        evaluation_date: table.evaluation_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MatchType;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn input() -> PipelineInput {
        PipelineInput::new(
            "2015-boys",
            vec![
                MatchRecord::new("Alpha FC", "Bravo FC", 3, 0, date(2025, 4, 1)),
                MatchRecord::new("alpha fc", "Bravo FC", 3, 0, date(2025, 4, 1)),
                MatchRecord::new("Bravo FC", "Charlie Utd", 1, 1, date(2025, 4, 8)),
            ],
            vec![MasterTeam::new("A", "Alpha FC"), MasterTeam::new("B", "Bravo FC")],
        )
    }

    #[test]
    fn test_run_maps_and_ranks() {
        let output = run(&input(), &PipelineConfig::default()).unwrap();

        assert_eq!(output.mapping.len(), 4);
        assert_eq!(output.history.len(), 6);
        assert_eq!(output.rankings.len(), 3);
        assert_eq!(output.evaluation_date, date(2025, 4, 8));

        let charlie = output
            .mapping
            .iter()
            .find(|e| e.raw_name == "Charlie Utd")
            .unwrap();
        assert_eq!(charlie.match_type, MatchType::External);

        // external mint is a warning
        assert!(output.quality.warning_count() >= 1);
        assert_eq!(output.quality.violation_count(), 0);
    }

    #[test]
    fn test_dedupe_is_opt_in() {
        // "alpha fc" vs "Alpha FC" are distinct raw names, so only exact repeats collapse
        let mut input = input();
        input.matches.push(input.matches[0].clone());

        let plain = run(&input, &PipelineConfig::default()).unwrap();
        assert_eq!(plain.history.len(), 8);

        let config = PipelineConfig {
            dedupe_matches: true,
            ..PipelineConfig::default()
        };
        let deduped = run(&input, &config).unwrap();
        assert_eq!(deduped.history.len(), 6);
    }

    #[test]
    fn test_bad_master_aborts() {
        let mut input = input();
        input.master.push(MasterTeam::new("A", "Another"));

        assert_eq!(
            run(&input, &PipelineConfig::default()).unwrap_err(),
            ValidationError::DuplicateTeamId("A".to_string())
        );
    }

    #[test]
    fn test_bad_config_aborts_before_work() {
        let mut config = PipelineConfig::default();
        config.ranking.max_recent_games = 0;
        assert!(matches!(
            run(&input(), &config),
            Err(ValidationError::InvalidConfig { field: "max_recent_games", .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let input = PipelineInput::new("empty", Vec::new(), Vec::new());
        let output = run(&input, &PipelineConfig::default()).unwrap();
        assert!(output.rankings.is_empty());
        assert!(output.mapping.is_empty());
        assert!(output.quality.is_clean());
    }
}
