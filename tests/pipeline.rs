// End-to-end runs over a small division

use chrono::NaiveDate;
use league_ranker::{
    external_team_id, run, AliasEntry, MasterTeam, MatchRecord, MatchType, PipelineConfig,
    PipelineInput, SampleStatus, ValidationError,
};
use std::collections::HashSet;

const DIVISION: &str = "2015-boys-gold";
const HUDSON_GREY: &str = "Hudson United 2015 Boys Blue GREY 1";

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn master() -> Vec<MasterTeam> {
    vec![
        MasterTeam::new("T1", "Hudson United 2015 Boys Blue").with_club("Hudson United"),
        MasterTeam::new("T2", "River City 2015 Boys"),
        MasterTeam::new("T3", "Lakeside SC 2015 Boys"),
    ]
}

fn matches() -> Vec<MatchRecord> {
    vec![
        MatchRecord::new("Hudson United 2015 Boys Blue", "River City 2015 Boys", 3, 1, date(2025, 3, 1)),
        MatchRecord::new("River-City 2015 Boys", "Lakeside SC 2015 Boys", 2, 2, date(2025, 3, 8)),
        MatchRecord::new("Lakeside SC 2015 Boyz", HUDSON_GREY, 0, 4, date(2025, 3, 15)),
        MatchRecord::new("Hudson United 2015 Boys Blue", "Lakeside SC 2015 Boys", 1, 0, date(2025, 3, 22))
            .with_competition("Spring Cup"),
        MatchRecord::new("HUSC Blue", "River City 2015 Boys", 2, 0, date(2025, 3, 29)),
        MatchRecord::new("River City 2015 Boys", HUDSON_GREY, 1, 1, None),
    ]
}

fn input() -> PipelineInput {
    PipelineInput::new(DIVISION, matches(), master())
        .with_aliases(vec![AliasEntry::new("HUSC Blue", "T1")])
}

#[test]
fn test_every_raw_name_mapped_exactly_once() {
    let input = input();
    let output = run(&input, &PipelineConfig::default()).unwrap();

    let raw: HashSet<&str> = input
        .matches
        .iter()
        .flat_map(|m| [m.home_name.as_str(), m.away_name.as_str()])
        .collect();
    let mapped: Vec<&str> = output.mapping.iter().map(|e| e.raw_name.as_str()).collect();

    assert_eq!(mapped.len(), raw.len());
    assert_eq!(mapped.iter().copied().collect::<HashSet<_>>(), raw);

    let kind = |name: &str| {
        output
            .mapping
            .iter()
            .find(|e| e.raw_name == name)
            .map(|e| (e.team_id.clone(), e.match_type))
    };
    assert_eq!(kind("Hudson United 2015 Boys Blue"), Some(("T1".to_string(), MatchType::Exact)));
    assert_eq!(kind("River-City 2015 Boys"), Some(("T2".to_string(), MatchType::Normalized)));
    assert_eq!(kind("Lakeside SC 2015 Boyz"), Some(("T3".to_string(), MatchType::Fuzzy)));
    assert_eq!(kind("HUSC Blue"), Some(("T1".to_string(), MatchType::Manual)));
    assert_eq!(kind(HUDSON_GREY).map(|k| k.1), Some(MatchType::External));
}

#[test]
fn test_unmatched_name_gets_stable_external_id() {
    let config = PipelineConfig::default();
    let first = run(&input(), &config).unwrap();
    let second = run(&input(), &config).unwrap();

    let expected = external_team_id(DIVISION, HUDSON_GREY, 16);
    assert_eq!(expected.len(), 16);

    for output in [&first, &second] {
        let entry = output
            .mapping
            .iter()
            .find(|e| e.raw_name == HUDSON_GREY)
            .unwrap();
        assert_eq!(entry.team_id, expected);
        assert_eq!(entry.display_name, HUDSON_GREY);
    }

    // a different division mints a different id for the same name
    assert_ne!(external_team_id("2014-boys-gold", HUDSON_GREY, 16), expected);

    assert!(first.unmatched.iter().any(|u| u.raw_name == HUDSON_GREY));
}

#[test]
fn test_runs_are_reproducible() {
    let config = PipelineConfig::default();
    let a = run(&input(), &config).unwrap();
    let b = run(&input(), &config).unwrap();

    assert_eq!(a.rankings, b.rankings);
    assert_eq!(a.mapping, b.mapping);
    assert_eq!(a.history, b.history);
    assert_eq!(a.quality, b.quality);
}

#[test]
fn test_rankings_are_a_total_order() {
    let output = run(&input(), &PipelineConfig::default()).unwrap();

    // T1, T2, T3 and the external Hudson Grey
    assert_eq!(output.rankings.len(), 4);

    let ranks: Vec<usize> = output.rankings.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);

    let ids: HashSet<&str> = output.rankings.iter().map(|r| r.team_id.as_str()).collect();
    assert_eq!(ids.len(), 4);

    for pair in output.rankings.windows(2) {
        assert!(pair[0].power_score_adjusted >= pair[1].power_score_adjusted);
    }

    for row in &output.rankings {
        assert!(row.power_score_adjusted >= 0.0);
        assert_eq!(row.status, SampleStatus::Provisional);
        assert_eq!(row.wins + row.losses + row.draws, row.games_played);
    }
}

#[test]
fn test_history_is_symmetric() {
    let output = run(&input(), &PipelineConfig::default()).unwrap();

    assert_eq!(output.history.len(), 2 * matches().len());
    for row in &output.history {
        assert!(output.history.contains(&row.mirror()));
    }

    // undated game counted in history, excluded from the window
    let undated = output.history.iter().filter(|r| r.date.is_none()).count();
    assert_eq!(undated, 2);
    assert!(output.quality.warning_count() > 0);
    assert_eq!(output.quality.violation_count(), 0);
}

#[test]
fn test_home_away_orientation_does_not_matter() {
    let forward = PipelineInput::new(
        DIVISION,
        vec![
            MatchRecord::new("River City 2015 Boys", "Lakeside SC 2015 Boys", 2, 1, date(2025, 5, 1)),
            MatchRecord::new("Hudson United 2015 Boys Blue", "River City 2015 Boys", 0, 0, date(2025, 5, 2)),
        ],
        master(),
    );
    let swapped = PipelineInput::new(
        DIVISION,
        vec![
            MatchRecord::new("Lakeside SC 2015 Boys", "River City 2015 Boys", 1, 2, date(2025, 5, 1)),
            MatchRecord::new("River City 2015 Boys", "Hudson United 2015 Boys Blue", 0, 0, date(2025, 5, 2)),
        ],
        master(),
    );

    let config = PipelineConfig::default();
    let a = run(&forward, &config).unwrap();
    let b = run(&swapped, &config).unwrap();

    let mut rows_a = a.history.clone();
    let mut rows_b = b.history.clone();
    let key = |r: &league_ranker::TeamPerspectiveRecord| (r.team_id.clone(), r.opponent_id.clone(), r.date);
    rows_a.sort_by_key(key);
    rows_b.sort_by_key(key);
    assert_eq!(rows_a, rows_b);

    assert_eq!(a.rankings, b.rankings);
}

#[test]
fn test_alias_to_unknown_team_is_fatal() {
    let input = PipelineInput::new(DIVISION, matches(), master())
        .with_aliases(vec![AliasEntry::new("HUSC Blue", "T9")]);

    assert!(matches!(
        run(&input, &PipelineConfig::default()),
        Err(ValidationError::UnknownAliasTarget { .. })
    ));
}

#[test]
fn test_duplicate_display_name_is_fatal() {
    let mut teams = master();
    teams.push(MasterTeam::new("T4", "River City 2015 Boys"));
    let input = PipelineInput::new(DIVISION, matches(), teams);

    assert_eq!(
        run(&input, &PipelineConfig::default()).unwrap_err(),
        ValidationError::DuplicateDisplayName("River City 2015 Boys".to_string())
    );
}

#[test]
fn test_csv_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let matches_path = dir.path().join("matches.csv");
    let master_path = dir.path().join("master.csv");

    std::fs::write(
        &matches_path,
        "home_name,away_name,home_score,away_score,date\n\
         Hudson United 2015 Boys Blue,River City 2015 Boys,2,1,2025-04-05\n\
         River City 2015 Boys,Newcomers FC,3,3,04/12/2025\n",
    )
    .unwrap();
    std::fs::write(
        &master_path,
        "team_id,display_name,club\n\
         T1,Hudson United 2015 Boys Blue,Hudson United\n\
         T2,River City 2015 Boys,\n",
    )
    .unwrap();

    let loaded = league_ranker::load_matches(&matches_path).unwrap();
    let master = league_ranker::load_master(&master_path).unwrap();
    let input = PipelineInput::new(DIVISION, loaded.records, master);
    let output = run(&input, &PipelineConfig::default()).unwrap();

    assert_eq!(output.rankings.len(), 3);
    assert_eq!(output.evaluation_date, date(2025, 4, 12));

    let rankings_path = dir.path().join("rankings.csv");
    league_ranker::save_rankings(&rankings_path, &output.rankings).unwrap();
    let text = std::fs::read_to_string(&rankings_path).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.starts_with("rank,team_id,display_name,power_score"));
}
