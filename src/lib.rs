// League Ranker - Core Library
// Team identity resolution and power rankings for youth-sports divisions

pub mod config;      // Tunables: ranking, resolver, pipeline
pub mod entities;    // Master teams, identities, mapping audit rows
pub mod error;       // Fatal validation errors
pub mod history;     // Match records → per-team perspective rows
pub mod normalize;   // Name normalizer
pub mod pipeline;    // End-to-end run
pub mod quality;     // Non-fatal warnings and invariant violations
pub mod ranking;     // Ranking engine
pub mod resolver;    // Identity resolver cascade
pub mod similarity;  // Token-sort fuzzy similarity
pub mod tables;      // CSV input/output

// Re-export commonly used types
pub use config::{PipelineConfig, RankingConfig, ResolverConfig};
pub use entities::{
    external_team_id, AliasEntry, IdentitySource, MasterTeam, MatchType, NameMappingEntry,
    TeamIdentity, TeamRegistry, UnmatchedName,
};
pub use error::ValidationError;
pub use history::{
    build_history, dedupe_matches, GameResult, History, MatchRecord, TeamPerspectiveRecord,
};
pub use normalize::normalize;
pub use pipeline::{run, PipelineInput, PipelineOutput};
pub use quality::{IssueKind, QualityIssue, QualityReport};
pub use ranking::{RankingEngine, RankingTable, SampleStatus, TeamRankingRow};
pub use resolver::{
    ExactMatcher, FuzzyMatcher, IdentityResolver, NormalizedMatcher, Resolution,
    ResolverStrategy, StrategyOutcome,
};
pub use similarity::similarity;
pub use tables::{
    load_aliases, load_master, load_matches, save_mapping, save_rankings, save_unmatched,
    LoadedMatches,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
