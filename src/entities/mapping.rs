// 🗺️ Name mapping - raw name → team identity audit rows

use serde::{Deserialize, Serialize};

// ============================================================================
// MATCH TYPE
// ============================================================================

/// How a raw name was tied to its team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    /// Same as a master display name, ignoring case
    Exact,

    /// Same as a master display name after normalization
    Normalized,

    /// Close enough to a master display name to clear the fuzzy threshold
    Fuzzy,

    /// Forced by the manual alias table
    Manual,

    /// Nothing matched; a new identity was minted
    External,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Normalized => "NORMALIZED",
            MatchType::Fuzzy => "FUZZY",
            MatchType::Manual => "MANUAL",
            MatchType::External => "EXTERNAL",
        }
    }
}

// ============================================================================
// MAPPING ENTRY
// ============================================================================

/// One row of the name-mapping audit. Exactly one per observed raw name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMappingEntry {
    pub raw_name: String,
    pub team_id: String,
    pub display_name: String,
    pub match_type: MatchType,

    /// Similarity of the accepted candidate, fuzzy matches only
    #[serde(default)]
    pub score: Option<f64>,
}

// ============================================================================
// ALIAS / UNMATCHED ROWS
// ============================================================================

/// Manual override: this raw name always means this team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub raw_name: String,
    pub team_id: String,
}

impl AliasEntry {
    pub fn new(raw_name: &str, team_id: &str) -> Self {
        AliasEntry {
            raw_name: raw_name.to_string(),
            team_id: team_id.to_string(),
        }
    }
}

/// A raw name the fuzzy stage rejected, for operator review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedName {
    pub raw_name: String,

    /// Closest master display name that still missed the threshold
    #[serde(default)]
    pub best_candidate: Option<String>,

    #[serde(default)]
    pub best_score: Option<f64>,
}
