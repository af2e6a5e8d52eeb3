// 🏟️ Team Entity - stable identity for a team across every spelling of its name
//
// "team_id is IDENTITY (never changes), display_name is how we show it"
//
// Problem solved:
// - "Hudson Utd 2015 Boys", "HUDSON UNITED 2015 BOYS", "Hudson United 2015 Boys"
//   → one team, one team_id
// - Teams missing from the master list still get a reproducible identity

use crate::error::ValidationError;
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

// ============================================================================
// IDENTITY SOURCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// Listed in the curated master identity list
    Master,

    /// Minted from an observed raw name that matched nothing
    External,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Master => "master",
            IdentitySource::External => "external",
        }
    }
}

// ============================================================================
// MASTER TEAM (input row)
// ============================================================================

/// One row of the master identity list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterTeam {
    pub team_id: String,
    pub display_name: String,
    #[serde(default)]
    pub club: Option<String>,
}

impl MasterTeam {
    pub fn new(team_id: &str, display_name: &str) -> Self {
        MasterTeam {
            team_id: team_id.to_string(),
            display_name: display_name.to_string(),
            club: None,
        }
    }

    /// Builder pattern: add optional club
    pub fn with_club(mut self, club: &str) -> Self {
        self.club = Some(club.to_string());
        self
    }
}

// ============================================================================
// TEAM IDENTITY
// ============================================================================

/// The canonical identity a raw name resolves to.
///
/// Created once per distinct team by the resolver and never changed during a
/// ranking run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub team_id: String,
    pub display_name: String,
    pub club: Option<String>,
    pub source: IdentitySource,
}

impl TeamIdentity {
    pub fn from_master(team: &MasterTeam) -> Self {
        TeamIdentity {
            team_id: team.team_id.clone(),
            display_name: team.display_name.clone(),
            club: team.club.clone(),
            source: IdentitySource::Master,
        }
    }

    /// Mint an external identity for a raw name nobody recognised.
    ///
    /// The id is the first `id_len` hex chars of SHA-256 over
    /// `"{division_key}:{raw_name}"`, so the same name in the same division
    /// always mints the same id.
    pub fn external(division_key: &str, raw_name: &str, id_len: usize) -> Self {
        TeamIdentity {
            team_id: external_team_id(division_key, raw_name, id_len),
            display_name: raw_name.to_string(),
            club: None,
            source: IdentitySource::External,
        }
    }

    pub fn is_external(&self) -> bool {
        self.source == IdentitySource::External
    }
}

pub fn external_team_id(division_key: &str, raw_name: &str, id_len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", division_key, raw_name));
    let digest = format!("{:x}", hasher.finalize());
    digest.chars().take(id_len).collect()
}

// ============================================================================
// TEAM REGISTRY
// ============================================================================

/// Validated master identity list with the lookup tables matching needs.
///
/// Construction fails on duplicate team_ids, duplicate display_names or empty
/// fields; nothing gets resolved against a corrupt list.
#[derive(Debug, Clone)]
pub struct TeamRegistry {
    teams: Vec<TeamIdentity>,
    by_id: HashMap<String, usize>,
    by_lowercase: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
    normalized_names: Vec<String>,
}

impl TeamRegistry {
    pub fn from_master(master: &[MasterTeam]) -> Result<Self, ValidationError> {
        let mut seen_names = HashSet::new();
        let mut registry = TeamRegistry {
            teams: Vec::with_capacity(master.len()),
            by_id: HashMap::with_capacity(master.len()),
            by_lowercase: HashMap::with_capacity(master.len()),
            by_normalized: HashMap::with_capacity(master.len()),
            normalized_names: Vec::with_capacity(master.len()),
        };

        for (row, team) in master.iter().enumerate() {
            if team.team_id.trim().is_empty() {
                return Err(ValidationError::EmptyMasterField { row, field: "team_id" });
            }
            if team.display_name.trim().is_empty() {
                return Err(ValidationError::EmptyMasterField { row, field: "display_name" });
            }
            if registry.by_id.contains_key(&team.team_id) {
                return Err(ValidationError::DuplicateTeamId(team.team_id.clone()));
            }
            if !seen_names.insert(team.display_name.as_str()) {
                return Err(ValidationError::DuplicateDisplayName(team.display_name.clone()));
            }

            let index = registry.teams.len();
            let normalized = normalize(&team.display_name);

            registry.by_id.insert(team.team_id.clone(), index);

            // Names that differ only in case or punctuation are legal but
            // ambiguous for matching: the first listed team keeps the key.
            let lowercase = team.display_name.to_lowercase();
            if let Some(&first) = registry.by_lowercase.get(&lowercase) {
                warn!(
                    team_id = %team.team_id,
                    shadowed_by = %registry.teams[first].team_id,
                    "display name collides case-insensitively with an earlier master team"
                );
            } else {
                registry.by_lowercase.insert(lowercase, index);
            }
            if let Some(&first) = registry.by_normalized.get(&normalized) {
                warn!(
                    team_id = %team.team_id,
                    shadowed_by = %registry.teams[first].team_id,
                    "display name collides after normalization with an earlier master team"
                );
            } else {
                registry.by_normalized.insert(normalized.clone(), index);
            }

            registry.teams.push(TeamIdentity::from_master(team));
            registry.normalized_names.push(normalized);
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Teams in master-list order
    pub fn teams(&self) -> &[TeamIdentity] {
        &self.teams
    }

    pub fn get(&self, index: usize) -> Option<&TeamIdentity> {
        self.teams.get(index)
    }

    pub fn find_by_id(&self, team_id: &str) -> Option<&TeamIdentity> {
        self.index_of(team_id).map(|i| &self.teams[i])
    }

    /// Position of `team_id` in master order
    pub fn index_of(&self, team_id: &str) -> Option<usize> {
        self.by_id.get(team_id).copied()
    }

    /// Index of the team whose display name equals `name` ignoring case
    pub fn find_exact(&self, name: &str) -> Option<usize> {
        self.by_lowercase.get(&name.to_lowercase()).copied()
    }

    /// Index of the team whose normalized display name equals `normalized`
    pub fn find_normalized(&self, normalized: &str) -> Option<usize> {
        self.by_normalized.get(normalized).copied()
    }

    /// Normalized display names, aligned with [`TeamRegistry::teams`]
    pub fn normalized_names(&self) -> &[String] {
        &self.normalized_names
    }

    /// Display names keyed by team_id, for reporting
    pub fn display_names(&self) -> BTreeMap<String, String> {
        self.teams
            .iter()
            .map(|t| (t.team_id.clone(), t.display_name.clone()))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Vec<MasterTeam> {
        vec![
            MasterTeam::new("T1", "Hudson United 2015 Boys Blue").with_club("Hudson United"),
            MasterTeam::new("T2", "River City Strikers 2015 Boys"),
            MasterTeam::new("T3", "Atlético Jrs 2014 Girls"),
        ]
    }

    #[test]
    fn test_registry_lookups() {
        let registry = TeamRegistry::from_master(&master()).unwrap();
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.find_exact("HUDSON UNITED 2015 BOYS BLUE"), Some(0));
        assert_eq!(registry.find_exact("Hudson United 2015 Boys"), None);

        assert_eq!(registry.find_normalized("atletico jrs 2014 girls"), Some(2));
        assert_eq!(registry.normalized_names()[1], "river city strikers 2015 boys");

        let t1 = registry.find_by_id("T1").unwrap();
        assert_eq!(t1.club.as_deref(), Some("Hudson United"));
        assert_eq!(t1.source, IdentitySource::Master);
        assert!(registry.find_by_id("T9").is_none());

        assert_eq!(registry.index_of("T1"), Some(0));
        assert_eq!(registry.index_of("t1"), None);
        assert_eq!(registry.index_of("T9"), None);
    }

    #[test]
    fn test_duplicate_team_id_is_fatal() {
        let mut teams = master();
        teams.push(MasterTeam::new("T2", "Someone Else"));

        let err = TeamRegistry::from_master(&teams).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateTeamId("T2".to_string()));
    }

    #[test]
    fn test_duplicate_display_name_is_fatal() {
        let mut teams = master();
        teams.push(MasterTeam::new("T4", "River City Strikers 2015 Boys"));

        let err = TeamRegistry::from_master(&teams).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateDisplayName("River City Strikers 2015 Boys".to_string())
        );
    }

    #[test]
    fn test_empty_fields_are_fatal() {
        let teams = vec![MasterTeam::new("T1", "A"), MasterTeam::new("  ", "B")];
        let err = TeamRegistry::from_master(&teams).unwrap_err();
        assert_eq!(err, ValidationError::EmptyMasterField { row: 1, field: "team_id" });

        let teams = vec![MasterTeam::new("T1", "")];
        let err = TeamRegistry::from_master(&teams).unwrap_err();
        assert_eq!(err, ValidationError::EmptyMasterField { row: 0, field: "display_name" });
    }

    #[test]
    fn test_case_collision_keeps_first_team() {
        let teams = vec![
            MasterTeam::new("T1", "Lions FC"),
            MasterTeam::new("T2", "LIONS FC"),
        ];
        let registry = TeamRegistry::from_master(&teams).unwrap();
        assert_eq!(registry.find_exact("lions fc"), Some(0));
        assert_eq!(registry.find_normalized("lions fc"), Some(0));
        assert_eq!(registry.find_by_id("T2").unwrap().display_name, "LIONS FC");
    }

    #[test]
    fn test_external_id_is_deterministic() {
        let a = TeamIdentity::external("u11-boys", "Hudson United 2015 Boys Blue GREY 1", 16);
        let b = TeamIdentity::external("u11-boys", "Hudson United 2015 Boys Blue GREY 1", 16);
        let other_division = TeamIdentity::external("u12-boys", "Hudson United 2015 Boys Blue GREY 1", 16);

        assert_eq!(a, b);
        assert_eq!(a.team_id.len(), 16);
        assert!(a.team_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.team_id, other_division.team_id);
        assert_eq!(a.display_name, "Hudson United 2015 Boys Blue GREY 1");
        assert!(a.is_external());
    }

    #[test]
    fn test_external_id_matches_sha256_prefix() {
        // sha256("d:abc")
        let mut hasher = Sha256::new();
        hasher.update(b"d:abc");
        let full = format!("{:x}", hasher.finalize());

        assert_eq!(external_team_id("d", "abc", 12), &full[..12]);
        assert_eq!(external_team_id("d", "abc", 64), full);
    }
}
