// 🧭 Identity Resolver - raw team names → stable team identities
//
// Ordered cascade, each stage only sees names the earlier stages left behind:
//   1. Exact (case-insensitive) display name
//   2. Normalized display name
//   3. Fuzzy, bounded by the acceptance threshold
//   4. Manual alias overlay (always wins)
//   5. External identity minted from (division_key, raw_name)
//
// Stages 1-3 are pure strategies tried in order until the first success.

use crate::config::ResolverConfig;
use crate::entities::{
    AliasEntry, MatchType, NameMappingEntry, TeamIdentity, TeamRegistry, UnmatchedName,
};
use crate::error::ValidationError;
use crate::normalize::normalize;
use crate::quality::QualityReport;
use crate::similarity::similarity;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, info_span};

// ============================================================================
// STRATEGY RESULTS
// ============================================================================

/// A master team picked by a strategy
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMatch {
    /// Index into [`TeamRegistry::teams`]
    pub index: usize,
    pub match_type: MatchType,
    pub score: Option<f64>,
}

/// Best candidate a bounded strategy looked at and turned down
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    pub index: Option<usize>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Matched(StrategyMatch),

    /// The strategy does not apply to this name
    NoMatch,

    /// The strategy scored candidates and none cleared its bar
    Rejected(NearMiss),
}

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

/// One stage of the automatic cascade.
///
/// Implementations must be pure: the same (raw name, registry) always gives
/// the same outcome, and nothing is remembered between calls.
pub trait ResolverStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, raw_name: &str, registry: &TeamRegistry) -> StrategyOutcome;
}

/// Stage 1: display name equal ignoring case
pub struct ExactMatcher;

impl ResolverStrategy for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn resolve(&self, raw_name: &str, registry: &TeamRegistry) -> StrategyOutcome {
        match registry.find_exact(raw_name) {
            Some(index) => StrategyOutcome::Matched(StrategyMatch {
                index,
                match_type: MatchType::Exact,
                score: None,
            }),
            None => StrategyOutcome::NoMatch,
        }
    }
}

/// Stage 2: display name equal after normalization
pub struct NormalizedMatcher;

impl ResolverStrategy for NormalizedMatcher {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn resolve(&self, raw_name: &str, registry: &TeamRegistry) -> StrategyOutcome {
        let normalized = normalize(raw_name);
        if normalized.is_empty() {
            return StrategyOutcome::NoMatch;
        }

        match registry.find_normalized(&normalized) {
            Some(index) => StrategyOutcome::Matched(StrategyMatch {
                index,
                match_type: MatchType::Normalized,
                score: None,
            }),
            None => StrategyOutcome::NoMatch,
        }
    }
}

/// Stage 3: best token-aware similarity, accepted only at or above `threshold`
pub struct FuzzyMatcher {
    pub threshold: f64,
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        FuzzyMatcher { threshold }
    }

    /// Highest-scoring master team. Ties keep the earliest in master order.
    pub fn best_candidate(&self, normalized: &str, registry: &TeamRegistry) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in registry.normalized_names().iter().enumerate() {
            let score = similarity(normalized, candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }

        best
    }
}

impl ResolverStrategy for FuzzyMatcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(&self, raw_name: &str, registry: &TeamRegistry) -> StrategyOutcome {
        let normalized = normalize(raw_name);

        match self.best_candidate(&normalized, registry) {
            Some((index, score)) if score >= self.threshold => {
                StrategyOutcome::Matched(StrategyMatch {
                    index,
                    match_type: MatchType::Fuzzy,
                    score: Some(score),
                })
            }
            Some((index, score)) => StrategyOutcome::Rejected(NearMiss {
                index: Some(index),
                score: Some(score),
            }),
            None => StrategyOutcome::Rejected(NearMiss {
                index: None,
                score: None,
            }),
        }
    }
}

/// The default automatic cascade
pub fn default_strategies(config: &ResolverConfig) -> Vec<Box<dyn ResolverStrategy>> {
    vec![
        Box::new(ExactMatcher),
        Box::new(NormalizedMatcher),
        Box::new(FuzzyMatcher::new(config.fuzzy_threshold)),
    ]
}

/// Try each strategy in order, stop at the first match.
///
/// Returns the match, or the last rejection seen when nothing matched.
pub fn first_success(
    strategies: &[Box<dyn ResolverStrategy>],
    raw_name: &str,
    registry: &TeamRegistry,
) -> Result<StrategyMatch, Option<NearMiss>> {
    let mut rejection = None;

    for strategy in strategies {
        match strategy.resolve(raw_name, registry) {
            StrategyOutcome::Matched(m) => {
                debug!(strategy = strategy.name(), raw_name, index = m.index, "resolved");
                return Ok(m);
            }
            StrategyOutcome::Rejected(near) => rejection = Some(near),
            StrategyOutcome::NoMatch => {}
        }
    }

    Err(rejection)
}

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Output of one resolver run
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One entry per distinct observed raw name, keyed by raw name
    pub entries: BTreeMap<String, NameMappingEntry>,

    /// Every identity referenced by `entries`, keyed by team_id
    pub identities: BTreeMap<String, TeamIdentity>,

    /// Names the fuzzy stage rejected, in raw-name order
    pub unmatched: Vec<UnmatchedName>,

    pub quality: QualityReport,
}

impl Resolution {
    pub fn team_id(&self, raw_name: &str) -> Option<&str> {
        self.entries.get(raw_name).map(|e| e.team_id.as_str())
    }

    pub fn identity_for(&self, raw_name: &str) -> Option<&TeamIdentity> {
        self.team_id(raw_name).and_then(|id| self.identities.get(id))
    }

    /// Mapping audit rows in raw-name order
    pub fn mapping_table(&self) -> Vec<NameMappingEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn count_by_type(&self, match_type: MatchType) -> usize {
        self.entries
            .values()
            .filter(|e| e.match_type == match_type)
            .count()
    }
}

// ============================================================================
// IDENTITY RESOLVER
// ============================================================================

pub struct IdentityResolver {
    registry: TeamRegistry,
    strategies: Vec<Box<dyn ResolverStrategy>>,
    division_key: String,
    external_id_len: usize,
}

impl IdentityResolver {
    /// Resolver with the default exact → normalized → fuzzy cascade
    pub fn new(registry: TeamRegistry, division_key: &str, config: &ResolverConfig) -> Self {
        Self::with_strategies(registry, division_key, config, default_strategies(config))
    }

    pub fn with_strategies(
        registry: TeamRegistry,
        division_key: &str,
        config: &ResolverConfig,
        strategies: Vec<Box<dyn ResolverStrategy>>,
    ) -> Self {
        IdentityResolver {
            registry,
            strategies,
            division_key: division_key.to_string(),
            external_id_len: config.external_id_len,
        }
    }

    pub fn registry(&self) -> &TeamRegistry {
        &self.registry
    }

    /// Resolve every distinct raw name to exactly one identity.
    ///
    /// Fails only when the alias table is structurally broken; unmatched names
    /// never fail, they get external identities.
    pub fn resolve<'a, I>(
        &self,
        raw_names: I,
        aliases: &[AliasEntry],
    ) -> Result<Resolution, ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let alias_targets = self.validate_aliases(aliases)?;

        let names: BTreeSet<&str> = raw_names.into_iter().collect();
        let span = info_span!("resolve_names", division = %self.division_key, names = names.len());
        let _guard = span.enter();

        let mut resolution = Resolution::default();
        let mut unresolved: Vec<&str> = Vec::new();

        // Stages 1-3
        for &raw_name in &names {
            match first_success(&self.strategies, raw_name, &self.registry) {
                Ok(m) => self.assign_master(&mut resolution, raw_name, m.index, m.match_type, m.score),
                Err(rejection) => {
                    if let Some(near) = rejection {
                        resolution.unmatched.push(UnmatchedName {
                            raw_name: raw_name.to_string(),
                            best_candidate: near
                                .index
                                .and_then(|i| self.registry.get(i))
                                .map(|t| t.display_name.clone()),
                            best_score: near.score,
                        });
                    }
                    unresolved.push(raw_name);
                }
            }
        }

        // Stage 4: aliases override whatever the cascade decided
        for &raw_name in &names {
            if let Some(&index) = alias_targets.get(raw_name) {
                self.assign_master(&mut resolution, raw_name, index, MatchType::Manual, None);
            }
        }

        // Stage 5
        for raw_name in unresolved {
            if resolution.entries.contains_key(raw_name) {
                continue;
            }
            self.assign_external(&mut resolution, raw_name);
        }

        info!(
            exact = resolution.count_by_type(MatchType::Exact),
            normalized = resolution.count_by_type(MatchType::Normalized),
            fuzzy = resolution.count_by_type(MatchType::Fuzzy),
            manual = resolution.count_by_type(MatchType::Manual),
            external = resolution.count_by_type(MatchType::External),
            unmatched = resolution.unmatched.len(),
            "name resolution complete"
        );

        Ok(resolution)
    }

    /// raw_name → registry index for every alias; rejects unknown targets and
    /// a raw name aliased to two different teams.
    fn validate_aliases<'a>(
        &self,
        aliases: &'a [AliasEntry],
    ) -> Result<BTreeMap<&'a str, usize>, ValidationError> {
        let mut targets: BTreeMap<&str, usize> = BTreeMap::new();

        for alias in aliases {
            let index = self
                .registry
                .index_of(&alias.team_id)
                .ok_or_else(|| ValidationError::UnknownAliasTarget {
                    raw_name: alias.raw_name.clone(),
                    team_id: alias.team_id.clone(),
                })?;

            match targets.get(alias.raw_name.as_str()) {
                Some(&existing) if existing != index => {
                    return Err(ValidationError::ConflictingAlias(alias.raw_name.clone()));
                }
                _ => {
                    targets.insert(alias.raw_name.as_str(), index);
                }
            }
        }

        Ok(targets)
    }

    fn assign_master(
        &self,
        resolution: &mut Resolution,
        raw_name: &str,
        index: usize,
        match_type: MatchType,
        score: Option<f64>,
    ) {
        let Some(team) = self.registry.get(index) else {
            resolution.quality.violation(raw_name, format!("strategy returned unknown index {}", index));
            return;
        };

        resolution.entries.insert(
            raw_name.to_string(),
            NameMappingEntry {
                raw_name: raw_name.to_string(),
                team_id: team.team_id.clone(),
                display_name: team.display_name.clone(),
                match_type,
                score,
            },
        );
        resolution
            .identities
            .entry(team.team_id.clone())
            .or_insert_with(|| team.clone());
    }

    fn assign_external(&self, resolution: &mut Resolution, raw_name: &str) {
        let mut identity = TeamIdentity::external(&self.division_key, raw_name, self.external_id_len);

        // A taken id gets a numeric suffix; names are visited in sorted order,
        // so the suffix is the same on every run.
        let minted = identity.team_id.clone();
        let mut suffix = 2;
        while self.id_taken(resolution, &identity.team_id) {
            let next = format!("{}-{}", minted, suffix);
            resolution.quality.violation(
                raw_name,
                format!("external id {} is already taken, using {}", identity.team_id, next),
            );
            identity.team_id = next;
            suffix += 1;
        }

        resolution.quality.warn(
            raw_name,
            format!("no master team matched, minted external id {}", identity.team_id),
        );

        resolution.entries.insert(
            raw_name.to_string(),
            NameMappingEntry {
                raw_name: raw_name.to_string(),
                team_id: identity.team_id.clone(),
                display_name: identity.display_name.clone(),
                match_type: MatchType::External,
                score: None,
            },
        );
        resolution
            .identities
            .insert(identity.team_id.clone(), identity);
    }

    fn id_taken(&self, resolution: &Resolution, team_id: &str) -> bool {
        resolution.identities.contains_key(team_id) || self.registry.index_of(team_id).is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
