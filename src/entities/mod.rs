// Entity Models
//
// A team has one stable identity (team_id) and any number of raw names that
// point at it. The resolver owns identity creation; everything downstream only
// reads identities.

pub mod mapping;
pub mod team;

pub use mapping::{AliasEntry, MatchType, NameMappingEntry, UnmatchedName};
pub use team::{external_team_id, IdentitySource, MasterTeam, TeamIdentity, TeamRegistry};
