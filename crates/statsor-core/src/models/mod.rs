//! Data models for Statsor entities.
//!
//! - `Player`: squad member with profile and performance fields
//! - `Team`: a squad owned by a user
//! - `Match`: a fixture, scheduled or completed
//! - `ClubData`: the per-user club view derived from the first team
//!
//! Each stored entity comes with a `New*` insert payload and a `*Patch`
//! partial-update payload.

pub mod club;
pub mod fixture;
pub mod player;
pub mod team;

pub use club::{ClubData, ClubUpdate};
pub use fixture::{Match, MatchPatch, MatchResult, NewMatch};
pub use player::{NewPlayer, Player, PlayerPatch, PlayerSortColumn, Position, PositionGroup};
pub use team::{NewTeam, Team, TeamPatch};
