use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Playing position as entered by the user.
///
/// Known codes parse case-insensitively (as do the four long names); any
/// other text is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    Goalkeeper,
    CentreBack,
    LeftBack,
    RightBack,
    Defender,
    DefensiveMidfielder,
    CentralMidfielder,
    AttackingMidfielder,
    Midfielder,
    LeftWinger,
    RightWinger,
    Striker,
    CentreForward,
    Forward,
    Other(String),
}

/// Coarse grouping of positions for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unknown,
}

impl Position {
    pub fn code(&self) -> &str {
        match self {
            Position::Goalkeeper => "GK",
            Position::CentreBack => "CB",
            Position::LeftBack => "LB",
            Position::RightBack => "RB",
            Position::Defender => "DEF",
            Position::DefensiveMidfielder => "CDM",
            Position::CentralMidfielder => "CM",
            Position::AttackingMidfielder => "CAM",
            Position::Midfielder => "MID",
            Position::LeftWinger => "LW",
            Position::RightWinger => "RW",
            Position::Striker => "ST",
            Position::CentreForward => "CF",
            Position::Forward => "FWD",
            Position::Other(raw) => raw,
        }
    }

    pub fn group(&self) -> PositionGroup {
        match self {
            Position::Goalkeeper => PositionGroup::Goalkeeper,
            Position::CentreBack | Position::LeftBack | Position::RightBack | Position::Defender => {
                PositionGroup::Defender
            }
            Position::DefensiveMidfielder
            | Position::CentralMidfielder
            | Position::AttackingMidfielder
            | Position::Midfielder => PositionGroup::Midfielder,
            Position::LeftWinger
            | Position::RightWinger
            | Position::Striker
            | Position::CentreForward
            | Position::Forward => PositionGroup::Forward,
            Position::Other(_) => PositionGroup::Unknown,
        }
    }
}

impl FromStr for Position {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let position = match trimmed.to_ascii_uppercase().as_str() {
            "GK" | "GOALKEEPER" => Position::Goalkeeper,
            "CB" => Position::CentreBack,
            "LB" => Position::LeftBack,
            "RB" => Position::RightBack,
            "DEF" | "DEFENDER" => Position::Defender,
            "CDM" => Position::DefensiveMidfielder,
            "CM" => Position::CentralMidfielder,
            "CAM" => Position::AttackingMidfielder,
            "MID" | "MIDFIELDER" => Position::Midfielder,
            "LW" => Position::LeftWinger,
            "RW" => Position::RightWinger,
            "ST" => Position::Striker,
            "CF" => Position::CentreForward,
            "FWD" | "FORWARD" => Position::Forward,
            _ => Position::Other(trimmed.to_string()),
        };
        Ok(position)
    }
}

impl From<String> for Position {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(position) => position,
            Err(never) => match never {},
        }
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.code().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PositionGroup::Goalkeeper => "Goalkeeper",
            PositionGroup::Defender => "Defender",
            PositionGroup::Midfielder => "Midfielder",
            PositionGroup::Forward => "Forward",
            PositionGroup::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

fn default_status() -> String {
    "active".to_string()
}

fn default_true() -> bool {
    true
}

/// A player row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Player {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub position: Position,
    pub jersey_number: Option<u32>,
    pub age: Option<u32>,
    pub nationality: Option<String>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    pub preferred_foot: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub team_id: Option<String>,
    pub user_id: String,
    // Performance
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub fitness: u32,
    #[serde(default)]
    pub technical_skills: u32,
    #[serde(default)]
    pub physical_skills: u32,
    #[serde(default)]
    pub tactical_skills: u32,
    #[serde(default)]
    pub mental_skills: u32,
    #[serde(default = "default_true")]
    pub medical_clearance: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// Active and medically cleared.
    pub fn is_available(&self) -> bool {
        self.medical_clearance && self.status.eq_ignore_ascii_case("active")
    }

    pub fn display_number(&self) -> String {
        match self.jersey_number {
            Some(n) => format!("#{}", n),
            None => "-".to_string(),
        }
    }

    /// Goals plus assists per 90 minutes played.
    pub fn contributions_per_90(&self) -> Option<f64> {
        if self.minutes == 0 {
            return None;
        }
        Some(f64::from(self.goals + self.assists) * 90.0 / f64::from(self.minutes))
    }
}

/// Insert payload for a player. Ownership, id and timestamps are stamped by
/// the repository and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewPlayer {
    pub name: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jersey_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_foot: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub fitness: u32,
    #[serde(default)]
    pub technical_skills: u32,
    #[serde(default)]
    pub physical_skills: u32,
    #[serde(default)]
    pub tactical_skills: u32,
    #[serde(default)]
    pub mental_skills: u32,
    #[serde(default = "default_true")]
    pub medical_clearance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            jersey_number: None,
            age: None,
            nationality: None,
            height: None,
            weight: None,
            preferred_foot: None,
            status: default_status(),
            team_id: None,
            goals: 0,
            assists: 0,
            minutes: 0,
            fitness: 0,
            technical_skills: 0,
            physical_skills: 0,
            tactical_skills: 0,
            mental_skills: 0,
            medical_clearance: true,
            notes: None,
        }
    }
}

/// Partial update for a player.
///
/// `None` leaves a column untouched. Nullable columns are doubly optional:
/// `Some(None)` sends `null` and clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PlayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub position: Option<Position>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub jersey_number: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub age: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub nationality: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub height: Option<Option<f64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub weight: Option<Option<f64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub preferred_foot: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub team_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assists: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_skills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_skills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tactical_skills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mental_skills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_clearance: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSortColumn {
    Name,
    Position,
    Number,
    Goals,
}

impl PlayerSortColumn {
    pub fn sort(&self, players: &mut [Player]) {
        match self {
            PlayerSortColumn::Name => players.sort_by(|a, b| {
                a.name.to_lowercase().cmp(&b.name.to_lowercase())
            }),
            PlayerSortColumn::Position => players.sort_by(|a, b| {
                a.position
                    .group()
                    .cmp(&b.position.group())
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }),
            // Players without a number go last
            PlayerSortColumn::Number => players.sort_by_key(|p| (p.jersey_number.is_none(), p.jersey_number)),
            PlayerSortColumn::Goals => players.sort_by(|a, b| b.goals.cmp(&a.goals)),
        }
    }
}
