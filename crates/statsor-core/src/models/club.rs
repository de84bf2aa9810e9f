//! The per-user club record.
//!
//! There is no club table: a user's club is their oldest team, with the
//! team's description doubling as club notes.

use serde::{Deserialize, Serialize};

use super::{Team, TeamPatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ClubData {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
}

impl From<&Team> for ClubData {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            notes: team.description.clone(),
        }
    }
}

/// Changes to the club record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ClubUpdate {
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl ClubUpdate {
    pub fn to_team_patch(&self) -> TeamPatch {
        TeamPatch {
            name: self.name.clone(),
            description: self.notes.clone().map(Some),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_club_from_team_maps_description_to_notes() {
        let now = Utc::now();
        let team = Team {
            id: "t1".to_string(),
            name: "Rovers".to_string(),
            sport: "football".to_string(),
            description: Some("Sunday league".to_string()),
            logo_url: None,
            formation: None,
            owner_id: "u1".to_string(),
            created_at: now,
            updated_at: now,
        };
        let club = ClubData::from(&team);
        assert_eq!(club.id, "t1");
        assert_eq!(club.notes.as_deref(), Some("Sunday league"));
    }

    #[test]
    fn test_club_update_to_patch() {
        let update = ClubUpdate {
            name: None,
            notes: Some("New notes".to_string()),
        };
        let patch = update.to_team_patch();
        assert_eq!(patch.description, Some(Some("New notes".to_string())));
        assert!(patch.name.is_none());
        assert!(patch.formation.is_none());
    }
}
