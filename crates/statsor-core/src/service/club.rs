//! Club view over the user's first team.

use crate::api::{Direction, Table};
use crate::models::{ClubData, ClubUpdate, NewTeam, Team};

use super::{DataError, DataService};

const CACHE_KIND: &str = "club";

impl DataService {
    /// The user's club: their oldest team, if they have one.
    pub async fn club_data(&self) -> Result<Option<ClubData>, DataError> {
        Ok(self.first_team().await?.as_ref().map(ClubData::from))
    }

    /// Rename or re-describe the club, creating it when the user has no
    /// team yet.
    pub async fn update_club_data(&self, update: &ClubUpdate) -> Result<ClubData, DataError> {
        let team = match self.first_team().await? {
            Some(team) => self.update_team(&team.id, &update.to_team_patch()).await?,
            None => {
                let name = update.name.clone().ok_or_else(|| {
                    DataError::Validation("club name is required to create a club".to_string())
                })?;
                let new = NewTeam {
                    description: update.notes.clone(),
                    ..NewTeam::new(name)
                };
                self.add_team(&new).await?
            }
        };
        Ok(ClubData::from(&team))
    }

    async fn first_team(&self) -> Result<Option<Team>, DataError> {
        let teams: Vec<Team> = self
            .list_rows(Table::Teams, CACHE_KIND, None, Direction::Ascending)
            .await?;
        Ok(teams.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::harness;

    #[tokio::test]
    async fn test_club_is_first_team() {
        let h = harness(Some("u1"));
        assert_eq!(h.service.club_data().await.expect("club"), None);

        let first = h
            .service
            .add_team(&NewTeam {
                description: Some("Founded 1999".to_string()),
                ..NewTeam::new("Rovers")
            })
            .await
            .expect("add");
        h.service.add_team(&NewTeam::new("Rovers U18")).await.expect("add");

        let club = h.service.club_data().await.expect("club").expect("some club");
        assert_eq!(club.id, first.id);
        assert_eq!(club.notes.as_deref(), Some("Founded 1999"));
    }

    #[tokio::test]
    async fn test_update_club_creates_or_updates() {
        let h = harness(Some("u1"));

        let missing_name = h.service.update_club_data(&ClubUpdate::default()).await;
        assert!(matches!(missing_name, Err(DataError::Validation(_))));

        let created = h
            .service
            .update_club_data(&ClubUpdate {
                name: Some("Rovers".to_string()),
                notes: None,
            })
            .await
            .expect("create club");

        let updated = h
            .service
            .update_club_data(&ClubUpdate {
                name: None,
                notes: Some("Training on Tuesdays".to_string()),
            })
            .await
            .expect("update club");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Rovers");
        assert_eq!(updated.notes.as_deref(), Some("Training on Tuesdays"));
        assert_eq!(h.service.teams().await.expect("teams").len(), 1);
    }
}
