//! Team repository.

use tracing::warn;

use crate::api::{Direction, Table};
use crate::models::{NewTeam, Team, TeamPatch};

use super::{DataError, DataService, SubscriptionId};

const CACHE_KIND: &str = "teams";

impl DataService {
    /// Teams owned by the current user, newest first.
    pub async fn teams(&self) -> Result<Vec<Team>, DataError> {
        self.list_rows(Table::Teams, CACHE_KIND, None, Direction::Descending)
            .await
    }

    pub async fn team(&self, id: &str) -> Result<Option<Team>, DataError> {
        self.fetch_row(Table::Teams, id).await
    }

    pub async fn add_team(&self, team: &NewTeam) -> Result<Team, DataError> {
        let created = self.insert_row(Table::Teams, team, false).await;
        if created.as_ref().map_or_else(|e| e.write_committed(), |_| true) {
            self.publish_teams().await;
        }
        created
    }

    pub async fn update_team(&self, id: &str, patch: &TeamPatch) -> Result<Team, DataError> {
        let updated = self.update_row(Table::Teams, id, patch).await?;
        self.publish_teams().await;
        Ok(updated)
    }

    pub async fn delete_team(&self, id: &str) -> Result<bool, DataError> {
        let deleted = self.delete_row(Table::Teams, id).await?;
        if deleted {
            self.publish_teams().await;
        }
        Ok(deleted)
    }

    pub fn subscribe_teams(
        &self,
        callback: impl Fn(&[Team]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.team_subscribers.subscribe(callback)
    }

    pub fn unsubscribe_teams(&self, id: SubscriptionId) -> bool {
        self.team_subscribers.unsubscribe(id)
    }

    pub(crate) async fn publish_teams(&self) {
        if self.team_subscribers.is_empty() {
            return;
        }
        match self.teams().await {
            Ok(teams) => self.team_subscribers.emit(&teams),
            Err(e) => warn!(error = %e, "Failed to refresh teams for subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::harness;

    #[tokio::test]
    async fn test_team_crud_scoped_by_owner_id() {
        let h = harness(Some("coach"));
        let team = h
            .service
            .add_team(&NewTeam {
                formation: Some("4-3-3".to_string()),
                ..NewTeam::new("Rovers")
            })
            .await
            .expect("add");
        assert_eq!(team.owner_id, "coach");
        assert_eq!(team.sport, "football");

        let renamed = h
            .service
            .update_team(
                &team.id,
                &TeamPatch {
                    name: Some("Rovers FC".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(renamed.name, "Rovers FC");
        assert_eq!(renamed.display_formation(), "4-3-3");

        assert_eq!(h.service.teams().await.expect("list").len(), 1);
        assert!(h.service.delete_team(&team.id).await.expect("delete"));
        assert!(h.service.teams().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_update_can_clear_formation() {
        let h = harness(Some("coach"));
        let team = h
            .service
            .add_team(&NewTeam {
                formation: Some("4-3-3".to_string()),
                ..NewTeam::new("Rovers")
            })
            .await
            .expect("add");

        let cleared = h
            .service
            .update_team(
                &team.id,
                &TeamPatch {
                    formation: Some(None),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(cleared.formation, None);
        assert_eq!(cleared.name, "Rovers");
    }

    #[tokio::test]
    async fn test_second_team_list_is_served_from_cache() {
        let h = harness(Some("coach"));
        h.service.add_team(&NewTeam::new("Rovers")).await.expect("add");

        let first = h.service.teams().await.expect("first list");
        let second = h.service.teams().await.expect("second list");

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(h.store.select_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_team_twice_returns_false_second_time() {
        let h = harness(Some("coach"));
        let team = h.service.add_team(&NewTeam::new("Rovers")).await.expect("add");

        assert!(h.service.delete_team(&team.id).await.expect("first delete"));
        assert!(!h.service.delete_team(&team.id).await.expect("second delete"));
        assert!(h.service.team(&team.id).await.expect("get").is_none());
        assert_eq!(
            h.notices.messages().iter().filter(|m| *m == "Team deleted").count(),
            1
        );
    }
}
