//! Match repository.

use tracing::warn;

use crate::api::{Direction, Table};
use crate::models::{Match, MatchPatch, NewMatch};

use super::{DataError, DataService, SubscriptionId};

const CACHE_KIND: &str = "matches";

impl DataService {
    /// Matches owned by the current user, newest first, optionally only
    /// those for `team_id`.
    pub async fn matches(&self, team_id: Option<&str>) -> Result<Vec<Match>, DataError> {
        self.list_rows(
            Table::Matches,
            CACHE_KIND,
            team_id.map(|id| ("team_id", id)),
            Direction::Descending,
        )
        .await
    }

    pub async fn get_match(&self, id: &str) -> Result<Option<Match>, DataError> {
        self.fetch_row(Table::Matches, id).await
    }

    pub async fn add_match(&self, new: &NewMatch) -> Result<Match, DataError> {
        let created = self.insert_row(Table::Matches, new, false).await;
        if created.as_ref().map_or_else(|e| e.write_committed(), |_| true) {
            self.publish_matches().await;
        }
        created
    }

    pub async fn update_match(&self, id: &str, patch: &MatchPatch) -> Result<Match, DataError> {
        let updated = self.update_row(Table::Matches, id, patch).await?;
        self.publish_matches().await;
        Ok(updated)
    }

    pub async fn delete_match(&self, id: &str) -> Result<bool, DataError> {
        let deleted = self.delete_row(Table::Matches, id).await?;
        if deleted {
            self.publish_matches().await;
        }
        Ok(deleted)
    }

    pub fn subscribe_matches(
        &self,
        callback: impl Fn(&[Match]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.match_subscribers.subscribe(callback)
    }

    pub fn unsubscribe_matches(&self, id: SubscriptionId) -> bool {
        self.match_subscribers.unsubscribe(id)
    }

    pub(crate) async fn publish_matches(&self) {
        if self.match_subscribers.is_empty() {
            return;
        }
        match self.matches(None).await {
            Ok(matches) => self.match_subscribers.emit(&matches),
            Err(e) => warn!(error = %e, "Failed to refresh matches for subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::MatchResult;
    use crate::service::test_support::harness;

    #[tokio::test]
    async fn test_record_result_for_team_fixture() {
        let h = harness(Some("u1"));
        let kickoff = Utc.with_ymd_and_hms(2026, 11, 1, 14, 0, 0).single().expect("date");
        let fixture = h
            .service
            .add_match(&NewMatch {
                team_id: Some("team-a".to_string()),
                is_home: false,
                ..NewMatch::new("City", kickoff)
            })
            .await
            .expect("add");
        assert_eq!(fixture.status, "scheduled");
        assert_eq!(fixture.result(), None);

        let played = h
            .service
            .update_match(
                &fixture.id,
                &MatchPatch {
                    home_score: Some(0),
                    away_score: Some(2),
                    status: Some("completed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(played.result(), Some(MatchResult::Win));

        assert_eq!(h.service.matches(Some("team-a")).await.expect("scoped").len(), 1);
        assert!(h.service.matches(Some("team-b")).await.expect("other").is_empty());
        assert_eq!(
            h.service.get_match(&fixture.id).await.expect("get").map(|m| m.away_score),
            Some(2)
        );
    }

    fn city() -> NewMatch {
        let kickoff = Utc.with_ymd_and_hms(2026, 11, 8, 15, 0, 0).single().expect("date");
        NewMatch {
            team_id: Some("team-a".to_string()),
            ..NewMatch::new("City", kickoff)
        }
    }

    #[tokio::test]
    async fn test_second_match_list_is_served_from_cache() {
        let h = harness(Some("u1"));
        h.service.add_match(&city()).await.expect("add");

        let first = h.service.matches(Some("team-a")).await.expect("first list");
        let second = h.service.matches(Some("team-a")).await.expect("second list");

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(h.store.select_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_match_twice_returns_false_second_time() {
        let h = harness(Some("u1"));
        let fixture = h.service.add_match(&city()).await.expect("add");

        assert!(h.service.delete_match(&fixture.id).await.expect("first delete"));
        assert!(!h.service.delete_match(&fixture.id).await.expect("second delete"));
        assert!(h.service.get_match(&fixture.id).await.expect("get").is_none());
    }
}
