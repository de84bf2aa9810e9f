//! Player repository.

use tracing::warn;

use crate::api::{Direction, Table};
use crate::models::{NewPlayer, Player, PlayerPatch};

use super::{DataError, DataService, SubscriptionId};

const CACHE_KIND: &str = "players";

impl DataService {
    /// Players owned by the current user, newest first, optionally only
    /// those on `team_id`.
    pub async fn players(&self, team_id: Option<&str>) -> Result<Vec<Player>, DataError> {
        self.list_rows(
            Table::Players,
            CACHE_KIND,
            team_id.map(|id| ("team_id", id)),
            Direction::Descending,
        )
        .await
    }

    pub async fn player(&self, id: &str) -> Result<Option<Player>, DataError> {
        self.fetch_row(Table::Players, id).await
    }

    pub async fn add_player(&self, player: &NewPlayer) -> Result<Player, DataError> {
        let created = self.insert_row(Table::Players, player, false).await;
        if created.as_ref().map_or_else(|e| e.write_committed(), |_| true) {
            self.publish_players().await;
        }
        created
    }

    pub async fn update_player(&self, id: &str, patch: &PlayerPatch) -> Result<Player, DataError> {
        let updated = self.update_row(Table::Players, id, patch).await?;
        self.publish_players().await;
        Ok(updated)
    }

    pub async fn delete_player(&self, id: &str) -> Result<bool, DataError> {
        let deleted = self.delete_row(Table::Players, id).await?;
        if deleted {
            self.publish_players().await;
        }
        Ok(deleted)
    }

    /// Call `callback` with the full player list after every player write.
    pub fn subscribe_players(
        &self,
        callback: impl Fn(&[Player]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.player_subscribers.subscribe(callback)
    }

    pub fn unsubscribe_players(&self, id: SubscriptionId) -> bool {
        self.player_subscribers.unsubscribe(id)
    }

    pub(crate) async fn publish_players(&self) {
        if self.player_subscribers.is_empty() {
            return;
        }
        match self.players(None).await {
            Ok(players) => self.player_subscribers.emit(&players),
            Err(e) => warn!(error = %e, "Failed to refresh players for subscribers"),
        }
    }
}
