use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::Table;
use crate::models::{Match, NewMatch, NewPlayer, NewTeam, Player, Team};
use crate::service::{DataError, DataService, Notice};

use super::ImportReport;

/// Full data export for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
    #[serde(rename = "exportedAt")]
    pub exported_at: DateTime<Utc>,
}

/// Import side: records stay raw so one bad record cannot sink the file.
#[derive(Debug, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    players: Vec<Value>,
    #[serde(default)]
    teams: Vec<Value>,
    #[serde(default)]
    matches: Vec<Value>,
}

/// Point an imported record's team reference at the team it now belongs to.
/// References to teams that were neither imported nor already exist are
/// dropped.
fn remap_team(
    team_id: Option<String>,
    imported: &HashMap<String, String>,
    existing: &HashSet<String>,
) -> Option<String> {
    let old = team_id?;
    if let Some(new_id) = imported.get(&old) {
        return Some(new_id.clone());
    }
    if existing.contains(&old) {
        Some(old)
    } else {
        debug!(team_id = %old, "Dropping reference to unknown team");
        None
    }
}

fn parse_record<T: DeserializeOwned>(raw: Value) -> Result<T, DataError> {
    serde_json::from_value(raw).map_err(DataError::Serialization)
}

impl DataService {
    /// Gather players, teams and matches (in that order) into one document.
    pub async fn export_document(&self) -> Result<ExportDocument, DataError> {
        let players = self.players(None).await?;
        let teams = self.teams().await?;
        let matches = self.matches(None).await?;
        Ok(ExportDocument {
            players,
            teams,
            matches,
            exported_at: Utc::now(),
        })
    }

    pub async fn export_json(&self) -> Result<String, DataError> {
        let document = self.export_document().await?;
        info!(
            players = document.players.len(),
            teams = document.teams.len(),
            matches = document.matches.len(),
            "Exported data"
        );
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Create every record in an export document for the current user.
    ///
    /// Teams go first so players and matches can be re-pointed at the new
    /// team ids. Failed records are skipped and reported.
    pub async fn import_json(&self, text: &str) -> Result<ImportReport, DataError> {
        let document: ImportDocument = serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, "Import file is not a valid export document");
            self.notify(Notice::error("Import file is not a valid Statsor export"));
            DataError::Import(e.to_string())
        })?;

        if self.current_user().await.is_none() {
            self.notify(Notice::error("Please sign in to import data"));
            return Err(DataError::Unauthenticated);
        }

        let total = document.players.len() + document.teams.len() + document.matches.len();
        let mut report = ImportReport::new(total);

        let mut imported_teams: HashMap<String, String> = HashMap::new();
        for (index, raw) in document.teams.into_iter().enumerate() {
            let old_id = raw.get("id").and_then(Value::as_str).map(str::to_string);
            let result = match parse_record::<NewTeam>(raw) {
                Ok(new) => self.insert_row::<_, Team>(Table::Teams, &new, true).await,
                Err(e) => Err(e),
            };
            let new_id = match result {
                Ok(team) => Ok(team.id),
                Err(DataError::Unreadable { id, .. }) if !id.is_empty() => {
                    warn!(index, id = %id, "Imported team could not be read back");
                    Ok(id)
                }
                Err(e) => Err(e),
            };
            match new_id {
                Ok(new_id) => {
                    if let Some(old_id) = old_id {
                        imported_teams.insert(old_id, new_id);
                    }
                    report.record_success();
                }
                Err(e) => {
                    warn!(index, error = %e, "Skipping team during import");
                    report.record_failure(Table::Teams, index, e);
                }
            }
        }

        let existing_teams: HashSet<String> = match self.teams().await {
            Ok(teams) => teams.into_iter().map(|t| t.id).collect(),
            Err(e) => {
                warn!(error = %e, "Could not load teams to check references");
                HashSet::new()
            }
        };

        for (index, raw) in document.players.into_iter().enumerate() {
            let result = match parse_record::<NewPlayer>(raw) {
                Ok(mut new) => {
                    new.team_id = remap_team(new.team_id.take(), &imported_teams, &existing_teams);
                    self.insert_row::<_, Player>(Table::Players, &new, true)
                        .await
                        .map(|_| ())
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.record_success(),
                Err(e) if e.write_committed() => {
                    warn!(index, error = %e, "Imported player could not be read back");
                    report.record_success();
                }
                Err(e) => {
                    warn!(index, error = %e, "Skipping player during import");
                    report.record_failure(Table::Players, index, e);
                }
            }
        }

        for (index, raw) in document.matches.into_iter().enumerate() {
            let result = match parse_record::<NewMatch>(raw) {
                Ok(mut new) => {
                    new.team_id = remap_team(new.team_id.take(), &imported_teams, &existing_teams);
                    self.insert_row::<_, Match>(Table::Matches, &new, true)
                        .await
                        .map(|_| ())
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.record_success(),
                Err(e) if e.write_committed() => {
                    warn!(index, error = %e, "Imported match could not be read back");
                    report.record_success();
                }
                Err(e) => {
                    warn!(index, error = %e, "Skipping match during import");
                    report.record_failure(Table::Matches, index, e);
                }
            }
        }

        info!(imported = report.imported, total = report.total, "Import finished");
        if report.failures.is_empty() {
            self.notify(Notice::success(report.summary()));
        } else {
            self.notify(Notice::info(report.summary()));
        }
        if report.imported > 0 {
            self.publish_all().await;
        }
        Ok(report)
    }
}
