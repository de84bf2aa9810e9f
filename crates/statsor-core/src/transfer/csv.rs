use std::collections::HashMap;

use tracing::{info, warn};

use crate::api::Table;
use crate::models::{NewPlayer, Player, Position};
use crate::service::{DataError, DataService, Notice};

use super::ImportReport;

pub const CSV_HEADERS: [&str; 15] = [
    "ID",
    "Name",
    "Position",
    "Age",
    "Nationality",
    "Goals",
    "Assists",
    "Minutes",
    "Fitness",
    "Technical Skills",
    "Physical Skills",
    "Tactical Skills",
    "Mental Skills",
    "Medical Clearance",
    "Notes",
];

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render players in the spreadsheet layout, one row per player.
pub fn players_to_csv(players: &[Player]) -> String {
    let mut out = CSV_HEADERS.join(",");
    out.push('\n');

    for player in players {
        let row = [
            quote(&player.id),
            quote(&player.name),
            quote(player.position.code()),
            player.age.map(|a| a.to_string()).unwrap_or_default(),
            quote(player.nationality.as_deref().unwrap_or("")),
            player.goals.to_string(),
            player.assists.to_string(),
            player.minutes.to_string(),
            player.fitness.to_string(),
            player.technical_skills.to_string(),
            player.physical_skills.to_string(),
            player.tactical_skills.to_string(),
            player.mental_skills.to_string(),
            if player.medical_clearance { "Yes" } else { "No" }.to_string(),
            quote(player.notes.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    // Blank lines
    if record.len() == 1 && record[0].trim().is_empty() {
        return;
    }
    records.push(record);
}

/// Split CSV text into records. Quoted fields may contain commas, newlines
/// and doubled quotes.
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => record.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    push_record(&mut records, std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn number(cell: &str) -> u32 {
    cell.parse().unwrap_or(0)
}

fn optional_number(cell: &str) -> Option<u32> {
    if cell.is_empty() {
        None
    } else {
        Some(number(cell))
    }
}

fn optional_text(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn clearance(cell: &str) -> bool {
    !matches!(
        cell.to_ascii_lowercase().as_str(),
        "no" | "n" | "false" | "0"
    )
}

/// Read players from CSV. Headers are matched case-insensitively and may
/// appear in any order; unknown columns and the `ID` column are ignored.
pub fn parse_players_csv(text: &str) -> Result<Vec<NewPlayer>, DataError> {
    let mut records = parse_records(text).into_iter();
    let header = records
        .next()
        .ok_or_else(|| DataError::Import("CSV file is empty".to_string()))?;

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();
    if !columns.contains_key("name") {
        return Err(DataError::Import("CSV has no Name column".to_string()));
    }

    let players = records
        .map(|record| {
            let cell = |name: &str| {
                columns
                    .get(name)
                    .and_then(|&i| record.get(i))
                    .map(|s| s.trim())
                    .unwrap_or("")
            };
            NewPlayer {
                age: optional_number(cell("age")),
                nationality: optional_text(cell("nationality")),
                goals: number(cell("goals")),
                assists: number(cell("assists")),
                minutes: number(cell("minutes")),
                fitness: number(cell("fitness")),
                technical_skills: number(cell("technical skills")),
                physical_skills: number(cell("physical skills")),
                tactical_skills: number(cell("tactical skills")),
                mental_skills: number(cell("mental skills")),
                medical_clearance: clearance(cell("medical clearance")),
                notes: optional_text(cell("notes")),
                ..NewPlayer::new(cell("name"), Position::from(cell("position").to_string()))
            }
        })
        .collect();
    Ok(players)
}

impl DataService {
    /// The current user's players as CSV, optionally only one team's.
    pub async fn export_players_csv(&self, team_id: Option<&str>) -> Result<String, DataError> {
        let players = self.players(team_id).await?;
        info!(players = players.len(), "Exported players to CSV");
        Ok(players_to_csv(&players))
    }

    /// Create a player for every CSV row. Rows the store rejects are
    /// skipped and reported.
    pub async fn import_players_csv(&self, text: &str) -> Result<ImportReport, DataError> {
        let players = parse_players_csv(text).map_err(|e| {
            self.notify(Notice::error(e.to_string()));
            e
        })?;

        if self.current_user().await.is_none() {
            self.notify(Notice::error("Please sign in to import players"));
            return Err(DataError::Unauthenticated);
        }

        let mut report = ImportReport::new(players.len());
        for (index, player) in players.iter().enumerate() {
            match self.insert_row::<_, Player>(Table::Players, player, true).await {
                Ok(_) => report.record_success(),
                Err(e) if e.write_committed() => {
                    warn!(row = index + 1, error = %e, "Imported CSV row could not be read back");
                    report.record_success();
                }
                Err(e) => {
                    warn!(row = index + 1, error = %e, "Skipping CSV row");
                    report.record_failure(Table::Players, index, e);
                }
            }
        }

        info!(imported = report.imported, total = report.total, "CSV import finished");
        if report.failures.is_empty() {
            self.notify(Notice::success(report.summary()));
        } else {
            self.notify(Notice::info(report.summary()));
        }
        if report.imported > 0 {
            self.publish_players().await;
        }
        Ok(report)
    }
}
