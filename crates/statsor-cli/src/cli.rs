use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use statsor_core::models::PlayerSortColumn;

/// Manage a club's players, teams and matches.
#[derive(Debug, Parser)]
#[command(name = "statsor", version, about)]
pub struct Cli {
    /// Work against a throwaway in-memory store instead of Supabase.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        email: Option<String>,
        /// Keep the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and forget the saved session
    Logout {
        /// Also remove the remembered password
        #[arg(long)]
        forget: bool,
    },
    #[command(subcommand)]
    Players(PlayerCommand),
    #[command(subcommand)]
    Teams(TeamCommand),
    #[command(subcommand)]
    Matches(MatchCommand),
    #[command(subcommand)]
    Club(ClubCommand),
    /// Write all data (JSON) or players (CSV)
    Export {
        #[arg(value_enum)]
        format: Format,
        /// Destination file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only export this team's players (CSV)
        #[arg(long)]
        team: Option<String>,
    },
    /// Create records from a JSON export or a players CSV
    Import {
        #[arg(value_enum)]
        format: Format,
        path: PathBuf,
    },
    /// Re-list players periodically and print changes
    Watch {
        #[arg(long)]
        team: Option<String>,
        /// Minutes between refreshes
        #[arg(long, default_value_t = 5)]
        every: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum PlayerCommand {
    List {
        #[arg(long)]
        team: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
    },
    Show {
        id: String,
    },
    Add(AddPlayerArgs),
    Update(UpdatePlayerArgs),
    Rm {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct AddPlayerArgs {
    pub name: String,
    /// Position code (GK, CB, CM, ST, ...) or free text
    pub position: String,
    #[arg(long)]
    pub number: Option<u32>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub nationality: Option<String>,
    #[arg(long)]
    pub team: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdatePlayerArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub number: Option<u32>,
    #[arg(long)]
    pub goals: Option<u32>,
    #[arg(long)]
    pub assists: Option<u32>,
    #[arg(long)]
    pub minutes: Option<u32>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Assign the player to this team
    #[arg(long, conflicts_with = "no_team")]
    pub team: Option<String>,
    /// Remove the player from their team
    #[arg(long)]
    pub no_team: bool,
    /// Erase the player's notes
    #[arg(long, conflicts_with = "notes")]
    pub clear_notes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Name,
    Position,
    Number,
    Goals,
}

impl From<SortArg> for PlayerSortColumn {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => PlayerSortColumn::Name,
            SortArg::Position => PlayerSortColumn::Position,
            SortArg::Number => PlayerSortColumn::Number,
            SortArg::Goals => PlayerSortColumn::Goals,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        formation: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Rm {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum MatchCommand {
    List {
        #[arg(long)]
        team: Option<String>,
    },
    Add {
        opponent: String,
        /// Kick-off as RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (UTC)
        #[arg(value_parser = parse_match_date)]
        date: DateTime<Utc>,
        #[arg(long)]
        away: bool,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },
    /// Record a final score and mark the match completed
    Score {
        id: String,
        home: u32,
        away: u32,
    },
    Rm {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClubCommand {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Parse a kick-off time. Bare dates are taken as 15:00 UTC.
pub fn parse_match_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = day.and_hms_opt(15, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    bail!("Unrecognized date '{}'", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_match_date_formats() {
        let full = parse_match_date("2026-11-08T19:45:00+01:00").expect("rfc3339");
        assert_eq!(full.hour(), 18);

        let short = parse_match_date("2026-11-08 19:45").expect("date and time");
        assert_eq!((short.day(), short.hour(), short.minute()), (8, 19, 45));

        let bare = parse_match_date("2026-11-08").expect("date");
        assert_eq!(bare.hour(), 15);

        assert!(parse_match_date("next saturday").is_err());
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from(["statsor", "--offline", "players", "list", "--sort", "goals"])
            .expect("parse");
        assert!(cli.offline);
        assert!(matches!(
            cli.command,
            Command::Players(PlayerCommand::List {
                sort: SortArg::Goals,
                team: None
            })
        ));
    }

    #[test]
    fn test_team_and_no_team_conflict() {
        let cleared = Cli::try_parse_from(["statsor", "players", "update", "p1", "--no-team"])
            .expect("parse");
        assert!(matches!(
            cleared.command,
            Command::Players(PlayerCommand::Update(UpdatePlayerArgs { no_team: true, .. }))
        ));

        assert!(Cli::try_parse_from([
            "statsor", "players", "update", "p1", "--team", "t1", "--no-team"
        ])
        .is_err());
    }
}
