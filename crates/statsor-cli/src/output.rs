//! Console rendering of lists and notices.

use statsor_core::models::{ClubData, Match, Player, Team};
use statsor_core::utils::{format_height, format_optional, format_timestamp, truncate_string};
use statsor_core::{Notice, NoticeLevel, NoticeSink};

/// Column width for names in list output
const NAME_WIDTH: usize = 24;

/// Prints notices to stderr so stdout stays clean for exports.
#[derive(Debug, Default)]
pub struct ConsoleNotices;

impl NoticeSink for ConsoleNotices {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "i",
            NoticeLevel::Error => "✗",
        };
        eprintln!("{} {}", marker, notice.message);
    }
}

pub fn player_row(player: &Player) -> String {
    format!(
        "{:<4} {:<width$} {:<5} {:>3} {:>7} {:>3}G {:>3}A  {}  {}",
        player.display_number(),
        truncate_string(&player.name, NAME_WIDTH),
        player.position.code(),
        player.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
        format_height(player.height),
        player.goals,
        player.assists,
        if player.is_available() { "available" } else { "unavailable" },
        player.id,
        width = NAME_WIDTH,
    )
}

pub fn print_players(players: &[Player]) {
    if players.is_empty() {
        println!("No players");
        return;
    }
    for player in players {
        println!("{}", player_row(player));
    }
}

pub fn print_player(player: &Player) {
    println!("{} {}", player.display_number(), player.name);
    println!("  Position:    {} ({})", player.position, player.position.group());
    println!("  Nationality: {}", format_optional(player.nationality.as_deref(), "-"));
    println!("  Height:      {}", format_height(player.height));
    println!("  Status:      {}", player.status);
    println!(
        "  Record:      {} goals, {} assists in {} minutes",
        player.goals, player.assists, player.minutes
    );
    if let Some(rate) = player.contributions_per_90() {
        println!("  Per 90:      {:.2}", rate);
    }
    println!("  Notes:       {}", format_optional(player.notes.as_deref(), "-"));
    println!("  Updated:     {}", format_timestamp(&player.updated_at));
}

pub fn print_teams(teams: &[Team]) {
    if teams.is_empty() {
        println!("No teams");
        return;
    }
    for team in teams {
        println!(
            "{:<width$} {:<8} {}  {}",
            truncate_string(&team.name, NAME_WIDTH),
            team.display_formation(),
            format_timestamp(&team.created_at),
            team.id,
            width = NAME_WIDTH,
        )
    }
}

pub fn match_row(fixture: &Match) -> String {
    let score = match fixture.result() {
        Some(result) => {
            let (ours, theirs) = fixture.our_score();
            format!("{} {}-{}", result, ours, theirs)
        }
        None => fixture.status.clone(),
    };
    format!(
        "{:<13} {:<width$} {:<10} {}",
        fixture.formatted_date(),
        truncate_string(&fixture.fixture_label(), NAME_WIDTH),
        score,
        fixture.id,
        width = NAME_WIDTH,
    )
}

pub fn print_matches(matches: &[Match]) {
    if matches.is_empty() {
        println!("No matches");
        return;
    }
    for fixture in matches {
        println!("{}", match_row(fixture));
    }
}

pub fn print_club(club: Option<&ClubData>) {
    match club {
        Some(club) => {
            println!("{}", club.name);
            println!("  {}", format_optional(club.notes.as_deref(), "No notes"));
        }
        None => println!("No club yet. Create one with `statsor club set --name <NAME>`."),
    }
}
