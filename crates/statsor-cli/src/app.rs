//! Command execution against the data service.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use statsor_core::auth::{CredentialStore, Session, SessionData};
use statsor_core::models::{
    ClubUpdate, MatchPatch, NewMatch, NewPlayer, NewTeam, Player, PlayerPatch, PlayerSortColumn,
    Position,
};
use statsor_core::{ApiError, Config, DataError, DataService, MemoryStore, SupabaseClient};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cli::{
    AddPlayerArgs, ClubCommand, Command, Format, MatchCommand, PlayerCommand, TeamCommand,
    UpdatePlayerArgs,
};
use crate::output::{self, ConsoleNotices};

/// User id the offline store signs in as.
const OFFLINE_USER: &str = "offline";

pub struct App {
    config: Config,
    session: Session,
    /// `None` in offline mode
    client: Option<SupabaseClient>,
    service: DataService,
}

impl App {
    pub async fn new(config: Config, offline: bool) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let mut session = Session::new(cache_dir);
        if let Err(e) = session.load() {
            warn!(error = %e, "Ignoring unreadable session file");
        }

        let (client, service) = if offline {
            info!("Running against the in-memory store");
            let store = Arc::new(MemoryStore::signed_in(OFFLINE_USER));
            (None, DataService::new(store))
        } else {
            let (url, key) = config.supabase().with_context(|| {
                format!(
                    "Supabase project not configured. Set {} and {} or add them to the config file.",
                    statsor_core::config::ENV_SUPABASE_URL,
                    statsor_core::config::ENV_SUPABASE_ANON_KEY
                )
            })?;
            let client = SupabaseClient::new(url, key)?;
            let service = DataService::new(Arc::new(client.clone()));
            (Some(client), service)
        };

        let service = service
            .with_cache_ttl(config.cache_ttl())
            .with_notices(Arc::new(ConsoleNotices));

        let mut app = Self {
            config,
            session,
            client,
            service,
        };
        app.restore_session().await;
        Ok(app)
    }

    /// Hand the saved session to the client, refreshing it first if it is
    /// about to expire.
    async fn restore_session(&mut self) {
        let (Some(client), Some(data)) = (&self.client, self.session.data.clone()) else {
            return;
        };
        client.set_session(data.clone()).await;
        if !data.needs_refresh() {
            debug!(minutes = data.minutes_until_expiry(), "Session restored");
            return;
        }

        if let Err(e) = self.refresh_session().await {
            warn!(error = %e, "Session refresh failed, signing out");
            self.end_session().await;
        }
    }

    /// Trade the refresh token for a new access token and persist it.
    async fn refresh_session(&mut self) -> Result<(), ApiError> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let fresh = client.refresh().await?;
        info!(minutes = fresh.minutes_until_expiry(), "Session refreshed");
        self.session.update(fresh);
        if let Err(e) = self.session.save() {
            warn!(error = %e, "Failed to save refreshed session");
        }
        Ok(())
    }

    async fn end_session(&mut self) {
        if let Some(client) = &self.client {
            client.sign_out().await;
        }
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to remove session file");
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, remember } => self.login(email, remember).await,
            Command::Logout { forget } => self.logout(forget).await,
            Command::Players(cmd) => self.players(cmd).await,
            Command::Teams(cmd) => self.teams(cmd).await,
            Command::Matches(cmd) => self.matches(cmd).await,
            Command::Club(cmd) => self.club(cmd).await,
            Command::Export {
                format,
                output,
                team,
            } => self.export(format, output, team).await,
            Command::Import { format, path } => self.import(format, path).await,
            Command::Watch { team, every } => self.watch(team, every).await,
        }
    }

    // ===== Authentication =====

    async fn login(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let Some(client) = self.client.clone() else {
            bail!("Sign-in is not available in offline mode");
        };

        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt_email()?,
        };

        let credentials = self.credentials();
        let password = match credentials.password(&email) {
            Some(password) => {
                debug!("Using remembered password");
                password
            }
            None => rpassword::prompt_password("Password: ")?,
        };

        eprintln!("Signing in...");
        let data = client.sign_in(&email, &password).await?;

        if remember {
            if let Err(e) = credentials.remember(&email, &password) {
                warn!(error = %e, "Failed to remember password");
            }
        }

        self.config.last_email = Some(email.clone());
        self.config.save()?;

        self.session.update(data);
        self.session.save()?;

        println!("Signed in as {}", email);
        Ok(())
    }

    async fn logout(&mut self, forget: bool) -> Result<()> {
        if let Some(client) = &self.client {
            client.sign_out().await;
        }
        let email = self.session.data.as_ref().map(|d| d.email.clone());
        self.session.clear()?;
        self.service.clear_cache();

        if forget {
            if let Some(email) = email.or_else(|| self.config.last_email.clone()) {
                if let Err(e) = self.credentials().forget(&email) {
                    warn!(error = %e, "No remembered password to remove");
                }
            }
        }
        println!("Signed out");
        Ok(())
    }

    fn credentials(&self) -> CredentialStore {
        CredentialStore::for_project(self.config.supabase_url.as_deref().unwrap_or(""))
    }

    // ===== Entities =====

    async fn players(&self, cmd: PlayerCommand) -> Result<()> {
        match cmd {
            PlayerCommand::List { team, sort } => {
                let mut players = self.service.players(team.as_deref()).await?;
                PlayerSortColumn::from(sort).sort(&mut players);
                output::print_players(&players);
            }
            PlayerCommand::Show { id } => match self.service.player(&id).await? {
                Some(player) => output::print_player(&player),
                None => bail!("No player with id {}", id),
            },
            PlayerCommand::Add(args) => {
                let player = self.service.add_player(&new_player(args)).await?;
                println!("{}", output::player_row(&player));
            }
            PlayerCommand::Update(args) => {
                let id = args.id.clone();
                let player = self.service.update_player(&id, &player_patch(args)).await?;
                println!("{}", output::player_row(&player));
            }
            PlayerCommand::Rm { id } => {
                if !self.service.delete_player(&id).await? {
                    println!("No player with id {}", id);
                }
            }
        }
        Ok(())
    }

    async fn teams(&self, cmd: TeamCommand) -> Result<()> {
        match cmd {
            TeamCommand::List => output::print_teams(&self.service.teams().await?),
            TeamCommand::Add {
                name,
                formation,
                description,
            } => {
                let new = NewTeam {
                    formation,
                    description,
                    ..NewTeam::new(name)
                };
                let team = self.service.add_team(&new).await?;
                output::print_teams(std::slice::from_ref(&team));
            }
            TeamCommand::Rm { id } => {
                if !self.service.delete_team(&id).await? {
                    println!("No team with id {}", id);
                }
            }
        }
        Ok(())
    }

    async fn matches(&self, cmd: MatchCommand) -> Result<()> {
        match cmd {
            MatchCommand::List { team } => {
                output::print_matches(&self.service.matches(team.as_deref()).await?)
            }
            MatchCommand::Add {
                opponent,
                date,
                away,
                location,
                team,
            } => {
                let new = NewMatch {
                    team_id: team,
                    location,
                    is_home: !away,
                    ..NewMatch::new(opponent, date)
                };
                let fixture = self.service.add_match(&new).await?;
                println!("{}", output::match_row(&fixture));
            }
            MatchCommand::Score { id, home, away } => {
                let patch = MatchPatch {
                    home_score: Some(home),
                    away_score: Some(away),
                    status: Some("completed".to_string()),
                    ..Default::default()
                };
                let fixture = self.service.update_match(&id, &patch).await?;
                println!("{}", output::match_row(&fixture));
            }
            MatchCommand::Rm { id } => {
                if !self.service.delete_match(&id).await? {
                    println!("No match with id {}", id);
                }
            }
        }
        Ok(())
    }

    async fn club(&self, cmd: ClubCommand) -> Result<()> {
        match cmd {
            ClubCommand::Show => output::print_club(self.service.club_data().await?.as_ref()),
            ClubCommand::Set { name, notes } => {
                let club = self
                    .service
                    .update_club_data(&ClubUpdate { name, notes })
                    .await?;
                output::print_club(Some(&club));
            }
        }
        Ok(())
    }

    // ===== Import / export =====

    async fn export(&self, format: Format, path: Option<PathBuf>, team: Option<String>) -> Result<()> {
        let text = match format {
            Format::Json => self.service.export_json().await?,
            Format::Csv => self.service.export_players_csv(team.as_deref()).await?,
        };
        match path {
            Some(path) => {
                std::fs::write(&path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
            None => print!("{}", text),
        }
        Ok(())
    }

    async fn import(&self, format: Format, path: PathBuf) -> Result<()> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = match format {
            Format::Json => self.service.import_json(&text).await?,
            Format::Csv => self.service.import_players_csv(&text).await?,
        };
        for failure in &report.failures {
            eprintln!(
                "  skipped {} #{}: {}",
                failure.table,
                failure.index + 1,
                failure.reason
            );
        }
        Ok(())
    }

    // ===== Periodic refresh =====

    /// Re-list players every tick, refreshing the access token whenever it
    /// is about to expire or the store has rejected it.
    async fn watch(&mut self, team: Option<String>, every_minutes: u64) -> Result<()> {
        let period = Duration::from_secs(every_minutes.max(1) * 60);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last: Option<Vec<Player>> = None;
        let mut last_error: Option<DataError> = None;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Watch stopped");
                    return Ok(());
                }
            }

            if should_refresh(self.session.data.as_ref(), last_error.as_ref()) {
                match self.refresh_session().await {
                    Ok(()) => {}
                    Err(e) if is_rejected_refresh(&e) => {
                        self.end_session().await;
                        bail!(DataError::Remote(e));
                    }
                    Err(e) => {
                        warn!(error = %e, "Session refresh failed, will retry next tick");
                        continue;
                    }
                }
            }

            self.service.clear_cache();
            let players = match self.service.players(team.as_deref()).await {
                Ok(players) => {
                    last_error = None;
                    players
                }
                Err(e) => {
                    warn!(error = %e, "Refresh failed, will retry next tick");
                    last_error = Some(e);
                    continue;
                }
            };
            if last.as_ref() != Some(&players) {
                println!("--- {} players ---", players.len());
                output::print_players(&players);
                last = Some(players);
            }
        }
    }
}

/// Whether the access token should be refreshed before the next request:
/// it is inside the expiry buffer, or the last request was refused for
/// want of a valid sign-in. Without a saved session there is nothing to
/// refresh.
fn should_refresh(session: Option<&SessionData>, last_error: Option<&DataError>) -> bool {
    session.is_some_and(|data| {
        data.needs_refresh() || last_error.is_some_and(DataError::needs_sign_in)
    })
}

/// The auth server refused the refresh token itself, so retrying is pointless.
fn is_rejected_refresh(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::Rejected(_)
    )
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

fn new_player(args: AddPlayerArgs) -> NewPlayer {
    NewPlayer {
        jersey_number: args.number,
        age: args.age,
        nationality: args.nationality,
        team_id: args.team,
        ..NewPlayer::new(args.name, Position::from(args.position))
    }
}

fn player_patch(args: UpdatePlayerArgs) -> PlayerPatch {
    PlayerPatch {
        name: args.name,
        position: args.position.map(Position::from),
        jersey_number: args.number.map(Some),
        goals: args.goals,
        assists: args.assists,
        minutes: args.minutes,
        status: args.status,
        team_id: optional_update(args.team, args.no_team),
        notes: optional_update(args.notes, args.clear_notes),
        ..Default::default()
    }
}

/// A new value, an explicit clear, or no change.
fn optional_update<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_patch_only_sets_given_fields() {
        let patch = player_patch(UpdatePlayerArgs {
            id: "p1".to_string(),
            name: None,
            position: Some("st".to_string()),
            number: None,
            goals: Some(9),
            assists: None,
            minutes: None,
            status: None,
            notes: None,
            team: None,
            no_team: false,
            clear_notes: false,
        });
        assert_eq!(patch.position, Some(Position::Striker));
        assert_eq!(patch.goals, Some(9));

        let json = serde_json::to_value(&patch).expect("json");
        assert_eq!(json.as_object().map(|o| o.len()), Some(2));
    }

    #[test]
    fn test_player_patch_clears_team_and_notes() {
        let patch = player_patch(UpdatePlayerArgs {
            id: "p1".to_string(),
            name: None,
            position: None,
            number: Some(10),
            goals: None,
            assists: None,
            minutes: None,
            status: None,
            notes: None,
            team: None,
            no_team: true,
            clear_notes: true,
        });
        assert_eq!(patch.team_id, Some(None));
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.jersey_number, Some(Some(10)));

        let json = serde_json::to_value(&patch).expect("json");
        assert!(json["team_id"].is_null());
        assert!(json["notes"].is_null());
    }

    fn session(expires_in_minutes: i64) -> SessionData {
        SessionData {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: "u1".to_string(),
            email: "coach@example.com".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(expires_in_minutes),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_should_refresh_near_expiry_or_after_rejection() {
        let fresh = session(60);
        let expiring = session(2);
        let expired = session(-30);
        let unauthorized = DataError::Remote(ApiError::Unauthorized);
        let outage = DataError::Remote(ApiError::ServerError("down".to_string()));

        assert!(!should_refresh(Some(&fresh), None));
        assert!(!should_refresh(Some(&fresh), Some(&outage)));
        assert!(should_refresh(Some(&fresh), Some(&unauthorized)));
        assert!(should_refresh(Some(&expiring), None));
        assert!(should_refresh(Some(&expired), Some(&outage)));
        assert!(!should_refresh(None, Some(&unauthorized)));
    }

    #[test]
    fn test_refresh_rejection_is_final() {
        assert!(is_rejected_refresh(&ApiError::Unauthorized));
        assert!(is_rejected_refresh(&ApiError::Rejected("invalid_grant".to_string())));
        assert!(!is_rejected_refresh(&ApiError::RateLimited));
        assert!(!is_rejected_refresh(&ApiError::ServerError("502".to_string())));
    }

    #[tokio::test]
    async fn test_offline_app_round_trip() {
        let mut app = App::new(Config::default(), true).await.expect("offline app");
        app.run(Command::Players(PlayerCommand::Add(AddPlayerArgs {
            name: "Pedri".to_string(),
            position: "CM".to_string(),
            number: Some(8),
            age: None,
            nationality: None,
            team: None,
        })))
        .await
        .expect("add");

        let players = app.service.players(None).await.expect("players");
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].user_id, OFFLINE_USER);
        assert!(app.run(Command::Login { email: None, remember: false }).await.is_err());
    }
}
