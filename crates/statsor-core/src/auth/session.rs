use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

/// On-disk session persistence, so a signed-in user stays signed in across
/// runs of the CLI.
pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are still loaded when they
    /// carry a refresh token; callers decide whether to refresh.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() || !data.refresh_token.is_empty() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the user ID if session exists
    pub fn user_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.user_id.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(expires_in_minutes: i64, refresh_token: &str) -> SessionData {
        SessionData {
            access_token: "access".to_string(),
            refresh_token: refresh_token.to_string(),
            user_id: "user-1".to_string(),
            email: "coach@example.com".to_string(),
            expires_at: Utc::now() + Duration::minutes(expires_in_minutes),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_expiry_checks() {
        let fresh = sample(60, "r");
        assert!(!fresh.is_expired());
        assert!(!fresh.needs_refresh());

        let nearly = sample(3, "r");
        assert!(!nearly.is_expired());
        assert!(nearly.needs_refresh());

        let expired = sample(-1, "r");
        assert!(expired.is_expired());
        assert_eq!(expired.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_session_save_load_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(sample(60, "r"));
        session.save().expect("save");

        let mut loaded = Session::new(dir.path().to_path_buf());
        assert!(loaded.load().expect("load"));
        assert_eq!(loaded.user_id(), Some("user-1"));
        assert!(loaded.is_valid());

        loaded.clear().expect("clear");
        let mut again = Session::new(dir.path().to_path_buf());
        assert!(!again.load().expect("load after clear"));
    }

    #[test]
    fn test_expired_session_without_refresh_token_is_not_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(sample(-10, ""));
        session.save().expect("save");

        let mut loaded = Session::new(dir.path().to_path_buf());
        assert!(!loaded.load().expect("load"));
        assert!(loaded.data.is_none());
    }
}
