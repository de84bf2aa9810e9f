use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_PREFIX: &str = "statsor";

/// Remembered sign-in passwords in the OS keychain.
///
/// Entries are keyed by email under a service name that includes the
/// Supabase project host, so the same email on two projects keeps two
/// passwords.
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn for_project(project_url: &str) -> Self {
        Self {
            service: service_name(project_url),
        }
    }

    fn entry(&self, email: &str) -> Result<Entry> {
        Entry::new(&self.service, email).context("Failed to create keyring entry")
    }

    pub fn remember(&self, email: &str, password: &str) -> Result<()> {
        self.entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// The remembered password, or `None` if there is none (or the keychain
    /// is unavailable).
    pub fn password(&self, email: &str) -> Option<String> {
        match self.entry(email).and_then(|e| e.get_password().map_err(Into::into)) {
            Ok(password) => Some(password),
            Err(e) => {
                debug!(error = %e, "No remembered password");
                None
            }
        }
    }

    pub fn forget(&self, email: &str) -> Result<()> {
        self.entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }
}

fn service_name(project_url: &str) -> String {
    let host = project_url
        .split("://")
        .last()
        .unwrap_or(project_url)
        .split('/')
        .next()
        .unwrap_or("")
        .trim();
    if host.is_empty() {
        SERVICE_PREFIX.to_string()
    } else {
        format!("{}:{}", SERVICE_PREFIX, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_uses_project_host() {
        assert_eq!(
            service_name("https://abc.supabase.co/"),
            "statsor:abc.supabase.co"
        );
        assert_eq!(service_name("abc.supabase.co"), "statsor:abc.supabase.co");
        assert_eq!(service_name(""), "statsor");
    }
}
