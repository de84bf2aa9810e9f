use thiserror::Error;

use crate::api::ApiError;

/// Outcome of a failed repository call.
///
/// An empty list or `None` from a repository always means "no data";
/// anything that went wrong comes back as one of these.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("No {entity} with id {id} for the current user")]
    NotFound { entity: &'static str, id: String },

    #[error("Remote store error: {0}")]
    Remote(#[from] ApiError),

    #[error("Malformed record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store committed the row but returned something that does not
    /// decode. The write happened; only the echo is lost.
    #[error("{entity} {id} was saved but could not be read back: {source}")]
    Unreadable {
        entity: &'static str,
        id: String,
        source: serde_json::Error,
    },

    #[error("Import failed: {0}")]
    Import(String),
}

impl DataError {
    /// Whether signing in (again) could fix this.
    pub fn needs_sign_in(&self) -> bool {
        matches!(
            self,
            DataError::Unauthenticated | DataError::Remote(ApiError::Unauthorized)
        )
    }

    /// Whether the store applied the write even though the call failed.
    pub fn write_committed(&self) -> bool {
        matches!(self, DataError::Unreadable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_sign_in() {
        assert!(DataError::Unauthenticated.needs_sign_in());
        assert!(DataError::Remote(ApiError::Unauthorized).needs_sign_in());
        assert!(!DataError::Validation("id".to_string()).needs_sign_in());
    }

    #[test]
    fn test_only_unreadable_rows_count_as_committed() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let unreadable = DataError::Unreadable {
            entity: "player",
            id: "p1".to_string(),
            source,
        };
        assert!(unreadable.write_committed());
        assert!(!DataError::Unauthenticated.write_committed());
        assert!(!DataError::Import("bad".to_string()).write_committed());
    }

    #[test]
    fn test_not_found_message() {
        let err = DataError::NotFound {
            entity: "player",
            id: "p1".to_string(),
        };
        assert_eq!(err.to_string(), "No player with id p1 for the current user");
    }
}
