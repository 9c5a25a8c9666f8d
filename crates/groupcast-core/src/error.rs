//! groupcast error type — one enum shared by every crate in the workspace.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GroupcastError>;

/// All the ways groupcast can fail.
#[derive(Error, Debug)]
pub enum GroupcastError {
    /// Bad or missing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The platform rejected our credentials.
    #[error("auth failed: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, TLS, timeout, malformed body).
    #[error("http error: {0}")]
    Http(String),

    /// Structured failure reported by the platform API envelope.
    /// `retry_after` and `migrate_to_chat_id` mirror the Bot API
    /// `parameters` object so callers can react without string matching.
    #[error("api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
        migrate_to_chat_id: Option<i64>,
    },

    /// Saved-state (roster file) problems.
    #[error("state error: {0}")]
    State(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GroupcastError {
    /// Seconds the server asked us to wait before messaging this chat again.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// New chat id when the group was upgraded to a supergroup.
    pub fn migrated_to(&self) -> Option<i64> {
        match self {
            Self::Api {
                migrate_to_chat_id, ..
            } => *migrate_to_chat_id,
            _ => None,
        }
    }

    /// True when the chat can no longer be messaged at all — we were kicked,
    /// the group was deleted, or the id never pointed anywhere.
    pub fn is_gone(&self) -> bool {
        match self {
            Self::Api { code: 403, .. } => true,
            Self::Api {
                code: 400,
                description,
                ..
            } => description.contains("chat not found") || description.contains("deactivated"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_err(code: i64, description: &str) -> GroupcastError {
        GroupcastError::Api {
            code,
            description: description.into(),
            retry_after: None,
            migrate_to_chat_id: None,
        }
    }

    #[test]
    fn test_kicked_is_gone() {
        assert!(api_err(403, "Forbidden: bot was kicked from the supergroup chat").is_gone());
    }

    #[test]
    fn test_missing_chat_is_gone() {
        assert!(api_err(400, "Bad Request: chat not found").is_gone());
        assert!(api_err(400, "Bad Request: group chat was deactivated").is_gone());
    }

    #[test]
    fn test_ordinary_errors_are_not_gone() {
        assert!(!api_err(400, "Bad Request: message is too long").is_gone());
        assert!(!GroupcastError::Http("timeout".into()).is_gone());
    }

    #[test]
    fn test_retry_after_extraction() {
        let err = GroupcastError::Api {
            code: 429,
            description: "Too Many Requests: retry after 35".into(),
            retry_after: Some(35),
            migrate_to_chat_id: None,
        };
        assert_eq!(err.retry_after(), Some(35));
        assert_eq!(err.migrated_to(), None);
    }

    #[test]
    fn test_migration_extraction() {
        let err = GroupcastError::Api {
            code: 400,
            description: "Bad Request: group chat was upgraded to a supergroup chat".into(),
            retry_after: None,
            migrate_to_chat_id: Some(-1009876),
        };
        assert_eq!(err.migrated_to(), Some(-1009876));
        assert!(!err.is_gone());
    }
}
