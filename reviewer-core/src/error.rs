//! Error types for the PR reviewer service

use thiserror::Error;

/// Result type alias for reviewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reviewer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced team, user, or pull request does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Team name is already taken
    #[error("Team '{0}' already exists")]
    TeamExists(String),

    /// Pull request id is already taken
    #[error("Pull request '{0}' already exists")]
    PrExists(String),

    /// Mutation attempted on a merged pull request
    #[error("Pull request '{0}' is already merged")]
    PrMerged(String),

    /// Reviewer is not assigned to the pull request
    #[error("User '{user_id}' is not assigned to pull request '{pr_id}'")]
    NotAssigned { pr_id: String, user_id: String },

    /// No active replacement reviewer is available
    #[error("No active replacement candidate for pull request '{0}'")]
    NoCandidate(String),

    /// Unclassified failure from the backing store
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Category of an [`Error`], matched on at service boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    TeamExists,
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    Internal,
}

impl Error {
    /// Get the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::TeamExists(_) => ErrorKind::TeamExists,
            Error::PrExists(_) => ErrorKind::PrExists,
            Error::PrMerged(_) => ErrorKind::PrMerged,
            Error::NotAssigned { .. } => ErrorKind::NotAssigned,
            Error::NoCandidate(_) => ErrorKind::NoCandidate,
            Error::Storage(_) | Error::Config(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::NotFound("pr1".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::TeamExists("core".into()).kind(), ErrorKind::TeamExists);
        assert_eq!(Error::PrExists("pr1".into()).kind(), ErrorKind::PrExists);
        assert_eq!(Error::PrMerged("pr1".into()).kind(), ErrorKind::PrMerged);
        assert_eq!(
            Error::NotAssigned {
                pr_id: "pr1".into(),
                user_id: "u9".into()
            }
            .kind(),
            ErrorKind::NotAssigned
        );
        assert_eq!(Error::NoCandidate("pr1".into()).kind(), ErrorKind::NoCandidate);
        assert_eq!(Error::Storage("disk I/O".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_assigned_message() {
        let err = Error::NotAssigned {
            pr_id: "pr1".into(),
            user_id: "u9".into(),
        };
        assert_eq!(
            err.to_string(),
            "User 'u9' is not assigned to pull request 'pr1'"
        );
    }
}
