use thiserror::Error;

/// Why a transfer ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FailureReason {
    fn from(e: std::io::Error) -> Self {
        FailureReason::Io(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Download URL must not be blank")]
    BlankUrl,

    #[error("Task engine is no longer accepting work")]
    EngineClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Could not promote task to foreground: {0}")]
    ForegroundUnavailable(String),
}
