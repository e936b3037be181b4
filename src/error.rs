use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
}

/// The mutation a failed request belonged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Assign,
    Unassign,
    Update,
    Delete,
}

impl Action {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::Toggle | Action::Update => "Failed to update task. Please try again.",
            Action::Assign => "Failed to assign user. Please try again.",
            Action::Unassign => "Failed to unassign user. Please try again.",
            Action::Delete => "Failed to delete task. Please try again.",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Toggle => "toggle",
            Action::Assign => "assign",
            Action::Unassign => "unassign",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

// Display strings double as the user-facing notification text
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("You don't have permission to complete this task. Only assigned users can mark it as done.")]
    PermissionDenied,
    #[error("Please log in to update tasks")]
    Unauthenticated,
    #[error("This task is already being updated")]
    Busy,
    #[error("Delete must be confirmed first")]
    NotConfirmed,
    #[error("Task is not being edited")]
    NotEditing,
    #[error("User #{0} is not assigned to this task")]
    NotAssigned(u64),
    #[error("Task title cannot be empty.")]
    EmptyTitle,
    #[error("{}", .action.failure_message())]
    Request {
        action: Action,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}
