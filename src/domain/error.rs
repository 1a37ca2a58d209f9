use std::io;

use thiserror::Error;

/// Library-wide error type for nexus operations.
///
/// Every failure of an assembly call surfaces as one of these variants; callers
/// classify them with [`AppError::is_inventory`] and [`AppError::is_rendering`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Host or data unavailable from the inventory source.
    #[error("{0}")]
    Inventory(String),

    /// The external inventory command could not run or exited non-zero.
    #[error("Inventory command '{command}' failed: {details}")]
    InventoryCommand { command: String, details: String },

    /// Workflow could not be resolved or rendered.
    #[error("{0}")]
    Rendering(String),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn inventory<S: Into<String>>(message: S) -> Self {
        AppError::Inventory(message.into())
    }

    pub fn rendering<S: Into<String>>(message: S) -> Self {
        AppError::Rendering(message.into())
    }

    /// True for failures caused by the inventory source or an unknown host.
    pub fn is_inventory(&self) -> bool {
        matches!(self, AppError::Inventory(_) | AppError::InventoryCommand { .. })
    }

    /// True for failures raised while resolving or rendering a workflow.
    pub fn is_rendering(&self) -> bool {
        matches!(self, AppError::Rendering(_))
    }

    /// Provide an `io::ErrorKind`-like view for callers expecting legacy behavior.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_) | AppError::TomlParse(_) => io::ErrorKind::InvalidInput,
            AppError::Inventory(_) => io::ErrorKind::NotFound,
            AppError::Rendering(_) => io::ErrorKind::InvalidData,
            AppError::InventoryCommand { .. } => io::ErrorKind::Other,
        }
    }
}

/// Failure to turn a task path into a loadable template.
///
/// Kept distinct from [`AppError`] so the security case can be logged on its
/// own; the `From` impl below is the only place it is narrowed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No template exists for the task path.
    #[error("Template not found for task '{0}'")]
    NotFound(String),

    /// The resolved template lies outside the trusted root.
    #[error("Path injection attempt: '{0}'")]
    Security(String),

    /// The template exists but could not be parsed.
    #[error("Template for task '{task}' is invalid: {reason}")]
    Invalid { task: String, reason: String },
}

impl ResolveError {
    pub fn task(&self) -> &str {
        match self {
            ResolveError::NotFound(task) | ResolveError::Security(task) => task,
            ResolveError::Invalid { task, .. } => task,
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(task) | ResolveError::Security(task) => {
                AppError::Rendering(format!("Task template missing or insecure: {}", task))
            }
            ResolveError::Invalid { task, reason } => {
                AppError::Rendering(format!("Task template {} is invalid: {}", task, reason))
            }
        }
    }
}
