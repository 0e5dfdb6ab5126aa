use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Environment name cannot be empty.")]
    EmptyName,
    #[error("Environment name '{0}' must be a single directory name.")]
    InvalidName(String),
    #[error("A file or folder already exists at {}.", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Failed to create virtual environment: {0}")]
    BuildFailed(String),
}

impl CreateError {
    /// Rejections of the requested name, as opposed to a failed build.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CreateError::BuildFailed(_))
    }
}

/// A freshly created environment and the terminal opened for it, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Created {
    pub name: String,
    pub path: PathBuf,
    pub terminal: Option<String>,
}

/// Trims `raw` and checks that it can be used as a single directory name.
///
/// # Errors
/// Returns [`CreateError::EmptyName`] or [`CreateError::InvalidName`].
pub fn validate_env_name(raw: &str) -> Result<String, CreateError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CreateError::EmptyName);
    }
    let single_component = Path::new(name)
        .file_name()
        .is_some_and(|component| component == name);
    if name == "." || name == ".." || name.contains(['/', '\\']) || !single_component {
        return Err(CreateError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}
