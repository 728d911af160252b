use crate::error::{Result, UpdaterError};

/// Validates paths that address files inside a hosted repository.
pub struct PathValidator;

impl PathValidator {
    /// Accepts a relative, forward-slash path without `.`/`..` or empty components.
    pub fn validate_repo_path(path: &str) -> Result<String> {
        let path = path.trim();

        if path.is_empty() {
            return Err(UpdaterError::Usage("Manifest file path is empty".to_string()));
        }

        if path.starts_with('/') || path.contains('\\') || path.contains(':') {
            return Err(UpdaterError::Usage(format!(
                "Manifest file path '{path}' must be relative to the repository root"
            )));
        }

        if let Some(bad) = path
            .split('/')
            .find(|component| component.is_empty() || *component == "." || *component == "..")
        {
            return Err(UpdaterError::Usage(format!(
                "Manifest file path '{path}' contains invalid component '{bad}'"
            )));
        }

        Ok(path.to_string())
    }

    /// Accepts `<owner>/<name>`.
    pub fn validate_repo_identity(identity: &str) -> Result<String> {
        let valid = identity
            .split_once('/')
            .is_some_and(|(owner, name)| {
                !owner.is_empty() && !name.is_empty() && !name.contains('/')
            });

        if !valid {
            return Err(UpdaterError::Usage(format!(
                "Manifest repository '{identity}' must have the form <owner>/<name>"
            )));
        }

        Ok(identity.to_string())
    }
}
