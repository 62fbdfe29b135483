use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized for repository: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Tag listing failure for one of the target repositories
#[derive(Debug, Error)]
#[error("Failed to read tags of {repo}: {source}")]
pub struct TargetError {
    pub repo: String,
    #[source]
    pub source: RegistryError,
}
