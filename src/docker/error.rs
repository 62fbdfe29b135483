use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerError {
    /// The image build itself failed; `log` holds the build output up to the failure
    #[error("Build failed: {message}")]
    Build { message: String, log: Vec<String> },

    /// Transient failure talking to the daemon or the registry
    #[error("Connection error: {0}")]
    Connection(String),

    /// The registry rejected the push
    #[error("Push failed: {0}")]
    Push(String),

    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DockerError {
    /// Build output attached to a build failure
    pub fn build_log(&self) -> &[String] {
        match self {
            DockerError::Build { log, .. } => log,
            _ => &[],
        }
    }

    /// True for failures worth retrying a push for
    pub fn is_connection(&self) -> bool {
        matches!(self, DockerError::Connection(_))
    }
}
