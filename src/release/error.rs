use thiserror::Error;

use crate::docker::DockerError;
use crate::hook::HookError;
use crate::registry::TargetError;
use crate::version::error::SourceError;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to fetch versions of {product_key}: {source}")]
    Source {
        product_key: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Registry(#[from] TargetError),

    #[error("Build of {version} failed: {source}")]
    Build {
        version: String,
        #[source]
        source: DockerError,
    },

    #[error("Tagging \"{reference}\" failed: {source}")]
    Tag {
        reference: String,
        #[source]
        source: DockerError,
    },

    #[error("Push failed for tag \"{reference}\": {source}")]
    Push {
        reference: String,
        #[source]
        source: DockerError,
    },

    #[error("Hook failed for {subject}: {source}")]
    Hook {
        subject: String,
        #[source]
        source: HookError,
    },

    /// A release job panicked or was aborted
    #[error("Release job did not complete: {0}")]
    Join(String),
}

impl ReleaseError {
    /// Version or reference the failure concerns, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            ReleaseError::Build { version, .. } => Some(version),
            ReleaseError::Tag { reference, .. } | ReleaseError::Push { reference, .. } => {
                Some(reference)
            }
            ReleaseError::Hook { subject, .. } => Some(subject),
            ReleaseError::Registry(e) => Some(&e.repo),
            ReleaseError::Source { product_key, .. } => Some(product_key),
            ReleaseError::InvalidConfig(_) | ReleaseError::Join(_) => None,
        }
    }
}
