//! Build collaborator trait

use std::path::PathBuf;

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;

use crate::docker::error::DockerError;

/// Everything needed to build one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Build context directory
    pub context_path: PathBuf,
    /// Dockerfile, relative to the context directory
    pub dockerfile: PathBuf,
    /// Build arguments, version argument first
    pub build_args: IndexMap<String, String>,
    /// `repo:tag` the image carries locally once built; a rebuild moves it
    pub reference: String,
}

/// Handle of a locally built image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    pub id: String,
}

/// Trait for building, tagging and pushing images.
///
/// Shared by every worker of a run, so implementations must allow concurrent calls.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Builds an image; fails with `DockerError::Build` carrying the build log
    async fn build(&self, request: &BuildRequest) -> Result<BuiltImage, DockerError>;

    /// Applies `repo:tag` to a local image
    async fn tag(&self, image: &BuiltImage, repo: &str, tag: &str) -> Result<(), DockerError>;

    /// Pushes a fully qualified `repo:tag` reference; transient failures are
    /// reported as `DockerError::Connection`
    async fn push(&self, reference: &str) -> Result<(), DockerError>;
}
