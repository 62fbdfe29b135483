//! Build, hook, tag and push sequence for one version

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{error, info};

use crate::config::{ReleaseConfig, parse_buildargs};
use crate::docker::{BuildRequest, BuiltImage, DockerError, ImageBuilder};
use crate::hook::{Hook, flag};
use crate::release::error::ReleaseError;
use crate::release::tags::TagCalculator;
use crate::retry::RetryPolicy;

/// Runs every step of a release for a single version.
///
/// Shared read-only by all workers; the only shared mutable resource is the
/// `ImageBuilder`, which is expected to allow concurrent use.
#[derive(Clone)]
pub struct ReleasePipeline {
    builder: Arc<dyn ImageBuilder>,
    tags: TagCalculator,
    docker_repos: Vec<String>,
    context_path: PathBuf,
    dockerfile: PathBuf,
    version_arg: String,
    static_buildargs: IndexMap<String, String>,
    push_docker: bool,
    post_build_hook: Hook,
    post_push_hook: Hook,
    build_retry: RetryPolicy,
    push_retry: RetryPolicy,
}

impl ReleasePipeline {
    pub fn new(
        config: &ReleaseConfig,
        tags: TagCalculator,
        builder: Arc<dyn ImageBuilder>,
    ) -> Result<Self, ReleaseError> {
        let static_buildargs = match &config.dockerfile_buildargs {
            Some(buildargs) => parse_buildargs(buildargs)?,
            None => IndexMap::new(),
        };

        Ok(Self {
            builder,
            tags,
            docker_repos: config.docker_repos.clone(),
            context_path: config.context_path.clone(),
            dockerfile: config.dockerfile.clone(),
            version_arg: config.dockerfile_version_arg.clone(),
            static_buildargs,
            push_docker: config.push_docker,
            post_build_hook: Hook::post_build(config.post_build_hook.clone()),
            post_push_hook: Hook::post_push(config.post_push_hook.clone()),
            build_retry: RetryPolicy::build(),
            push_retry: RetryPolicy::push(),
        })
    }

    pub fn with_retry_policies(mut self, build: RetryPolicy, push: RetryPolicy) -> Self {
        self.build_retry = build;
        self.push_retry = push;
        self
    }

    pub fn tags(&self) -> &TagCalculator {
        &self.tags
    }

    /// Build arguments for `version`: the version argument first, then the
    /// static arguments in declaration order
    pub fn build_args(&self, version: &str) -> IndexMap<String, String> {
        let mut args = IndexMap::from([(self.version_arg.clone(), version.to_string())]);
        args.extend(self.static_buildargs.clone());
        args
    }

    /// Builds, checks and publishes `version`.
    ///
    /// `prerelease` is forwarded to the post-push hook.
    pub async fn release(&self, version: &str, prerelease: bool) -> Result<(), ReleaseError> {
        let image = self.build(version).await?;

        self.post_build_hook
            .run(&[
                image.id.as_str(),
                flag(self.push_docker),
                flag(self.tags.is_latest_minor(version)),
            ])
            .await
            .map_err(|source| ReleaseError::Hook {
                subject: version.to_string(),
                source,
            })?;

        for tag in self.tags.calculate_tags(version) {
            for repo in &self.docker_repos {
                let reference = format!("{}:{}", repo, tag);
                self.builder
                    .tag(&image, repo, &tag)
                    .await
                    .map_err(|source| ReleaseError::Tag {
                        reference: reference.clone(),
                        source,
                    })?;

                self.push(&reference, prerelease).await?;
            }
        }

        info!("Release of {} complete", version);
        Ok(())
    }

    /// Local reference for a build: the first published tag of the first
    /// repository, or `repo:version` when the version gets no tags
    pub fn build_reference(&self, version: &str) -> String {
        let repo = self.docker_repos.first().map(String::as_str).unwrap_or_default();
        let tag = self
            .tags
            .calculate_tags(version)
            .into_iter()
            .next()
            .unwrap_or_else(|| version.to_string());
        format!("{}:{}", repo, tag)
    }

    async fn build(&self, version: &str) -> Result<BuiltImage, ReleaseError> {
        let build_args = self.build_args(version);
        let repos = self.docker_repos.join(", ");
        let buildargs_log = build_args
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        info!("Building {} with buildargs: {}", repos, buildargs_log);
        info!("Using docker file \"{}\"", self.dockerfile.display());

        let request = BuildRequest {
            context_path: self.context_path.clone(),
            dockerfile: self.dockerfile.clone(),
            build_args,
            reference: self.build_reference(version),
        };

        let label = format!("Build of {}", version);
        let result = self
            .build_retry
            .run(&label, |_| self.builder.build(&request), is_retryable_build_error)
            .await;

        result.map_err(|e| {
            error!(
                "Build for {} with {}={} failed:\n\t{}",
                repos, self.version_arg, version, e
            );
            if !e.build_log().is_empty() {
                error!("Build log:\n{}", e.build_log().join("\n"));
            }
            ReleaseError::Build {
                version: version.to_string(),
                source: e,
            }
        })
    }

    async fn push(&self, reference: &str, prerelease: bool) -> Result<(), ReleaseError> {
        if !self.push_docker {
            info!("Push disabled; skipping tag \"{}\"", reference);
            return Ok(());
        }

        info!("Pushing tag \"{}\"", reference);
        let label = format!("Pushing tag \"{}\"", reference);
        self.push_retry
            .run(&label, |_| self.builder.push(reference), DockerError::is_connection)
            .await
            .map_err(|source| {
                error!("Push failed for tag \"{}\"", reference);
                ReleaseError::Push {
                    reference: reference.to_string(),
                    source,
                }
            })?;
        info!("Pushing tag \"{}\" succeeded!", reference);

        self.post_push_hook
            .run(&[reference, flag(prerelease)])
            .await
            .map_err(|source| ReleaseError::Hook {
                subject: reference.to_string(),
                source,
            })
    }
}

/// A missing build context or Dockerfile will not appear on retry
fn is_retryable_build_error(error: &DockerError) -> bool {
    !matches!(
        error,
        DockerError::DockerfileNotFound(_) | DockerError::ContextNotFound(_)
    )
}
