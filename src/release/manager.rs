//! Release run orchestration: configuration-time state and the worker pool

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ReleaseConfig;
use crate::docker::ImageBuilder;
use crate::registry::{TagLister, TargetRepository, get_targets};
use crate::release::error::ReleaseError;
use crate::release::pipeline::ReleasePipeline;
use crate::release::reconcile::{batch_job, eap_candidates, release_candidates, unbuilt_versions};
use crate::release::tags::TagCalculator;
use crate::retry::RetryPolicy;
use crate::version::source::VersionSource;

/// One release run.
///
/// Version lists and registry snapshots are read once in [`ReleaseManager::new`]
/// and never refreshed, so every mode of the run sees the same state.
pub struct ReleaseManager {
    config: ReleaseConfig,
    release_versions: Vec<String>,
    eap_release_versions: Vec<String>,
    targets: Vec<TargetRepository>,
    pipeline: Arc<ReleasePipeline>,
}

impl ReleaseManager {
    /// Fetches versions and registry state and computes the candidate sets
    pub async fn new(
        config: ReleaseConfig,
        source: &dyn VersionSource,
        lister: &dyn TagLister,
        builder: Arc<dyn ImageBuilder>,
    ) -> Result<Self, ReleaseError> {
        config.validate()?;

        let source_error = |source| ReleaseError::Source {
            product_key: config.product_key.clone(),
            source,
        };
        let (all_releases, all_eaps) =
            tokio::try_join!(source.fetch_release_versions(), source.fetch_eap_versions())
                .map_err(source_error)?;

        let targets = get_targets(lister, &config.docker_repos).await?;

        let mut release_versions = release_candidates(
            &all_releases,
            &config.start_version,
            config.end_version.as_ref(),
        );
        let mut eap_release_versions = eap_candidates(&all_eaps, &config.start_version);

        if let Some((offset, total)) = config.job_shard() {
            info!("Running job {} of {}", offset + 1, total);
            release_versions = batch_job(&release_versions, total, offset).to_vec();
            eap_release_versions = batch_job(&eap_release_versions, total, offset).to_vec();
        }

        debug!("Release candidates: {:?}", release_versions);
        debug!("EAP candidates: {:?}", eap_release_versions);

        if !config.default_release && config.tag_suffixes.is_empty() {
            warn!("Neither the default release line nor any tag suffix is enabled; nothing will be tagged");
        }

        let tags = TagCalculator::new(
            all_releases,
            config.tag_suffixes.clone(),
            config.default_release,
        )
        .with_eap(all_eaps, config.default_eap);
        let pipeline = ReleasePipeline::new(&config, tags, builder)?;

        Ok(Self {
            config,
            release_versions,
            eap_release_versions,
            targets,
            pipeline: Arc::new(pipeline),
        })
    }

    /// Replaces the build and push retry policies
    pub fn with_retry_policies(mut self, build: RetryPolicy, push: RetryPolicy) -> Self {
        let pipeline = (*self.pipeline).clone();
        self.pipeline = Arc::new(pipeline.with_retry_policies(build, push));
        self
    }

    /// Release versions of this run (bounds and job shard applied), newest first
    pub fn release_versions(&self) -> &[String] {
        &self.release_versions
    }

    /// EAP versions of this run (major floor and job shard applied), newest first
    pub fn eap_release_versions(&self) -> &[String] {
        &self.eap_release_versions
    }

    pub fn targets(&self) -> &[TargetRepository] {
        &self.targets
    }

    pub fn unbuilt_release_versions(&self) -> Vec<String> {
        let versions = unbuilt_versions(
            &self.release_versions,
            &self.targets,
            self.config.default_release,
            &self.config.tag_suffixes,
        );
        info!("Unbuilt release versions: {:?}", versions);
        versions
    }

    pub fn unbuilt_eap_versions(&self) -> Vec<String> {
        let versions = unbuilt_versions(
            &self.eap_release_versions,
            &self.targets,
            self.config.default_release,
            &self.config.tag_suffixes,
        );
        info!("Unbuilt EAP versions: {:?}", versions);
        versions
    }

    pub fn calculate_tags(&self, version: &str) -> BTreeSet<String> {
        self.pipeline.tags().calculate_tags(version)
    }

    /// Builds every release version that is not yet published everywhere
    pub async fn create_releases(&self) -> Result<(), ReleaseError> {
        info!("##### Creating new releases #####");
        let versions = self.unbuilt_release_versions();
        self.build_releases(versions, false).await
    }

    /// Rebuilds and republishes every release version of the run
    pub async fn update_releases(&self) -> Result<(), ReleaseError> {
        info!("##### Updating existing releases #####");
        self.build_releases(self.release_versions.clone(), false).await
    }

    /// Builds every EAP version that is not yet published everywhere
    pub async fn create_eap_releases(&self) -> Result<(), ReleaseError> {
        info!("##### Creating new EAP releases #####");
        let versions = self.unbuilt_eap_versions();
        self.build_releases(versions, true).await
    }

    /// Releases `versions`, at most `concurrent_builds` at a time.
    ///
    /// The first failure closes the pool: versions that have not started are
    /// skipped, versions already running finish, and that first error is
    /// returned once they have.
    pub async fn build_releases(
        &self,
        versions: Vec<String>,
        prerelease: bool,
    ) -> Result<(), ReleaseError> {
        info!(
            "Found {} release{} to build",
            versions.len(),
            if versions.len() == 1 { "" } else { "s" }
        );
        info!("Building with {} workers", self.config.concurrent_builds);

        if self.config.concurrent_builds <= 1 {
            for version in &versions {
                self.pipeline.release(version, prerelease).await?;
            }
            return Ok(());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_builds));
        let mut jobs = JoinSet::new();

        for version in versions {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);
            jobs.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    debug!("Skipping {}; run is cancelled", version);
                    return Ok(());
                };

                let result = pipeline.release(&version, prerelease).await;
                if result.is_err() {
                    // Close before the permit is released so no waiting job starts
                    semaphore.close();
                }
                result
            });
        }

        let mut first_error = None;
        while let Some(joined) = jobs.join_next().await {
            let result = joined
                .map_err(|e| ReleaseError::Join(e.to_string()))
                .and_then(|r| r);

            if let Err(e) = result {
                if first_error.is_none() {
                    error!("Release job failed; cancelling outstanding jobs...");
                    semaphore.close();
                    first_error = Some(e);
                } else {
                    warn!("Another release job failed: {}", e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
