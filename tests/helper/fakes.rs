//! In-memory collaborators for release runs

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use image_release_manager::docker::{BuildRequest, BuiltImage, DockerError, ImageBuilder};
use image_release_manager::registry::{RegistryError, TagLister};
use image_release_manager::version::Version;
use image_release_manager::version::error::SourceError;
use image_release_manager::version::source::VersionSource;

/// Version source returning fixed lists, newest first like the real feeds
#[derive(Default)]
pub struct StaticVersionSource {
    releases: Vec<String>,
    eaps: Vec<String>,
    unavailable: bool,
}

impl StaticVersionSource {
    pub fn new(releases: &[&str]) -> Self {
        Self {
            releases: sorted(releases),
            ..Default::default()
        }
    }

    pub fn with_eaps(mut self, eaps: &[&str]) -> Self {
        self.eaps = sorted(eaps);
        self
    }

    /// Every fetch fails with `NotFound`
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn result(&self, versions: &[String]) -> Result<Vec<String>, SourceError> {
        if self.unavailable {
            return Err(SourceError::NotFound("test-product".to_string()));
        }
        Ok(versions.to_vec())
    }
}

fn sorted(versions: &[&str]) -> Vec<String> {
    let mut versions: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
    versions.sort_by(|a, b| Version::parse(b).cmp(&Version::parse(a)));
    versions
}

#[async_trait]
impl VersionSource for StaticVersionSource {
    async fn fetch_release_versions(&self) -> Result<Vec<String>, SourceError> {
        self.result(&self.releases)
    }

    async fn fetch_eap_versions(&self) -> Result<Vec<String>, SourceError> {
        self.result(&self.eaps)
    }
}

/// Tag lister backed by a map; unknown repositories have no tags
#[derive(Default)]
pub struct StaticTagLister {
    tags: HashMap<String, HashSet<String>>,
}

impl StaticTagLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, repo: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            repo.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl TagLister for StaticTagLister {
    async fn existing_tags(&self, repo: &str) -> Result<HashSet<String>, RegistryError> {
        Ok(self.tags.get(repo).cloned().unwrap_or_default())
    }
}

/// Image builder that records every call instead of talking to a daemon
pub struct RecordingImageBuilder {
    version_arg: String,
    failing_versions: HashSet<String>,
    builds: Mutex<Vec<String>>,
    tags: Mutex<Vec<String>>,
    pushes: Mutex<Vec<String>>,
}

impl RecordingImageBuilder {
    /// `version_arg` is the build argument the version is read from
    pub fn new(version_arg: &str) -> Self {
        Self {
            version_arg: version_arg.to_string(),
            failing_versions: HashSet::new(),
            builds: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
        }
    }

    /// Builds of these versions fail with a build log attached
    pub fn failing(mut self, versions: &[&str]) -> Self {
        self.failing_versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Versions built, one entry per build attempt
    pub fn builds(&self) -> Vec<String> {
        self.builds.lock().unwrap().clone()
    }

    pub fn built_set(&self) -> HashSet<String> {
        self.builds().into_iter().collect()
    }

    /// `repo:tag` references applied to images
    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }

    /// References pushed
    pub fn pushes(&self) -> HashSet<String> {
        self.pushes.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl ImageBuilder for RecordingImageBuilder {
    async fn build(&self, request: &BuildRequest) -> Result<BuiltImage, DockerError> {
        let version = request
            .build_args
            .get(&self.version_arg)
            .cloned()
            .unwrap_or_default();
        self.builds.lock().unwrap().push(version.clone());

        if self.failing_versions.contains(&version) {
            return Err(DockerError::Build {
                message: "Test failure message".to_string(),
                log: vec!["Build log".to_string()],
            });
        }

        Ok(BuiltImage {
            id: format!("sha256:{}", version),
        })
    }

    async fn tag(&self, _image: &BuiltImage, repo: &str, tag: &str) -> Result<(), DockerError> {
        self.tags.lock().unwrap().push(format!("{}:{}", repo, tag));
        Ok(())
    }

    async fn push(&self, reference: &str) -> Result<(), DockerError> {
        self.pushes.lock().unwrap().push(reference.to_string());
        Ok(())
    }
}
