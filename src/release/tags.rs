//! Tag set calculation for a single version

use std::collections::BTreeSet;

use crate::version::latest::{
    find_max, is_latest, is_latest_major, is_latest_minor, major_prefix, minor_prefix,
};

/// Tag applied to the newest early-access build
pub const EAP_TAG: &str = "eap";

/// Tag applied to the newest release of the primary line
pub const LATEST_TAG: &str = "latest";

/// Computes the tags of a version from the run's immutable version sets.
///
/// "Latest" checks run over the full release list of the feed, not over the
/// filtered candidates, so a shard never claims `latest` for an older version.
#[derive(Debug, Clone, Default)]
pub struct TagCalculator {
    release_versions: Vec<String>,
    eap_versions: Vec<String>,
    tag_suffixes: Vec<String>,
    default_release: bool,
    default_eap: bool,
}

impl TagCalculator {
    pub fn new(release_versions: Vec<String>, tag_suffixes: Vec<String>, default_release: bool) -> Self {
        Self {
            release_versions,
            tag_suffixes,
            default_release,
            ..Default::default()
        }
    }

    /// Enables the `eap` tag for the maximum of `eap_versions`
    pub fn with_eap(mut self, eap_versions: Vec<String>, default_eap: bool) -> Self {
        self.eap_versions = eap_versions;
        self.default_eap = default_eap;
        self
    }

    /// True if `version` is the newest release of its `major.minor` line
    pub fn is_latest_minor(&self, version: &str) -> bool {
        is_latest_minor(version, &self.release_versions)
    }

    fn is_latest(&self, version: &str) -> bool {
        is_latest(version, &self.release_versions)
    }

    fn is_latest_eap(&self, version: &str) -> bool {
        self.default_eap && find_max(&self.eap_versions) == Some(version)
    }

    /// Every tag `version` should be published under.
    ///
    /// # Examples
    /// With releases `5.4.3, 5.6.7, 6.7.7, 6.7.8`, suffix `jdk11` and the
    /// primary line enabled, `6.7.8` yields `6`, `6.7`, `6.7.8`, `latest`,
    /// `6-jdk11`, `6.7-jdk11`, `6.7.8-jdk11` and `jdk11`.
    pub fn calculate_tags(&self, version: &str) -> BTreeSet<String> {
        let mut version_tags = BTreeSet::from([version.to_string()]);

        if is_latest_major(version, &self.release_versions) {
            version_tags.insert(major_prefix(version).to_string());
        }
        if self.is_latest_minor(version) {
            version_tags.insert(minor_prefix(version).to_string());
        }
        if self.is_latest_eap(version) {
            version_tags.insert(EAP_TAG.to_string());
        }

        let latest = self.is_latest(version);
        let mut tags = BTreeSet::new();

        if self.default_release {
            tags.extend(version_tags.iter().cloned());
            if latest {
                tags.insert(LATEST_TAG.to_string());
            }
        }

        for suffix in &self.tag_suffixes {
            tags.extend(version_tags.iter().map(|t| format!("{}-{}", t, suffix)));
            if latest {
                tags.insert(suffix.clone());
            }
        }

        tags
    }
}
