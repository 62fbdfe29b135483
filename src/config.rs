use std::path::PathBuf;

use indexmap::IndexMap;

use crate::release::error::ReleaseError;
use crate::version::Version;

// =============================================================================
// Retry constants
// =============================================================================

/// Attempts for feed and registry requests
pub const NETWORK_MAX_ATTEMPTS: u32 = 10;

/// First backoff delay for feed and registry requests, doubled on each attempt
pub const NETWORK_RETRY_BASE_SECS: u64 = 1;

/// Attempts for an image build
pub const BUILD_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between image build attempts
pub const BUILD_RETRY_DELAY_SECS: u64 = 30;

/// Attempts for a single image push
pub const PUSH_MAX_ATTEMPTS: u32 = 5;

/// Linear backoff step between push attempts
pub const PUSH_RETRY_STEP_SECS: u64 = 1;

// =============================================================================
// Upstream endpoints
// =============================================================================

/// Marketplace REST API base URL
pub const DEFAULT_MARKETPLACE_URL: &str = "https://marketplace.atlassian.com";

/// Early-access download feed base URL
pub const DEFAULT_EAP_FEED_URL: &str = "https://my.atlassian.com/download/feeds/eap";

/// Maven repository base URL for products without a Marketplace listing
pub const DEFAULT_MAVEN_URL: &str = "https://packages.atlassian.com/maven-external";

/// Registry used for repositories without an explicit registry host
pub const DEFAULT_REGISTRY_URL: &str = "https://registry-1.docker.io";

/// Page size used when walking the Marketplace versions collection
pub const MARKETPLACE_PAGE_SIZE: u32 = 50;

/// Base URLs of every external service the tool talks to
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub marketplace_url: String,
    pub eap_feed_url: String,
    pub maven_url: String,
    pub registry_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            marketplace_url: DEFAULT_MARKETPLACE_URL.to_string(),
            eap_feed_url: DEFAULT_EAP_FEED_URL.to_string(),
            maven_url: DEFAULT_MAVEN_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

/// Registry credentials, passed explicitly to the tag reader and the image pusher
#[derive(Clone, Default, PartialEq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Immutable input of one release run
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Lowest release version to build (inclusive)
    pub start_version: Version,
    /// Upper bound (exclusive); `None` means unbounded
    pub end_version: Option<Version>,
    /// Worker pool size; `1` processes versions sequentially
    pub concurrent_builds: usize,
    /// Publish untagged tags (`6.7.8`, `6.7`, `6`, `latest`)
    pub default_release: bool,
    /// Publish the `eap` tag on the newest early-access build
    pub default_eap: bool,
    /// Every repository each image is pushed to
    pub docker_repos: Vec<String>,
    /// Build context directory
    pub context_path: PathBuf,
    /// Dockerfile, relative to the build context
    pub dockerfile: PathBuf,
    /// Static build arguments, `KEY=value,KEY=value`
    pub dockerfile_buildargs: Option<String>,
    /// Build argument that receives the product version
    pub dockerfile_version_arg: String,
    /// Upstream product key (selects the version feed)
    pub product_key: String,
    /// Secondary variant lines such as `jdk11` or `ubuntu`
    pub tag_suffixes: Vec<String>,
    /// Push images; when false every push is skipped
    pub push_docker: bool,
    pub post_build_hook: Option<PathBuf>,
    pub post_push_hook: Option<PathBuf>,
    /// Shard index of this job, paired with `jobs_total`
    pub job_offset: Option<usize>,
    pub jobs_total: Option<usize>,
}

impl ReleaseConfig {
    /// Creates a configuration with the defaults of the command line
    pub fn new(
        start_version: &str,
        docker_repos: Vec<String>,
        dockerfile_version_arg: &str,
        product_key: &str,
    ) -> Self {
        Self {
            start_version: Version::parse(start_version),
            end_version: None,
            concurrent_builds: 1,
            default_release: false,
            default_eap: false,
            docker_repos,
            context_path: PathBuf::from("."),
            dockerfile: PathBuf::from("Dockerfile"),
            dockerfile_buildargs: None,
            dockerfile_version_arg: dockerfile_version_arg.to_string(),
            product_key: product_key.to_string(),
            tag_suffixes: Vec::new(),
            push_docker: false,
            post_build_hook: None,
            post_push_hook: None,
            job_offset: None,
            jobs_total: None,
        }
    }

    /// Job shard `(offset, total)` when both halves are configured
    pub fn job_shard(&self) -> Option<(usize, usize)> {
        self.job_offset.zip(self.jobs_total)
    }

    /// Checks settings that cannot be expressed in the types
    pub fn validate(&self) -> Result<(), ReleaseError> {
        if self.concurrent_builds == 0 {
            return Err(ReleaseError::InvalidConfig(
                "concurrent builds must be at least 1".to_string(),
            ));
        }
        if self.docker_repos.is_empty() {
            return Err(ReleaseError::InvalidConfig(
                "at least one docker repository is required".to_string(),
            ));
        }
        if self.dockerfile_version_arg.is_empty() {
            return Err(ReleaseError::InvalidConfig(
                "dockerfile version argument must not be empty".to_string(),
            ));
        }
        match (self.job_offset, self.jobs_total) {
            (Some(_), Some(0)) => Err(ReleaseError::InvalidConfig(
                "jobs total must be at least 1".to_string(),
            )),
            (Some(offset), Some(total)) if offset >= total => {
                Err(ReleaseError::InvalidConfig(format!(
                    "job offset {} is out of range for {} jobs",
                    offset, total
                )))
            }
            (Some(_), None) | (None, Some(_)) => Err(ReleaseError::InvalidConfig(
                "job offset and jobs total must be set together".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Parses `KEY=value,KEY=value` into an ordered map.
pub fn parse_buildargs(buildargs: &str) -> Result<IndexMap<String, String>, ReleaseError> {
    buildargs
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            item.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| {
                    ReleaseError::InvalidConfig(format!("malformed build argument: {}", item))
                })
        })
        .collect()
}

/// Splits a comma-separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config() -> ReleaseConfig {
        ReleaseConfig::new(
            "6",
            vec!["atlassian/bitbucket-server".to_string()],
            "BITBUCKET_VERSION",
            "bitbucket",
        )
    }

    #[test]
    fn parse_buildargs_keeps_declaration_order() {
        let args =
            parse_buildargs("ARTEFACT=jira-software,BASE_IMAGE=adoptopenjdk/openjdk11:slim").unwrap();

        assert_eq!(
            args.into_iter().collect::<Vec<_>>(),
            vec![
                ("ARTEFACT".to_string(), "jira-software".to_string()),
                (
                    "BASE_IMAGE".to_string(),
                    "adoptopenjdk/openjdk11:slim".to_string()
                ),
            ]
        );
    }

    #[test]
    fn parse_buildargs_allows_equals_in_value() {
        let args = parse_buildargs("OPTS=-Dfoo=bar").unwrap();
        assert_eq!(args["OPTS"], "-Dfoo=bar");
    }

    #[rstest]
    #[case("NOVALUE")]
    #[case("A=1,=2")]
    fn parse_buildargs_rejects_malformed_pairs(#[case] input: &str) {
        assert!(matches!(
            parse_buildargs(input),
            Err(ReleaseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn split_list_drops_empty_entries() {
        assert_eq!(
            split_list("jdk11, ubuntu,,"),
            vec!["jdk11".to_string(), "ubuntu".to_string()]
        );
    }

    #[rstest]
    #[case(Some(0), Some(4), true)]
    #[case(Some(3), Some(4), true)]
    #[case(Some(4), Some(4), false)]
    #[case(Some(0), Some(0), false)]
    #[case(Some(1), None, false)]
    #[case(None, None, true)]
    fn validate_checks_job_shard(
        #[case] offset: Option<usize>,
        #[case] total: Option<usize>,
        #[case] valid: bool,
    ) {
        let mut config = config();
        config.job_offset = offset;
        config.jobs_total = total;

        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = config();
        config.concurrent_builds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = RegistryCredentials {
            username: "ci".to_string(),
            password: "hunter2".to_string(),
        };

        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
