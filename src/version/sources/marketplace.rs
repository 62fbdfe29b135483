//! Marketplace REST API and early-access feed implementation

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{DEFAULT_EAP_FEED_URL, DEFAULT_MARKETPLACE_URL, MARKETPLACE_PAGE_SIZE};
use crate::retry::RetryPolicy;
use crate::version::error::SourceError;
use crate::version::source::VersionSource;
use crate::version::sources::{is_release_version, sort_descending};

/// Length of the `downloads(` callback prefix wrapping the EAP feed
const EAP_FEED_PREFIX_LEN: usize = 10;

/// Version token inside an EAP entry description
static EAP_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)+(?:-[A-Za-z0-9]+)*)").expect("valid EAP version pattern")
});

/// Jira products share one EAP feed; entries are told apart by description
const JIRA_FEED_KEY: &str = "jira";
const JIRA_DESCRIPTION_KEYS: &[(&str, &str)] = &[
    ("jira", "jira core"),
    ("jira-software", "jira software"),
    ("jira-servicedesk", "jira servicedesk"),
];

/// One page of the Marketplace versions collection
#[derive(Debug, Deserialize)]
struct VersionsPage {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedVersions,
    #[serde(rename = "_links", default)]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVersions {
    versions: Vec<MarketplaceVersion>,
}

#[derive(Debug, Deserialize)]
struct MarketplaceVersion {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

/// Entry of the early-access feed
#[derive(Debug, Deserialize)]
struct EapEntry {
    #[serde(default)]
    description: String,
}

/// Version source backed by the Marketplace and the early-access download feed
pub struct MarketplaceSource {
    client: reqwest::Client,
    marketplace_url: String,
    eap_feed_url: String,
    product_key: String,
    retry: RetryPolicy,
}

impl MarketplaceSource {
    /// Creates a MarketplaceSource with custom base URLs
    pub fn new(marketplace_url: &str, eap_feed_url: &str, product_key: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("image-release-manager")
                .build()
                .expect("Failed to create HTTP client"),
            marketplace_url: marketplace_url.trim_end_matches('/').to_string(),
            eap_feed_url: eap_feed_url.trim_end_matches('/').to_string(),
            product_key: product_key.to_string(),
            retry: RetryPolicy::network(),
        }
    }

    /// Creates a MarketplaceSource against the public endpoints
    pub fn for_product(product_key: &str) -> Self {
        Self::new(DEFAULT_MARKETPLACE_URL, DEFAULT_EAP_FEED_URL, product_key)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolves a `next` link, which the Marketplace returns as a path
    fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.marketplace_url, href)
        }
    }

    async fn fetch_page(&self, url: &str, first: bool) -> Result<VersionsPage, SourceError> {
        let mut request = self.client.get(url);
        if first {
            request = request.query(&[("offset", 0), ("limit", MARKETPLACE_PAGE_SIZE)]);
        }
        let response = request.send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(self.product_key.clone()));
        }

        if !status.is_success() {
            warn!("Marketplace returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse Marketplace response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })
    }

    async fn fetch_eap_feed(&self, feed_key: &str) -> Result<String, SourceError> {
        let url = format!("{}/{}.json", self.eap_feed_url, feed_key);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(feed_key.to_string()));
        }

        if !status.is_success() {
            warn!("EAP feed returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response.text().await?)
    }

    /// Feed key and description filter for the configured product
    fn eap_feed_key(&self) -> (&str, Option<&'static str>) {
        match JIRA_DESCRIPTION_KEYS
            .iter()
            .find(|(key, _)| *key == self.product_key)
        {
            Some((_, description)) => (JIRA_FEED_KEY, Some(*description)),
            None => (&self.product_key, None),
        }
    }
}

#[async_trait::async_trait]
impl VersionSource for MarketplaceSource {
    async fn fetch_release_versions(&self) -> Result<Vec<String>, SourceError> {
        let mut url = format!(
            "{}/rest/2/products/key/{}/versions",
            self.marketplace_url, self.product_key
        );
        let mut versions = HashSet::new();
        let mut page = 1;

        loop {
            info!(
                "Retrieving Marketplace product versions for {}: page {}",
                self.product_key, page
            );
            let label = format!("Fetching {}", url);
            let data = self
                .retry
                .run(&label, |_| self.fetch_page(&url, page == 1), |_| true)
                .await?;

            versions.extend(
                data.embedded
                    .versions
                    .into_iter()
                    .map(|v| v.name)
                    .filter(|name| is_release_version(name)),
            );

            match data.links.next {
                Some(next) => {
                    url = self.resolve(&next.href);
                    page += 1;
                }
                None => break,
            }
        }

        info!("Found {} versions", versions.len());
        Ok(sort_descending(versions))
    }

    async fn fetch_eap_versions(&self) -> Result<Vec<String>, SourceError> {
        let (feed_key, description_key) = self.eap_feed_key();
        info!("Retrieving EAP versions for {}", self.product_key);

        let label = format!("Fetching EAP feed {}", feed_key);
        let fetch = |_: u32| async move {
            let body = self.fetch_eap_feed(feed_key).await?;
            parse_eap_feed(&body)
        };
        let entries = match self.retry.run(&label, fetch, |_| true).await {
            Ok(entries) => entries,
            Err(SourceError::NotFound(_)) => {
                warn!("No EAP feed for {}; assuming no EAP versions", feed_key);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let versions: HashSet<String> = entries
            .iter()
            .filter(|entry| {
                description_key
                    .is_none_or(|key| entry.description.to_lowercase().contains(key))
            })
            .filter_map(|entry| extract_eap_version(&entry.description))
            .collect();

        info!("Found {} EAPs", versions.len());
        Ok(sort_descending(versions))
    }
}

/// Strips the single-line JS callback envelope and parses the entries
fn parse_eap_feed(body: &str) -> Result<Vec<EapEntry>, SourceError> {
    let body = body.trim();
    let char_count = body.chars().count();
    if char_count <= EAP_FEED_PREFIX_LEN {
        return Err(SourceError::InvalidResponse(
            "EAP feed is shorter than its callback envelope".to_string(),
        ));
    }
    let inner: String = body
        .chars()
        .skip(EAP_FEED_PREFIX_LEN)
        .take(char_count - EAP_FEED_PREFIX_LEN - 1)
        .collect();

    serde_json::from_str(&inner).map_err(|e| {
        warn!("Failed to parse EAP feed: {}", e);
        SourceError::InvalidResponse(e.to_string())
    })
}

/// Extracts the version token from a free-text EAP description
fn extract_eap_version(description: &str) -> Option<String> {
    EAP_VERSION_PATTERN
        .captures(description)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
