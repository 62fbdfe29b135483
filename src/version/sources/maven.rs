//! Maven `maven-metadata.xml` implementation, for products without a Marketplace listing

use std::collections::HashSet;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::{info, warn};

use crate::retry::RetryPolicy;
use crate::version::error::SourceError;
use crate::version::source::VersionSource;
use crate::version::sources::{is_release_version, sort_descending};

/// Pre-release versions published to Maven: `MAJOR.MINOR.PATCH-(RC|M)N`
static EAP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+\.\d+\.\d+-(rc|m)\d+$").expect("valid Maven EAP pattern")
});

/// Version source backed by a Maven metadata document
pub struct MavenSource {
    client: reqwest::Client,
    metadata_url: String,
    retry: RetryPolicy,
}

impl MavenSource {
    /// Creates a MavenSource for the metadata document at `metadata_url`
    pub fn new(metadata_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("image-release-manager")
                .build()
                .expect("Failed to create HTTP client"),
            metadata_url: metadata_url.to_string(),
            retry: RetryPolicy::network(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_metadata(&self) -> Result<String, SourceError> {
        let response = self.client.get(&self.metadata_url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(self.metadata_url.clone()));
        }

        if !status.is_success() {
            warn!(
                "Maven repository returned status {}: {}",
                status, self.metadata_url
            );
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response.text().await?)
    }

    async fn fetch_all_versions(&self) -> Result<Vec<String>, SourceError> {
        info!("Retrieving Maven metadata from {}", self.metadata_url);
        let label = format!("Fetching {}", self.metadata_url);
        self.retry
            .run(
                &label,
                |_| async move {
                    let body = self.fetch_metadata().await?;
                    parse_metadata_versions(&body)
                },
                |_| true,
            )
            .await
    }
}

#[async_trait::async_trait]
impl VersionSource for MavenSource {
    async fn fetch_release_versions(&self) -> Result<Vec<String>, SourceError> {
        let versions: HashSet<String> = self
            .fetch_all_versions()
            .await?
            .into_iter()
            .filter(|v| is_release_version(v))
            .collect();

        info!("Found {} versions", versions.len());
        Ok(sort_descending(versions))
    }

    async fn fetch_eap_versions(&self) -> Result<Vec<String>, SourceError> {
        let versions: HashSet<String> = self
            .fetch_all_versions()
            .await?
            .into_iter()
            .filter(|v| EAP_PATTERN.is_match(v))
            .collect();

        info!("Found {} EAPs", versions.len());
        Ok(sort_descending(versions))
    }
}

/// Collects the text of every `<version>` element, wherever it is nested
fn parse_metadata_versions(xml: &str) -> Result<Vec<String>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut versions = Vec::new();
    let mut in_version = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                in_version = e.name().as_ref() == b"version";
            }
            Ok(Event::Text(e)) if in_version => {
                let text = e
                    .unescape()
                    .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    versions.push(text.to_string());
                }
            }
            Ok(Event::End(_)) => in_version = false,
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Failed to parse Maven metadata: {}", e);
                return Err(SourceError::InvalidResponse(e.to_string()));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.atlassian.bitbucket.mesh</groupId>
  <artifactId>bitbucket-mesh-distribution</artifactId>
  <version>2.1.0</version>
  <versioning>
    <latest>2.1.0</latest>
    <release>2.1.0</release>
    <versions>
      <version>1.0.0</version>
      <version>1.0.0-rc1</version>
      <version>1.5.2</version>
      <version>2.0.0-M3</version>
      <version>2.0.0-RC2</version>
      <version>2.0.0-EAP1</version>
      <version>2.1.0</version>
    </versions>
    <lastUpdated>20230101000000</lastUpdated>
  </versioning>
</metadata>"#;

    #[tokio::test]
    async fn fetch_release_versions_reads_all_numeric_versions() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven-metadata.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(METADATA)
            .create_async()
            .await;

        let source = MavenSource::new(&format!("{}/maven-metadata.xml", server.url()))
            .with_retry_policy(RetryPolicy::immediate(2));
        let result = source.fetch_release_versions().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec!["2.1.0", "1.5.2", "1.0.0"]);
    }

    #[tokio::test]
    async fn fetch_eap_versions_matches_rc_and_milestone_only() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven-metadata.xml")
            .with_status(200)
            .with_body(METADATA)
            .create_async()
            .await;

        let source = MavenSource::new(&format!("{}/maven-metadata.xml", server.url()))
            .with_retry_policy(RetryPolicy::immediate(2));
        let result = source.fetch_eap_versions().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec!["2.0.0-RC2", "2.0.0-M3", "1.0.0-rc1"]);
    }

    #[tokio::test]
    async fn fetch_eap_versions_retries_malformed_metadata() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven-metadata.xml")
            .with_status(200)
            .with_body("<metadata><versions><version>2.0.0-RC1</versions>")
            .expect(3)
            .create_async()
            .await;

        let source = MavenSource::new(&format!("{}/maven-metadata.xml", server.url()))
            .with_retry_policy(RetryPolicy::immediate(3));
        let result = source.fetch_eap_versions().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_release_versions_retries_missing_metadata_then_fails() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven-metadata.xml")
            .with_status(404)
            .expect(5)
            .create_async()
            .await;

        let source = MavenSource::new(&format!("{}/maven-metadata.xml", server.url()))
            .with_retry_policy(RetryPolicy::immediate(5));
        let result = source.fetch_release_versions().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn parse_metadata_versions_ignores_other_elements() {
        let versions = parse_metadata_versions(
            "<metadata><latest>9.9.9</latest><versions><version>1.2.3</version></versions></metadata>",
        )
        .unwrap();

        assert_eq!(versions, vec!["1.2.3"]);
    }
}
