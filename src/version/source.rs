//! Source trait for fetching the product versions an image may be built for

#[cfg(test)]
use mockall::automock;

use crate::version::error::SourceError;

/// Trait for fetching product versions from an upstream release feed
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Fetches every stable release version
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Deduplicated, all-numeric versions, ordered from newest to oldest
    /// * `Err(SourceError)` - If the feed could not be read after retrying
    async fn fetch_release_versions(&self) -> Result<Vec<String>, SourceError>;

    /// Fetches every early-access (pre-release) version
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Deduplicated versions, ordered from newest to oldest
    /// * `Err(SourceError)` - If the feed could not be read after retrying
    async fn fetch_eap_versions(&self) -> Result<Vec<String>, SourceError>;
}
