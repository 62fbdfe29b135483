//! Version source implementations and per-product source selection

pub mod marketplace;
pub mod maven;

pub use marketplace::MarketplaceSource;
pub use maven::MavenSource;

use std::sync::Arc;

use crate::config::Endpoints;
use crate::retry::RetryPolicy;
use crate::version::source::VersionSource;
use crate::version::types::Version;

/// Products published to a Maven repository instead of the Marketplace,
/// with the artifact path of their `maven-metadata.xml`
const MAVEN_PRODUCTS: &[(&str, &str)] = &[(
    "bitbucket-mesh",
    "com/atlassian/bitbucket/mesh/bitbucket-mesh-distribution",
)];

/// Where a product's versions are published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSource {
    /// Marketplace versions collection plus the early-access feed
    Marketplace,
    /// `maven-metadata.xml` under the given artifact path
    Maven { artifact_path: &'static str },
}

impl ProductSource {
    /// Selects the source kind for a product key
    pub fn for_product(product_key: &str) -> Self {
        MAVEN_PRODUCTS
            .iter()
            .find(|(key, _)| *key == product_key)
            .map_or(ProductSource::Marketplace, |(_, artifact_path)| {
                ProductSource::Maven {
                    artifact_path: *artifact_path,
                }
            })
    }

    /// Builds the version source for `product_key` against `endpoints`
    pub fn build(
        self,
        product_key: &str,
        endpoints: &Endpoints,
        retry: RetryPolicy,
    ) -> Arc<dyn VersionSource> {
        match self {
            ProductSource::Marketplace => Arc::new(
                MarketplaceSource::new(
                    &endpoints.marketplace_url,
                    &endpoints.eap_feed_url,
                    product_key,
                )
                .with_retry_policy(retry),
            ),
            ProductSource::Maven { artifact_path } => Arc::new(
                MavenSource::new(&format!(
                    "{}/{}/maven-metadata.xml",
                    endpoints.maven_url.trim_end_matches('/'),
                    artifact_path
                ))
                .with_retry_policy(retry),
            ),
        }
    }
}

/// True if every dot-separated component is a non-empty run of digits,
/// i.e. a stable release without any `-suffix`
pub fn is_release_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()))
}

/// Sorts versions newest first, dropping entries without any numeric component
pub(crate) fn sort_descending<I>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut versions: Vec<(String, Version)> = versions
        .into_iter()
        .map(|v| {
            let parsed = Version::parse(&v);
            (v, parsed)
        })
        .filter(|(_, parsed)| parsed.is_numeric())
        .collect();

    versions.sort_by(|(a_raw, a), (b_raw, b)| b.cmp(a).then_with(|| b_raw.cmp(a_raw)));

    versions.into_iter().map(|(v, _)| v).collect()
}
