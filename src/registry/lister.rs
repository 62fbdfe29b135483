//! Tag listing for image repositories

use std::collections::HashSet;

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_REGISTRY_URL, RegistryCredentials};
use crate::registry::error::RegistryError;
use crate::retry::RetryPolicy;

/// Trait for reading the tags already present in an image repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagLister: Send + Sync {
    /// Fetches every tag of `repo`
    ///
    /// # Returns
    /// * `Ok(HashSet<String>)` - Existing tags; empty if the repository does not exist
    /// * `Err(RegistryError)` - If the registry could not be read after retrying
    async fn existing_tags(&self, repo: &str) -> Result<HashSet<String>, RegistryError>;
}

/// Response of `GET /v2/<name>/tags/list`
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Response of a token service. Docker Hub sends both fields.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parameters of a `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

/// One page of a tag listing and the bearer token that read it
#[derive(Debug)]
struct TagsPage {
    tags: Vec<String>,
    next: Option<String>,
    token: Option<String>,
}

/// Tag lister for the Docker Registry HTTP API v2
pub struct DockerRegistry {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<RegistryCredentials>,
    retry: RetryPolicy,
}

impl DockerRegistry {
    /// Creates a DockerRegistry for repositories without an explicit registry host
    pub fn new(base_url: &str, credentials: Option<RegistryCredentials>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("image-release-manager")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            retry: RetryPolicy::network(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Registry origin and repository path for `repo`.
    ///
    /// A first path segment that looks like a host (`.`/`:` or `localhost`)
    /// selects that registry over HTTPS; anything else uses the base URL.
    /// Single-name repositories on Docker Hub live under `library/`.
    fn locate(&self, repo: &str) -> (String, String) {
        match repo.split_once('/') {
            Some((host, path))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (format!("https://{}", host), path.to_string())
            }
            None if self.base_url == DEFAULT_REGISTRY_URL => {
                (self.base_url.clone(), format!("library/{}", repo))
            }
            _ => (self.base_url.clone(), repo.to_string()),
        }
    }

    async fn send(&self, url: &str, token: Option<&str>) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        } else if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        Ok(request.send().await?)
    }

    /// Exchanges a bearer challenge for a pull token on `path`
    async fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        repo: &str,
        path: &str,
    ) -> Result<String, RegistryError> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", path));
        let mut query = vec![("scope", scope)];
        if let Some(service) = &challenge.service {
            query.push(("service", service.clone()));
        }

        let mut request = self.client.get(&challenge.realm).query(&query);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token service returned status {}: {}", status, challenge.realm);
            return Err(RegistryError::Unauthorized(repo.to_string()));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        body.token
            .or(body.access_token)
            .ok_or_else(|| RegistryError::InvalidResponse("Token response without a token".to_string()))
    }

    /// Reads one page of tags.
    ///
    /// Returns `None` when the repository does not exist. That is only
    /// possible on the first page; a later page going missing is an error.
    async fn fetch_page(
        &self,
        url: &str,
        repo: &str,
        path: &str,
        token: Option<&str>,
        first: bool,
    ) -> Result<Option<TagsPage>, RegistryError> {
        let mut token = token.map(str::to_string);
        let mut response = self.send(url, token.as_deref()).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(reqwest::header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_bearer_challenge);
            if let Some(challenge) = challenge {
                debug!("Requesting a pull token for {} from {}", repo, challenge.realm);
                let fresh = self.fetch_token(&challenge, repo, path).await?;
                response = self.send(url, Some(&fresh)).await?;
                token = Some(fresh);
            }
        }

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            if first {
                return Ok(None);
            }
            return Err(RegistryError::InvalidResponse(format!(
                "Tag page disappeared while listing {}: {}",
                repo, url
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RegistryError::Unauthorized(repo.to_string()));
        }

        if !status.is_success() {
            warn!("Registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let list: TagList = response.json().await.map_err(|e| {
            warn!("Failed to parse registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(Some(TagsPage {
            tags: list.tags.unwrap_or_default(),
            next,
            token,
        }))
    }
}

impl Default for DockerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL, None)
    }
}

#[async_trait::async_trait]
impl TagLister for DockerRegistry {
    async fn existing_tags(&self, repo: &str) -> Result<HashSet<String>, RegistryError> {
        info!("Retrieving Docker tags for {}", repo);
        let (origin, path) = self.locate(repo);
        let mut url = format!("{}/v2/{}/tags/list", origin, path);
        let mut token: Option<String> = None;
        let mut tags = HashSet::new();
        let mut first = true;

        loop {
            let label = format!("Listing tags of {}", repo);
            let page = self
                .retry
                .run(
                    &label,
                    |_| self.fetch_page(&url, repo, &path, token.as_deref(), first),
                    |_| true,
                )
                .await?;

            let Some(page) = page else {
                info!("Repository {} does not exist yet", repo);
                return Ok(HashSet::new());
            };
            tags.extend(page.tags);
            token = page.token;
            first = false;

            match page.next {
                Some(next) if next.starts_with("http") => url = next,
                Some(next) => url = format!("{}{}", origin, next),
                None => break,
            }
        }

        info!("Found {} tags for {}", tags.len(), repo);
        Ok(tags)
    }
}

/// Parses `Bearer realm="...",service="...",scope="..."`
fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let (scheme, params) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for (key, value) in challenge_params(params) {
        match key.to_ascii_lowercase().as_str() {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }

    Some(BearerChallenge {
        realm: realm?,
        service,
        scope,
    })
}

/// Splits `key="value",key=value` pairs; commas inside quotes belong to the value
fn challenge_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while let Some((key, after)) = rest.split_once('=') {
        let after = after.trim_start();
        let (value, remainder) = match after.strip_prefix('"') {
            Some(quoted) => quoted.split_once('"').unwrap_or((quoted, "")),
            None => after.split_once(',').unwrap_or((after, "")),
        };
        pairs.push((key.trim().to_string(), value.trim().to_string()));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

/// Extracts the target of a `Link: <...>; rel="next"` header
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .map(str::trim)
            .any(|p| p == "rel=\"next\"" || p == "rel=next")
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}
