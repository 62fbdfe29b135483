//! Target repositories and their tag snapshots

use std::collections::HashSet;

use futures::future::try_join_all;

use crate::registry::error::TargetError;
use crate::registry::lister::TagLister;

/// A destination image repository and the tags it held when the run started.
///
/// The snapshot is never refreshed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRepository {
    pub repo: String,
    pub existing_tags: HashSet<String>,
}

impl TargetRepository {
    pub fn new(repo: impl Into<String>, existing_tags: HashSet<String>) -> Self {
        Self {
            repo: repo.into(),
            existing_tags,
        }
    }
}

/// Reads the tag snapshot of every repository.
///
/// All repositories are read up front; a failure on any one of them fails the
/// whole call with the repository name attached.
pub async fn get_targets(
    lister: &dyn TagLister,
    repos: &[String],
) -> Result<Vec<TargetRepository>, TargetError> {
    let futures = repos.iter().map(|repo| async move {
        lister
            .existing_tags(repo)
            .await
            .map(|tags| TargetRepository::new(repo.clone(), tags))
            .map_err(|source| TargetError {
                repo: repo.clone(),
                source,
            })
    });

    try_join_all(futures).await
}
