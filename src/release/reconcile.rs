//! Deciding which candidate versions still need an image

use std::collections::HashSet;

use crate::registry::TargetRepository;
use crate::version::Version;

/// Tags present in every target repository.
///
/// Empty when there are no targets, so nothing counts as built.
pub fn common_existing(targets: &[TargetRepository]) -> HashSet<String> {
    let Some((first, rest)) = targets.split_first() else {
        return HashSet::new();
    };

    first
        .existing_tags
        .iter()
        .filter(|tag| rest.iter().all(|t| t.existing_tags.contains(*tag)))
        .cloned()
        .collect()
}

/// Candidates that are not yet published in every target repository,
/// in candidate order.
///
/// A primary-line run looks for the bare version tag. A suffix-only run
/// rebuilds a version as soon as any one of its `{version}-{suffix}` tags is
/// missing.
pub fn unbuilt_versions(
    candidates: &[String],
    targets: &[TargetRepository],
    default_release: bool,
    tag_suffixes: &[String],
) -> Vec<String> {
    let existing = common_existing(targets);

    candidates
        .iter()
        .filter(|v| {
            if default_release {
                !existing.contains(*v)
            } else {
                tag_suffixes
                    .iter()
                    .any(|suffix| !existing.contains(&format!("{}-{}", v, suffix)))
            }
        })
        .cloned()
        .collect()
}

/// Release candidates: `start <= v < end`, with `None` as an open upper bound
pub fn release_candidates(
    versions: &[String],
    start: &Version,
    end: Option<&Version>,
) -> Vec<String> {
    versions
        .iter()
        .filter(|v| {
            let version = Version::parse(v);
            *start <= version && end.is_none_or(|end| version < *end)
        })
        .cloned()
        .collect()
}

/// Early-access candidates: any version whose major is at least `start`'s
pub fn eap_candidates(versions: &[String], start: &Version) -> Vec<String> {
    versions
        .iter()
        .filter(|v| Version::parse(v).major >= start.major)
        .cloned()
        .collect()
}

/// Contiguous shard `offset` of `total` near-equal shards.
///
/// The first `len % total` shards hold one extra item. Concatenating every
/// shard in order gives back `items`. An out-of-range offset yields nothing.
pub fn batch_job<T>(items: &[T], total: usize, offset: usize) -> &[T] {
    if total == 0 || offset >= total {
        return &[];
    }

    let base = items.len() / total;
    let extra = items.len() % total;
    let start = offset * base + offset.min(extra);
    let len = base + usize::from(offset < extra);

    &items[start..start + len]
}
