//! Build context archiving

use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;
use tracing::{debug, warn};

use crate::docker::error::DockerError;

/// Context size above which a warning is logged (500MB)
const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024;

/// Archives `context_path` as tar.gz for the Engine build endpoint.
///
/// `dockerfile` is relative to the context and must exist inside it.
pub fn create_context(context_path: &Path, dockerfile: &Path) -> Result<Vec<u8>, DockerError> {
    if !context_path.is_dir() {
        return Err(DockerError::ContextNotFound(context_path.to_path_buf()));
    }
    if !context_path.join(dockerfile).is_file() {
        return Err(DockerError::DockerfileNotFound(dockerfile.to_path_buf()));
    }

    debug!("Creating build context from: {}", context_path.display());

    let mut archive_data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut archive_data, Compression::default());
        let mut tar = Builder::new(encoder);
        tar.append_dir_all(".", context_path)?;
        tar.into_inner()?.finish()?;
    }

    debug!("Build context created: {} bytes", archive_data.len());
    if archive_data.len() > MAX_CONTEXT_SIZE {
        warn!(
            "Build context is {}MB; consider a .dockerignore",
            archive_data.len() / 1024 / 1024
        );
    }

    Ok(archive_data)
}
