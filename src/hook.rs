//! Post-build and post-push hook scripts

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum HookError {
    /// The configured script does not exist; a setup problem, never retried
    #[error("Hook script '{0}' does not exist")]
    NotFound(PathBuf),

    /// The script ran and rejected the image
    #[error("Hook script '{path}' exited with non-zero ({code})")]
    Failed { path: PathBuf, code: ExitCode },

    #[error("Failed to run hook script '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exit status of a failed script; `Signal` when it was killed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Code(i32),
    Signal,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Code(code) => write!(f, "{}", code),
            ExitCode::Signal => f.write_str("terminated by signal"),
        }
    }
}

/// An optional external script invoked with positional arguments
#[derive(Debug, Clone)]
pub struct Hook {
    name: &'static str,
    path: Option<PathBuf>,
}

impl Hook {
    /// An empty path is treated as unset
    pub fn new(name: &'static str, path: Option<PathBuf>) -> Self {
        let path = path.filter(|p| !p.as_os_str().is_empty());
        Self { name, path }
    }

    pub fn post_build(path: Option<PathBuf>) -> Self {
        Self::new("post-build", path)
    }

    pub fn post_push(path: Option<PathBuf>) -> Self {
        Self::new("post-push", path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs the script and waits for it.
    ///
    /// An unset hook is skipped with a warning. Exit code 0 is success.
    pub async fn run(&self, args: &[&str]) -> Result<(), HookError> {
        let Some(path) = &self.path else {
            warn!("No {} hook is set; skipping", self.name);
            return Ok(());
        };

        if !path.exists() {
            error!("{} hook '{}' does not exist; failing!", self.name, path.display());
            return Err(HookError::NotFound(path.clone()));
        }

        info!("Running {} hook: {} {}", self.name, path.display(), args.join(" "));

        let status = Command::new(path)
            .args(args)
            .status()
            .await
            .map_err(|source| HookError::Io {
                path: path.clone(),
                source,
            })?;

        if !status.success() {
            let code = status.code().map_or(ExitCode::Signal, ExitCode::Code);
            error!(
                "{} hook '{}' exited with non-zero ({}); failing!",
                self.name,
                path.display(),
                code
            );
            return Err(HookError::Failed {
                path: path.clone(),
                code,
            });
        }

        Ok(())
    }
}

/// Renders a flag argument the way hook scripts expect it
pub fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
