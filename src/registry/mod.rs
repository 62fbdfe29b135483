//! Registry state: which tags already exist in the target image repositories
//!
//! # Modules
//!
//! - [`lister`]: `TagLister` trait and the Docker Registry HTTP API implementation
//! - [`target`]: `TargetRepository` snapshots and eager fan-out across repositories
//! - [`error`]: Error type for tag listing

pub mod error;
pub mod lister;
pub mod target;

pub use lister::{DockerRegistry, TagLister};
pub use target::{TargetRepository, get_targets};
pub use error::{RegistryError, TargetError};
