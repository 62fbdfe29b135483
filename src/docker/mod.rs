//! Image build, tag and push collaborator
//!
//! # Modules
//!
//! - [`builder`]: `ImageBuilder` trait with the build request and image handle types
//! - [`engine`]: `ImageBuilder` implementation on top of the Docker Engine API
//! - [`context`]: Build context archiving
//! - [`error`]: Error type distinguishing build, connectivity and push failures

pub mod builder;
pub mod context;
pub mod engine;
pub mod error;

pub use builder::{BuildRequest, BuiltImage, ImageBuilder};
pub use engine::DockerEngine;
pub use error::DockerError;
