//! Version layer: parsing, ordering and fetching of upstream product versions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sources   │────▶│   Version   │◀────│   Latest    │
//! │ (mpac,maven)│     │  (ordering) │     │ (max rules) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: `Version` and `ReleaseType`, the ordered structural version value
//! - [`latest`]: "latest overall / major / minor" membership checks
//! - [`source`]: `VersionSource` trait for fetching release and EAP versions
//! - [`sources`]: Marketplace and Maven metadata implementations
//! - [`error`]: Error type for version source operations

pub mod error;
pub mod latest;
pub mod source;
pub mod sources;
pub mod types;

pub use types::{Major, ReleaseType, Version};
