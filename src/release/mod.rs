//! Release layer: which versions to build, which tags they get, and the
//! build/test/push run itself
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Reconcile   │────▶│   Manager    │────▶│   Pipeline   │
//! │ (unbuilt,    │     │ (modes, pool)│     │ (build, hook,│
//! │  shards)     │     └──────────────┘     │  tag, push)  │
//! └──────────────┘                          └──────┬───────┘
//!                                                  │
//!                                           ┌──────▼───────┐
//!                                           │     Tags     │
//!                                           └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`reconcile`]: Candidate filters, unbuilt detection and job sharding
//! - [`tags`]: `TagCalculator`, the tag set of a version
//! - [`pipeline`]: `ReleasePipeline`, the per-version sequence with retries and hooks
//! - [`manager`]: `ReleaseManager`, run modes and the bounded worker pool
//! - [`error`]: Top-level error type of a run

pub mod error;
pub mod manager;
pub mod pipeline;
pub mod reconcile;
pub mod tags;

pub use error::ReleaseError;
pub use manager::ReleaseManager;
pub use pipeline::ReleasePipeline;
pub use tags::TagCalculator;
