//! Shared test utilities

pub mod fakes;

pub use fakes::{RecordingImageBuilder, StaticTagLister, StaticVersionSource};
