pub mod config;
pub mod docker;
pub mod hook;
pub mod registry;
pub mod release;
pub mod retry;
pub mod version;
