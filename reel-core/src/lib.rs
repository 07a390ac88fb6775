//! reel-core: transport-agnostic building blocks shared by the reel crates.
//!
//! - [`errors`]: structured errors with status codes and a JSON shape
//! - [`config`]: string key/value configuration with env overrides

pub mod config;
pub mod errors;

pub use config::{ReelConfig, ReelConfigSnapshot};
pub use errors::{ErrorKind, ReelError};
