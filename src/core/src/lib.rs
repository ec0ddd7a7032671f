//! oci2docker Core - Foundational Types
//!
//! Error taxonomy and conversion configuration shared by the runtime
//! pipeline and the command-line front end.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{ConvertConfig, EntrypointMode, SpecLayout, Verbosity};
pub use error::{BundleError, ContextStage, ConvertError, Result};

/// oci2docker version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
