//! oci2docker Runtime - OCI bundle to Docker image conversion.
//!
//! This crate holds the conversion pipeline: bundle validation, descriptor
//! parsing, directive mapping, Dockerfile rendering, build context assembly
//! and the hand-off to an external image build tool.

pub mod fs;
pub mod oci;
pub mod pipeline;

// Re-export common types
pub use oci::build::{
    BuildContext, BuildContextAssembler, BuildOutput, BuildScript, CommandBuilder, Directive,
    Dockerfile, ImageBuilder, ScriptOptions,
};
pub use oci::{
    is_valid_bundle, map_directives, read_spec, BundleSpec, BundleValidator, DirectiveSet,
    MapperOptions, ValidatedBundle,
};
pub use pipeline::{convert, inspect, prepare, render, ConvertReport, Inspection, PreparedBuild};

/// oci2docker Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
