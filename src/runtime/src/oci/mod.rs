//! OCI bundle support.
//!
//! Validates runtime bundles, parses their descriptors, and maps the process
//! definition onto Dockerfile directives.

pub mod build;
pub mod bundle;
pub mod mapper;
pub mod spec;

pub use bundle::{is_valid_bundle, BundleValidator, ValidatedBundle};
pub use mapper::{map_directives, DirectiveSet, MapperOptions};
pub use spec::{read_spec, BundleSpec, HookSpec, HooksSpec, ProcessSpec, RootSpec, UserSpec};
