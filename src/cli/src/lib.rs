//! oci2docker CLI - convert OCI runtime bundles into Docker images.

pub mod commands;
pub mod output;
