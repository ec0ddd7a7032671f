//! `oci2docker version` command.

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("oci2docker version {}", oci2docker_core::VERSION);
    Ok(())
}
