//! `oci2docker render` command: print the generated Dockerfile.

use std::path::PathBuf;

use clap::Args;
use oci2docker_core::config::Verbosity;

use super::MappingArgs;

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Write the Dockerfile into this directory instead of printing it
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.mapping.bundle.require_bundle()?;
    let config = args.mapping.to_config("", Verbosity::Quiet);
    let script = oci2docker_runtime::render(&config)?;

    match args.output {
        Some(dir) => {
            let path = script.write_to(&dir)?;
            println!("{}", path.display());
        }
        None => print!("{}", script.render()),
    }
    Ok(())
}
