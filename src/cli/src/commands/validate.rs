//! `oci2docker validate` command.

use clap::Args;
use oci2docker_core::error::ConvertError;
use oci2docker_runtime::{BundleValidator, ValidatedBundle};

use super::BundleArgs;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Report only through the exit status
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.bundle.require_bundle()?;
    let bundle = BundleValidator::new(args.bundle.layout)
        .validate(&path)
        .map_err(ConvertError::from)?;

    if !args.quiet {
        println!("{}", summary(&bundle));
    }
    Ok(())
}

fn summary(bundle: &ValidatedBundle) -> String {
    format!(
        "{}: valid OCI bundle ({} layout, {} rootfs entries)",
        bundle.path().display(),
        bundle.layout(),
        bundle.rootfs_entries()
    )
}
