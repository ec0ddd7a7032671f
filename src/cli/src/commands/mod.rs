//! CLI command definitions and dispatch.

mod convert;
mod inspect;
mod render;
mod validate;
mod version;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use oci2docker_core::config::{ConvertConfig, EntrypointMode, SpecLayout, Verbosity};
use oci2docker_core::error::ConvertError;

pub use convert::ConvertArgs;
pub use inspect::InspectArgs;
pub use render::RenderArgs;
pub use validate::ValidateArgs;
pub use version::VersionArgs;

/// oci2docker - build Docker images from OCI runtime bundles.
#[derive(Parser)]
#[command(name = "oci2docker", version, about)]
pub struct Cli {
    /// Print debug logs and stream build tool output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Convert an OCI bundle into a Docker image
    Convert(ConvertArgs),
    /// Check that a directory is a well-formed OCI bundle
    Validate(ValidateArgs),
    /// Show how a bundle maps onto Dockerfile directives
    Inspect(InspectArgs),
    /// Print the Dockerfile generated for a bundle
    Render(RenderArgs),
    /// Show version information
    Version(VersionArgs),
}

/// Bundle location and descriptor layout.
#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    /// Path to the OCI bundle directory
    #[arg(long = "oci-bundle", value_name = "PATH")]
    pub oci_bundle: Option<PathBuf>,

    /// Descriptor layout: auto, legacy (config.json + runtime.json) or current
    #[arg(long, default_value_t = SpecLayout::Auto)]
    pub layout: SpecLayout,
}

impl BundleArgs {
    /// The bundle path, or the same error `convert` reports when it is missing.
    pub fn require_bundle(&self) -> Result<PathBuf, ConvertError> {
        self.oci_bundle
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| ConvertError::ConfigError("please specify OCI bundle path".to_string()))
    }
}

/// Options that change how the bundle maps onto directives.
#[derive(Args, Debug, Clone)]
pub struct MappingArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Port to EXPOSE in the image
    #[arg(long)]
    pub port: Option<String>,

    /// Entrypoint derivation: resolve (absolute path, /bin for shallow paths) or raw
    #[arg(long = "entrypoint-mode", default_value_t = EntrypointMode::Resolve)]
    pub entrypoint_mode: EntrypointMode,

    /// Emit WORKDIR from the process working directory
    #[arg(long)]
    pub workdir: bool,

    /// Image for the FROM instruction
    #[arg(long = "base-image", default_value = "scratch")]
    pub base_image: String,

    /// Value for a `maintainer` label
    #[arg(long)]
    pub maintainer: Option<String>,
}

impl MappingArgs {
    /// Pipeline configuration for these options; build settings stay default.
    pub fn to_config(&self, image_name: &str, verbosity: Verbosity) -> ConvertConfig {
        ConvertConfig {
            bundle: self.bundle.oci_bundle.clone().unwrap_or_default(),
            image_name: image_name.to_string(),
            port: self.port.clone(),
            layout: self.bundle.layout,
            entrypoint_mode: self.entrypoint_mode,
            emit_workdir: self.workdir,
            base_image: self.base_image.clone(),
            maintainer: self.maintainer.clone(),
            verbosity,
            ..Default::default()
        }
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let verbosity = Verbosity::from_debug_flag(cli.debug);
    match cli.command {
        Command::Convert(args) => convert::execute(args, verbosity).await,
        Command::Validate(args) => validate::execute(args).await,
        Command::Inspect(args) => inspect::execute(args).await,
        Command::Render(args) => render::execute(args).await,
        Command::Version(args) => version::execute(args).await,
    }
}
