//! Conversion configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which descriptor shape a bundle uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecLayout {
    /// Probe for `runtime.json`: legacy when present, current otherwise.
    #[default]
    Auto,
    /// `config.json` plus a separate `runtime.json` carrying hooks.
    Legacy,
    /// A single `config.json` carrying process, root and hooks.
    Current,
}

impl SpecLayout {
    /// Whether a `runtime.json` must be present in the bundle.
    pub fn requires_runtime(&self) -> bool {
        matches!(self, Self::Legacy)
    }
}

impl std::fmt::Display for SpecLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Legacy => write!(f, "legacy"),
            Self::Current => write!(f, "current"),
        }
    }
}

impl std::str::FromStr for SpecLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "legacy" => Ok(Self::Legacy),
            "current" => Ok(Self::Current),
            _ => Err(format!(
                "unknown spec layout: '{}' (supported: auto, legacy, current)",
                s
            )),
        }
    }
}

/// How the process's first argument becomes the image entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntrypointMode {
    /// Prefix relative paths with the working directory and shallow paths
    /// with `/bin`.
    #[default]
    Resolve,
    /// Use the first argument verbatim.
    Raw,
}

impl std::fmt::Display for EntrypointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve => write!(f, "resolve"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

impl std::str::FromStr for EntrypointMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "resolve" => Ok(Self::Resolve),
            "raw" => Ok(Self::Raw),
            _ => Err(format!(
                "unknown entrypoint mode: '{}' (supported: resolve, raw)",
                s
            )),
        }
    }
}

/// Operator-facing verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    /// One-line results; build tool output is captured, not shown.
    #[default]
    Quiet,
    /// Stage detail and live build tool output.
    Debug,
}

impl Verbosity {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            Self::Debug
        } else {
            Self::Quiet
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Everything one conversion needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Path of the OCI bundle to convert
    pub bundle: PathBuf,

    /// Name (and optional tag) of the image to build
    pub image_name: String,

    /// Port to expose, passed through verbatim
    pub port: Option<String>,

    /// Descriptor layout of the bundle
    pub layout: SpecLayout,

    /// Entrypoint resolution mode
    pub entrypoint_mode: EntrypointMode,

    /// Emit a WORKDIR directive from the process cwd
    pub emit_workdir: bool,

    /// Image the Dockerfile starts FROM
    pub base_image: String,

    /// Optional maintainer label
    pub maintainer: Option<String>,

    /// Program invoked as `<builder> build -t <image> <context>`
    pub builder: String,

    /// Directory the Dockerfile is rendered into before relocation
    pub staging_dir: PathBuf,

    /// Operator verbosity
    pub verbosity: Verbosity,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            bundle: PathBuf::new(),
            image_name: String::new(),
            port: None,
            layout: SpecLayout::Auto,
            entrypoint_mode: EntrypointMode::Resolve,
            emit_workdir: false,
            base_image: "scratch".to_string(),
            maintainer: None,
            builder: "docker".to_string(),
            staging_dir: PathBuf::from("."),
            verbosity: Verbosity::Quiet,
        }
    }
}

impl ConvertConfig {
    /// Config for `bundle` and `image_name` with everything else defaulted.
    pub fn new(bundle: impl Into<PathBuf>, image_name: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
            image_name: image_name.into(),
            ..Default::default()
        }
    }

    /// Reject configurations the pipeline cannot act on.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConvertError;

        if self.bundle.as_os_str().is_empty() {
            return Err(ConvertError::ConfigError(
                "please specify OCI bundle path".to_string(),
            ));
        }
        if self.image_name.trim().is_empty() {
            return Err(ConvertError::ConfigError(
                "please specify image name for output".to_string(),
            ));
        }
        if self.base_image.trim().is_empty() {
            return Err(ConvertError::ConfigError(
                "base image must not be empty".to_string(),
            ));
        }
        if self.builder.trim().is_empty() {
            return Err(ConvertError::ConfigError(
                "builder program must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
