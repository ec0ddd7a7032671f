use std::path::PathBuf;

use thiserror::Error;

/// Structural problems found while validating an OCI bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Bundle path is missing or is not a directory
    #[error("given path {0} is not a directory")]
    NotADirectory(PathBuf),

    /// No config descriptor at the bundle root
    #[error("no config.json found in bundle")]
    NoConfig,

    /// No runtime descriptor although the layout requires one
    #[error("no runtime.json found in bundle")]
    NoRuntime,

    /// No root filesystem directory at the bundle root
    #[error("no rootfs found in bundle")]
    NoRootFS,

    /// `rootfs` exists but is a file or a symlink
    #[error("rootfs is not a directory")]
    RootfsNotDirectory,

    /// Top-level entry that is neither a descriptor nor the rootfs
    #[error("unrecognized file path in bundle: {0:?}")]
    UnrecognizedEntry(String),

    /// Walking the bundle tree failed
    #[error("error accessing bundle at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required descriptor could not be read in full
    #[error("error reading {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Step of build context assembly that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStage {
    Allocate,
    CreateRootfs,
    RelocateScript,
    CopyRootfs,
}

impl std::fmt::Display for ContextStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allocate => write!(f, "allocate"),
            Self::CreateRootfs => write!(f, "create rootfs"),
            Self::RelocateScript => write!(f, "relocate script"),
            Self::CopyRootfs => write!(f, "copy rootfs"),
        }
    }
}

/// oci2docker error types
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Bundle failed structural validation
    #[error("Invalid OCI bundle: {0}")]
    BundleInvalid(#[from] BundleError),

    /// Descriptor could not be parsed
    #[error("Malformed spec {file}: {reason}")]
    SpecMalformed { file: String, reason: String },

    /// Build context could not be assembled
    #[error("Build context failure ({stage}): {source}")]
    BuildContextFailure {
        stage: ContextStage,
        #[source]
        source: std::io::Error,
    },

    /// The external image build tool exited unsuccessfully
    #[error("{tool} build failed: {}", exit_description(*.code))]
    ExternalToolFailure {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    /// The external image build tool could not be started
    #[error("Failed to run {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Rendered Dockerfile did not pass its own syntax check
    #[error("Dockerfile error: {0}")]
    ScriptError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConvertError {
    /// Diagnostic output attached to the error, if any.
    ///
    /// Only the external tool failure carries output.
    pub fn diagnostic_output(&self) -> Option<&str> {
        match self {
            Self::ExternalToolFailure { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type alias for oci2docker operations
pub type Result<T> = std::result::Result<T, ConvertError>;
