//! OCI descriptor parsing.
//!
//! Two descriptor shapes are supported:
//! - legacy: `config.json` carries process and root, `runtime.json` carries hooks
//! - current: `config.json` carries process, root and hooks
//!
//! Field names are shared between the two. Absent sub-objects are valid; a
//! present hook without `path` or a present user without `uid`/`gid` is not.

use serde::{Deserialize, Deserializer, Serialize};

use oci2docker_core::config::SpecLayout;
use oci2docker_core::error::{ConvertError, Result};
use tracing::debug;

use super::bundle::{paths, ValidatedBundle};

/// Process definition from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    /// Command line; first element is the executable.
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,

    /// `KEY=VALUE` entries in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,

    /// Working directory, possibly empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cwd: String,

    #[serde(default)]
    pub user: Option<UserSpec>,

    #[serde(default)]
    pub terminal: bool,
}

/// Numeric process identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub uid: u32,
    pub gid: u32,
}

/// Root filesystem location, relative to the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(default)]
    pub readonly: bool,
}

/// A single lifecycle hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    pub path: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

/// Hooks keyed by lifecycle phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HooksSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prestart: Vec<HookSpec>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub create_runtime: Vec<HookSpec>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub create_container: Vec<HookSpec>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub start_container: Vec<HookSpec>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub poststart: Vec<HookSpec>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub poststop: Vec<HookSpec>,
}

impl HooksSpec {
    /// Check if any hooks are configured.
    pub fn is_empty(&self) -> bool {
        self.prestart.is_empty()
            && self.create_runtime.is_empty()
            && self.create_container.is_empty()
            && self.start_container.is_empty()
            && self.poststart.is_empty()
            && self.poststop.is_empty()
    }
}

/// `config.json` as far as image conversion is concerned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDescriptor {
    /// Pre-1.0 bundles call this `version`.
    #[serde(default, alias = "version")]
    oci_version: String,
    #[serde(default)]
    process: Option<ProcessSpec>,
    #[serde(default)]
    root: Option<RootSpec>,
    #[serde(default)]
    hooks: Option<HooksSpec>,
}

/// Legacy `runtime.json`.
#[derive(Debug, Clone, Default, Deserialize)]
struct RuntimeDescriptor {
    #[serde(default)]
    hooks: Option<HooksSpec>,
}

/// Parsed bundle descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSpec {
    pub oci_version: String,
    pub layout: SpecLayout,
    pub process: Option<ProcessSpec>,
    pub root: Option<RootSpec>,
    pub hooks: HooksSpec,
}

/// Parse the descriptors of a validated bundle.
pub fn read_spec(bundle: &ValidatedBundle) -> Result<BundleSpec> {
    parse_spec(bundle.layout(), bundle.config_bytes(), bundle.runtime_bytes())
}

/// Parse descriptor contents for a resolved layout.
///
/// In the legacy layout hooks come from `runtime` and hooks in `config` are
/// ignored. `runtime` is ignored in the current layout.
pub fn parse_spec(layout: SpecLayout, config: &[u8], runtime: Option<&[u8]>) -> Result<BundleSpec> {
    let descriptor: ConfigDescriptor =
        serde_json::from_slice(config).map_err(|e| malformed(paths::CONFIG_FILE, e))?;

    let hooks = match (layout, runtime) {
        (SpecLayout::Legacy, Some(runtime)) => {
            let runtime: RuntimeDescriptor =
                serde_json::from_slice(runtime).map_err(|e| malformed(paths::RUNTIME_FILE, e))?;
            runtime.hooks
        }
        (SpecLayout::Legacy, None) => None,
        _ => descriptor.hooks,
    };

    let spec = BundleSpec {
        oci_version: descriptor.oci_version,
        layout,
        process: descriptor.process,
        root: descriptor.root,
        hooks: hooks.unwrap_or_default(),
    };

    debug!(
        oci_version = %spec.oci_version,
        layout = %layout,
        has_process = spec.process.is_some(),
        has_root = spec.root.is_some(),
        poststart_hooks = spec.hooks.poststart.len(),
        "Parsed bundle spec"
    );

    Ok(spec)
}

fn malformed(file: &str, err: serde_json::Error) -> ConvertError {
    ConvertError::SpecMalformed {
        file: file.to_string(),
        reason: err.to_string(),
    }
}

/// Older runtimes serialize empty lists and strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
