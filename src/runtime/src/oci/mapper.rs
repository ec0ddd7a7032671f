//! Mapping from parsed OCI descriptors to Dockerfile directive values.
//!
//! Every rule is a standalone function over plain values so each one can be
//! exercised with a synthetic spec. [`map_directives`] applies them in order;
//! none depends on another's result. No I/O happens here.

use serde::Serialize;

use oci2docker_core::config::{ConvertConfig, EntrypointMode};

use super::spec::{BundleSpec, HooksSpec, ProcessSpec, UserSpec};

/// Entrypoint used when the process has no arguments.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Directory prepended to executables that sit directly under `/`.
pub const BIN_DIR: &str = "/bin";

/// Knobs that change how a spec is mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperOptions {
    pub entrypoint_mode: EntrypointMode,
    /// Emit WORKDIR from the process cwd.
    pub emit_workdir: bool,
    /// Caller-supplied port, not derived from the spec.
    pub port: Option<String>,
}

impl From<&ConvertConfig> for MapperOptions {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            entrypoint_mode: config.entrypoint_mode,
            emit_workdir: config.emit_workdir,
            port: config.port.clone(),
        }
    }
}

/// Build-ready directive values with one presence flag per optional directive.
///
/// A flag is true iff its value is present (and, for workdir, the capability
/// is enabled). Rendering skips every directive whose flag is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectiveSet {
    pub entrypoint: String,
    pub entrypoint_args: Vec<String>,
    pub workdir: String,
    pub environment: String,
    pub user: Option<UserSpec>,
    pub command: String,
    pub content: String,
    pub expose: String,

    pub has_env: bool,
    pub has_user: bool,
    pub has_workdir: bool,
    pub has_cmd: bool,
    pub has_port: bool,
    pub has_add: bool,
}

impl DirectiveSet {
    /// USER argument, `uid:gid`.
    pub fn user_string(&self) -> Option<String> {
        self.user.map(|u| format!("{}:{}", u.uid, u.gid))
    }
}

/// Map a parsed spec onto directive values.
pub fn map_directives(spec: &BundleSpec, options: &MapperOptions) -> DirectiveSet {
    let process = spec.process.as_ref();

    let (entrypoint, entrypoint_args) = resolve_entrypoint(process, options.entrypoint_mode);
    let workdir = process.map(|p| p.cwd.clone()).unwrap_or_default();
    let environment = map_environment(process.map(|p| p.env.as_slice()).unwrap_or_default());
    let user = process.and_then(|p| p.user);
    let command = map_poststart(&spec.hooks);
    let content = spec
        .root
        .as_ref()
        .map(|r| map_content_path(&r.path))
        .unwrap_or_default();
    let expose = options
        .port
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    DirectiveSet {
        has_env: !environment.is_empty(),
        has_user: user.is_some(),
        has_workdir: options.emit_workdir && !workdir.is_empty(),
        has_cmd: !command.is_empty(),
        has_port: !expose.is_empty(),
        has_add: !content.is_empty(),
        entrypoint,
        entrypoint_args,
        workdir,
        environment,
        user,
        command,
        content,
        expose,
    }
}

/// Entrypoint path plus the remaining process arguments.
///
/// No arguments (or an empty first argument) falls back to [`DEFAULT_SHELL`].
pub fn resolve_entrypoint(
    process: Option<&ProcessSpec>,
    mode: EntrypointMode,
) -> (String, Vec<String>) {
    let args = process.map(|p| p.args.as_slice()).unwrap_or_default();
    let Some((first, rest)) = args.split_first().filter(|(first, _)| !first.is_empty()) else {
        return (DEFAULT_SHELL.to_string(), Vec::new());
    };

    let entrypoint = match mode {
        EntrypointMode::Raw => first.clone(),
        EntrypointMode::Resolve => {
            let cwd = process.map(|p| p.cwd.as_str()).unwrap_or_default();
            prefix_bin_for_shallow_path(&absolutize(first, cwd))
        }
    };

    (entrypoint, rest.to_vec())
}

/// Join a relative executable onto `cwd`, or `/` when there is none.
pub fn absolutize(path: &str, cwd: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else if cwd.is_empty() {
        format!("/{path}")
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), path)
    }
}

/// Put `/bin` in front of paths with two or fewer `/`-delimited segments.
///
/// Some bundles keep executables at the top of their rootfs; `/server`
/// becomes `/bin/server` while `/app/server` is left alone.
pub fn prefix_bin_for_shallow_path(path: &str) -> String {
    let segments = path.matches('/').count() + 1;
    if segments <= 2 {
        format!("{BIN_DIR}{path}")
    } else {
        path.to_string()
    }
}

/// Environment entries in order, space-separated and otherwise untouched.
/// Only entries that are exactly empty are skipped.
pub fn map_environment(env: &[String]) -> String {
    env.iter()
        .map(String::as_str)
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Root path as a build-context-relative reference, or empty.
pub fn map_content_path(root_path: &str) -> String {
    let trimmed = root_path.trim_start_matches("./").trim_start_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("./{trimmed}")
    }
}

/// First poststart hook as `path args... env...`, or empty.
pub fn map_poststart(hooks: &HooksSpec) -> String {
    let Some(hook) = hooks.poststart.first() else {
        return String::new();
    };
    if hook.path.is_empty() {
        return String::new();
    }

    std::iter::once(&hook.path)
        .chain(hook.args.iter())
        .chain(hook.env.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
