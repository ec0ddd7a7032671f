//! Dockerfile rendering and checking.
//!
//! [`BuildScript::from_directives`] turns a [`DirectiveSet`] into directives in
//! a fixed order:
//!
//! ```text
//! FROM <base>
//! LABEL maintainer="..."     (when configured)
//! ADD ./rootfs .             (has_add)
//! ENV K=V ...                (has_env)
//! USER uid:gid               (has_user)
//! WORKDIR <dir>              (has_workdir)
//! CMD <poststart command>    (has_cmd)
//! ENTRYPOINT ["exe", ...]    (always)
//! EXPOSE <port>              (has_port)
//! ```
//!
//! Omitted directives leave no trace in the output; the build tool rejects an
//! empty directive. [`Dockerfile::parse`] reads a script back and is used to
//! check rendered output before it is written.

use std::path::{Path, PathBuf};

use oci2docker_core::error::{ConvertError, Result};

use crate::oci::mapper::DirectiveSet;

/// Fixed name of the rendered script.
pub const DOCKERFILE: &str = "Dockerfile";

/// A single Dockerfile directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `FROM <image>`
    From { image: String },
    /// `LABEL <key>="<value>"`
    Label { key: String, value: String },
    /// `ADD <src> <dst>`
    Add { src: String, dst: String },
    /// `ENV <entries>` with entries kept opaque
    Env { entries: String },
    /// `USER <user>[:<group>]`
    User { user: String },
    /// `WORKDIR <path>`
    Workdir { path: String },
    /// `CMD <command>` (shell form)
    Cmd { command: String },
    /// `ENTRYPOINT ["exec", "form"]`
    Entrypoint { exec: Vec<String> },
    /// `EXPOSE <port>[/<proto>]`
    Expose { port: String },
}

impl Directive {
    /// Instruction keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::From { .. } => "FROM",
            Self::Label { .. } => "LABEL",
            Self::Add { .. } => "ADD",
            Self::Env { .. } => "ENV",
            Self::User { .. } => "USER",
            Self::Workdir { .. } => "WORKDIR",
            Self::Cmd { .. } => "CMD",
            Self::Entrypoint { .. } => "ENTRYPOINT",
            Self::Expose { .. } => "EXPOSE",
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::From { image } => write!(f, "FROM {image}"),
            Self::Label { key, value } => write!(f, "LABEL {key}={}", json_string(value)),
            Self::Add { src, dst } => write!(f, "ADD {src} {dst}"),
            Self::Env { entries } => write!(f, "ENV {entries}"),
            Self::User { user } => write!(f, "USER {user}"),
            Self::Workdir { path } => write!(f, "WORKDIR {path}"),
            Self::Cmd { command } => write!(f, "CMD {command}"),
            Self::Entrypoint { exec } => {
                let items: Vec<String> = exec.iter().map(|s| json_string(s)).collect();
                write!(f, "ENTRYPOINT [{}]", items.join(", "))
            }
            Self::Expose { port } => write!(f, "EXPOSE {port}"),
        }
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Settings that do not come from the bundle.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub base_image: String,
    pub maintainer: Option<String>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            base_image: "scratch".to_string(),
            maintainer: None,
        }
    }
}

/// An ordered directive script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildScript {
    pub directives: Vec<Directive>,
}

impl BuildScript {
    /// Lay out directives for `set` in the fixed order.
    pub fn from_directives(set: &DirectiveSet, options: &ScriptOptions) -> Self {
        let mut directives = vec![Directive::From {
            image: options.base_image.clone(),
        }];

        if let Some(maintainer) = options.maintainer.as_ref().filter(|m| !m.trim().is_empty()) {
            directives.push(Directive::Label {
                key: "maintainer".to_string(),
                value: maintainer.clone(),
            });
        }
        if set.has_add {
            directives.push(Directive::Add {
                src: set.content.clone(),
                dst: ".".to_string(),
            });
        }
        if set.has_env {
            directives.push(Directive::Env {
                entries: set.environment.clone(),
            });
        }
        if set.has_user {
            if let Some(user) = set.user_string() {
                directives.push(Directive::User { user });
            }
        }
        if set.has_workdir {
            directives.push(Directive::Workdir {
                path: set.workdir.clone(),
            });
        }
        if set.has_cmd {
            directives.push(Directive::Cmd {
                command: set.command.clone(),
            });
        }

        let mut exec = Vec::with_capacity(1 + set.entrypoint_args.len());
        exec.push(set.entrypoint.clone());
        exec.extend(set.entrypoint_args.iter().cloned());
        directives.push(Directive::Entrypoint { exec });

        if set.has_port {
            directives.push(Directive::Expose {
                port: set.expose.clone(),
            });
        }

        Self { directives }
    }

    /// Script text, one directive per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for directive in &self.directives {
            out.push_str(&directive.to_string());
            out.push('\n');
        }
        out
    }

    /// Check the rendered text and write it to `dir/Dockerfile`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let content = self.render();
        Dockerfile::parse(&content)?;

        let path = dir.join(DOCKERFILE);
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), "Wrote Dockerfile");
        Ok(path)
    }
}

/// Parser for the directive subset this tool emits.
pub struct Dockerfile;

impl Dockerfile {
    /// Parse script text, rejecting unknown or empty directives.
    ///
    /// The first directive must be `FROM` and `ENTRYPOINT` must be a JSON
    /// array of strings.
    pub fn parse(content: &str) -> Result<BuildScript> {
        let mut directives = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            directives.push(parse_directive(trimmed, idx + 1)?);
        }

        match directives.first() {
            Some(Directive::From { .. }) => Ok(BuildScript { directives }),
            Some(_) => Err(ConvertError::ScriptError(
                "first instruction must be FROM".to_string(),
            )),
            None => Err(ConvertError::ScriptError(
                "Dockerfile is empty or contains no instructions".to_string(),
            )),
        }
    }
}

fn parse_directive(line: &str, line_num: usize) -> Result<Directive> {
    let (keyword, rest) = split_first_word(line);
    if rest.is_empty() {
        return Err(script_error(line_num, format!("{keyword} requires an argument")));
    }
    let rest_owned = rest.to_string();

    match keyword.to_uppercase().as_str() {
        "FROM" => Ok(Directive::From { image: rest_owned }),
        "LABEL" => {
            let (key, value) = rest
                .split_once('=')
                .ok_or_else(|| script_error(line_num, "LABEL requires key=value".to_string()))?;
            let value = serde_json::from_str::<String>(value).unwrap_or_else(|_| value.to_string());
            Ok(Directive::Label {
                key: key.to_string(),
                value,
            })
        }
        "ADD" => {
            let (src, dst) = split_first_word(rest);
            if dst.is_empty() {
                return Err(script_error(line_num, "ADD requires <src> <dst>".to_string()));
            }
            Ok(Directive::Add {
                src: src.to_string(),
                dst: dst.to_string(),
            })
        }
        "ENV" => Ok(Directive::Env { entries: rest_owned }),
        "USER" => Ok(Directive::User { user: rest_owned }),
        "WORKDIR" => Ok(Directive::Workdir { path: rest_owned }),
        "CMD" => Ok(Directive::Cmd { command: rest_owned }),
        "ENTRYPOINT" => {
            let exec: Vec<String> = serde_json::from_str(rest).map_err(|e| {
                script_error(line_num, format!("ENTRYPOINT must be a JSON array: {e}"))
            })?;
            if exec.first().map_or(true, |e| e.is_empty()) {
                return Err(script_error(line_num, "ENTRYPOINT is empty".to_string()));
            }
            Ok(Directive::Entrypoint { exec })
        }
        "EXPOSE" => Ok(Directive::Expose { port: rest_owned }),
        _ => Err(script_error(
            line_num,
            format!("unknown instruction '{keyword}'"),
        )),
    }
}

fn script_error(line_num: usize, message: String) -> ConvertError {
    ConvertError::ScriptError(format!("line {line_num}: {message}"))
}

/// Split a string into the first word and the rest.
fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}
