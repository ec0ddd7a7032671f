//! External image build invocation.
//!
//! The build engine itself is an opaque tool (`docker` by default) that
//! consumes a context directory. Its stdout and stderr are drained on two
//! separate tasks while it runs so neither pipe can fill up and stall the
//! child; both tasks are joined before the exit status is inspected.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use oci2docker_core::config::Verbosity;
use oci2docker_core::error::{ConvertError, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Cap on captured output per stream.
const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// Output captured from a build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub stdout: String,
    pub stderr: String,
}

impl BuildOutput {
    /// Both streams, stderr last.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}{}", self.stdout, self.stderr),
        }
    }
}

/// Something that turns a build context into a named image.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Tool name used in messages.
    fn name(&self) -> &str;

    /// Build `image` from the context directory.
    async fn build(&self, context: &Path, image: &str) -> Result<BuildOutput>;
}

/// Runs `<program> [prefix args] build -t <image> <context>`.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    prefix_args: Vec<String>,
    verbosity: Verbosity,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>, verbosity: Verbosity) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            verbosity,
        }
    }

    /// Docker CLI on `PATH`.
    pub fn docker(verbosity: Verbosity) -> Self {
        Self::new("docker", verbosity)
    }

    /// Arguments placed before `build`, e.g. a `--context` flag.
    pub fn with_prefix_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl ImageBuilder for CommandBuilder {
    fn name(&self) -> &str {
        &self.program
    }

    async fn build(&self, context: &Path, image: &str) -> Result<BuildOutput> {
        tracing::debug!(
            tool = %self.program,
            image,
            context = %context.display(),
            "Running image build"
        );

        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .arg("build")
            .arg("-t")
            .arg(image)
            .arg(context)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConvertError::ToolUnavailable {
                tool: self.program.clone(),
                source,
            })?;

        let echo = self.verbosity.is_debug();
        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(drain(out, Stream::Stdout, echo)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(drain(err, Stream::Stderr, echo)));

        let output = BuildOutput {
            stdout: join_drain(stdout, Stream::Stdout).await,
            stderr: join_drain(stderr, Stream::Stderr).await,
        };

        let status = child.wait().await?;
        if !status.success() {
            return Err(ConvertError::ExternalToolFailure {
                tool: self.program.clone(),
                code: status.code(),
                output: output.combined(),
            });
        }

        Ok(output)
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read `reader` to the end, echoing lines when asked and keeping at most
/// [`MAX_CAPTURED_BYTES`] of them.
///
/// Output is decoded lossily and a read error only ends the capture; the
/// tool's exit status alone decides whether the build failed.
async fn drain<R>(reader: R, stream: Stream, echo: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut captured = String::new();
    let mut truncated = false;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(?stream, error = %e, "Stopped reading build output");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        if echo {
            match stream {
                Stream::Stdout => println!("{line}"),
                Stream::Stderr => eprintln!("{line}"),
            }
        }
        if captured.len() + line.len() < MAX_CAPTURED_BYTES {
            captured.push_str(line);
            captured.push('\n');
        } else {
            truncated = true;
        }
    }

    if truncated {
        tracing::debug!(?stream, "Build output truncated at {} bytes", MAX_CAPTURED_BYTES);
    }
    captured
}

async fn join_drain(handle: Option<tokio::task::JoinHandle<String>>, stream: Stream) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            tracing::warn!(?stream, error = %e, "Build output reader task failed");
            String::new()
        }),
        None => String::new(),
    }
}
