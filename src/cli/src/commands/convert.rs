//! `oci2docker convert` command.

use std::path::PathBuf;

use clap::Args;
use oci2docker_core::config::{ConvertConfig, Verbosity};
use oci2docker_core::error::ConvertError;
use oci2docker_runtime::{BuildContextAssembler, CommandBuilder};

use super::MappingArgs;

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Name (and optional tag) of the image to build
    #[arg(long = "image-name", value_name = "NAME")]
    pub image_name: Option<String>,

    /// Build tool, invoked as `<builder> build -t <image> <context>`
    #[arg(long, default_value = "docker")]
    pub builder: String,

    /// Directory the Dockerfile is written to before it moves into the context
    #[arg(long = "staging-dir", value_name = "DIR", default_value = ".")]
    pub staging_dir: PathBuf,

    /// Parent directory for build contexts [default: system temp dir]
    #[arg(long = "context-dir", value_name = "DIR")]
    pub context_dir: Option<PathBuf>,
}

impl ConvertArgs {
    pub fn to_config(&self, verbosity: Verbosity) -> ConvertConfig {
        let image_name = self.image_name.as_deref().unwrap_or_default();
        ConvertConfig {
            builder: self.builder.clone(),
            staging_dir: self.staging_dir.clone(),
            ..self.mapping.to_config(image_name, verbosity)
        }
    }
}

pub async fn execute(
    args: ConvertArgs,
    verbosity: Verbosity,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config(verbosity);
    let assembler = match &args.context_dir {
        Some(dir) => BuildContextAssembler::with_parent(dir),
        None => BuildContextAssembler::new(),
    };
    let builder = CommandBuilder::new(config.builder.clone(), verbosity);

    match oci2docker_runtime::convert(&config, &assembler, &builder).await {
        Ok(report) => {
            tracing::debug!(
                context = %report.context.display(),
                "Build context left in place"
            );
            Ok(())
        }
        Err(e) => Err(failure_message(&e, verbosity).into()),
    }
}

/// One-line failure text.
///
/// Quiet runs never showed the build tool's output, so its last non-blank
/// line is appended; debug runs already streamed it.
fn failure_message(err: &ConvertError, verbosity: Verbosity) -> String {
    let detail = err
        .diagnostic_output()
        .filter(|_| !verbosity.is_debug())
        .and_then(last_line);
    match detail {
        Some(line) => format!("{err}: {line}"),
        None => err.to_string(),
    }
}

fn last_line(output: &str) -> Option<&str> {
    output.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{BundleArgs, Cli, Command};
    use clap::Parser;

    fn tool_failure(output: &str) -> ConvertError {
        ConvertError::ExternalToolFailure {
            tool: "docker".to_string(),
            code: Some(1),
            output: output.to_string(),
        }
    }

    fn parse(args: &[&str]) -> ConvertArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Convert(args) => args,
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_failure_message_quiet_appends_last_line() {
        let err = tool_failure("Step 1/3\nno such file: rootfs\n\n");
        assert_eq!(
            failure_message(&err, Verbosity::Quiet),
            "docker build failed: exit status 1: no such file: rootfs"
        );
    }

    #[test]
    fn test_failure_message_debug_is_plain() {
        let err = tool_failure("Step 1/3\n");
        assert_eq!(
            failure_message(&err, Verbosity::Debug),
            "docker build failed: exit status 1"
        );
    }

    #[test]
    fn test_failure_message_without_output() {
        let err = ConvertError::ConfigError("please specify image name for output".to_string());
        assert_eq!(
            failure_message(&err, Verbosity::Quiet),
            "Configuration error: please specify image name for output"
        );
        assert_eq!(
            failure_message(&tool_failure("  \n"), Verbosity::Quiet),
            "docker build failed: exit status 1"
        );
    }

    #[test]
    fn test_to_config() {
        let args = parse(&[
            "oci2docker",
            "convert",
            "--oci-bundle",
            "/bundles/web",
            "--image-name",
            "web:1",
            "--port",
            "8080",
            "--builder",
            "podman",
            "--staging-dir",
            "/tmp/stage",
        ]);
        let config = args.to_config(Verbosity::Debug);

        assert_eq!(config.bundle, PathBuf::from("/bundles/web"));
        assert_eq!(config.image_name, "web:1");
        assert_eq!(config.port.as_deref(), Some("8080"));
        assert_eq!(config.builder, "podman");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(config.base_image, "scratch");
        assert!(config.verbosity.is_debug());
    }

    #[test]
    fn test_missing_flags_become_config_errors() {
        let args = ConvertArgs {
            mapping: MappingArgs {
                bundle: BundleArgs {
                    oci_bundle: None,
                    layout: Default::default(),
                },
                port: None,
                entrypoint_mode: Default::default(),
                workdir: false,
                base_image: "scratch".to_string(),
                maintainer: None,
            },
            image_name: Some("img".to_string()),
            builder: "docker".to_string(),
            staging_dir: PathBuf::from("."),
            context_dir: None,
        };
        assert!(matches!(
            args.to_config(Verbosity::Quiet).validate(),
            Err(ConvertError::ConfigError(msg)) if msg == "please specify OCI bundle path"
        ));
    }

    #[cfg(unix)]
    mod build {
        use super::*;
        use std::fs;

        fn bundle_args(dir: &std::path::Path, builder: &str) -> ConvertArgs {
            let bundle = dir.join("bundle");
            fs::create_dir_all(bundle.join("rootfs/bin")).unwrap();
            fs::write(
                bundle.join("config.json"),
                r#"{"process": {"args": ["/bin/app"]}, "root": {"path": "rootfs"}}"#,
            )
            .unwrap();
            fs::write(bundle.join("rootfs/bin/app"), "").unwrap();
            fs::create_dir_all(dir.join("contexts")).unwrap();

            let bundle = bundle.to_string_lossy().into_owned();
            let staging = dir.to_string_lossy().into_owned();
            let contexts = dir.join("contexts").to_string_lossy().into_owned();
            parse(&[
                "oci2docker",
                "convert",
                "--oci-bundle",
                &bundle,
                "--image-name",
                "app",
                "--builder",
                builder,
                "--staging-dir",
                &staging,
                "--context-dir",
                &contexts,
            ])
        }

        #[tokio::test]
        async fn test_execute_with_succeeding_builder() {
            let dir = tempfile::tempdir().unwrap();
            let args = bundle_args(dir.path(), "true");

            execute(args, Verbosity::Quiet).await.unwrap();
            assert_eq!(fs::read_dir(dir.path().join("contexts")).unwrap().count(), 1);
        }

        #[tokio::test]
        async fn test_execute_with_failing_builder() {
            let dir = tempfile::tempdir().unwrap();
            let args = bundle_args(dir.path(), "false");

            let err = execute(args, Verbosity::Quiet).await.unwrap_err();
            assert_eq!(err.to_string(), "false build failed: exit status 1");
        }
    }
}
