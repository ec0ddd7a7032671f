//! Bundle-to-image conversion pipeline.
//!
//! Validate → read spec → map directives → render → assemble context →
//! external build. Every stage short-circuits; validation and parse failures
//! happen before any Dockerfile or context exists.

use std::path::PathBuf;

use oci2docker_core::config::ConvertConfig;
use oci2docker_core::error::Result;
use tracing::{debug, info};

use crate::oci::build::{
    BuildContext, BuildContextAssembler, BuildOutput, BuildScript, ImageBuilder, ScriptOptions,
};
use crate::oci::{
    map_directives, read_spec, BundleSpec, BundleValidator, DirectiveSet, MapperOptions,
    ValidatedBundle,
};

/// Result of the read-only stages.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub bundle: ValidatedBundle,
    pub spec: BundleSpec,
    pub directives: DirectiveSet,
}

/// A build context ready for the build tool.
#[derive(Debug, Clone)]
pub struct PreparedBuild {
    pub directives: DirectiveSet,
    pub script: BuildScript,
    pub context: BuildContext,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub image: String,
    /// Context directory, left in place for the caller.
    pub context: PathBuf,
    pub output: BuildOutput,
}

/// Validate the bundle, parse it and map its directives.
pub fn inspect(config: &ConvertConfig) -> Result<Inspection> {
    let bundle = BundleValidator::new(config.layout).validate(&config.bundle)?;
    let spec = read_spec(&bundle)?;
    let directives = map_directives(&spec, &MapperOptions::from(config));

    debug!(
        entrypoint = %directives.entrypoint,
        env = directives.has_env,
        user = directives.has_user,
        workdir = directives.has_workdir,
        cmd = directives.has_cmd,
        port = directives.has_port,
        add = directives.has_add,
        "Mapped directives"
    );

    Ok(Inspection {
        bundle,
        spec,
        directives,
    })
}

/// Produce the Dockerfile for the configured bundle without writing it.
pub fn render(config: &ConvertConfig) -> Result<BuildScript> {
    let inspection = inspect(config)?;
    Ok(BuildScript::from_directives(
        &inspection.directives,
        &script_options(config),
    ))
}

/// Run every stage up to, but not including, the external build.
pub fn prepare(config: &ConvertConfig, assembler: &BuildContextAssembler) -> Result<PreparedBuild> {
    let inspection = inspect(config)?;
    let script = BuildScript::from_directives(&inspection.directives, &script_options(config));

    let staged = script.write_to(&config.staging_dir)?;
    let context = assembler.assemble(&staged, &inspection.bundle.rootfs_path())?;
    debug!("Docker build context is in {}", context.path().display());

    Ok(PreparedBuild {
        directives: inspection.directives,
        script,
        context,
    })
}

/// Convert the configured bundle into an image with `builder`.
pub async fn convert(
    config: &ConvertConfig,
    assembler: &BuildContextAssembler,
    builder: &dyn ImageBuilder,
) -> Result<ConvertReport> {
    config.validate()?;
    let prepared = prepare(config, assembler)?;

    let output = builder
        .build(prepared.context.path(), &config.image_name)
        .await?;
    info!(
        image = %config.image_name,
        builder = builder.name(),
        "Docker image {} generated successfully.",
        config.image_name
    );

    Ok(ConvertReport {
        image: config.image_name.clone(),
        context: prepared.context.path().to_path_buf(),
        output,
    })
}

fn script_options(config: &ConvertConfig) -> ScriptOptions {
    ScriptOptions {
        base_image: config.base_image.clone(),
        maintainer: config.maintainer.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci2docker_core::error::{BundleError, ConvertError};
    use std::fs;

    fn bundle(config_json: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), config_json).unwrap();
        fs::create_dir(dir.path().join("rootfs")).unwrap();
        dir
    }

    #[test]
    fn test_inspect_maps_directives() {
        let dir = bundle(r#"{"process": {"args": ["server"], "cwd": "/srv", "env": ["A=1"]}, "root": {"path": "rootfs"}}"#);
        let config = ConvertConfig::new(dir.path(), "img");

        let inspection = inspect(&config).unwrap();
        assert_eq!(inspection.directives.entrypoint, "/srv/server");
        assert_eq!(inspection.directives.environment, "A=1");
        assert!(inspection.directives.has_add);
    }

    #[test]
    fn test_render_uses_base_image_and_maintainer() {
        let dir = bundle(r#"{"process": {"args": ["/usr/bin/app"]}}"#);
        let mut config = ConvertConfig::new(dir.path(), "img");
        config.base_image = "busybox:latest".to_string();
        config.maintainer = Some("ops".to_string());

        let rendered = render(&config).unwrap().render();
        assert_eq!(
            rendered,
            "FROM busybox:latest\nLABEL maintainer=\"ops\"\nENTRYPOINT [\"/usr/bin/app\"]\n"
        );
    }

    #[test]
    fn test_invalid_bundle_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        let staging = tempfile::tempdir().unwrap();

        let mut config = ConvertConfig::new(dir.path(), "img");
        config.staging_dir = staging.path().to_path_buf();

        let result = prepare(&config, &BuildContextAssembler::with_parent(staging.path()));
        assert!(matches!(
            result,
            Err(ConvertError::BundleInvalid(BundleError::NoRootFS))
        ));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_spec_writes_nothing() {
        let dir = bundle("{ not json");
        let staging = tempfile::tempdir().unwrap();

        let mut config = ConvertConfig::new(dir.path(), "img");
        config.staging_dir = staging.path().to_path_buf();

        let result = prepare(&config, &BuildContextAssembler::with_parent(staging.path()));
        assert!(matches!(result, Err(ConvertError::SpecMalformed { .. })));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }
}
