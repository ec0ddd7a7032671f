//! Build context assembly.
//!
//! A context is a fresh temporary directory holding the rendered Dockerfile
//! at its root and a copy of the bundle rootfs under `rootfs/`. It is handed
//! to the build tool and then left for the caller to discard; nothing is
//! rolled back when a step fails.

use std::path::{Path, PathBuf};

use oci2docker_core::error::{ContextStage, ConvertError, Result};
use tracing::debug;

use super::dockerfile::DOCKERFILE;
use crate::oci::bundle::paths::ROOTFS_DIR;

/// Prefix of every allocated context directory.
pub const CONTEXT_PREFIX: &str = "oci2docker";

/// An assembled build context.
#[derive(Debug, Clone)]
pub struct BuildContext {
    path: PathBuf,
    rootfs_entries: u64,
}

impl BuildContext {
    /// Context root, passed to the build tool.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dockerfile_path(&self) -> PathBuf {
        self.path.join(DOCKERFILE)
    }

    pub fn rootfs_path(&self) -> PathBuf {
        self.path.join(ROOTFS_DIR)
    }

    /// Entries copied from the bundle rootfs.
    pub fn rootfs_entries(&self) -> u64 {
        self.rootfs_entries
    }

    /// Delete the context directory.
    pub fn remove(self) -> std::io::Result<()> {
        std::fs::remove_dir_all(&self.path)
    }
}

/// Allocates and populates build contexts.
#[derive(Debug, Clone, Default)]
pub struct BuildContextAssembler {
    /// Parent for new contexts; the system temp dir when unset.
    parent: Option<PathBuf>,
}

impl BuildContextAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate contexts under `parent` instead of the system temp dir.
    pub fn with_parent(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: Some(parent.into()),
        }
    }

    /// Build a context from a staged Dockerfile and a bundle rootfs.
    ///
    /// The staged script is moved, not copied, into the context.
    pub fn assemble(&self, staged_script: &Path, bundle_rootfs: &Path) -> Result<BuildContext> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(CONTEXT_PREFIX);
        let dir = match &self.parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| stage_error(ContextStage::Allocate, e))?;
        // The build tool reads the context after we return.
        let path = dir.into_path();

        let rootfs = path.join(ROOTFS_DIR);
        std::fs::create_dir_all(&rootfs).map_err(|e| stage_error(ContextStage::CreateRootfs, e))?;

        crate::fs::move_file(staged_script, &path.join(DOCKERFILE))
            .map_err(|e| stage_error(ContextStage::RelocateScript, e))?;

        let rootfs_entries = crate::fs::copy_tree(bundle_rootfs, &rootfs)
            .map_err(|e| stage_error(ContextStage::CopyRootfs, e))?;

        debug!(
            context = %path.display(),
            rootfs_entries,
            "Docker build context is ready"
        );

        Ok(BuildContext {
            path,
            rootfs_entries,
        })
    }
}

fn stage_error(stage: ContextStage, source: std::io::Error) -> ConvertError {
    ConvertError::BuildContextFailure { stage, source }
}
