//! OCI bundle validation.
//!
//! A bundle is a directory holding:
//! - `config.json`: process, root and (in the current layout) hooks
//! - `runtime.json`: hooks, only in the legacy two-file layout
//! - `rootfs/`: the root filesystem tree
//!
//! Nothing else may appear at the top level. Validation walks the whole tree
//! once without following symlinks, checks the required markers, and only then
//! reads the descriptors. The bundle is never modified.
//!
//! Reference: <https://github.com/opencontainers/runtime-spec/blob/main/bundle.md>

use std::fs;
use std::path::{Component, Path, PathBuf};

use oci2docker_core::config::SpecLayout;
use oci2docker_core::error::BundleError;
use tracing::{debug, warn};

/// Bundle entry names.
pub mod paths {
    /// Config descriptor file name.
    pub const CONFIG_FILE: &str = "config.json";
    /// Runtime descriptor file name (legacy layout).
    pub const RUNTIME_FILE: &str = "runtime.json";
    /// Root filesystem directory name.
    pub const ROOTFS_DIR: &str = "rootfs";
}

/// A bundle that passed validation, with its descriptors already read.
#[derive(Debug, Clone)]
pub struct ValidatedBundle {
    path: PathBuf,
    layout: SpecLayout,
    config: Vec<u8>,
    runtime: Option<Vec<u8>>,
    rootfs_entries: usize,
}

impl ValidatedBundle {
    /// Bundle directory as given by the caller.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved layout: always `Legacy` or `Current`, never `Auto`.
    pub fn layout(&self) -> SpecLayout {
        self.layout
    }

    /// Raw `config.json` contents.
    pub fn config_bytes(&self) -> &[u8] {
        &self.config
    }

    /// Raw `runtime.json` contents (legacy layout only).
    pub fn runtime_bytes(&self) -> Option<&[u8]> {
        self.runtime.as_deref()
    }

    /// Root filesystem directory inside the bundle.
    pub fn rootfs_path(&self) -> PathBuf {
        self.path.join(paths::ROOTFS_DIR)
    }

    /// Number of entries found below `rootfs/`.
    pub fn rootfs_entries(&self) -> usize {
        self.rootfs_entries
    }
}

/// Checks the OCI bundle contract for one layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleValidator {
    layout: SpecLayout,
}

/// What the walk found.
#[derive(Debug, Default)]
struct Classification {
    config: Option<PathBuf>,
    runtime: Option<PathBuf>,
    rootfs: bool,
    rootfs_entries: usize,
    others: Vec<String>,
}

impl BundleValidator {
    pub fn new(layout: SpecLayout) -> Self {
        Self { layout }
    }

    /// Validate the bundle at `path`.
    pub fn validate(&self, path: &Path) -> Result<ValidatedBundle, BundleError> {
        let meta = fs::metadata(path).map_err(|_| BundleError::NotADirectory(path.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(BundleError::NotADirectory(path.to_path_buf()));
        }

        let mut found = Classification::default();
        walk(path, path, &mut found)?;

        let layout = match self.layout {
            SpecLayout::Auto if found.runtime.is_some() => SpecLayout::Legacy,
            SpecLayout::Auto => SpecLayout::Current,
            explicit => explicit,
        };

        let config_path = found.config.ok_or(BundleError::NoConfig)?;
        if layout.requires_runtime() && found.runtime.is_none() {
            return Err(BundleError::NoRuntime);
        }
        if !found.rootfs {
            return Err(BundleError::NoRootFS);
        }

        found.others.sort();
        if let Some(entry) = found.others.into_iter().next() {
            return Err(BundleError::UnrecognizedEntry(entry));
        }

        let config = read_descriptor(&config_path)?;
        let runtime = match (layout, found.runtime) {
            (SpecLayout::Legacy, Some(runtime_path)) => Some(read_descriptor(&runtime_path)?),
            (_, Some(runtime_path)) => {
                warn!(
                    path = %runtime_path.display(),
                    "Ignoring runtime.json in current layout bundle"
                );
                None
            }
            (_, None) => None,
        };

        debug!(
            bundle = %path.display(),
            layout = %layout,
            rootfs_entries = found.rootfs_entries,
            "Valid OCI bundle"
        );

        Ok(ValidatedBundle {
            path: path.to_path_buf(),
            layout,
            config,
            runtime,
            rootfs_entries: found.rootfs_entries,
        })
    }
}

/// Validate and report the outcome as a boolean, logging the reason.
pub fn is_valid_bundle(path: &Path, layout: SpecLayout) -> bool {
    match BundleValidator::new(layout).validate(path) {
        Ok(_) => {
            debug!("{}: valid oci bundle.", path.display());
            true
        }
        Err(e) => {
            debug!("{}: invalid oci bundle: {}.", path.display(), e);
            false
        }
    }
}

/// Depth-first walk that classifies every entry relative to `root`.
fn walk(root: &Path, dir: &Path, found: &mut Classification) -> Result<(), BundleError> {
    let unreadable = |path: &Path, source| BundleError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(|e| unreadable(dir, e))? {
        let entry = entry.map_err(|e| unreadable(dir, e))?;
        let entry_path = entry.path();
        // file_type() does not follow symlinks
        let file_type = entry.file_type().map_err(|e| unreadable(&entry_path, e))?;
        let relative = entry_path.strip_prefix(root).unwrap_or(&entry_path);

        match relative.to_str() {
            Some(paths::CONFIG_FILE) => found.config = Some(entry_path.clone()),
            Some(paths::RUNTIME_FILE) => found.runtime = Some(entry_path.clone()),
            Some(paths::ROOTFS_DIR) => {
                if !file_type.is_dir() {
                    return Err(BundleError::RootfsNotDirectory);
                }
                found.rootfs = true;
            }
            _ if is_under_rootfs(relative) => found.rootfs_entries += 1,
            _ => found.others.push(relative.to_string_lossy().into_owned()),
        }

        if file_type.is_dir() {
            walk(root, &entry_path, found)?;
        }
    }

    Ok(())
}

/// Whether the first component of `relative` is the rootfs directory.
fn is_under_rootfs(relative: &Path) -> bool {
    matches!(
        relative.components().next(),
        Some(Component::Normal(first)) if first == paths::ROOTFS_DIR
    )
}

fn read_descriptor(path: &Path) -> Result<Vec<u8>, BundleError> {
    fs::read(path).map_err(|source| BundleError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"ociVersion": "1.0.0", "process": {"args": ["/bin/true"]}, "root": {"path": "rootfs"}}"#;
    const RUNTIME: &str = r#"{"hooks": {"poststart": [{"path": "/bin/notify"}]}}"#;

    fn current_bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), CONFIG).unwrap();
        fs::create_dir_all(dir.path().join("rootfs/bin")).unwrap();
        fs::write(dir.path().join("rootfs/bin/true"), "").unwrap();
        dir
    }

    fn legacy_bundle() -> tempfile::TempDir {
        let dir = current_bundle();
        fs::write(dir.path().join("runtime.json"), RUNTIME).unwrap();
        dir
    }

    #[test]
    fn test_validate_current_layout() {
        let dir = current_bundle();
        let bundle = BundleValidator::new(SpecLayout::Current)
            .validate(dir.path())
            .unwrap();

        assert_eq!(bundle.layout(), SpecLayout::Current);
        assert_eq!(bundle.config_bytes(), CONFIG.as_bytes());
        assert!(bundle.runtime_bytes().is_none());
        assert_eq!(bundle.rootfs_entries(), 2);
        assert!(bundle.rootfs_path().ends_with("rootfs"));
    }

    #[test]
    fn test_validate_legacy_layout() {
        let dir = legacy_bundle();
        let bundle = BundleValidator::new(SpecLayout::Legacy)
            .validate(dir.path())
            .unwrap();

        assert_eq!(bundle.layout(), SpecLayout::Legacy);
        assert_eq!(bundle.runtime_bytes(), Some(RUNTIME.as_bytes()));
    }

    #[test]
    fn test_auto_layout_probes_runtime_file() {
        let legacy = legacy_bundle();
        let current = current_bundle();
        let validator = BundleValidator::new(SpecLayout::Auto);

        assert_eq!(
            validator.validate(legacy.path()).unwrap().layout(),
            SpecLayout::Legacy
        );
        assert_eq!(
            validator.validate(current.path()).unwrap().layout(),
            SpecLayout::Current
        );
    }

    #[test]
    fn test_current_layout_ignores_runtime_file() {
        let dir = legacy_bundle();
        let bundle = BundleValidator::new(SpecLayout::Current)
            .validate(dir.path())
            .unwrap();
        assert!(bundle.runtime_bytes().is_none());
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bundle.tar");
        fs::write(&file, "not a bundle").unwrap();

        let result = BundleValidator::default().validate(&file);
        assert!(matches!(result, Err(BundleError::NotADirectory(_))));

        let result = BundleValidator::default().validate(&dir.path().join("missing"));
        assert!(matches!(result, Err(BundleError::NotADirectory(_))));
    }

    #[test]
    fn test_missing_config() {
        let dir = current_bundle();
        fs::remove_file(dir.path().join("config.json")).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        assert!(matches!(result, Err(BundleError::NoConfig)));
    }

    #[test]
    fn test_missing_runtime_in_legacy_layout() {
        let dir = current_bundle();
        let result = BundleValidator::new(SpecLayout::Legacy).validate(dir.path());
        assert!(matches!(result, Err(BundleError::NoRuntime)));
    }

    #[test]
    fn test_missing_rootfs() {
        let dir = current_bundle();
        fs::remove_dir_all(dir.path().join("rootfs")).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        assert!(matches!(result, Err(BundleError::NoRootFS)));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_rootfs_does_not_read_descriptors() {
        use std::os::unix::fs::PermissionsExt;

        let dir = current_bundle();
        fs::remove_dir_all(dir.path().join("rootfs")).unwrap();
        // An unreadable config would surface as ReadFailure if it were opened.
        let config = dir.path().join("config.json");
        fs::set_permissions(&config, fs::Permissions::from_mode(0o000)).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        fs::set_permissions(&config, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(result, Err(BundleError::NoRootFS)));
    }

    #[test]
    fn test_rootfs_is_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), CONFIG).unwrap();
        fs::write(dir.path().join("rootfs"), "").unwrap();

        let result = BundleValidator::default().validate(dir.path());
        assert!(matches!(result, Err(BundleError::RootfsNotDirectory)));
    }

    #[test]
    fn test_unrecognized_top_level_file() {
        let dir = current_bundle();
        fs::write(dir.path().join("README.md"), "hello").unwrap();

        let result = BundleValidator::default().validate(dir.path());
        match result {
            Err(BundleError::UnrecognizedEntry(entry)) => assert_eq!(entry, "README.md"),
            other => panic!("expected UnrecognizedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_directory_reports_top_level_entry() {
        let dir = current_bundle();
        fs::create_dir_all(dir.path().join("extra/nested")).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        match result {
            Err(BundleError::UnrecognizedEntry(entry)) => assert_eq!(entry, "extra"),
            other => panic!("expected UnrecognizedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_rootfs_prefixed_sibling_is_unrecognized() {
        let dir = current_bundle();
        fs::create_dir(dir.path().join("rootfs-old")).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        assert!(matches!(result, Err(BundleError::UnrecognizedEntry(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_rootfs_symlinks_are_not_followed() {
        let dir = current_bundle();
        std::os::unix::fs::symlink("/etc", dir.path().join("rootfs/etc")).unwrap();

        let bundle = BundleValidator::default().validate(dir.path()).unwrap();
        assert_eq!(bundle.rootfs_entries(), 3);
    }

    #[test]
    fn test_config_directory_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config.json")).unwrap();
        fs::create_dir(dir.path().join("rootfs")).unwrap();

        let result = BundleValidator::default().validate(dir.path());
        assert!(matches!(result, Err(BundleError::ReadFailure { .. })));
    }

    #[test]
    fn test_is_valid_bundle() {
        let dir = current_bundle();
        assert!(is_valid_bundle(dir.path(), SpecLayout::Auto));
        assert!(!is_valid_bundle(dir.path(), SpecLayout::Legacy));
    }
}
