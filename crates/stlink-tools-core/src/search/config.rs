//! OpenOCD configuration location

use std::path::{Path, PathBuf};

use super::{absolute, has_extension, resolve_single, FileSearch, DEFAULT_SEARCH_DEPTH};
use crate::error::{Error, Result};

/// Whether `path` has the `.cfg` extension
pub fn is_openocd_config(path: &Path) -> bool {
    has_extension(path, "cfg")
}

/// Locate the OpenOCD board/target configuration
///
/// An explicit file is used as-is. Otherwise the explicit directory, or the
/// project directory, must contain exactly one `.cfg` file within two levels.
/// Directories whose name is listed in `exclude_dirs` are not searched.
pub fn resolve_openocd_config(
    project_dir: &Path,
    explicit: Option<&Path>,
    exclude_dirs: &[String],
) -> Result<PathBuf> {
    let search_dir = match explicit {
        Some(path) => {
            let path = absolute(path)?;
            if path.is_file() {
                return Ok(path);
            }
            if !path.exists() {
                return Err(Error::NotFound {
                    what: "OpenOCD config".into(),
                    searched: vec![path],
                });
            }
            path
        }
        None => absolute(project_dir)?,
    };

    let excluded = |path: &Path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| exclude_dirs.iter().any(|e| e == name))
    };
    let search_dirs = [search_dir];
    let results = FileSearch::new(DEFAULT_SEARCH_DEPTH, &is_openocd_config)
        .exclude_dirs(&excluded)
        .run(&search_dirs)?;
    resolve_single(results, "cfg files", &search_dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::touch;
    use tempfile::TempDir;

    #[test]
    fn test_project_root_config() {
        let tmp = TempDir::new().unwrap();
        let cfg = touch(tmp.path(), "openocd_stm.cfg", b"source [find target/stm32f4x.cfg]");
        touch(tmp.path(), "mbed-os/targets/board.cfg", b"");

        assert_eq!(resolve_openocd_config(tmp.path(), None, &[]).unwrap(), cfg);
    }

    #[test]
    fn test_case_insensitive_extension() {
        let tmp = TempDir::new().unwrap();
        let cfg = touch(tmp.path(), "tools/BOARD.CFG", b"");

        assert_eq!(resolve_openocd_config(tmp.path(), None, &[]).unwrap(), cfg);
    }

    #[test]
    fn test_ambiguous_config() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "openocd_stm.cfg", b"");
        touch(tmp.path(), "stm32f3.cfg", b"");

        assert!(matches!(
            resolve_openocd_config(tmp.path(), None, &[]),
            Err(Error::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_not_found() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "main.c", b"");

        let err = resolve_openocd_config(tmp.path(), None, &[]).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        let cfg = touch(tmp.path(), "board/openocd.cfg", b"");
        touch(tmp.path(), "TESTS/test.cfg", b"");
        touch(tmp.path(), "mbed-os/mbed.cfg", b"");

        assert!(matches!(
            resolve_openocd_config(tmp.path(), None, &[]),
            Err(Error::Ambiguous { .. })
        ));
        let exclude = vec!["TESTS".to_string(), "mbed-os".to_string()];
        assert_eq!(
            resolve_openocd_config(tmp.path(), None, &exclude).unwrap(),
            cfg
        );
    }

    #[test]
    fn test_explicit_file_skips_checks() {
        let tmp = TempDir::new().unwrap();
        let cfg = touch(tmp.path(), "board.tcl", b"");
        touch(tmp.path(), "openocd_stm.cfg", b"");

        assert_eq!(
            resolve_openocd_config(tmp.path(), Some(&cfg), &[]).unwrap(),
            cfg
        );
    }

    #[test]
    fn test_explicit_directory() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "openocd_stm.cfg", b"");
        let cfg = touch(tmp.path(), "debug/board.cfg", b"");

        let dir = tmp.path().join("debug");
        assert_eq!(
            resolve_openocd_config(tmp.path(), Some(&dir), &[]).unwrap(),
            cfg
        );
    }

    #[test]
    fn test_explicit_missing() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.cfg");

        assert!(matches!(
            resolve_openocd_config(tmp.path(), Some(&missing), &[]),
            Err(Error::NotFound { .. })
        ));
    }
}
