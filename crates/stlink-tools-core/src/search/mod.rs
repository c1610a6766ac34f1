//! Breadth-first file search
//!
//! Project layouts are unpredictable, so files are located by scanning
//! directories level by level. By default a match at a shallow level stops
//! the search: a build artifact at the top of a build directory wins over a
//! stale copy several levels down.
//!
//! Every caller resolves the results with [`resolve_single`]: exactly one
//! match is required and several matches are an error, never a silent pick.

mod config;
mod elf;

pub use config::{is_openocd_config, resolve_openocd_config};
pub use elf::{is_build_dir, is_elf_file, resolve_elf, ELF_MAGIC};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Depth used by the ELF and config searches
pub const DEFAULT_SEARCH_DEPTH: usize = 2;

/// A file found by [`FileSearch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Level at which the file was found (0 = directly in a start directory)
    pub level: usize,
}

type Predicate<'a> = &'a dyn Fn(&Path) -> bool;

/// Level-order directory search
pub struct FileSearch<'a> {
    max_depth: usize,
    file_predicate: Predicate<'a>,
    exclude_dir: Option<Predicate<'a>>,
    stop_on_top_level: bool,
}

impl<'a> FileSearch<'a> {
    /// Search `max_depth` levels for files accepted by `file_predicate`
    ///
    /// `max_depth` counts listed levels: 1 lists only the start directories,
    /// 2 also lists their immediate subdirectories.
    pub fn new(max_depth: usize, file_predicate: Predicate<'a>) -> Self {
        Self {
            max_depth,
            file_predicate,
            exclude_dir: None,
            stop_on_top_level: true,
        }
    }

    /// Skip subdirectories for which `predicate` returns true
    pub fn exclude_dirs(mut self, predicate: Predicate<'a>) -> Self {
        self.exclude_dir = Some(predicate);
        self
    }

    /// Whether to stop descending once any level produced a match
    pub fn stop_on_top_level(mut self, stop: bool) -> Self {
        self.stop_on_top_level = stop;
        self
    }

    /// Run the search from `start_dirs`
    pub fn run(&self, start_dirs: &[PathBuf]) -> Result<Vec<SearchResult>> {
        let mut dirs_to_visit = Vec::with_capacity(start_dirs.len());
        for dir in start_dirs {
            let dir = absolute(dir)?;
            if !dir.is_dir() {
                return Err(Error::InvalidInput(format!(
                    "search root \"{}\" isn't a directory",
                    dir.display()
                )));
            }
            dirs_to_visit.push(dir);
        }

        let mut results = Vec::new();
        for level in 0..self.max_depth {
            if dirs_to_visit.is_empty() {
                break;
            }
            let current = std::mem::take(&mut dirs_to_visit);
            for dir in &current {
                for path in sorted_entries(dir)? {
                    if path.is_dir() {
                        if self.exclude_dir.is_some_and(|exclude| exclude(&path)) {
                            log::debug!("Skipping excluded directory {}", path.display());
                        } else {
                            dirs_to_visit.push(path);
                        }
                    } else if (self.file_predicate)(&path) {
                        log::trace!("Match at level {}: {}", level, path.display());
                        results.push(SearchResult { path, level });
                    }
                }
            }
            if self.stop_on_top_level && !results.is_empty() {
                break;
            }
        }

        Ok(results)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    entries.sort();
    Ok(entries)
}

/// Make `path` absolute without resolving symlinks
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::io(path, e))
}

/// Apply the one-match policy to search results
pub fn resolve_single(
    results: Vec<SearchResult>,
    what: &str,
    searched: &[PathBuf],
) -> Result<PathBuf> {
    let mut paths: Vec<PathBuf> = results.into_iter().map(|r| r.path).collect();
    match paths.len() {
        1 => {
            let path = paths.remove(0);
            log::info!("Found {}", path.display());
            Ok(path)
        }
        0 => Err(Error::NotFound {
            what: what.to_string(),
            searched: searched.to_vec(),
        }),
        _ => Err(Error::Ambiguous {
            what: what.to_string(),
            matches: paths,
        }),
    }
}

/// Whether the final component of `path` has extension `ext` (ASCII
/// case-insensitive, without the dot)
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create `rel` under `root` with `contents`, making parent directories
    pub(crate) fn touch(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn txt(path: &Path) -> bool {
        has_extension(path, "txt")
    }

    #[test]
    fn test_level_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/one.txt", b"");
        touch(tmp.path(), "b/two.txt", b"");
        touch(tmp.path(), "a/deep/three.txt", b"");

        let results = FileSearch::new(3, &txt)
            .stop_on_top_level(false)
            .run(&[tmp.path().to_path_buf()])
            .unwrap();
        let levels: Vec<_> = results.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 1, 2]);
        assert_eq!(results[0].path, tmp.path().join("a/one.txt"));
        assert_eq!(results[1].path, tmp.path().join("b/two.txt"));
    }

    #[test]
    fn test_stop_on_top_level_never_visits_deeper() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.txt", b"");
        touch(tmp.path(), "trap/inner.txt", b"");

        let predicate = |path: &Path| {
            assert!(
                !path.starts_with(tmp.path().join("trap")),
                "trap directory was visited"
            );
            txt(path)
        };
        let results = FileSearch::new(5, &predicate)
            .run(&[tmp.path().to_path_buf()])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].level, 0);
    }

    #[test]
    fn test_max_depth_bounds_search() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/b/deep.txt", b"");

        let root = [tmp.path().to_path_buf()];
        assert!(FileSearch::new(2, &txt).run(&root).unwrap().is_empty());
        assert_eq!(FileSearch::new(3, &txt).run(&root).unwrap().len(), 1);
        assert!(FileSearch::new(0, &txt).run(&root).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_dirs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "TESTS/skip.txt", b"");
        touch(tmp.path(), "src/keep.txt", b"");

        let exclude = |path: &Path| path.file_name().is_some_and(|n| n == "TESTS");
        let results = FileSearch::new(2, &txt)
            .exclude_dirs(&exclude)
            .run(&[tmp.path().to_path_buf()])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].path.ends_with("src/keep.txt"));
    }

    #[test]
    fn test_multiple_start_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "build/a.txt", b"");
        touch(tmp.path(), "BUILD/b.txt", b"");

        let starts = [tmp.path().join("build"), tmp.path().join("BUILD")];
        let results = FileSearch::new(2, &txt).run(&starts).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_start_dir_must_be_directory() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "file.txt", b"");
        let err = FileSearch::new(2, &txt).run(&[file]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_resolve_single_policy() {
        let found = |name: &str| SearchResult {
            path: PathBuf::from(name),
            level: 0,
        };
        let searched = [PathBuf::from("/project")];

        let err = resolve_single(Vec::new(), "cfg files", &searched).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let path = resolve_single(vec![found("/project/a.cfg")], "cfg files", &searched).unwrap();
        assert_eq!(path, PathBuf::from("/project/a.cfg"));

        let err = resolve_single(
            vec![found("/project/b.cfg"), found("/project/a.cfg")],
            "cfg files",
            &searched,
        )
        .unwrap_err();
        let Error::Ambiguous { matches, .. } = err else {
            panic!("expected ambiguous error");
        };
        assert_eq!(
            matches,
            vec![PathBuf::from("/project/b.cfg"), PathBuf::from("/project/a.cfg")]
        );
    }
}
