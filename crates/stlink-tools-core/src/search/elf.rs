//! Firmware image location

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{absolute, has_extension, resolve_single, FileSearch, DEFAULT_SEARCH_DEPTH};
use crate::error::{Error, Result};

/// First four bytes of every ELF image
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

// "build" as a standalone token; any letter or digit extends a token, '_' and
// '-' separate them
static BUILD_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^\pL\pN])build(?:$|[^\pL\pN])").unwrap());

/// Whether `path` looks like an ELF image: extension `.elf` or none, and the
/// ELF magic at offset 0
pub fn is_elf_file(path: &Path) -> bool {
    if path.extension().is_some() && !has_extension(path, "elf") {
        return false;
    }
    let mut magic = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => magic == ELF_MAGIC,
        Err(e) => {
            log::trace!("Cannot read {}: {}", path.display(), e);
            false
        }
    }
}

/// Whether the directory name contains the word "build"
pub fn is_build_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| BUILD_DIR.is_match(n))
}

/// Locate the firmware image to upload
///
/// An explicit file must be an ELF image; an explicit directory is searched.
/// Without an explicit path the project's build directories are searched, or
/// the project directory itself when it has none.
pub fn resolve_elf(project_dir: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    let search_dirs = match explicit {
        Some(path) => {
            let path = absolute(path)?;
            if !path.exists() {
                return Err(Error::NotFound {
                    what: "elf file".into(),
                    searched: vec![path],
                });
            }
            if path.is_file() {
                if is_elf_file(&path) {
                    return Ok(path);
                }
                return Err(Error::InvalidInput(format!(
                    "File \"{}\" isn't an ELF file",
                    path.display()
                )));
            }
            vec![path]
        }
        None => {
            let project_dir = absolute(project_dir)?;
            let mut build_dirs: Vec<PathBuf> = fs::read_dir(&project_dir)
                .map_err(|e| Error::io(&project_dir, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_dir() && is_build_dir(path))
                .collect();
            build_dirs.sort();
            if build_dirs.is_empty() {
                log::debug!(
                    "No build directory in {}, searching the project directory",
                    project_dir.display()
                );
                vec![project_dir]
            } else {
                build_dirs
            }
        }
    };

    log::debug!(
        "Searching elf files in: {}",
        search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let results = FileSearch::new(DEFAULT_SEARCH_DEPTH, &is_elf_file).run(&search_dirs)?;
    resolve_single(results, "elf files", &search_dirs)
}
