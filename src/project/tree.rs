// Project tree access
//
// The engine only ever needs three things from the filesystem: find the
// settings file by name, list the root's subdirectories, and read a file
// inside an application. `ProjectTree` is that seam.

use crate::error::{Error, Result};
use glob::Pattern;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Read-only view of the analyzed project, paths relative to its root
pub trait ProjectTree: Sync {
    /// Absolute location of the root
    fn root(&self) -> &Path;

    /// Name of the root directory
    fn name(&self) -> String;

    /// Every file called `file_name` under the root, shallowest first
    fn find_files(&self, file_name: &str) -> Vec<PathBuf>;

    /// Names of the root's immediate subdirectories, sorted
    fn subdirectories(&self) -> Result<Vec<String>>;

    fn is_dir(&self, relative: &Path) -> bool;

    fn is_file(&self, relative: &Path) -> bool;

    /// File contents; `Ok(None)` when the file does not exist
    fn read(&self, relative: &Path) -> Result<Option<String>>;
}

/// A project on the local filesystem
pub struct FsTree {
    root: PathBuf,
    exclude: Vec<Pattern>,
}

impl FsTree {
    /// Open a project root; fails when the root is not an accessible directory
    pub fn open(root: &Path, exclude: &[String]) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(Error::PathNotFound(root));
        }

        let exclude = exclude
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { root, exclude })
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(relative))
    }

    /// Directories are pruned when a file directly inside them would be excluded
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if is_hidden(entry) {
            return false;
        }
        let Ok(relative) = entry.path().strip_prefix(&self.root) else {
            return false;
        };
        if entry.file_type().is_dir() {
            !self.is_excluded(&relative.join("_"))
        } else {
            !self.is_excluded(relative)
        }
    }
}

impl ProjectTree for FsTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string())
    }

    fn find_files(&self, file_name: &str) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.keep_entry(e))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::debug!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == file_name)
            .filter_map(|e| e.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .collect();

        found.sort_by(|a, b| match a.components().count().cmp(&b.components().count()) {
            Ordering::Equal => a.cmp(b),
            other => other,
        });
        found
    }

    fn subdirectories(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn is_dir(&self, relative: &Path) -> bool {
        self.root.join(relative).is_dir()
    }

    fn is_file(&self, relative: &Path) -> bool {
        self.root.join(relative).is_file()
    }

    fn read(&self, relative: &Path) -> Result<Option<String>> {
        let path = self.root.join(relative);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", relative.display(), e),
            ))
        })?;
        Ok(Some(text))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
