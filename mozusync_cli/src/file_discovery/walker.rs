//! Directory walker for file discovery
//!
//! Yields every entry under the project root as a path relative to it, in a
//! stable order.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{DiscoveryError, Result};

/// Streaming enumeration of a project directory
pub struct FileDiscovery {
    walker: walkdir::IntoIter,
    root: PathBuf,
}

impl FileDiscovery {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(DiscoveryError::PathNotFound(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(Self {
            walker,
            root: root.to_path_buf(),
        })
    }

    fn relative(&self, entry: &DirEntry) -> Option<PathBuf> {
        entry
            .path()
            .strip_prefix(&self.root)
            .ok()
            .map(Path::to_path_buf)
    }
}

impl Iterator for FileDiscovery {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if let Some(path) = self.relative(&entry) {
                        return Some(path);
                    }
                }
                Err(e) => {
                    // Log walk errors but continue
                    log::warn!("Walk error: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yields_relative_sorted_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/inner.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();

        let entries: Vec<PathBuf> = FileDiscovery::new(dir.path()).unwrap().collect();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b"),
                Path::new("b").join("inner.txt"),
            ]
        );
    }

    #[test]
    fn test_missing_root() {
        assert!(matches!(
            FileDiscovery::new(Path::new("/no/such/project")),
            Err(DiscoveryError::PathNotFound(_))
        ));
    }
}
