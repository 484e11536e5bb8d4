//! File locator: resolves a recorded source path to an actual file,
//! searching a fallback root when the recorded path has gone stale.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::DEFAULT_SEARCH_DEPTH;

/// Resolves source files, with a bounded-depth fallback search.
#[derive(Debug, Clone)]
pub struct FileLocator {
    root: PathBuf,
    max_depth: usize,
}

impl FileLocator {
    /// Create a locator searching under `root` with the default depth.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Override the maximum search depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve `expected` to an existing file.
    ///
    /// Returns the expected path untouched when it exists. Otherwise searches
    /// the fallback root recursively, matching file names case-insensitively.
    /// Multiple matches resolve to the most recently modified one. `None`
    /// means the file could not be found anywhere.
    pub fn resolve(&self, expected: &Path) -> Option<PathBuf> {
        if expected.is_file() {
            return Some(expected.to_path_buf());
        }

        let file_name = expected.file_name()?.to_str()?;
        log::info!(
            "{} not at recorded path, searching under {}",
            file_name,
            self.root.display()
        );

        if !self.root.is_dir() {
            log::warn!("Fallback root does not exist: {}", self.root.display());
            return None;
        }

        let wanted = file_name.to_lowercase();
        let mut matches = Vec::new();
        self.search(&self.root, &wanted, 0, &mut matches);

        if matches.is_empty() {
            log::warn!("File not found: {}", file_name);
            return None;
        }

        if matches.len() > 1 {
            // Newest modification time wins; ties keep the first encountered.
            matches.sort_by_key(|(_, modified)| std::cmp::Reverse(*modified));
            log::info!(
                "Multiple matches for {}, using newest: {}",
                file_name,
                matches[0].0.display()
            );
        } else {
            log::info!("Found via fallback search: {}", matches[0].0.display());
        }

        Some(matches.remove(0).0)
    }

    fn search(
        &self,
        dir: &Path,
        wanted: &str,
        depth: usize,
        matches: &mut Vec<(PathBuf, SystemTime)>,
    ) {
        // The depth bound guarantees termination on pathological trees.
        if depth >= self.max_depth {
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("Skipping unreadable directory {}: {}", dir.display(), err);
                return;
            },
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                self.search(&path, wanted, depth + 1, matches);
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.to_lowercase() == wanted)
            {
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                matches.push((path, modified));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn touch(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(b"x").unwrap();
    }

    #[test]
    fn test_existing_path_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("0123.indd");
        touch(&target);

        // Root deliberately empty; the expected path alone must resolve.
        let empty = tempfile::tempdir().unwrap();
        let locator = FileLocator::new(empty.path());
        assert_eq!(locator.resolve(&target), Some(target));
    }

    #[test]
    fn test_fallback_finds_nested_file() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("2024").join("herbst");
        fs::create_dir_all(&nested).unwrap();
        let target = nested.join("0123.indd");
        touch(&target);

        let locator = FileLocator::new(root.path());
        let resolved = locator.resolve(Path::new("/gone/0123.indd"));
        assert_eq!(resolved, Some(target));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("Seite_0123.INDD");
        touch(&target);

        let locator = FileLocator::new(root.path());
        let resolved = locator.resolve(Path::new("/gone/seite_0123.indd"));
        assert_eq!(resolved, Some(target));
    }

    #[test]
    fn test_depth_bound_is_honored() {
        let root = tempfile::tempdir().unwrap();
        // Depth 3 lists root (0) and two nested levels (1, 2); a file three
        // directories down sits at depth 3 and must not be found.
        let deep = root.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        touch(&deep.join("0123.indd"));

        let locator = FileLocator::new(root.path());
        assert_eq!(locator.resolve(Path::new("/gone/0123.indd")), None);

        let wider = FileLocator::new(root.path()).with_max_depth(4);
        assert!(wider.resolve(Path::new("/gone/0123.indd")).is_some());
    }

    #[test]
    fn test_newest_match_wins() {
        let root = tempfile::tempdir().unwrap();
        let old_dir = root.path().join("old");
        let new_dir = root.path().join("new");
        fs::create_dir_all(&old_dir).unwrap();
        fs::create_dir_all(&new_dir).unwrap();

        let older = old_dir.join("0123.indd");
        let newer = new_dir.join("0123.indd");
        touch(&older);
        touch(&newer);

        let base = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let set_mtime = |path: &Path, time: SystemTime| {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(time)
                .unwrap();
        };
        set_mtime(&older, base);
        set_mtime(&newer, base + std::time::Duration::from_secs(3600));

        let locator = FileLocator::new(root.path());
        assert_eq!(locator.resolve(Path::new("/gone/0123.indd")), Some(newer));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let root = tempfile::tempdir().unwrap();
        let locator = FileLocator::new(root.path());
        assert_eq!(locator.resolve(Path::new("/gone/0123.indd")), None);
    }
}
