//! File set for collecting files to analyze.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use super::{Language, Result};

/// Directory names always excluded from the walk, on top of hidden
/// directories and anything gitignore already filters.
const VENDOR_DIRS: &[&str] = &["node_modules", "build", "dist", "out", "__pycache__", "venv"];

/// Whether any path component is a hidden or vendor directory.
///
/// The VCS-backed scan path applies this to tracked paths so both scan paths
/// agree on the file population.
pub fn is_vendored_or_hidden(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        (name.starts_with('.') && name.len() > 1) || VENDOR_DIRS.contains(&&*name)
    })
}

/// A set of source files under a workspace root, in deterministic order.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Root directory.
    root: PathBuf,
    /// All files in the set, sorted by path.
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Create a file set from a directory path with exclude glob patterns.
    pub fn from_path(path: impl AsRef<Path>, exclude_patterns: &[String]) -> Result<Self> {
        let root = path.as_ref().canonicalize()?;
        let exclude_set = build_globset(exclude_patterns)?;
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                entry.depth() == 0
                    || !(entry.file_type().is_some_and(|t| t.is_dir())
                        && VENDOR_DIRS.contains(&&*name))
            })
            .build();

        for entry in walker.flatten() {
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            if Language::detect(path).is_none() {
                continue;
            }

            let relative = path.strip_prefix(&root).unwrap_or(path);
            if exclude_set.is_match(relative) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        // Sort for deterministic ordering
        files.sort();

        Ok(Self { root, files })
    }

    /// Create a file set without exclude patterns.
    pub fn from_path_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path(path, &[])
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get all files in the set.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over files.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Get relative path from root.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| super::Error::config(format!("bad exclude pattern {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| super::Error::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_empty() {
        let temp = tempfile::tempdir().unwrap();
        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert!(file_set.is_empty());
        assert_eq!(file_set.len(), 0);
    }

    #[test]
    fn test_file_set_with_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.py"), "print(1)").unwrap();
        std::fs::write(temp.path().join("app.ts"), "export {}").unwrap();
        std::fs::write(temp.path().join("README.md"), "# README").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert_eq!(file_set.len(), 2);
    }

    #[test]
    fn test_file_set_skips_vendor_dirs() {
        let temp = tempfile::tempdir().unwrap();
        for dir in ["node_modules", "dist", "__pycache__", "venv"] {
            let sub = temp.path().join(dir);
            std::fs::create_dir(&sub).unwrap();
            std::fs::write(sub.join("x.js"), "// TODO hidden").unwrap();
        }
        std::fs::write(temp.path().join("kept.js"), "// TODO kept").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert_eq!(file_set.len(), 1);
        assert!(file_set.files()[0].ends_with("kept.js"));
    }

    #[test]
    fn test_file_set_skips_hidden_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let hidden = temp.path().join(".cache");
        std::fs::create_dir(&hidden).unwrap();
        std::fs::write(hidden.join("x.py"), "# TODO hidden").unwrap();
        std::fs::write(temp.path().join("kept.py"), "# TODO kept").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert_eq!(file_set.len(), 1);
    }

    #[test]
    fn test_file_set_exclude_patterns() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.py"), "x = 1").unwrap();
        std::fs::write(temp.path().join("main_test.py"), "x = 1").unwrap();

        let file_set =
            FileSet::from_path(temp.path(), &["*_test.py".to_string()]).unwrap();
        assert_eq!(file_set.len(), 1);
        assert!(file_set.files()[0].ends_with("main.py"));
    }

    #[test]
    fn test_file_set_deterministic_order() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.py"), "").unwrap();
        std::fs::write(temp.path().join("a.py"), "").unwrap();
        std::fs::write(temp.path().join("c.py"), "").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        let names: Vec<_> = file_set
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py", "c.py"]);
    }

    #[test]
    fn test_relative_path() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.py"), "").unwrap();
        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        let rel = file_set.relative_path(&file_set.files()[0]);
        assert_eq!(rel, PathBuf::from("main.py"));
    }
}
