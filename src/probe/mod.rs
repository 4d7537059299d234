//! Repository probe: VCS metadata behind a capability trait.
//!
//! The pipeline never invokes git directly. `GixProbe` answers blame and
//! bulk-search queries from the repository; `NullProbe` reports everything
//! as unavailable, which drives the scanner's sentinel-metadata and
//! filesystem-fallback paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use chrono::{DateTime, TimeZone, Utc};
use gix::ThreadSafeRepository;
use parking_lot::Mutex;
use regex::RegexSet;

use crate::core::{Error, Result};

/// Blame metadata for one line.
#[derive(Debug, Clone)]
pub struct BlameLineInfo {
    /// Full commit hash.
    pub commit: String,
    /// Commit author date.
    pub date: DateTime<Utc>,
}

/// One match from a VCS-backed bulk search.
#[derive(Debug, Clone)]
pub struct GrepMatch {
    /// Path relative to the repository root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: u32,
    /// The matching line, untrimmed.
    pub content: String,
}

/// VCS metadata capability required by the scanner.
pub trait RepositoryProbe: Send + Sync {
    /// Blame metadata for a line, or `None` when unavailable (untracked
    /// file, no VCS).
    fn blame_line(&self, file: &Path, line: u32) -> Option<BlameLineInfo>;

    /// Bulk-search tracked files whose extension is in `extensions` for
    /// lines matching any of the regex `patterns`.
    fn grep(&self, patterns: &[String], extensions: &[&str]) -> Result<Vec<GrepMatch>>;

    /// The current HEAD commit hash.
    fn current_head(&self) -> Result<String>;

    /// Whether HEAD was committed within the last `within_secs` seconds.
    fn recent_commit(&self, within_secs: u64) -> Result<bool>;
}

/// Probe for workspaces without a usable repository.
#[derive(Debug, Default)]
pub struct NullProbe;

impl RepositoryProbe for NullProbe {
    fn blame_line(&self, _file: &Path, _line: u32) -> Option<BlameLineInfo> {
        None
    }

    fn grep(&self, _patterns: &[String], _extensions: &[&str]) -> Result<Vec<GrepMatch>> {
        Err(Error::vcs("no repository"))
    }

    fn current_head(&self) -> Result<String> {
        Err(Error::vcs("no repository"))
    }

    fn recent_commit(&self, _within_secs: u64) -> Result<bool> {
        Ok(false)
    }
}

/// Gix-backed probe.
pub struct GixProbe {
    repo: ThreadSafeRepository,
    root: PathBuf,
    /// Per-file blame maps, filled lazily. One blame pass serves every
    /// candidate line in the file.
    blame_cache: Mutex<HashMap<PathBuf, Option<HashMap<u32, BlameLineInfo>>>>,
}

impl GixProbe {
    /// Open a repository at or above the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = ThreadSafeRepository::discover(path.as_ref())
            .map_err(|e| Error::vcs(format!("failed to open repository: {e}")))?;
        let root = repo
            .work_tree
            .clone()
            .ok_or_else(|| Error::vcs("not a work tree"))?;

        Ok(Self {
            repo,
            root,
            blame_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, file: &Path) -> PathBuf {
        file.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| file.to_path_buf())
    }

    fn blame_whole_file(&self, relative: &Path) -> Result<HashMap<u32, BlameLineInfo>> {
        let repo = self.repo.to_thread_local();
        let head = repo
            .head_id()
            .map_err(|e| Error::vcs(format!("failed to get HEAD: {e}")))?;

        let rel_str = relative.to_string_lossy().replace('\\', "/");
        let outcome = repo
            .blame_file(
                rel_str.as_bytes().as_bstr(),
                head,
                gix::repository::blame_file::Options::default(),
            )
            .map_err(|e| Error::vcs(format!("failed to blame {}: {e}", relative.display())))?;

        // Cache commit -> date lookups; blame entries repeat commits heavily.
        let mut commit_cache: HashMap<gix::ObjectId, DateTime<Utc>> = HashMap::new();
        let mut lines = HashMap::new();

        for (entry, _line_content) in outcome.entries_with_lines() {
            let commit_id = entry.commit_id;
            let date = *commit_cache.entry(commit_id).or_insert_with(|| {
                repo.find_commit(commit_id)
                    .ok()
                    .and_then(|c| c.author().ok().map(|a| a.seconds()))
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                    .unwrap_or_else(Utc::now)
            });
            let sha = commit_id.to_string();
            for line_num in entry.range_in_blamed_file() {
                lines.insert(
                    (line_num + 1) as u32,
                    BlameLineInfo {
                        commit: sha.clone(),
                        date,
                    },
                );
            }
        }

        Ok(lines)
    }
}

impl RepositoryProbe for GixProbe {
    fn blame_line(&self, file: &Path, line: u32) -> Option<BlameLineInfo> {
        let relative = self.relative(file);
        let mut cache = self.blame_cache.lock();
        let entry = cache
            .entry(relative.clone())
            .or_insert_with(|| self.blame_whole_file(&relative).ok());
        entry.as_ref().and_then(|map| map.get(&line).cloned())
    }

    fn grep(&self, patterns: &[String], extensions: &[&str]) -> Result<Vec<GrepMatch>> {
        let set = RegexSet::new(patterns)
            .map_err(|e| Error::config(format!("bad grep pattern: {e}")))?;

        let repo = self.repo.to_thread_local();
        let head = repo
            .head_commit()
            .map_err(|e| Error::vcs(format!("failed to get HEAD commit: {e}")))?;
        let tree = head
            .tree()
            .map_err(|e| Error::vcs(format!("failed to get HEAD tree: {e}")))?;

        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(|e| Error::vcs(format!("failed to traverse HEAD tree: {e}")))?;

        let mut matches = Vec::new();
        for record in recorder.records {
            if !record.mode.is_blob() {
                continue;
            }
            let file = PathBuf::from(record.filepath.to_str_lossy().into_owned());
            let ext = file
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());
            if !ext.is_some_and(|e| extensions.contains(&e.as_str())) {
                continue;
            }
            let Ok(blob) = repo.find_object(record.oid) else {
                continue;
            };
            let content = String::from_utf8_lossy(&blob.data).into_owned();
            for (idx, line) in content.lines().enumerate() {
                if set.is_match(line) {
                    matches.push(GrepMatch {
                        file: file.clone(),
                        line: idx as u32 + 1,
                        content: line.to_string(),
                    });
                }
            }
        }

        matches.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
        Ok(matches)
    }

    fn current_head(&self) -> Result<String> {
        let repo = self.repo.to_thread_local();
        let head = repo
            .head_id()
            .map_err(|e| Error::vcs(format!("failed to get HEAD: {e}")))?;
        Ok(head.to_string())
    }

    fn recent_commit(&self, within_secs: u64) -> Result<bool> {
        let repo = self.repo.to_thread_local();
        let head = repo
            .head_commit()
            .map_err(|e| Error::vcs(format!("failed to get HEAD commit: {e}")))?;
        let committed = head
            .time()
            .map_err(|e| Error::vcs(format!("failed to read commit time: {e}")))?
            .seconds;
        let now = Utc::now().timestamp();
        Ok(now.saturating_sub(committed) <= within_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_test_repo(path: &Path) {
        Command::new("git")
            .args(["init"])
            .current_dir(path)
            .output()
            .expect("failed to init git repo");
        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(path)
            .output()
            .expect("failed to set git email");
        Command::new("git")
            .args(["config", "user.name", "Test Author"])
            .current_dir(path)
            .output()
            .expect("failed to set git name");
    }

    fn commit_all(path: &Path, message: &str) {
        Command::new("git")
            .args(["add", "-A"])
            .current_dir(path)
            .output()
            .expect("failed to add");
        Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(path)
            .output()
            .expect("failed to commit");
    }

    #[test]
    fn test_null_probe() {
        let probe = NullProbe;
        assert!(probe.blame_line(Path::new("x.py"), 1).is_none());
        assert!(probe.grep(&["TODO".to_string()], &["py"]).is_err());
        assert!(probe.current_head().is_err());
        assert!(!probe.recent_commit(60).unwrap());
    }

    #[test]
    fn test_open_not_a_repo() {
        let temp = tempfile::tempdir().unwrap();
        assert!(GixProbe::open(temp.path()).is_err());
    }

    #[test]
    fn test_current_head_and_recent_commit() {
        let temp = tempfile::tempdir().unwrap();
        init_test_repo(temp.path());
        std::fs::write(temp.path().join("a.py"), "# TODO first\n").unwrap();
        commit_all(temp.path(), "initial");

        let probe = GixProbe::open(temp.path()).unwrap();
        let head = probe.current_head().unwrap();
        assert_eq!(head.len(), 40);
        assert!(head.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(probe.recent_commit(3600).unwrap());
    }

    #[test]
    fn test_blame_line() {
        let temp = tempfile::tempdir().unwrap();
        init_test_repo(temp.path());
        let file = temp.path().join("a.py");
        std::fs::write(&file, "# TODO fix\nx = 1\n").unwrap();
        commit_all(temp.path(), "initial");

        let probe = GixProbe::open(temp.path()).unwrap();
        let info = probe.blame_line(&file, 1).expect("line 1 must be tracked");
        assert_eq!(info.commit.len(), 40);
        assert!(probe.blame_line(&file, 99).is_none());
    }

    #[test]
    fn test_blame_untracked_file_is_none() {
        let temp = tempfile::tempdir().unwrap();
        init_test_repo(temp.path());
        std::fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        commit_all(temp.path(), "initial");
        let untracked = temp.path().join("new.py");
        std::fs::write(&untracked, "# TODO new\n").unwrap();

        let probe = GixProbe::open(temp.path()).unwrap();
        assert!(probe.blame_line(&untracked, 1).is_none());
    }

    #[test]
    fn test_grep_tracked_files() {
        let temp = tempfile::tempdir().unwrap();
        init_test_repo(temp.path());
        std::fs::write(temp.path().join("a.py"), "# TODO alpha\nx = 1\n").unwrap();
        std::fs::write(temp.path().join("b.md"), "TODO not source\n").unwrap();
        commit_all(temp.path(), "initial");
        // Untracked files are invisible to the fast path.
        std::fs::write(temp.path().join("c.py"), "# TODO untracked\n").unwrap();

        let probe = GixProbe::open(temp.path()).unwrap();
        let matches = probe
            .grep(&[r"(?i)\bTODO\b".to_string()], &["py"])
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, PathBuf::from("a.py"));
        assert_eq!(matches[0].line, 1);
        assert!(matches[0].content.contains("TODO alpha"));
    }
}
