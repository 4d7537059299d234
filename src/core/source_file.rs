//! Source file representation.

use std::path::{Path, PathBuf};

use super::{Language, Result};

/// A source file with its content loaded.
///
/// Contents are read once per file and shared immutably with every analyzer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,
    /// Detected language.
    pub language: Language,
    /// File content as bytes.
    pub content: Vec<u8>,
}

impl SourceFile {
    /// Load a source file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let language = Language::detect(path).ok_or_else(|| super::Error::UnsupportedLanguage {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read(path).map_err(|_| super::Error::UnreadableFile {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            language,
            content,
        })
    }

    /// Create from existing content.
    pub fn from_content(path: impl Into<PathBuf>, language: Language, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            language,
            content,
        }
    }

    /// Get content as string (lossy conversion).
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Count total lines.
    pub fn total_lines(&self) -> usize {
        self.content_str().lines().count()
    }

    /// Extract the window of `radius` lines around a 1-based line number.
    ///
    /// The anchor line itself is included. Out-of-range portions are clipped.
    pub fn context_window(&self, line: u32, radius: u32) -> String {
        let content = self.content_str();
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() || line == 0 {
            return String::new();
        }
        let idx = (line as usize).saturating_sub(1).min(lines.len() - 1);
        let start = idx.saturating_sub(radius as usize);
        let end = (idx + radius as usize + 1).min(lines.len());
        lines[start..end].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_from_content() {
        let content = b"def main():\n    print('hello')\n".to_vec();
        let file = SourceFile::from_content("test.py", Language::Python, content);

        assert_eq!(file.language, Language::Python);
        assert_eq!(file.total_lines(), 2);
    }

    #[test]
    fn test_context_window_middle() {
        let content = (1..=20)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let file = SourceFile::from_content("t.py", Language::Python, content.into_bytes());

        let window = file.context_window(10, 5);
        let lines: Vec<&str> = window.lines().collect();
        assert_eq!(lines.first(), Some(&"line5"));
        assert_eq!(lines.last(), Some(&"line15"));
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_context_window_clips_at_boundaries() {
        let content = b"a\nb\nc\n".to_vec();
        let file = SourceFile::from_content("t.py", Language::Python, content);

        assert_eq!(file.context_window(1, 5), "a\nb\nc");
        assert_eq!(file.context_window(3, 1), "b\nc");
    }

    #[test]
    fn test_context_window_empty_file() {
        let file = SourceFile::from_content("t.py", Language::Python, Vec::new());
        assert_eq!(file.context_window(1, 5), "");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "TODO").unwrap();
        assert!(SourceFile::load(&path).is_err());
    }
}
