//! Language detection and enumeration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages recognized by the debt scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Ruby,
    Php,
}

impl Language {
    /// Detect language from file path based on extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::from_extension(extension)
    }

    /// Get language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Self::Python),
            "js" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cpp" | "hpp" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            "go" => Some(Self::Go),
            "rb" => Some(Self::Ruby),
            "php" => Some(Self::Php),
            _ => None,
        }
    }

    /// All file extensions the scanner recognizes.
    pub fn all_extensions() -> &'static [&'static str] {
        &[
            "py", "js", "jsx", "ts", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rb",
            "php",
        ]
    }

    /// Get the display name for the language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::Jsx => "JSX",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TSX",
            Self::Java => "Java",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Go => "Go",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
        }
    }

    /// Check whether a line carries a comment marker for this language.
    ///
    /// PHP accepts all three marker families.
    pub fn has_comment_marker(&self, line: &str) -> bool {
        match self {
            Self::Python | Self::Ruby => line.contains('#'),
            Self::Php => line.contains('#') || line.contains("//") || has_block_marker(line),
            _ => line.contains("//") || has_block_marker(line),
        }
    }
}

fn has_block_marker(line: &str) -> bool {
    line.contains("/*") || line.trim_start().starts_with('*')
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
