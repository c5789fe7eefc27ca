use crate::error::{Result, SyntaxError};
use std::path::Path;

/// Source language of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "cs" => Language::CSharp,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Unknown => "unknown",
        }
    }

    /// File extensions handled for this language, without the dot
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::CSharp => &["cs"],
            Language::Unknown => &[],
        }
    }

    /// Check if types of this language can be declared across several files
    pub fn supports_split(self) -> bool {
        matches!(self, Language::CSharp)
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::CSharp => Ok(tree_sitter_c_sharp::LANGUAGE.into()),
            Language::Unknown => Err(SyntaxError::unsupported_language(self.as_str())),
        }
    }
}
