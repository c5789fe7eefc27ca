use thiserror::Error;

/// Result type for parsing and rendering
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Errors that can occur while reading an aggregate out of a source file
#[derive(Error, Debug)]
pub enum SyntaxError {
    /// The source is not syntactically valid
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No splitter exists for this language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The file declares no type that can be split
    #[error("No splittable type declaration found")]
    NoAggregate,

    /// The file declares more than one top-level type
    #[error("Expected exactly one top-level type, found {}: {}", .0.len(), .0.join(", "))]
    MultipleAggregates(Vec<String>),

    /// Members share lines with each other's braces in a way that cannot be split by line
    #[error("Unsupported layout: {0}")]
    UnsupportedLayout(String),

    /// The type cannot be declared across several files
    #[error("Type cannot be split: {0}")]
    Unsplittable(String),

    /// Empty content
    #[error("Empty content provided")]
    EmptyContent,

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl SyntaxError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an unsupported layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::UnsupportedLayout(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Whether the input should be skipped rather than counted as a failure
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::NoAggregate | Self::MultipleAggregates(_) | Self::Unsplittable(_)
        )
    }
}
