use serde::{Deserialize, Serialize};

/// One top-level member of the aggregate, with its attached comments.
///
/// Units are line-granular: `text` is the exact source lines
/// `first_line..=last_line` (1-indexed) without line terminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationUnit {
    /// Position in source order
    pub index: usize,

    /// Tree-sitter node kind of the member (`method_declaration`, ...)
    pub kind: String,

    /// Member name when one can be read off the syntax tree
    pub name: Option<String>,

    /// First source line (1-indexed), including leading comments
    pub first_line: usize,

    /// Last source line (1-indexed, inclusive)
    pub last_line: usize,

    /// Blank lines that preceded the unit in the source
    pub leading_blank_lines: usize,

    /// Verbatim source lines, joined with `\n`
    pub text: String,

    /// Type-body `#region` / `#endregion` lines, as line offsets into `text`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<(usize, RegionDirective)>,
}

impl DeclarationUnit {
    /// Number of source lines covered by the unit
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.last_line.saturating_sub(self.first_line) + 1
    }

    /// Short label for reports: name if known, otherwise the node kind
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.kind)
    }
}

/// A `#region` or `#endregion` line directly inside the type body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionDirective {
    Open,
    Close,
}

impl RegionDirective {
    /// Classify a source line; `# region` with inner spaces is accepted
    pub fn from_line(line: &str) -> Option<Self> {
        let rest = line.trim_start().strip_prefix('#')?.trim_start();
        let word_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        match &rest[..word_end] {
            "region" => Some(Self::Open),
            "endregion" => Some(Self::Close),
            _ => None,
        }
    }
}

/// Line terminator used by the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Signature of the aggregate and where it sits in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateShape {
    pub name: String,

    /// `class`, `struct`, `interface`, `record`, `record struct`, ...
    pub keyword: String,

    /// Modifiers other than `partial`, in source order
    pub modifiers: Vec<String>,

    /// `<T, U>` with whitespace collapsed, if generic
    pub type_parameters: Option<String>,

    /// Whether the declaration already carries `partial`
    pub is_partial: bool,

    /// Leading whitespace of the declaration's first line
    pub indent: String,

    /// Row (0-indexed) where the declaration starts, attributes included
    pub(crate) start_row: usize,

    /// Row of the body's opening brace
    pub(crate) open_row: usize,

    /// Row of the body's closing brace
    pub(crate) close_row: usize,

    /// Row and byte column of the type keyword
    pub(crate) keyword_at: (usize, usize),
}

impl AggregateShape {
    /// Header for a freshly created container
    #[must_use]
    pub fn partial_header(&self) -> String {
        let mut header = self.indent.clone();
        for modifier in &self.modifiers {
            header.push_str(modifier);
            header.push(' ');
        }
        header.push_str("partial ");
        header.push_str(&self.keyword);
        header.push(' ');
        header.push_str(&self.name);
        if let Some(params) = &self.type_parameters {
            header.push_str(params);
        }
        header
    }
}

/// One enclosing namespace, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceScope {
    pub name: String,

    /// `namespace X;` rather than a braced block
    pub file_scoped: bool,

    /// Leading whitespace of the `namespace` line
    pub indent: String,

    /// Verbatim `using` / `extern alias` lines declared directly inside this namespace
    pub usings: Vec<String>,
}

/// Everything a new container needs to re-declare before the type header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaffold {
    /// Verbatim file-level `extern alias` and non-global `using` lines
    pub usings: Vec<String>,

    /// Enclosing namespaces, outermost first
    pub namespaces: Vec<NamespaceScope>,
}
