use crate::language::Language;
use crate::render::CSharpRenderer;
use crate::types::{AggregateShape, DeclarationUnit, LineEnding, Scaffold};

/// A parsed source file holding exactly one splittable aggregate
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display path the file was parsed from
    pub path: String,
    pub language: Language,
    pub shape: AggregateShape,
    pub scaffold: Scaffold,

    /// Members of the aggregate in source order
    pub units: Vec<DeclarationUnit>,

    pub(crate) lines: Vec<String>,
    pub(crate) line_ending: LineEnding,
    pub(crate) trailing_newline: bool,
}

impl SourceFile {
    /// Lines in the file as read
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Renderer bound to this file's scaffolding
    #[must_use]
    pub fn renderer(&self) -> CSharpRenderer<'_> {
        CSharpRenderer::new(self)
    }

    /// Source line at `row` (0-indexed), empty when out of range
    pub(crate) fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", String::as_str)
    }
}
