use serde::{Deserialize, Serialize};

/// Which container a group is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    /// The container the aggregate was read from; keeps its file-level preamble
    Original,

    /// A freshly created container with re-synthesized scaffolding
    New,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Original => "original",
            GroupRole::New => "new",
        }
    }
}

/// Turns a set of declaration units plus scaffolding into final text.
///
/// Implementations must be pure: identical arguments yield byte-identical
/// output. Estimates and verification both rely on that.
pub trait Renderer {
    /// Opaque declaration unit handled by this renderer
    type Unit;

    /// Error raised when rendering fails
    type Error: std::error::Error + Send + Sync + 'static;

    /// Render `units` (in the given order) as one container of `role`
    fn render(&self, units: &[&Self::Unit], role: GroupRole) -> Result<String, Self::Error>;

    /// Exact line count of the rendered container
    fn line_count(&self, units: &[&Self::Unit], role: GroupRole) -> Result<usize, Self::Error> {
        self.render(units, role).map(|text| count_lines(&text))
    }
}

/// Number of lines in rendered text; a trailing newline does not open a new line
#[must_use]
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}
