//! # Splitter Syntax
//!
//! Reads a C# source file with Tree-sitter, finds its single top-level type and
//! cuts the type body into line-granular declaration units. The parsed file
//! doubles as the [`splitter_planner::Renderer`] for its own containers.
//!
//! ## Architecture
//!
//! ```text
//! Source Code (.cs)
//!     │
//!     ├──> SourceParser (Tree-sitter)
//!     │    ├─> Reject syntax errors
//!     │    ├─> Collect usings and namespace chain (scaffold)
//!     │    └─> Require exactly one splittable type (class/struct/interface/record)
//!     │
//!     ├──> Unit extraction
//!     │    ├─> One unit per member, leading comments attached
//!     │    └─> Blank-line gaps remembered for rendering
//!     │
//!     └──> CSharpRenderer
//!          ├─> Original: file text around the body, header made `partial`
//!          └─> New: usings + namespaces + `partial` header + units
//! ```
//!
//! ## Example
//!
//! ```rust
//! use splitter_syntax::parse_source;
//!
//! let code = "class Greeter\n{\n    void Hello() { }\n\n    void Bye() { }\n}\n";
//! let file = parse_source(code, "Greeter.cs").unwrap();
//! assert_eq!(file.units.len(), 2);
//! assert_eq!(file.shape.name, "Greeter");
//! ```

mod error;
mod language;
mod parser;
mod render;
mod source;
mod types;

pub use error::{Result, SyntaxError};
pub use language::Language;
pub use parser::{parse_file, parse_source, SourceParser};
pub use render::CSharpRenderer;
pub use source::SourceFile;
pub use types::{
    AggregateShape, DeclarationUnit, LineEnding, NamespaceScope, RegionDirective, Scaffold,
};
