//! # Splitter Planner
//!
//! Size-aware distribution of an oversized aggregate's declaration units across
//! several partial containers, each kept under a line budget.
//!
//! ## Architecture
//!
//! ```text
//! Declaration units (source order)
//!     │
//!     ├──> SizeEstimator
//!     │    ├─> Render empty containers once per role (overhead)
//!     │    └─> Render each unit alone (estimate, cached)
//!     │
//!     ├──> DistributionEngine
//!     │    ├─> Sequential fit, verified by a fresh render
//!     │    ├─> Best-fit filler from later units when the next one does not fit
//!     │    └─> Oversized units isolated in their own container
//!     │
//!     └──> assemble
//!          ├─> Original group keeps the original name
//!          └─> New groups get `{base}{N}{ext}` past existing siblings
//! ```
//!
//! The planner never touches the filesystem. The host language is supplied
//! through the [`Renderer`] trait.
//!
//! ## Example
//!
//! ```rust
//! use splitter_planner::{Budget, DistributionEngine, GroupRole, Renderer};
//! use std::convert::Infallible;
//!
//! struct Lines;
//!
//! impl Renderer for Lines {
//!     type Unit = usize;
//!     type Error = Infallible;
//!
//!     fn render(&self, units: &[&usize], _role: GroupRole) -> Result<String, Infallible> {
//!         let body: usize = units.iter().map(|unit| **unit).sum();
//!         Ok("line\n".repeat(2 + body))
//!     }
//! }
//!
//! let engine = DistributionEngine::new(&Lines, Budget::new(10).unwrap());
//! let plan = engine.plan(&[4, 4, 4]).unwrap();
//! assert_eq!(plan.groups.len(), 2);
//! ```

mod assemble;
mod engine;
mod error;
mod estimator;
mod naming;
mod render;
mod types;

pub use assemble::{assemble, AssembledFile};
pub use engine::DistributionEngine;
pub use error::{PlannerError, Result};
pub use estimator::SizeEstimator;
pub use naming::{allocate_names, next_available_suffix, OutputNaming};
pub use render::{count_lines, GroupRole, Renderer};
pub use types::{Budget, Group, Plan, SizeEstimate};
