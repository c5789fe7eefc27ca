//! Library side of the `class-splitter` binary: configuration, input
//! discovery, the per-file pipeline and run reports.

pub mod config;
pub mod discovery;
pub mod lock;
pub mod pipeline;
pub mod report;

pub use config::SplitterConfig;
pub use discovery::InputScanner;
pub use pipeline::{plan_file, process_file, run_batch, FileOutcome, SplitOptions};
pub use report::{PlanReport, SplitSummary};
