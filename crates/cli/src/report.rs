use crate::pipeline::FileOutcome;
use serde::Serialize;
use splitter_planner::GroupRole;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Totals for a `split` run
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub processed: usize,
    pub split: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
    /// New files written (or planned, on a dry run)
    pub created: Vec<PathBuf>,
    /// Files left over budget by a unit too large to move
    pub oversized: Vec<PathBuf>,
    pub files: Vec<FileOutcome>,
}

impl SplitSummary {
    pub fn from_outcomes(files: Vec<FileOutcome>) -> Self {
        let mut summary = Self {
            processed: files.len(),
            split: 0,
            planned: 0,
            unchanged: 0,
            skipped: 0,
            errors: 0,
            created: Vec::new(),
            oversized: Vec::new(),
            files: Vec::new(),
        };

        for outcome in &files {
            match outcome {
                FileOutcome::Unchanged {
                    path, oversized, ..
                } => {
                    summary.unchanged += 1;
                    if *oversized {
                        summary.oversized.push(path.clone());
                    }
                }
                FileOutcome::Split { .. } => summary.split += 1,
                FileOutcome::Planned { .. } => summary.planned += 1,
                FileOutcome::Skipped { .. } => summary.skipped += 1,
                FileOutcome::Failed { .. } => summary.errors += 1,
            }

            let dir = outcome.path().parent().map(PathBuf::from).unwrap_or_default();
            for file in outcome.files() {
                let target = dir.join(&file.file_name);
                if file.role == GroupRole::New {
                    summary.created.push(target.clone());
                }
                if file.oversized {
                    summary.oversized.push(target);
                }
            }
        }

        summary.files = files;
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for outcome in &self.files {
            let path = outcome.path().display();
            let _ = match outcome {
                FileOutcome::Unchanged {
                    lines, oversized, ..
                } => {
                    let note = if *oversized { ", over budget" } else { "" };
                    writeln!(out, "unchanged {path} ({lines} lines{note})")
                }
                FileOutcome::Split { files, .. } => {
                    writeln!(out, "split     {path} -> {}", file_list(files))
                }
                FileOutcome::Planned { files, .. } => {
                    writeln!(out, "would split {path} -> {}", file_list(files))
                }
                FileOutcome::Skipped { reason, .. } => writeln!(out, "skipped   {path}: {reason}"),
                FileOutcome::Failed { error, .. } => writeln!(out, "error     {path}: {error}"),
            };
        }

        for path in &self.oversized {
            let _ = writeln!(out, "warning: {} is over budget", path.display());
        }

        let _ = writeln!(
            out,
            "Processed {} file(s): {} split, {} planned, {} unchanged, {} skipped, {} error(s)",
            self.processed, self.split, self.planned, self.unchanged, self.skipped, self.errors
        );
        out
    }
}

fn file_list(files: &[splitter_planner::AssembledFile]) -> String {
    files
        .iter()
        .map(|file| format!("{} ({})", file.file_name, file.lines))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One container in a `plan` report
#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub file_name: String,
    pub role: GroupRole,
    pub lines: usize,
    pub oversized: bool,
    /// Member labels in output order
    pub units: Vec<String>,
}

/// Output of the `plan` command
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub path: PathBuf,
    pub aggregate: String,
    pub budget: usize,
    pub total_lines: usize,
    /// Nothing to split
    pub noop: bool,
    pub containers: Vec<ContainerReport>,
}

impl PlanReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: `{}` has {} lines (budget {})",
            self.path.display(),
            self.aggregate,
            self.total_lines,
            self.budget
        );
        if self.noop {
            let over = self.containers.iter().any(|container| container.oversized);
            let note = if over {
                "over budget, but its only member cannot be moved"
            } else {
                "within budget, nothing to split"
            };
            let _ = writeln!(out, "{note}");
            return out;
        }

        for container in &self.containers {
            let flag = if container.oversized { " [over budget]" } else { "" };
            let _ = writeln!(
                out,
                "{} ({}, {} lines){flag}",
                container.file_name,
                container.role.as_str(),
                container.lines
            );
            for unit in &container.units {
                let _ = writeln!(out, "  {unit}");
            }
        }
        out
    }
}
