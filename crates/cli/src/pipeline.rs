use crate::lock::DirectoryLock;
use crate::report::{ContainerReport, PlanReport};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use splitter_planner::{assemble, AssembledFile, Budget, DistributionEngine, GroupRole, OutputNaming};
use splitter_syntax::{parse_file, SourceFile, SyntaxError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// How each input should be handled
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    pub budget: Budget,
    /// Plan and report without writing anything
    pub dry_run: bool,
}

/// Result of processing one input file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Left untouched: within budget, or over it with a single member that cannot move
    Unchanged {
        path: PathBuf,
        lines: usize,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        oversized: bool,
    },
    /// Written as several partial files
    Split { path: PathBuf, files: Vec<AssembledFile> },
    /// Would be split (dry run)
    Planned { path: PathBuf, files: Vec<AssembledFile> },
    /// Not a candidate for splitting
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unchanged { path, .. }
            | Self::Split { path, .. }
            | Self::Planned { path, .. }
            | Self::Skipped { path, .. }
            | Self::Failed { path, .. } => path,
        }
    }

    /// Containers produced or planned for this input
    pub fn files(&self) -> &[AssembledFile] {
        match self {
            Self::Split { files, .. } | Self::Planned { files, .. } => files,
            _ => &[],
        }
    }
}

/// Split one file, turning every error into an outcome
pub fn process_file(path: &Path, options: &SplitOptions) -> FileOutcome {
    match split_file(path, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            let path = path.to_path_buf();
            match err.downcast_ref::<SyntaxError>() {
                Some(syntax) if syntax.is_skip() => {
                    log::info!("Skipping {}: {syntax}", path.display());
                    FileOutcome::Skipped {
                        path,
                        reason: syntax.to_string(),
                    }
                }
                _ => {
                    log::error!("{}: {err:#}", path.display());
                    FileOutcome::Failed {
                        path,
                        error: format!("{err:#}"),
                    }
                }
            }
        }
    }
}

fn split_file(path: &Path, options: &SplitOptions) -> Result<FileOutcome> {
    let source = read_source(path)?;
    let renderer = source.renderer();
    let engine = DistributionEngine::new(&renderer, options.budget);
    let plan = engine
        .plan(&source.units)
        .with_context(|| format!("Failed to plan {}", path.display()))?;

    if plan.is_noop() {
        let oversized = plan.original().is_some_and(|group| group.oversized);
        if oversized {
            log::warn!(
                "{} stays over {} ({} lines): its only member cannot be moved",
                path.display(),
                options.budget,
                source.line_count()
            );
        } else {
            log::debug!(
                "{} is within {} ({} lines)",
                path.display(),
                options.budget,
                source.line_count()
            );
        }
        return Ok(FileOutcome::Unchanged {
            path: path.to_path_buf(),
            lines: source.line_count(),
            oversized,
        });
    }

    let (dir, naming) = destination(path)?;

    if options.dry_run {
        let existing = sibling_names(&dir)?;
        let files = assemble(
            &plan,
            &renderer,
            &source.units,
            &naming,
            existing.iter().map(String::as_str),
        )?;
        return Ok(FileOutcome::Planned {
            path: path.to_path_buf(),
            files,
        });
    }

    let _lock = DirectoryLock::acquire(&dir)?;
    let existing = sibling_names(&dir)?;
    let files = assemble(
        &plan,
        &renderer,
        &source.units,
        &naming,
        existing.iter().map(String::as_str),
    )?;
    write_containers(&dir, &files)?;

    log::info!(
        "Split {} into {} files",
        path.display(),
        files.len()
    );
    Ok(FileOutcome::Split {
        path: path.to_path_buf(),
        files,
    })
}

/// Plan one file without writing, for the `plan` command
pub fn plan_file(path: &Path, budget: Budget) -> Result<PlanReport> {
    let source = read_source(path)?;
    let renderer = source.renderer();
    let plan = DistributionEngine::new(&renderer, budget).plan(&source.units)?;
    let (dir, naming) = destination(path)?;
    let existing = sibling_names(&dir)?;
    let files = assemble(
        &plan,
        &renderer,
        &source.units,
        &naming,
        existing.iter().map(String::as_str),
    )?;

    let containers = files
        .iter()
        .map(|file| ContainerReport {
            file_name: file.file_name.clone(),
            role: file.role,
            lines: file.lines,
            oversized: file.oversized,
            units: file
                .units
                .iter()
                .filter_map(|&index| source.units.get(index))
                .map(|unit| unit.label().to_string())
                .collect(),
        })
        .collect();

    Ok(PlanReport {
        path: path.to_path_buf(),
        aggregate: source.shape.name.clone(),
        budget: budget.lines(),
        total_lines: source.line_count(),
        noop: plan.is_noop(),
        containers,
    })
}

fn read_source(path: &Path) -> Result<SourceFile> {
    Ok(parse_file(path)?)
}

/// Directory that receives the containers, plus the naming scheme for them
fn destination(path: &Path) -> Result<(PathBuf, OutputNaming)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?;
    let naming = OutputNaming::from_file_name(file_name)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, naming))
}

fn sibling_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Write new containers first and the original last.
///
/// Each write stands alone: a failure leaves earlier files in place and the
/// original untouched, so no unit is lost.
fn write_containers(dir: &Path, files: &[AssembledFile]) -> Result<()> {
    let (originals, new): (Vec<_>, Vec<_>) =
        files.iter().partition(|file| file.role == GroupRole::Original);

    for file in new {
        let target = dir.join(&file.file_name);
        let mut handle = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        handle
            .write_all(file.text.as_bytes())
            .with_context(|| format!("Failed to write {}", target.display()))?;
        log::debug!("Wrote {} ({} lines)", target.display(), file.lines);
    }

    for file in originals {
        let target = dir.join(&file.file_name);
        fs::write(&target, &file.text)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        log::debug!("Rewrote {} ({} lines)", target.display(), file.lines);
    }

    Ok(())
}

/// Process every input on the blocking pool, at most `jobs` at a time.
///
/// Outcomes come back in input order.
pub async fn run_batch(inputs: Vec<PathBuf>, options: SplitOptions, jobs: usize) -> Vec<FileOutcome> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut set = JoinSet::new();

    for (position, path) in inputs.iter().cloned().enumerate() {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        set.spawn_blocking(move || {
            let _permit = permit;
            (position, process_file(&path, &options))
        });
    }

    let mut outcomes: Vec<Option<FileOutcome>> = vec![None; inputs.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((position, outcome)) => outcomes[position] = Some(outcome),
            Err(err) => log::error!("Worker task failed: {err}"),
        }
    }

    outcomes
        .into_iter()
        .zip(inputs)
        .map(|(outcome, path)| {
            outcome.unwrap_or_else(|| FileOutcome::Failed {
                path,
                error: "worker task failed".to_string(),
            })
        })
        .collect()
}
