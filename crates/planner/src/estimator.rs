use crate::error::{PlannerError, Result};
use crate::render::{GroupRole, Renderer};
use crate::types::{Budget, SizeEstimate};
use once_cell::unsync::OnceCell;

/// Singleton-render cost estimates for planning.
///
/// Overheads are rendered once per role on first use and then treated as
/// constants for the rest of the run.
pub struct SizeEstimator<'r, R: Renderer> {
    renderer: &'r R,
    budget: Budget,
    original_overhead: OnceCell<usize>,
    new_overhead: OnceCell<usize>,
}

impl<'r, R: Renderer> SizeEstimator<'r, R> {
    pub fn new(renderer: &'r R, budget: Budget) -> Self {
        Self {
            renderer,
            budget,
            original_overhead: OnceCell::new(),
            new_overhead: OnceCell::new(),
        }
    }

    /// Line count of an empty container of `role`
    pub fn overhead(&self, role: GroupRole) -> Result<usize> {
        let cell = match role {
            GroupRole::Original => &self.original_overhead,
            GroupRole::New => &self.new_overhead,
        };
        cell.get_or_try_init(|| {
            let lines = self
                .renderer
                .line_count(&[], role)
                .map_err(PlannerError::render)?;
            log::debug!("Base overhead for {} container: {lines} lines", role.as_str());
            Ok(lines)
        })
        .copied()
    }

    /// Estimate one unit by rendering it alone in a new container
    pub fn estimate(&self, index: usize, unit: &R::Unit) -> Result<SizeEstimate> {
        let overhead = self.overhead(GroupRole::New)?;
        let total = self
            .renderer
            .line_count(&[unit], GroupRole::New)
            .map_err(PlannerError::render)?;

        if !self.budget.admits(total) {
            log::warn!(
                "Declaration unit #{index} renders to {total} lines on its own, over the {} budget; it will be placed in its own container",
                self.budget
            );
        }

        Ok(SizeEstimate {
            index,
            estimated_total_lines: total,
            incremental_cost: total.saturating_sub(overhead).max(1),
        })
    }

    /// Estimates for every unit, indexed by source position
    pub fn estimate_all(&self, units: &[R::Unit]) -> Result<Vec<SizeEstimate>> {
        units
            .iter()
            .enumerate()
            .map(|(index, unit)| self.estimate(index, unit))
            .collect()
    }
}
