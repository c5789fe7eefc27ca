//! Size-aware distribution of declaration units.
//!
//! The sweep walks units in source order and packs them into the group under
//! construction as long as the renderer confirms the budget holds. When the
//! next unit does not fit, the best-fitting later unit (by estimate) is tried
//! as a filler before the group is closed. Every placement is verified with a
//! fresh render; estimates only pick candidates.

use crate::error::{PlannerError, Result};
use crate::estimator::SizeEstimator;
use crate::render::{GroupRole, Renderer};
use crate::types::{Budget, Group, Plan, SizeEstimate};
use std::collections::BTreeSet;

/// Plans how the units of one aggregate are spread over output containers
pub struct DistributionEngine<'r, R: Renderer> {
    renderer: &'r R,
    budget: Budget,
}

/// Mutable state threaded through the sweep
#[derive(Debug)]
struct Sweep {
    /// Unplaced units, smallest source index first
    pending: BTreeSet<usize>,
    /// Finalized groups in plan order
    groups: Vec<Group>,
    /// Group under construction
    current: Group,
    new_overhead: usize,
}

impl Sweep {
    fn new(unit_count: usize, original_overhead: usize, new_overhead: usize) -> Self {
        Self {
            pending: (0..unit_count).collect(),
            groups: Vec::new(),
            current: Group::empty(GroupRole::Original, original_overhead),
            new_overhead,
        }
    }

    fn next_pending(&self) -> Option<usize> {
        self.pending.first().copied()
    }

    fn commit(&mut self, index: usize, lines: usize) {
        self.pending.remove(&index);
        self.current.units.push(index);
        self.current.actual_lines = lines;
    }

    /// Close the current group and open an empty new one.
    ///
    /// The original group is always kept; an empty new group is dropped.
    fn finalize_current(&mut self) {
        let fresh = Group::empty(GroupRole::New, self.new_overhead);
        let done = std::mem::replace(&mut self.current, fresh);
        if done.role == GroupRole::Original || !done.is_empty() {
            log::debug!(
                "Finalized {} group with {} units ({} lines)",
                done.role.as_str(),
                done.len(),
                done.actual_lines
            );
            self.groups.push(done);
        }
    }

    fn finish(mut self, budget: Budget) -> Plan {
        self.finalize_current();
        Plan {
            groups: self.groups,
            budget,
        }
    }
}

impl<'r, R: Renderer> DistributionEngine<'r, R> {
    pub fn new(renderer: &'r R, budget: Budget) -> Self {
        Self { renderer, budget }
    }

    #[must_use]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Build the plan for `units` (given in source order).
    ///
    /// When the whole aggregate already renders within budget the plan is a
    /// single original group and no estimates are computed.
    pub fn plan(&self, units: &[R::Unit]) -> Result<Plan> {
        let all: Vec<&R::Unit> = units.iter().collect();
        let whole = self.measure(&all, GroupRole::Original)?;
        if self.budget.admits(whole) {
            log::debug!(
                "Aggregate renders to {whole} lines, within the {} budget",
                self.budget
            );
            return Ok(Plan {
                groups: vec![Group {
                    role: GroupRole::Original,
                    units: (0..units.len()).collect(),
                    actual_lines: whole,
                    oversized: false,
                }],
                budget: self.budget,
            });
        }

        let estimator = SizeEstimator::new(self.renderer, self.budget);
        let estimates = estimator.estimate_all(units)?;
        let mut sweep = Sweep::new(
            units.len(),
            estimator.overhead(GroupRole::Original)?,
            estimator.overhead(GroupRole::New)?,
        );

        while let Some(next) = sweep.next_pending() {
            self.step(&mut sweep, units, &estimates, next)?;
        }

        let plan = sweep.finish(self.budget);
        plan.validate(units.len())?;
        log::debug!(
            "Planned {} units of a {whole}-line aggregate into {} containers",
            units.len(),
            plan.groups.len()
        );
        Ok(plan)
    }

    /// One decision of the sweep; always removes at least one unit from `pending`
    fn step(
        &self,
        sweep: &mut Sweep,
        units: &[R::Unit],
        estimates: &[SizeEstimate],
        next: usize,
    ) -> Result<()> {
        let lines = self.measure_with(units, &sweep.current, next)?;
        if self.budget.admits(lines) {
            sweep.commit(next, lines);
            return Ok(());
        }

        let remaining = self
            .budget
            .lines()
            .saturating_sub(sweep.current.actual_lines);
        if let Some(filler) = select_filler(estimates, &sweep.pending, next, remaining) {
            let lines = self.measure_with(units, &sweep.current, filler)?;
            if self.budget.admits(lines) {
                log::debug!(
                    "Unit #{filler} fills {} group ahead of #{next} ({lines} lines)",
                    sweep.current.role.as_str()
                );
                sweep.commit(filler, lines);
                return Ok(());
            }
            log::debug!("Filler #{filler} rejected on verification ({lines} lines)");
        }

        let alone = self.measure(&[&units[next]], GroupRole::New)?;
        if sweep.current.is_empty() && !self.budget.admits(alone) {
            // Fits nowhere and nothing fits beside it: it stays alone where it is.
            self.warn_oversized(next, lines);
            sweep.commit(next, lines);
            sweep.current.oversized = true;
            sweep.finalize_current();
            return Ok(());
        }

        sweep.finalize_current();
        sweep.commit(next, alone);
        if !self.budget.admits(alone) {
            self.warn_oversized(next, alone);
            sweep.current.oversized = true;
            sweep.finalize_current();
        }

        Ok(())
    }

    fn measure(&self, units: &[&R::Unit], role: GroupRole) -> Result<usize> {
        self.renderer
            .line_count(units, role)
            .map_err(PlannerError::render)
    }

    /// Render `group` with `extra` appended
    fn measure_with(&self, units: &[R::Unit], group: &Group, extra: usize) -> Result<usize> {
        let candidate: Vec<&R::Unit> = group
            .units
            .iter()
            .chain(std::iter::once(&extra))
            .map(|&index| &units[index])
            .collect();
        self.measure(&candidate, group.role)
    }

    fn warn_oversized(&self, index: usize, lines: usize) {
        log::warn!(
            "Declaration unit #{index} needs {lines} lines even alone; budget of {} cannot be honored for it",
            self.budget
        );
    }
}

/// Pick the pending unit (other than `next`) with the largest estimated cost
/// that still fits `remaining`. Ties go to the earliest source index.
fn select_filler(
    estimates: &[SizeEstimate],
    pending: &BTreeSet<usize>,
    next: usize,
    remaining: usize,
) -> Option<usize> {
    let mut best: Option<&SizeEstimate> = None;
    for &index in pending {
        if index == next {
            continue;
        }
        let estimate = &estimates[index];
        if estimate.incremental_cost > remaining {
            continue;
        }
        if best.map_or(true, |current| estimate.incremental_cost > current.incremental_cost) {
            best = Some(estimate);
        }
    }
    best.map(|estimate| estimate.index)
}
