use crate::error::{PlannerError, Result};
use crate::render::GroupRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lines allowed per output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Budget(usize);

impl Budget {
    /// Default line budget when none is configured
    pub const DEFAULT_LINES: usize = 1500;

    pub fn new(lines: usize) -> Result<Self> {
        if lines == 0 {
            return Err(PlannerError::InvalidBudget(lines));
        }
        Ok(Self(lines))
    }

    #[must_use]
    pub const fn lines(self) -> usize {
        self.0
    }

    /// Whether a container of `lines` satisfies the budget
    #[must_use]
    pub const fn admits(self, lines: usize) -> bool {
        lines <= self.0
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self(Self::DEFAULT_LINES)
    }
}

impl TryFrom<usize> for Budget {
    type Error = PlannerError;

    fn try_from(lines: usize) -> Result<Self> {
        Self::new(lines)
    }
}

impl From<Budget> for usize {
    fn from(budget: Budget) -> Self {
        budget.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lines", self.0)
    }
}

/// Cached singleton rendering cost of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Position of the unit in source order
    pub index: usize,

    /// Lines of a new container holding only this unit
    pub estimated_total_lines: usize,

    /// Estimated cost of adding the unit to a container (never below 1)
    pub incremental_cost: usize,
}

/// Units destined for one output container.
///
/// `units` holds source-order indices into the unit arena the plan was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub role: GroupRole,
    pub units: Vec<usize>,

    /// Line count the renderer reported for this exact grouping
    pub actual_lines: usize,

    /// Set when a single unit could not be brought under budget
    #[serde(default)]
    pub oversized: bool,
}

impl Group {
    pub(crate) fn empty(role: GroupRole, overhead: usize) -> Self {
        Self {
            role,
            units: Vec::new(),
            actual_lines: overhead,
            oversized: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.units.contains(&index)
    }
}

/// Finalized assignment of every unit of one aggregate to output containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub groups: Vec<Group>,
    pub budget: Budget,
}

impl Plan {
    /// True when the aggregate already fits and nothing has to move
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].role == GroupRole::Original
    }

    /// The group that stays in the original container
    pub fn original(&self) -> Option<&Group> {
        self.groups
            .iter()
            .find(|group| group.role == GroupRole::Original)
    }

    /// Groups that need freshly named containers, in plan order
    pub fn new_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(|group| group.role == GroupRole::New)
    }

    /// Position of the group holding `index`, if any
    #[must_use]
    pub fn group_of(&self, index: usize) -> Option<usize> {
        self.groups.iter().position(|group| group.contains(index))
    }

    /// Groups that exceed the budget
    pub fn oversized(&self) -> impl Iterator<Item = &Group> {
        let budget = self.budget;
        self.groups
            .iter()
            .filter(move |group| !budget.admits(group.actual_lines))
    }

    /// Check that exactly one group is original and every unit is placed exactly once
    pub fn validate(&self, unit_count: usize) -> Result<()> {
        let originals = self
            .groups
            .iter()
            .filter(|group| group.role == GroupRole::Original)
            .count();
        if originals != 1 {
            return Err(PlannerError::invalid_plan(format!(
                "expected exactly one original group, found {originals}"
            )));
        }

        let mut seen = vec![false; unit_count];
        for group in &self.groups {
            for &index in &group.units {
                let Some(slot) = seen.get_mut(index) else {
                    return Err(PlannerError::invalid_plan(format!(
                        "unit {index} is out of range (aggregate has {unit_count})"
                    )));
                };
                if *slot {
                    return Err(PlannerError::invalid_plan(format!(
                        "unit {index} is placed more than once"
                    )));
                }
                *slot = true;
            }
        }

        if let Some(missing) = seen.iter().position(|placed| !placed) {
            return Err(PlannerError::invalid_plan(format!(
                "unit {missing} was never placed"
            )));
        }

        Ok(())
    }
}
