use crate::error::{PlannerError, Result};
use crate::naming::{allocate_names, OutputNaming};
use crate::render::{count_lines, GroupRole, Renderer};
use crate::types::Plan;
use serde::{Deserialize, Serialize};

/// Final text for one output container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledFile {
    /// File name inside the destination directory
    pub file_name: String,
    pub role: GroupRole,
    /// Source-order indices of the units in this container
    pub units: Vec<usize>,
    pub lines: usize,
    pub oversized: bool,
    #[serde(skip)]
    pub text: String,
}

/// Render every group of `plan` and name its container.
///
/// The original group keeps the original file name; new groups get numbered
/// names after every `{base}{N}{ext}` already in `existing`. The renderer is
/// called again for each group, so the text reflects the final grouping.
pub fn assemble<'a, R, I>(
    plan: &Plan,
    renderer: &R,
    units: &[R::Unit],
    naming: &OutputNaming,
    existing: I,
) -> Result<Vec<AssembledFile>>
where
    R: Renderer,
    I: IntoIterator<Item = &'a str>,
{
    let mut new_names = allocate_names(existing, naming, plan.new_groups().count())?.into_iter();

    let mut files = Vec::with_capacity(plan.groups.len());
    for group in &plan.groups {
        let file_name = match group.role {
            GroupRole::Original => naming.original_name(),
            GroupRole::New => new_names.next().ok_or_else(|| {
                PlannerError::invalid_plan("more new groups than allocated names")
            })?,
        };

        let members: Vec<&R::Unit> = group
            .units
            .iter()
            .map(|&index| {
                units.get(index).ok_or_else(|| {
                    PlannerError::invalid_plan(format!("unit {index} is out of range"))
                })
            })
            .collect::<Result<_>>()?;
        let text = renderer
            .render(&members, group.role)
            .map_err(PlannerError::render)?;
        let lines = count_lines(&text);

        files.push(AssembledFile {
            file_name,
            role: group.role,
            units: group.units.clone(),
            lines,
            oversized: !plan.budget.admits(lines),
            text,
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DistributionEngine;
    use crate::types::Budget;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;

    /// Renders each unit as its own line with a role header
    struct TagRenderer;

    impl Renderer for TagRenderer {
        type Unit = &'static str;
        type Error = Infallible;

        fn render(&self, units: &[&&'static str], role: GroupRole) -> std::result::Result<String, Infallible> {
            let mut text = format!("// {}\n", role.as_str());
            for unit in units {
                text.push_str(unit);
                text.push('\n');
            }
            Ok(text)
        }
    }

    #[test]
    fn test_assemble_names_and_texts() {
        let units = ["a", "b", "c", "d", "e"];
        let engine = DistributionEngine::new(&TagRenderer, Budget::new(3).unwrap());
        let plan = engine.plan(&units).unwrap();
        let naming = OutputNaming::from_file_name("Widget.cs").unwrap();

        let files = assemble(&plan, &TagRenderer, &units, &naming, ["Widget.cs", "Widget2.cs"]).unwrap();

        let names: Vec<_> = files.iter().map(|file| file.file_name.as_str()).collect();
        assert_eq!(names, vec!["Widget.cs", "Widget3.cs", "Widget4.cs"]);
        assert_eq!(files[0].text, "// original\na\nb\n");
        assert_eq!(files[1].text, "// new\nc\nd\n");
        assert_eq!(files[2].text, "// new\ne\n");
        assert_eq!(files[2].lines, 2);
        assert!(files.iter().all(|file| !file.oversized));
    }

    #[test]
    fn test_noop_plan_assembles_single_original() {
        let units = ["a"];
        let engine = DistributionEngine::new(&TagRenderer, Budget::new(10).unwrap());
        let plan = engine.plan(&units).unwrap();
        let naming = OutputNaming::from_file_name("Widget.cs").unwrap();

        let files = assemble(&plan, &TagRenderer, &units, &naming, []).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].role, GroupRole::Original);
        assert_eq!(files[0].file_name, "Widget.cs");
    }
}
