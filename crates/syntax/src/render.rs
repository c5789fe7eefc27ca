use crate::source::SourceFile;
use crate::types::{DeclarationUnit, RegionDirective};
use splitter_planner::{GroupRole, Renderer};
use std::collections::HashSet;
use std::convert::Infallible;

/// Renders containers of one C# source file.
///
/// The original container reuses the file's own text around the type body;
/// new containers re-declare usings, namespaces and a bare `partial` header.
pub struct CSharpRenderer<'a> {
    source: &'a SourceFile,
}

impl<'a> CSharpRenderer<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self { source }
    }

    fn push_original_head(&self, out: &mut Vec<String>) {
        let shape = &self.source.shape;
        for row in 0..shape.start_row {
            out.push(self.source.line(row).to_string());
        }

        let (keyword_row, keyword_col) = shape.keyword_at;
        for row in shape.start_row..=shape.open_row {
            let line = self.source.line(row);
            if row == keyword_row && !shape.is_partial {
                out.push(insert_partial(line, keyword_col));
            } else {
                out.push(line.to_string());
            }
        }
    }

    fn push_original_tail(&self, out: &mut Vec<String>) {
        let shape = &self.source.shape;
        // A body that opens and closes on one line was already emitted with the header.
        let from = if shape.close_row > shape.open_row {
            shape.close_row
        } else {
            shape.close_row + 1
        };
        for row in from..self.source.line_count() {
            out.push(self.source.line(row).to_string());
        }
    }

    fn push_new_head(&self, out: &mut Vec<String>) {
        let scaffold = &self.source.scaffold;
        if !scaffold.usings.is_empty() {
            out.extend(scaffold.usings.iter().cloned());
            out.push(String::new());
        }

        for namespace in &scaffold.namespaces {
            if namespace.file_scoped {
                out.push(format!("{}namespace {};", namespace.indent, namespace.name));
                out.push(String::new());
            } else {
                out.push(format!("{}namespace {}", namespace.indent, namespace.name));
                out.push(format!("{}{{", namespace.indent));
            }
            if !namespace.usings.is_empty() {
                out.extend(namespace.usings.iter().cloned());
                out.push(String::new());
            }
        }

        let shape = &self.source.shape;
        out.push(shape.partial_header());
        out.push(format!("{}{{", shape.indent));
    }

    fn push_new_tail(&self, out: &mut Vec<String>) {
        out.push(format!("{}}}", self.source.shape.indent));
        for namespace in self.source.scaffold.namespaces.iter().rev() {
            if !namespace.file_scoped {
                out.push(format!("{}}}", namespace.indent));
            }
        }
    }
}

fn push_units(out: &mut Vec<String>, units: &[&DeclarationUnit]) {
    let unpaired = unpaired_regions(units);
    for (position, unit) in units.iter().enumerate() {
        if position > 0 {
            out.extend(std::iter::repeat(String::new()).take(unit.leading_blank_lines));
        }
        out.extend(
            unit.text
                .split('\n')
                .enumerate()
                .filter(|(offset, _)| !unpaired.contains(&(position, *offset)))
                .map(|(_, line)| line.to_string()),
        );
    }
}

/// Region directives whose partner landed in another container, as
/// `(position in units, line offset)`.
///
/// A container must open and close its own regions, so these lines are left out.
fn unpaired_regions(units: &[&DeclarationUnit]) -> HashSet<(usize, usize)> {
    let mut open = Vec::new();
    let mut unpaired = HashSet::new();
    for (position, unit) in units.iter().enumerate() {
        for &(offset, directive) in &unit.regions {
            match directive {
                RegionDirective::Open => open.push((position, offset)),
                RegionDirective::Close => {
                    if open.pop().is_none() {
                        unpaired.insert((position, offset));
                    }
                }
            }
        }
    }
    unpaired.extend(open);
    unpaired
}

/// Insert `partial ` at byte column `col`
fn insert_partial(line: &str, col: usize) -> String {
    let col = col.min(line.len());
    let col = if line.is_char_boundary(col) { col } else { 0 };
    let (head, tail) = line.split_at(col);
    format!("{head}partial {tail}")
}

impl Renderer for CSharpRenderer<'_> {
    type Unit = DeclarationUnit;
    type Error = Infallible;

    fn render(&self, units: &[&DeclarationUnit], role: GroupRole) -> Result<String, Infallible> {
        let mut out = Vec::new();
        match role {
            GroupRole::Original => {
                self.push_original_head(&mut out);
                push_units(&mut out, units);
                self.push_original_tail(&mut out);
            }
            GroupRole::New => {
                self.push_new_head(&mut out);
                push_units(&mut out, units);
                self.push_new_tail(&mut out);
            }
        }

        let ending = self.source.line_ending.as_str();
        let mut text = out.join(ending);
        let trailing = match role {
            GroupRole::Original => self.source.trailing_newline,
            GroupRole::New => true,
        };
        if trailing && !out.is_empty() {
            text.push_str(ending);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_partial() {
        assert_eq!(
            insert_partial("    public class Foo", 11),
            "    public partial class Foo"
        );
        assert_eq!(insert_partial("class Foo", 0), "partial class Foo");
        assert_eq!(insert_partial("x", 40), "xpartial ");
    }

    fn unit(text: &str, regions: Vec<(usize, RegionDirective)>) -> DeclarationUnit {
        DeclarationUnit {
            index: 0,
            kind: "field_declaration".to_string(),
            name: None,
            first_line: 1,
            last_line: 1,
            leading_blank_lines: 0,
            text: text.to_string(),
            regions,
        }
    }

    #[test]
    fn test_unpaired_regions() {
        let opens = unit("#region A\nint a;", vec![(0, RegionDirective::Open)]);
        let closes = unit("int b;\n#endregion", vec![(1, RegionDirective::Close)]);
        let plain = unit("int c;", Vec::new());

        assert!(unpaired_regions(&[&opens, &plain, &closes]).is_empty());
        assert_eq!(
            unpaired_regions(&[&opens, &plain]),
            HashSet::from([(0, 0)])
        );
        assert_eq!(unpaired_regions(&[&plain, &closes]), HashSet::from([(1, 1)]));

        let mut out = Vec::new();
        push_units(&mut out, &[&plain, &closes]);
        assert_eq!(out, vec!["int c;", "int b;"]);
    }
}
