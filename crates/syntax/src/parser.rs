use crate::error::{Result, SyntaxError};
use crate::language::Language;
use crate::source::SourceFile;
use crate::types::{
    AggregateShape, DeclarationUnit, LineEnding, NamespaceScope, RegionDirective, Scaffold,
};
use std::collections::BTreeMap;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Type declarations that may be spread over several files
const SPLITTABLE_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
];

/// Type declarations that count as top-level types but are never split
const OTHER_TYPE_KINDS: &[&str] = &["enum_declaration", "delegate_declaration"];

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "interface", "record"];

/// Tree-sitter based reader for one aggregate per file
pub struct SourceParser {
    parser: Parser,
    language: Language,
}

/// Member span before its text is cut out of the source
struct RawUnit {
    kind: String,
    name: Option<String>,
    first_row: usize,
    last_row: usize,
}

/// Top-level declarations found while walking namespaces
#[derive(Default)]
struct Discovery<'t> {
    scaffold: Scaffold,
    types: Vec<(Node<'t>, Vec<NamespaceScope>)>,
}

impl SourceParser {
    /// Create a parser for a language
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_split() {
            return Err(SyntaxError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| SyntaxError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser, language })
    }

    /// Create a parser for the language of `path`
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Language::from_path(path))
    }

    /// Parse `content` and locate its single aggregate
    pub fn parse(&mut self, content: &str, path: &str) -> Result<SourceFile> {
        if content.trim().is_empty() {
            return Err(SyntaxError::EmptyContent);
        }

        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| SyntaxError::parse("Failed to parse source code"))?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            let at = bad.start_position();
            return Err(SyntaxError::parse(format!(
                "{path}:{}:{}: invalid syntax near `{}`",
                at.row + 1,
                at.column + 1,
                snippet(content, bad)
            )));
        }

        let lines = split_lines(content);
        let mut discovery = Discovery::default();
        let mut chain = Vec::new();
        discovery.walk(content, &lines, root, &mut chain);

        let (decl, namespaces) = select_aggregate(content, discovery.types)?;
        let shape = Self::extract_shape(content, &lines, decl)?;
        let body = body_of(decl).ok_or_else(|| {
            SyntaxError::Unsplittable(format!("`{}` has no declaration body", shape.name))
        })?;
        let (raw, regions) = Self::extract_units(content, &lines, body, &shape)?;
        let units = Self::finalize_units(&lines, raw, &regions, &shape);

        log::debug!(
            "Parsed {path}: {} `{}` with {} members",
            shape.keyword,
            shape.name,
            units.len()
        );

        let mut scaffold = discovery.scaffold;
        scaffold.namespaces = namespaces;

        Ok(SourceFile {
            path: path.to_string(),
            language: self.language,
            shape,
            scaffold,
            units,
            line_ending: LineEnding::detect(content),
            trailing_newline: content.ends_with('\n'),
            lines,
        })
    }

    /// Read the declaration header: modifiers, keyword, name, generics, braces
    fn extract_shape(content: &str, lines: &[String], decl: Node) -> Result<AggregateShape> {
        let name = decl
            .child_by_field_name("name")
            .map(|node| node_text(content, node).to_string())
            .ok_or_else(|| SyntaxError::parse("type declaration without a name"))?;

        let mut modifiers = Vec::new();
        let mut is_partial = false;
        let mut keyword = None;
        let mut type_parameters = None;

        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            match child.kind() {
                "modifier" => {
                    let text = node_text(content, child).trim().to_string();
                    if text == "partial" {
                        is_partial = true;
                    } else {
                        modifiers.push(text);
                    }
                }
                "type_parameter_list" => {
                    type_parameters = Some(collapse_whitespace(node_text(content, child)));
                }
                kind if !child.is_named() && keyword.is_none() && TYPE_KEYWORDS.contains(&kind) => {
                    keyword = Some(child);
                }
                _ => {}
            }
        }

        if modifiers.iter().any(|modifier| modifier == "file") {
            return Err(SyntaxError::Unsplittable(format!(
                "file-local type `{name}` must stay in a single file"
            )));
        }

        let keyword =
            keyword.ok_or_else(|| SyntaxError::parse(format!("no type keyword for `{name}`")))?;
        let name_start = decl
            .child_by_field_name("name")
            .map_or(keyword.end_byte(), |node| node.start_byte());
        let keyword_text =
            collapse_whitespace(content.get(keyword.start_byte()..name_start).unwrap_or("class"));

        let body = body_of(decl).ok_or_else(|| {
            SyntaxError::Unsplittable(format!("`{name}` has no declaration body"))
        })?;

        let start_row = decl.start_position().row;
        Ok(AggregateShape {
            name,
            keyword: keyword_text,
            modifiers,
            type_parameters,
            is_partial,
            indent: leading_whitespace(lines.get(start_row).map_or("", String::as_str)),
            start_row,
            open_row: body.start_position().row,
            close_row: body.end_position().row,
            keyword_at: (keyword.start_position().row, keyword.start_position().column),
        })
    }

    /// Collect members of the body with their leading comments attached.
    ///
    /// Also returns the rows of body-level region directives, which must pair
    /// up inside the body.
    fn extract_units(
        content: &str,
        lines: &[String],
        body: Node,
        shape: &AggregateShape,
    ) -> Result<(Vec<RawUnit>, BTreeMap<usize, RegionDirective>)> {
        let mut units: Vec<RawUnit> = Vec::new();
        let mut regions = BTreeMap::new();
        let mut trivia: Option<(usize, usize)> = None;

        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if matches!(child.kind(), "{" | "}") {
                continue;
            }

            let start = child.start_position().row;
            let end = last_row(child);
            let directive = if child.is_extra() || child.kind().starts_with("preproc") {
                lines
                    .get(start)
                    .and_then(|line| RegionDirective::from_line(line))
            } else {
                None
            };

            if child.is_extra() || directive.is_some() {
                // Comments sharing a brace line belong to the header or the closing line.
                if start <= shape.open_row || start >= shape.close_row {
                    if directive.is_some() {
                        return Err(SyntaxError::layout(format!(
                            "region directive on line {} shares a brace line of `{}`",
                            start + 1,
                            shape.name
                        )));
                    }
                    continue;
                }
                if let Some(directive) = directive {
                    regions.insert(start, directive);
                }
                // A comment trailing the previous member's last line stays with it.
                if trivia.is_none() {
                    if let Some(previous) = units.last_mut() {
                        if start <= previous.last_row {
                            previous.last_row = previous.last_row.max(end);
                            continue;
                        }
                    }
                }
                trivia = Some(trivia.map_or((start, end), |(first, _)| (first, end)));
                continue;
            }

            if start <= shape.open_row {
                return Err(SyntaxError::layout(format!(
                    "member on line {} shares the line of `{}`'s opening brace",
                    start + 1,
                    shape.name
                )));
            }
            if end >= shape.close_row {
                return Err(SyntaxError::layout(format!(
                    "member ending on line {} shares the line of `{}`'s closing brace",
                    end + 1,
                    shape.name
                )));
            }

            let first_row = trivia.take().map_or(start, |(first, _)| first);
            match units.last_mut() {
                Some(previous) if first_row <= previous.last_row => {
                    previous.last_row = previous.last_row.max(end);
                }
                _ => units.push(RawUnit {
                    kind: child.kind().to_string(),
                    name: member_name(content, child),
                    first_row,
                    last_row: end,
                }),
            }
        }

        if let Some((first, last)) = trivia {
            match units.last_mut() {
                Some(previous) => previous.last_row = previous.last_row.max(last),
                None => units.push(RawUnit {
                    kind: "comment".to_string(),
                    name: None,
                    first_row: first,
                    last_row: last,
                }),
            }
        }

        let mut depth = 0usize;
        for (&row, directive) in &regions {
            depth = match directive {
                RegionDirective::Open => depth + 1,
                RegionDirective::Close => depth.checked_sub(1).ok_or_else(|| {
                    SyntaxError::layout(format!(
                        "`#endregion` on line {} closes a region opened outside `{}`",
                        row + 1,
                        shape.name
                    ))
                })?,
            };
        }
        if depth > 0 {
            return Err(SyntaxError::layout(format!(
                "region opened inside `{}` is closed outside its body",
                shape.name
            )));
        }

        Ok((units, regions))
    }

    /// Cut unit text out of the source and count the blank lines before each unit
    fn finalize_units(
        lines: &[String],
        raw: Vec<RawUnit>,
        regions: &BTreeMap<usize, RegionDirective>,
        shape: &AggregateShape,
    ) -> Vec<DeclarationUnit> {
        let line = |row: usize| lines.get(row).map_or("", String::as_str);
        let count = raw.len();
        let mut units = Vec::with_capacity(count);
        let mut previous_end = shape.open_row;

        for (index, mut unit) in raw.into_iter().enumerate() {
            // Stray non-blank lines in the gap travel with the unit that follows them.
            let gap = (previous_end + 1)..unit.first_row;
            let leading_blank_lines = match gap.clone().find(|&row| !line(row).trim().is_empty()) {
                Some(row) => {
                    let blanks = row - gap.start;
                    unit.first_row = row;
                    blanks
                }
                None => gap.len(),
            };

            if index + 1 == count {
                let tail = (unit.last_row + 1)..shape.close_row;
                if let Some(row) = tail.rev().find(|&row| !line(row).trim().is_empty()) {
                    unit.last_row = row;
                }
            }

            let text = (unit.first_row..=unit.last_row)
                .map(line)
                .collect::<Vec<_>>()
                .join("\n");
            let unit_regions = regions
                .range(unit.first_row..=unit.last_row)
                .map(|(&row, &directive)| (row - unit.first_row, directive))
                .collect();
            previous_end = unit.last_row;

            units.push(DeclarationUnit {
                index,
                kind: unit.kind,
                name: unit.name,
                first_line: unit.first_row + 1,
                last_line: unit.last_row + 1,
                leading_blank_lines,
                text,
                regions: unit_regions,
            });
        }

        units
    }
}

impl<'t> Discovery<'t> {
    /// Record usings, namespaces and type declarations reachable from `node`
    fn walk(
        &mut self,
        content: &str,
        lines: &[String],
        node: Node<'t>,
        chain: &mut Vec<NamespaceScope>,
    ) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();

        for child in children {
            let kind = child.kind();
            match kind {
                "using_directive" | "extern_alias_directive" => {
                    if node_text(content, child).trim_start().starts_with("global") {
                        continue;
                    }
                    let rows = row_lines(lines, child);
                    match chain.last_mut() {
                        Some(scope) => scope.usings.extend(rows),
                        None => self.scaffold.usings.extend(rows),
                    }
                }
                "namespace_declaration" => {
                    chain.push(namespace_scope(content, lines, child, false));
                    if let Some(body) = body_of(child) {
                        self.walk(content, lines, body, chain);
                    }
                    chain.pop();
                }
                "file_scoped_namespace_declaration" => {
                    // Applies to every following sibling, so the scope is never popped here.
                    chain.push(namespace_scope(content, lines, child, true));
                    self.walk(content, lines, child, chain);
                }
                _ if SPLITTABLE_KINDS.contains(&kind) || OTHER_TYPE_KINDS.contains(&kind) => {
                    self.types.push((child, chain.clone()));
                }
                _ => {}
            }
        }
    }
}

/// Exactly one splittable top-level type, with its namespace chain
fn select_aggregate<'t>(
    content: &str,
    mut types: Vec<(Node<'t>, Vec<NamespaceScope>)>,
) -> Result<(Node<'t>, Vec<NamespaceScope>)> {
    if types.len() > 1 {
        let names = types
            .iter()
            .map(|(node, _)| {
                let name = node
                    .child_by_field_name("name")
                    .map_or("?", |name| node_text(content, name));
                format!("{} {name}", node.kind().trim_end_matches("_declaration"))
            })
            .collect();
        return Err(SyntaxError::MultipleAggregates(names));
    }

    match types.pop() {
        Some((node, chain)) if SPLITTABLE_KINDS.contains(&node.kind()) => Ok((node, chain)),
        _ => Err(SyntaxError::NoAggregate),
    }
}

fn namespace_scope(content: &str, lines: &[String], node: Node, file_scoped: bool) -> NamespaceScope {
    let name = node
        .child_by_field_name("name")
        .map(|name| collapse_whitespace(node_text(content, name)))
        .unwrap_or_default();
    NamespaceScope {
        name,
        file_scoped,
        indent: leading_whitespace(lines.get(node.start_position().row).map_or("", String::as_str)),
        usings: Vec::new(),
    }
}

fn body_of(node: Node) -> Option<Node> {
    if let Some(body) = node.child_by_field_name("body") {
        if body.kind() == "declaration_list" {
            return Some(body);
        }
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| child.kind() == "declaration_list");
    found
}

/// Name of a member, looking through field/event declarators
fn member_name(content: &str, node: Node) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(node_text(content, name).to_string());
    }
    if node.kind() == "indexer_declaration" {
        return Some("this[]".to_string());
    }

    let declarator = find_descendant(node, "variable_declarator")?;
    let name = declarator.child_by_field_name("name").or_else(|| {
        let mut cursor = declarator.walk();
        let found = declarator
            .named_children(&mut cursor)
            .find(|child| child.kind() == "identifier");
        found
    })?;
    Some(node_text(content, name).to_string())
}

fn find_descendant<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    for child in children {
        if child.kind() == kind {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, kind) {
            return Some(found);
        }
    }
    None
}

/// First `ERROR` or missing node in the tree, if any
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    for child in children {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

/// Last row a node occupies; a node ending at column 0 stops on the previous row
fn last_row(node: Node) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    }
}

fn row_lines(lines: &[String], node: Node) -> Vec<String> {
    (node.start_position().row..=last_row(node))
        .filter_map(|row| lines.get(row).cloned())
        .collect()
}

fn node_text<'c>(content: &'c str, node: Node) -> &'c str {
    content.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn snippet(content: &str, node: Node) -> String {
    let text = node_text(content, node);
    let first = text.lines().next().unwrap_or("").trim();
    first.chars().take(40).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

/// Split on `\n`, dropping `\r` and the empty piece after a final newline
fn split_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if content.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Parse `content` as the language implied by `path`
pub fn parse_source(content: &str, path: &str) -> Result<SourceFile> {
    SourceParser::for_path(path)?.parse(content, path)
}

/// Read and parse a file from disk
pub fn parse_file(path: impl AsRef<Path>) -> Result<SourceFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let display = path.to_string_lossy();
    SourceParser::for_path(path)?.parse(&content, &display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LEDGER: &str = r#"using System;
using System.Collections.Generic;

namespace Acme.Inventory
{
    using Acme.Core;

    /// <summary>Stock ledger.</summary>
    [Serializable]
    public sealed class Ledger<T> : IDisposable where T : class
    {
        private readonly List<T> _items = new();

        // Counts entries.
        public int Count => _items.Count;

        /// <summary>Adds.</summary>
        public void Add(T item)
        {
            _items.Add(item);
        }

        public void Dispose()
        {
        }
    }
}
"#;

    fn parse(code: &str) -> Result<SourceFile> {
        parse_source(code, "Ledger.cs")
    }

    #[test]
    fn test_units_follow_source_order() {
        let file = parse(LEDGER).unwrap();
        let labels: Vec<_> = file.units.iter().map(|unit| unit.label()).collect();
        assert_eq!(labels, vec!["_items", "Count", "Add", "Dispose"]);

        let spans: Vec<_> = file
            .units
            .iter()
            .map(|unit| (unit.first_line, unit.last_line, unit.leading_blank_lines))
            .collect();
        assert_eq!(spans, vec![(12, 12, 0), (14, 15, 1), (17, 21, 1), (23, 25, 1)]);
    }

    #[test]
    fn test_comments_travel_with_their_member() {
        let file = parse(LEDGER).unwrap();
        assert_eq!(
            file.units[1].text,
            "        // Counts entries.\n        public int Count => _items.Count;"
        );
        assert!(file.units[2].text.starts_with("        /// <summary>Adds.</summary>"));
    }

    #[test]
    fn test_shape_and_scaffold() {
        let file = parse(LEDGER).unwrap();
        let shape = &file.shape;
        assert_eq!(shape.name, "Ledger");
        assert_eq!(shape.keyword, "class");
        assert_eq!(shape.modifiers, vec!["public", "sealed"]);
        assert_eq!(shape.type_parameters.as_deref(), Some("<T>"));
        assert!(!shape.is_partial);
        assert_eq!(shape.indent, "    ");

        assert_eq!(
            file.scaffold.usings,
            vec!["using System;", "using System.Collections.Generic;"]
        );
        assert_eq!(file.scaffold.namespaces.len(), 1);
        let namespace = &file.scaffold.namespaces[0];
        assert_eq!(namespace.name, "Acme.Inventory");
        assert!(!namespace.file_scoped);
        assert_eq!(namespace.usings, vec!["    using Acme.Core;"]);
    }

    #[test]
    fn test_file_scoped_namespace_and_record() {
        let code = r#"namespace Acme.Models;

public partial record struct Point(int X, int Y)
{
    public int Sum() => X + Y;

    public int Product() => X * Y;
}
"#;
        let file = parse(code).unwrap();
        assert!(file.shape.is_partial);
        assert_eq!(file.shape.keyword, "record struct");
        assert_eq!(file.scaffold.namespaces.len(), 1);
        assert!(file.scaffold.namespaces[0].file_scoped);
        assert_eq!(file.scaffold.namespaces[0].name, "Acme.Models");
        assert_eq!(file.units.len(), 2);
    }

    #[test]
    fn test_multiple_types_are_rejected() {
        let code = "class A\n{\n}\n\nclass B\n{\n}\n";
        let err = parse(code).unwrap_err();
        assert!(matches!(err, SyntaxError::MultipleAggregates(ref names) if names.len() == 2));
        assert!(err.is_skip());
    }

    #[test]
    fn test_enum_only_file_has_no_aggregate() {
        let err = parse("enum Color\n{\n    Red,\n}\n").unwrap_err();
        assert!(matches!(err, SyntaxError::NoAggregate));
    }

    #[test]
    fn test_invalid_source_is_a_parse_error() {
        let err = parse("class A\n{\n    void M( {\n}\n").unwrap_err();
        assert!(matches!(err, SyntaxError::ParseError(_)));
        assert!(!err.is_skip());
    }

    #[test]
    fn test_member_on_brace_line_is_unsupported() {
        let err = parse("class A { int x;\n    int y;\n}\n").unwrap_err();
        assert!(matches!(err, SyntaxError::UnsupportedLayout(_)));
    }

    #[test]
    fn test_members_sharing_a_line_form_one_unit() {
        let code = "class A\n{\n    int x; int y;\n    int z;\n}\n";
        let file = parse(code).unwrap();
        assert_eq!(file.units.len(), 2);
        assert_eq!(file.units[0].text, "    int x; int y;");
    }

    #[test]
    fn test_end_of_line_comment_stays_with_its_member() {
        let code = "class A\n{\n    int x; // x note\n    int y;\n    int z;\n}\n";
        let file = parse(code).unwrap();
        let texts: Vec<_> = file.units.iter().map(|unit| unit.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["    int x; // x note", "    int y;", "    int z;"]
        );
    }

    #[test]
    fn test_end_of_line_comment_after_method() {
        let code = "class A\n{\n    void M()\n    {\n    } // done\n\n    // Leading.\n    int y;\n}\n";
        let file = parse(code).unwrap();
        assert_eq!(file.units.len(), 2);
        assert_eq!(file.units[0].last_line, 5);
        assert_eq!(file.units[1].text, "    // Leading.\n    int y;");
        assert_eq!(file.units[1].leading_blank_lines, 1);
    }

    #[test]
    fn test_region_directives_are_recorded() {
        let code = "class A\n{\n    #region Fields\n    int a;\n    int b;\n    #endregion\n\n    void M()\n    {\n    }\n}\n";
        let file = parse(code).unwrap();
        let regions: Vec<_> = file.units.iter().map(|unit| unit.regions.clone()).collect();
        assert_eq!(
            regions,
            vec![
                vec![(0, RegionDirective::Open)],
                vec![],
                vec![(0, RegionDirective::Close)],
            ]
        );
        assert_eq!(file.units[2].text.lines().next(), Some("    #endregion"));
    }

    #[test]
    fn test_region_closed_outside_the_body_is_unsupported() {
        let code = "#region Outer\nclass A\n{\n    int a;\n    #endregion\n}\n";
        assert!(matches!(
            parse(code).unwrap_err(),
            SyntaxError::UnsupportedLayout(_)
        ));
    }

    #[test]
    fn test_parser_loads_grammar() {
        assert!(SourceParser::new(Language::CSharp).is_ok());
    }

    #[test]
    fn test_file_local_types_cannot_be_split() {
        let err = parse("file class Hidden\n{\n    int x;\n}\n").unwrap_err();
        assert!(matches!(err, SyntaxError::Unsplittable(_)));
    }

    #[test]
    fn test_crlf_is_detected() {
        let code = "class A\r\n{\r\n    int x;\r\n}\r\n";
        let file = parse(code).unwrap();
        assert_eq!(file.line_ending(), LineEnding::CrLf);
        assert_eq!(file.units[0].text, "    int x;");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_source("class A {}", "a.rs").unwrap_err();
        assert!(matches!(err, SyntaxError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_empty_content() {
        assert!(matches!(parse("  \n").unwrap_err(), SyntaxError::EmptyContent));
    }
}
