// Python parser using tree-sitter
//
// Wraps a parsed source file and provides the small vocabulary of syntax
// queries the extractors share: literals, names, calls, assignments,
// class and function definitions.

use crate::error::{Error, Result};
use crate::parser::walk::{descendants, named_children};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Read and parse a Python file
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
        })?;
        self.parse_source(source, path.to_path_buf())
    }

    /// Parse Python source code; files with syntax errors are rejected
    pub fn parse_source(&mut self, source: String, path: PathBuf) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| Error::parse(&path, "parser produced no tree"))?;

        // depth first: the extractors recurse once per nesting level
        if let Some(node) = too_deeply_nested(&tree, MAX_NESTING) {
            let pos = node.start_position();
            return Err(Error::parse(
                path,
                format!(
                    "too many nested expressions at line {}, column {}",
                    pos.row + 1,
                    pos.column + 1
                ),
            ));
        }

        if let Some(message) = syntax_error(&tree, source.as_bytes()) {
            return Err(Error::parse(path, message));
        }

        if let Some(message) = rejected_construct(&tree) {
            return Err(Error::parse(path, message));
        }

        Ok(SourceFile { path, source, tree })
    }
}

/// Deepest syntax tree accepted; CPython itself gives up on 200 nested parentheses
const MAX_NESTING: usize = 256;

/// First node found below `limit` levels, walking with a cursor so the check
/// itself never recurses
fn too_deeply_nested(tree: &Tree, limit: usize) -> Option<Node<'_>> {
    let mut cursor = tree.walk();
    let mut depth = 0usize;
    loop {
        if cursor.goto_first_child() {
            depth += 1;
            if depth > limit {
                return Some(cursor.node());
            }
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
            depth -= 1;
        }
    }
}

/// Constructs tree-sitter accepts but Python 3 does not
fn rejected_construct(tree: &Tree) -> Option<String> {
    for node in descendants(tree.root_node()) {
        match node.kind() {
            "print_statement" | "exec_statement" => {
                let pos = node.start_position();
                let keyword = node.kind().trim_end_matches("_statement");
                return Some(format!(
                    "Python 2 `{}` statement at line {}, column {}",
                    keyword,
                    pos.row + 1,
                    pos.column + 1
                ));
            }
            "parameters" | "lambda_parameters" => {
                if let Some(param) = required_after_default(&node) {
                    let pos = param.start_position();
                    return Some(format!(
                        "non-default argument follows default argument at line {}, column {}",
                        pos.row + 1,
                        pos.column + 1
                    ));
                }
            }
            _ => {}
        }
    }
    None
}

/// A positional parameter without a default that follows one with a default
fn required_after_default<'t>(params: &Node<'t>) -> Option<Node<'t>> {
    let mut seen_default = false;
    for param in named_children(params) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            // everything after a star is keyword-only
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => return None,
            "typed_parameter" => {
                let splat = named_children(&param)
                    .first()
                    .map(|n| n.kind().ends_with("splat_pattern"))
                    .unwrap_or(false);
                if splat {
                    return None;
                }
                if seen_default {
                    return Some(param);
                }
            }
            "identifier" if seen_default => return Some(param),
            _ => {}
        }
    }
    None
}

/// A syntactically valid Python file and its tree
pub struct SourceFile {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    /// Source text covered by a node
    pub fn text(&self, node: &Node) -> &str {
        node_text(node, self.source.as_bytes())
    }

    /// Top-level statements, comments excluded
    pub fn statements(&self) -> Vec<Node<'_>> {
        named_children(&self.root())
    }
}

/// Describe the first error or missing node, if the tree has any
fn syntax_error(tree: &Tree, source: &[u8]) -> Option<String> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let bad = descendants(root).find(|n| n.is_error() || n.is_missing())?;
    let pos = bad.start_position();
    let message = if bad.is_missing() {
        format!(
            "missing `{}` at line {}, column {}",
            bad.kind(),
            pos.row + 1,
            pos.column + 1
        )
    } else {
        let snippet: String = node_text(&bad, source).chars().take(20).collect();
        format!(
            "invalid syntax at line {}, column {}: `{}`",
            pos.row + 1,
            pos.column + 1,
            snippet.trim()
        )
    };
    Some(message)
}

/// Source text covered by a node
pub fn node_text<'s>(node: &Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// Decoded content of a string literal; `None` for interpolated f-strings
/// and anything that is not a string
pub fn string_literal(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .children(&mut cursor)
                .any(|c| c.kind() == "interpolation");
            if interpolated {
                return None;
            }
            decode_string(node_text(node, source))
        }
        "concatenated_string" => {
            let mut out = String::new();
            for part in named_children(node) {
                out.push_str(&string_literal(&part, source)?);
            }
            Some(out)
        }
        "parenthesized_expression" => {
            let inner = named_children(node).into_iter().next()?;
            string_literal(&inner, source)
        }
        _ => None,
    }
}

/// Strip prefix and quotes from a string token and resolve escapes
fn decode_string(text: &str) -> Option<String> {
    let prefix_len = text.find(|c| c == '"' || c == '\'')?;
    let raw = text[..prefix_len].to_ascii_lowercase().contains('r');
    let body = &text[prefix_len..];

    let quote = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        &body[..3]
    } else {
        &body[..1]
    };
    let inner = body.strip_prefix(quote)?.strip_suffix(quote)?;

    if raw {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // line continuation
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// `name` or `a.b.c` for identifiers and attribute chains of identifiers
pub fn dotted_name(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attr = node.child_by_field_name("attribute")?;
            Some(format!(
                "{}.{}",
                dotted_name(&object, source)?,
                node_text(&attr, source)
            ))
        }
        _ => None,
    }
}

/// Trailing name of an identifier or attribute access (`models.CharField` -> `CharField`)
pub fn simple_name(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "attribute" => node
            .child_by_field_name("attribute")
            .map(|a| node_text(&a, source).to_string()),
        _ => None,
    }
}

/// Identifier text, only for bare names
pub fn identifier(node: &Node, source: &[u8]) -> Option<String> {
    (node.kind() == "identifier").then(|| node_text(node, source).to_string())
}

/// A call expression split into callee and arguments
pub struct CallSite<'t> {
    pub function: Node<'t>,
    pub positional: Vec<Node<'t>>,
    pub keywords: Vec<(String, Node<'t>)>,
}

impl<'t> CallSite<'t> {
    pub fn keyword(&self, name: &str) -> Option<Node<'t>> {
        self.keywords
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }
}

/// Split a `call` node; `None` for other node kinds
pub fn call_site<'t>(node: &Node<'t>, source: &[u8]) -> Option<CallSite<'t>> {
    if node.kind() != "call" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    let arguments = node.child_by_field_name("arguments")?;

    let mut positional = Vec::new();
    let mut keywords = Vec::new();

    if arguments.kind() == "argument_list" {
        for arg in named_children(&arguments) {
            match arg.kind() {
                "keyword_argument" => {
                    if let (Some(name), Some(value)) = (
                        arg.child_by_field_name("name"),
                        arg.child_by_field_name("value"),
                    ) {
                        keywords.push((node_text(&name, source).to_string(), value));
                    }
                }
                "list_splat" | "dictionary_splat" => {}
                _ => positional.push(arg),
            }
        }
    }

    Some(CallSite {
        function,
        positional,
        keywords,
    })
}

/// An assignment statement: `a = b = value`, `a: T = value` or `a += value`
pub struct Assignment<'t> {
    pub targets: Vec<Node<'t>>,
    pub value: Option<Node<'t>>,
    /// `+=` extends the existing binding
    pub augmented: bool,
}

impl Assignment<'_> {
    /// Names of bare-identifier targets
    pub fn target_names(&self, source: &[u8]) -> Vec<String> {
        self.targets
            .iter()
            .filter_map(|t| identifier(t, source))
            .collect()
    }
}

/// Read an assignment out of an `expression_statement`
pub fn assignment<'t>(statement: &Node<'t>) -> Option<Assignment<'t>> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    let inner = named_children(statement).into_iter().next()?;

    match inner.kind() {
        "assignment" => {
            let mut targets = Vec::new();
            let mut current = inner;
            loop {
                targets.push(current.child_by_field_name("left")?);
                match current.child_by_field_name("right") {
                    Some(right) if right.kind() == "assignment" => current = right,
                    value => {
                        return Some(Assignment {
                            targets,
                            value,
                            augmented: false,
                        })
                    }
                }
            }
        }
        "augmented_assignment" => {
            let operator = inner.child_by_field_name("operator")?;
            if operator.kind() != "+=" {
                return None;
            }
            Some(Assignment {
                targets: vec![inner.child_by_field_name("left")?],
                value: inner.child_by_field_name("right"),
                augmented: true,
            })
        }
        _ => None,
    }
}

/// The definition wrapped by a decorated definition, or the node itself
pub fn undecorated<'t>(node: &Node<'t>) -> Node<'t> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(*node)
    } else {
        *node
    }
}

/// A class definition
pub struct ClassDef<'t> {
    pub name: String,
    /// Base expressions in declaration order (keyword arguments excluded)
    pub bases: Vec<Node<'t>>,
    pub body: Option<Node<'t>>,
}

impl<'t> ClassDef<'t> {
    /// Statements of the class body, decorators unwrapped
    pub fn members(&self) -> Vec<Node<'t>> {
        self.body
            .map(|b| named_children(&b).iter().map(undecorated).collect())
            .unwrap_or_default()
    }

    /// Nested class with the given name, e.g. `Meta`
    pub fn nested_class(&self, name: &str, source: &[u8]) -> Option<ClassDef<'t>> {
        self.members()
            .iter()
            .filter_map(|m| class_def(m, source))
            .find(|c| c.name == name)
    }
}

pub fn class_def<'t>(node: &Node<'t>, source: &[u8]) -> Option<ClassDef<'t>> {
    if node.kind() != "class_definition" {
        return None;
    }
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let bases = node
        .child_by_field_name("superclasses")
        .map(|list| {
            named_children(&list)
                .into_iter()
                .filter(|b| b.kind() != "keyword_argument")
                .collect()
        })
        .unwrap_or_default();

    Some(ClassDef {
        name,
        bases,
        body: node.child_by_field_name("body"),
    })
}

/// A function definition
pub struct FunctionDef<'t> {
    pub name: String,
    pub node: Node<'t>,
    /// Positional parameter names, up to the first `*`, `*args` or `**kwargs`
    pub parameters: Vec<String>,
    /// Decorator names (`@name` and `@name(...)` forms)
    pub decorators: Vec<String>,
    pub body: Option<Node<'t>>,
}

impl FunctionDef<'_> {
    /// Parameters without the receiver
    pub fn parameters_without_self(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| *p != "self")
            .cloned()
            .collect()
    }
}

pub fn function_def<'t>(node: &Node<'t>, source: &[u8]) -> Option<FunctionDef<'t>> {
    if node.kind() != "function_definition" {
        return None;
    }
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| parameter_names(&p, source))
        .unwrap_or_default();

    Some(FunctionDef {
        name,
        node: *node,
        parameters,
        decorators: decorator_names(node, source),
        body: node.child_by_field_name("body"),
    })
}

fn parameter_names(node: &Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();

    for param in named_children(node) {
        let name_node = match param.kind() {
            "identifier" => Some(param),
            "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
            "typed_parameter" => named_children(&param).into_iter().next(),
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => None,
        };

        match name_node {
            Some(n) if n.kind() == "identifier" => names.push(node_text(&n, source).to_string()),
            // `*args: T` inside a typed parameter
            Some(n) if n.kind().ends_with("splat_pattern") => break,
            _ => {}
        }
    }

    names
}

/// Decorator names of a (possibly decorated) function or class
fn decorator_names(node: &Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };

    named_children(&parent)
        .into_iter()
        .filter(|c| c.kind() == "decorator")
        .filter_map(|decorator| {
            let expr = named_children(&decorator).into_iter().next()?;
            match expr.kind() {
                "identifier" => identifier(&expr, source),
                "call" => identifier(&expr.child_by_field_name("function")?, source),
                _ => None,
            }
        })
        .collect()
}
