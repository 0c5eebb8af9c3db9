// Generic syntax tree traversal
//
// Every "find all matching sub-nodes" query in the extractors goes through
// here, so nested definitions and arbitrarily deep expressions are seen.

use tree_sitter::Node;

/// Pre-order iterator over a node and every node below it
pub struct Descendants<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let node = self.stack.pop()?;
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        // reversed so the leftmost child is visited first
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}

/// Iterate over `root` and all of its descendants in source order
pub fn descendants(root: Node<'_>) -> Descendants<'_> {
    Descendants { stack: vec![root] }
}

/// Iterate over the descendants of `root` with the given node kind
pub fn nodes_of_kind<'t>(root: Node<'t>, kind: &'static str) -> impl Iterator<Item = Node<'t>> {
    descendants(root).filter(move |n| n.kind() == kind)
}

/// Call `visit` for every node under `root` (inclusive) accepted by `matches`
pub fn visit_matching<'t, P, V>(root: Node<'t>, mut matches: P, mut visit: V)
where
    P: FnMut(&Node<'t>) -> bool,
    V: FnMut(Node<'t>),
{
    for node in descendants(root) {
        if matches(&node) {
            visit(node);
        }
    }
}

/// Named children of a node, comments excluded
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;

    fn parse(source: &str) -> crate::parser::SourceFile {
        PythonParser::new()
            .unwrap()
            .parse_source(source.to_string(), "test.py".into())
            .unwrap()
    }

    #[test]
    fn test_descendants_reach_nested_nodes() {
        let file = parse("def outer():\n    def inner():\n        return call(x)\n");
        let functions: Vec<_> = nodes_of_kind(file.root(), "function_definition")
            .map(|n| file.text(&n.child_by_field_name("name").unwrap()).to_string())
            .collect();
        assert_eq!(functions, vec!["outer", "inner"]);
    }

    #[test]
    fn test_descendants_preorder() {
        let file = parse("a = 1\nb = 2\n");
        let names: Vec<_> = nodes_of_kind(file.root(), "identifier")
            .map(|n| file.text(&n).to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_visit_matching() {
        let file = parse("x = f(g(1), h(2))\n");
        let mut calls = Vec::new();
        visit_matching(
            file.root(),
            |n| n.kind() == "call",
            |n| calls.push(file.text(&n.child_by_field_name("function").unwrap()).to_string()),
        );
        assert_eq!(calls, vec!["f", "g", "h"]);
    }

    #[test]
    fn test_named_children_skip_comments() {
        let file = parse("items = [\n    1,  # one\n    2,\n]\n");
        let list = nodes_of_kind(file.root(), "list").next().unwrap();
        let kinds: Vec<_> = named_children(&list).iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["integer", "integer"]);
    }
}
