// Handler extraction from views.py

use crate::config::Conventions;
use crate::model::{Behavior, Entity, Handler, HandlerKind};
use crate::parser::walk::{descendants, visit_matching};
use crate::parser::{call_site, class_def, function_def, identifier, string_literal, ClassDef, FunctionDef, SourceFile};
use std::collections::HashMap;
use tree_sitter::Node;

/// Lookup from the spellings a handler may use for an entity to its name
///
/// `Post` and its reverse accessor `post_set` both resolve to `Post`.
#[derive(Debug, Default, Clone)]
pub struct EntityIndex {
    spellings: HashMap<String, String>,
}

impl EntityIndex {
    pub fn new(entities: &[Entity], conventions: &Conventions) -> Self {
        let mut spellings = HashMap::new();
        for entity in entities {
            spellings.insert(entity.name.clone(), entity.name.clone());
        }
        for entity in entities {
            let accessor = format!("{}{}", entity.name.to_lowercase(), conventions.related_set_suffix);
            spellings.entry(accessor).or_insert_with(|| entity.name.clone());
        }
        Self { spellings }
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.spellings.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }
}

/// Function handlers (top level only) and class handlers (any depth), in source order
pub fn extract_handlers(
    app: &str,
    file: &SourceFile,
    conventions: &Conventions,
    entities: &EntityIndex,
) -> Vec<Handler> {
    let source = file.bytes();
    let mut handlers = Vec::new();

    for node in descendants(file.root()) {
        match node.kind() {
            "function_definition" if is_top_level(&node) => {
                if let Some(func) = function_def(&node, source) {
                    handlers.push(function_handler(app, &func, source, conventions, entities));
                }
            }
            "class_definition" => {
                let Some(class) = class_def(&node, source) else {
                    continue;
                };
                let bases = handler_bases(&class, source, conventions);
                if !bases.is_empty() {
                    handlers.push(class_handler(app, &node, &class, bases, source, conventions, entities));
                }
            }
            _ => {}
        }
    }

    log::debug!("{} handlers in {}", handlers.len(), app);
    handlers
}

fn is_top_level(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "module" => true,
        "decorated_definition" => parent.parent().map(|p| p.kind() == "module").unwrap_or(false),
        _ => false,
    }
}

/// Bare-name bases that look like handler base classes (`View`, `ListView`, `LoginRequiredViewMixin`)
fn handler_bases(class: &ClassDef, source: &[u8], conventions: &Conventions) -> Vec<String> {
    class
        .bases
        .iter()
        .filter_map(|base| identifier(base, source))
        .filter(|name| name.contains(conventions.handler_base.as_str()))
        .collect()
}

fn function_handler(
    app: &str,
    func: &FunctionDef,
    source: &[u8],
    conventions: &Conventions,
    entities: &EntityIndex,
) -> Handler {
    Handler {
        name: func.name.clone(),
        app: app.to_string(),
        kind: HandlerKind::Function {
            parameters: func.parameters.clone(),
            decorators: func.decorators.clone(),
        },
        entities: referenced_entities(func.node, source, entities),
        template: func
            .body
            .and_then(|body| template_name(body, source, conventions)),
    }
}

fn class_handler(
    app: &str,
    node: &Node,
    class: &ClassDef,
    bases: Vec<String>,
    source: &[u8],
    conventions: &Conventions,
    entities: &EntityIndex,
) -> Handler {
    let methods: Vec<FunctionDef> = class
        .members()
        .iter()
        .filter_map(|m| function_def(m, source))
        .collect();

    let template = methods
        .iter()
        .filter_map(|m| m.body)
        .find_map(|body| template_name(body, source, conventions));

    Handler {
        name: class.name.clone(),
        app: app.to_string(),
        kind: HandlerKind::Class {
            bases,
            methods: methods
                .iter()
                .map(|m| Behavior {
                    name: m.name.clone(),
                    parameters: m.parameters_without_self(),
                })
                .collect(),
        },
        entities: referenced_entities(*node, source, entities),
        template,
    }
}

/// First `render(request, "literal.html", ...)` under `root`
fn template_name(root: Node, source: &[u8], conventions: &Conventions) -> Option<String> {
    descendants(root)
        .filter_map(|node| call_site(&node, source))
        .filter(|call| identifier(&call.function, source).as_deref() == Some(conventions.render_call.as_str()))
        .find_map(|call| call.positional.get(1).and_then(|arg| string_literal(arg, source)))
}

/// Entities named by `Name.attr` accesses under `root`, first-seen order
fn referenced_entities(root: Node, source: &[u8], entities: &EntityIndex) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    if entities.is_empty() {
        return found;
    }

    visit_matching(
        root,
        |node| node.kind() == "attribute",
        |attr| {
            let Some(name) = attr
                .child_by_field_name("object")
                .and_then(|object| identifier(&object, source))
            else {
                return;
            };
            if let Some(entity) = entities.resolve(&name) {
                if !found.iter().any(|e| e == entity) {
                    found.push(entity.to_string());
                }
            }
        },
    );
    found
}
