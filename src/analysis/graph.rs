// Dependency synthesis and the component graph
//
// Edges are derived once every application has been extracted, since they
// cross application boundaries. The graph view is only for queries; the
// report carries the edge list as synthesized.

use crate::config::Conventions;
use crate::extract::ExtractionContext;
use crate::model::{DependencyEdge, EdgeKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

/// Derive the dependency edges of a fully extracted project
///
/// Order: entity relationships, handler references, route targets, form
/// bindings, serializer bindings; each in collection order.
pub fn synthesize(ctx: &ExtractionContext, conventions: &Conventions) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();

    for entity in &ctx.entities {
        // string forward references leave the target unresolved: no edge
        for rel in &entity.relationships {
            let Some(target) = &rel.target else {
                continue;
            };
            edges.push(DependencyEdge {
                source: Some(entity.name.clone()),
                source_app: entity.app.clone(),
                target: target.clone(),
                kind: EdgeKind::EntityRelationship {
                    relationship_type: rel.kind,
                    field_name: rel.field_name.clone(),
                },
            });
        }
    }

    for handler in &ctx.handlers {
        for entity in &handler.entities {
            edges.push(DependencyEdge {
                source: Some(handler.name.clone()),
                source_app: handler.app.clone(),
                target: entity.clone(),
                kind: EdgeKind::HandlerUsesEntity,
            });
        }
    }

    for route in &ctx.routes {
        let Some(handler) = &route.handler else {
            continue;
        };
        edges.push(DependencyEdge {
            source: route.path.clone(),
            source_app: route.app.clone(),
            target: handler.clone(),
            kind: EdgeKind::RouteTargetsHandler {
                url_name: route.name.clone(),
            },
        });
    }

    for form in &ctx.forms {
        if !form.bases.iter().any(|b| *b == conventions.model_form_base) {
            continue;
        }
        if let Some(model) = form.options.get("model").and_then(|v| v.as_name()) {
            edges.push(DependencyEdge {
                source: Some(form.name.clone()),
                source_app: form.app.clone(),
                target: model.to_string(),
                kind: EdgeKind::FormBoundToEntity,
            });
        }
    }

    for serializer in &ctx.serializers {
        if let Some(model) = serializer.options.get("model").and_then(|v| v.as_name()) {
            edges.push(DependencyEdge {
                source: Some(serializer.name.clone()),
                source_app: serializer.app.clone(),
                target: model.to_string(),
                kind: EdgeKind::SerializerBoundToEntity,
            });
        }
    }

    log::info!("Synthesized {} dependency edges", edges.len());
    edges
}

/// What a graph node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Entity,
    Handler,
    Route,
    Form,
    Serializer,
}

impl ComponentKind {
    /// Kinds of the two ends of an edge
    pub fn endpoints(kind: &EdgeKind) -> (ComponentKind, ComponentKind) {
        match kind {
            EdgeKind::EntityRelationship { .. } => (ComponentKind::Entity, ComponentKind::Entity),
            EdgeKind::HandlerUsesEntity => (ComponentKind::Handler, ComponentKind::Entity),
            EdgeKind::RouteTargetsHandler { .. } => (ComponentKind::Route, ComponentKind::Handler),
            EdgeKind::FormBoundToEntity => (ComponentKind::Form, ComponentKind::Entity),
            EdgeKind::SerializerBoundToEntity => (ComponentKind::Serializer, ComponentKind::Entity),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Entity => "model",
            ComponentKind::Handler => "view",
            ComponentKind::Route => "url",
            ComponentKind::Form => "form",
            ComponentKind::Serializer => "serializer",
        }
    }
}

/// A node of the component graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: String,
}

/// A component and how many edges point at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hotspot {
    pub kind: ComponentKind,
    pub name: String,
    pub dependents: usize,
}

/// Directed graph over the synthesized edges
pub struct DependencyGraph {
    graph: DiGraph<Component, EdgeKind>,
    nodes: HashMap<Component, NodeIndex>,
}

impl DependencyGraph {
    /// Build from edges; routes with a computed path have no source node and
    /// are skipped
    pub fn from_edges(edges: &[DependencyEdge]) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        };

        for edge in edges {
            let Some(source) = &edge.source else {
                continue;
            };
            let target = &edge.target;
            let (source_kind, target_kind) = ComponentKind::endpoints(&edge.kind);
            let from = graph.node(Component {
                kind: source_kind,
                name: source.clone(),
            });
            let to = graph.node(Component {
                kind: target_kind,
                name: target.clone(),
            });
            graph.graph.add_edge(from, to, edge.kind.clone());
        }

        graph
    }

    fn node(&mut self, component: Component) -> NodeIndex {
        if let Some(&index) = self.nodes.get(&component) {
            return index;
        }
        let index = self.graph.add_node(component.clone());
        self.nodes.insert(component, index);
        index
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Components with an edge into `kind`/`name`, sorted
    pub fn dependents_of(&self, kind: ComponentKind, name: &str) -> Vec<&Component> {
        let key = Component {
            kind,
            name: name.to_string(),
        };
        let Some(&index) = self.nodes.get(&key) else {
            return Vec::new();
        };
        let mut dependents: Vec<&Component> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .map(|n| &self.graph[n])
            .collect();
        dependents.sort();
        dependents.dedup();
        dependents
    }

    /// Components with the most distinct dependents, ties by kind then name
    pub fn most_depended_on(&self, limit: usize) -> Vec<Hotspot> {
        let mut hotspots: Vec<Hotspot> = self
            .graph
            .node_indices()
            .map(|index| {
                let component = &self.graph[index];
                Hotspot {
                    kind: component.kind,
                    name: component.name.clone(),
                    dependents: self.dependents_of(component.kind, &component.name).len(),
                }
            })
            .filter(|h| h.dependents > 0)
            .collect();

        hotspots.sort_by(|a, b| {
            b.dependents
                .cmp(&a.dependents)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.name.cmp(&b.name))
        });
        hotspots.truncate(limit);
        hotspots
    }
}
