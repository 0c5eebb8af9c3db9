// Diagram generation for Surveyor
//
// Generates Mermaid diagrams of the extracted architecture.

use crate::analysis::{ComponentKind, Report};
use crate::config::OutputConfig;
use crate::model::{EdgeKind, RelationKind};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Diagram generator for creating Mermaid diagrams
pub struct DiagramGenerator {
    /// Maximum nodes to display before aggregating by app
    max_nodes: usize,
    /// Layout direction (TB, LR, BT, RL)
    direction: String,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new() -> Self {
        Self {
            max_nodes: 100,
            direction: "LR".to_string(),
        }
    }

    /// Generator using the diagram options of the output config
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new()
            .with_max_nodes(config.diagram_max_nodes)
            .with_direction(&config.diagram_direction)
    }

    /// Set maximum nodes before aggregation
    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    /// Flowchart of every dependency edge
    pub fn generate_dependency_graph(&self, report: &Report) -> String {
        let mut nodes: Vec<(String, String, ComponentKind)> = Vec::new();
        let mut node_ids: HashSet<String> = HashSet::new();
        let mut edges: Vec<String> = Vec::new();
        let mut seen_edges: HashSet<(String, String, &'static str)> = HashSet::new();

        for edge in &report.dependencies {
            let Some(source) = &edge.source else {
                continue;
            };
            let target = &edge.target;
            let (source_kind, target_kind) = ComponentKind::endpoints(&edge.kind);
            let from = node_id(source_kind, source);
            let to = node_id(target_kind, target);

            for (id, name, kind) in [
                (&from, source.as_str(), source_kind),
                (&to, target.as_str(), target_kind),
            ] {
                if node_ids.insert(id.clone()) {
                    nodes.push((id.clone(), node_label(kind, name), kind));
                }
            }

            let label = edge_label(&edge.kind);
            if seen_edges.insert((from.clone(), to.clone(), label)) {
                edges.push(format!("    {} -->|{}| {}", from, label, to));
            }
        }

        if nodes.len() > self.max_nodes {
            return self.generate_app_level_graph(report);
        }

        let mut lines = vec![format!("graph {}", self.direction)];
        for (id, label, kind) in &nodes {
            lines.push(format!("    {}[\"{}\"]{}", id, label, node_style(*kind)));
        }
        lines.extend(edges);
        lines.join("\n")
    }

    /// App-to-app dependencies (aggregated view)
    pub fn generate_app_level_graph(&self, report: &Report) -> String {
        let mut lines = vec![format!("graph {}", self.direction)];

        for app in &report.apps {
            let models = report.models.iter().filter(|m| m.app == app.name).count();
            let views = report.views.iter().filter(|v| v.app == app.name).count();
            lines.push(format!(
                "    {}[\"{}\\n({} models, {} views)\"]",
                app_id(&app.name),
                app.name,
                models,
                views
            ));
        }

        // first owner wins when two apps define the same name
        let mut owner: HashMap<(ComponentKind, &str), &str> = HashMap::new();
        for model in &report.models {
            owner
                .entry((ComponentKind::Entity, model.name.as_str()))
                .or_insert(model.app.as_str());
        }
        for view in &report.views {
            owner
                .entry((ComponentKind::Handler, view.name.as_str()))
                .or_insert(view.app.as_str());
        }

        let mut app_edges: BTreeSet<(&str, &str)> = BTreeSet::new();
        for edge in &report.dependencies {
            let target = &edge.target;
            let (_, target_kind) = ComponentKind::endpoints(&edge.kind);
            if let Some(target_app) = owner.get(&(target_kind, target.as_str())) {
                if *target_app != edge.source_app {
                    app_edges.insert((edge.source_app.as_str(), *target_app));
                }
            }
        }

        for (from, to) in app_edges {
            lines.push(format!("    {} --> {}", app_id(from), app_id(to)));
        }

        lines.join("\n")
    }

    /// Class diagram of models, their fields and relationships
    pub fn generate_entity_diagram(&self, report: &Report) -> String {
        let mut lines = vec!["classDiagram".to_string()];
        lines.push(format!("    direction {}", self.direction));

        for model in &report.models {
            let safe_name = sanitize_class_name(&model.name);
            lines.push(format!("    class {} {{", safe_name));
            for field in &model.fields {
                lines.push(format!(
                    "        +{} {}",
                    sanitize_class_name(&field.field_type),
                    field.name
                ));
            }

            // Add methods (limited to avoid huge diagrams)
            for behavior in model.behaviors.iter().take(5) {
                let visibility = if behavior.name.starts_with('_') { "-" } else { "+" };
                lines.push(format!("        {}{}()", visibility, behavior.name));
            }
            if model.behaviors.len() > 5 {
                lines.push(format!("        +... {} more", model.behaviors.len() - 5));
            }
            lines.push("    }".to_string());
        }

        for model in &report.models {
            let safe_name = sanitize_class_name(&model.name);
            for rel in &model.relationships {
                let Some(target) = &rel.target else {
                    continue;
                };
                let safe_target = sanitize_class_name(target);
                let arrow = match rel.kind {
                    RelationKind::ForeignKey => format!("{} --> {}", safe_name, safe_target),
                    RelationKind::OneToOne => format!("{} -- {}", safe_name, safe_target),
                    RelationKind::ManyToMany => {
                        format!("{} \"*\" -- \"*\" {}", safe_name, safe_target)
                    }
                };
                lines.push(format!("    {} : {}", arrow, rel.field_name));
            }
        }

        lines.join("\n")
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn node_id(kind: ComponentKind, name: &str) -> String {
    format!("{}_{}", kind.as_str(), sanitize_id(name))
}

fn app_id(name: &str) -> String {
    format!("app_{}", sanitize_id(name))
}

fn node_label(kind: ComponentKind, name: &str) -> String {
    let name = name.replace('"', "'");
    match kind {
        ComponentKind::Route => format!("/{}", name),
        _ => name,
    }
}

fn edge_label(kind: &EdgeKind) -> &'static str {
    match kind {
        EdgeKind::EntityRelationship { .. } => "relates",
        EdgeKind::HandlerUsesEntity => "uses",
        EdgeKind::RouteTargetsHandler { .. } => "routes",
        EdgeKind::FormBoundToEntity => "binds",
        EdgeKind::SerializerBoundToEntity => "serializes",
    }
}

fn node_style(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Entity => ":::model",
        ComponentKind::Handler => ":::view",
        ComponentKind::Route => ":::url",
        ComponentKind::Form | ComponentKind::Serializer => ":::form",
    }
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitize a class name for Mermaid class diagrams
fn sanitize_class_name(s: &str) -> String {
    // Extract just the class name if it's a dotted path
    let name = s.split('.').next_back().unwrap_or(s);
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}
