// Markdown architecture summary rendered through Tera

use crate::analysis::{DependencyGraph, Report};
use crate::error::Result;
use crate::output::DiagramGenerator;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

const HOTSPOT_LIMIT: usize = 10;

/// Template engine wrapping Tera with the summary template and filters
pub struct MarkdownWriter {
    tera: Tera,
}

impl MarkdownWriter {
    /// Create a writer with the embedded template
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("report.md", include_str!("../../templates/report.md.tera"))?;
        tera.register_filter("pluralize", pluralize);
        tera.register_filter("slugify", slugify_filter);
        Ok(Self { tera })
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        let mut context = Context::from_serialize(report)?;

        let graph = DependencyGraph::from_edges(&report.dependencies);
        context.insert("hotspots", &graph.most_depended_on(HOTSPOT_LIMIT));

        let entity_diagram = if report.models.is_empty() {
            String::new()
        } else {
            DiagramGenerator::new().generate_entity_diagram(report)
        };
        context.insert("entity_diagram", &entity_diagram);

        Ok(self.tera.render("report.md", &context)?)
    }
}

/// Pluralize a word based on count
fn pluralize(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let count = value.as_u64().unwrap_or(0);
    let singular = args
        .get("singular")
        .and_then(|v| v.as_str())
        .unwrap_or("item");
    let default_plural = format!("{}s", singular);
    let plural = args
        .get("plural")
        .and_then(|v| v.as_str())
        .unwrap_or(&default_plural);

    if count == 1 {
        Ok(Value::String(format!("{} {}", count, singular)))
    } else {
        Ok(Value::String(format!("{} {}", count, plural)))
    }
}

fn slugify_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(slugify(s)))
}

/// Convert text to a Markdown heading anchor
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
