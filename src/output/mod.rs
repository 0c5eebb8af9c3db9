// Report writers

pub mod diagrams;
pub mod markdown;

pub use diagrams::DiagramGenerator;
pub use markdown::MarkdownWriter;

use crate::analysis::Report;
use crate::config::{OutputConfig, OutputFormat};
use crate::error::Result;

/// Render a report in the configured format
pub fn render(report: &Report, config: &OutputConfig) -> Result<String> {
    match config.format {
        OutputFormat::Json => report.to_json(config.pretty),
        OutputFormat::Markdown => MarkdownWriter::new()?.render(report),
        OutputFormat::Mermaid => {
            let generator = DiagramGenerator::from_config(config);
            let mut out = String::new();
            if !report.models.is_empty() {
                out.push_str(&generator.generate_entity_diagram(report));
                out.push_str("\n\n");
            }
            out.push_str(&generator.generate_dependency_graph(report));
            out.push('\n');
            Ok(out)
        }
    }
}
