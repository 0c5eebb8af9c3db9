// Result assembly: the report handed to writers

use crate::extract::ExtractionContext;
use crate::model::{
    Application, DatabaseDescriptor, DependencyEdge, Diagnostics, Entity, Handler, Middleware,
    Project, Route, Serializer, TemplateDescriptor, ValidationForm,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Framework facts shown in the metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub version: String,
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub project_name: String,
    pub total_apps: usize,
    pub total_models: usize,
    pub total_views: usize,
    pub analyzed_at: DateTime<Utc>,
    pub django: FrameworkInfo,
}

/// The part of the settings module reported back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsSummary {
    pub databases: BTreeMap<String, DatabaseDescriptor>,
    pub static_url: Option<String>,
    pub media_url: Option<String>,
    pub templates: Vec<TemplateDescriptor>,
}

/// Everything extracted from one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: Metadata,
    pub apps: Vec<Application>,
    pub models: Vec<Entity>,
    pub views: Vec<Handler>,
    pub urls: Vec<Route>,
    pub forms: Vec<ValidationForm>,
    pub serializers: Vec<Serializer>,
    pub middleware: Vec<Middleware>,
    pub dependencies: Vec<DependencyEdge>,
    pub settings: SettingsSummary,
    pub errors: Diagnostics,
}

impl Report {
    /// Merge project facts, extracted collections and edges
    pub fn assemble(
        project: Project,
        extracted: ExtractionContext,
        dependencies: Vec<DependencyEdge>,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        let Project {
            name,
            apps,
            configuration,
            framework_version,
            mut diagnostics,
            ..
        } = project;
        diagnostics.extend(extracted.diagnostics);

        let metadata = Metadata {
            project_name: name,
            total_apps: apps.len(),
            total_models: extracted.entities.len(),
            total_views: extracted.handlers.len(),
            analyzed_at,
            django: FrameworkInfo {
                version: framework_version,
                debug: configuration.debug,
            },
        };

        Self {
            metadata,
            apps,
            models: extracted.entities,
            views: extracted.handlers,
            urls: extracted.routes,
            forms: extracted.forms,
            serializers: extracted.serializers,
            middleware: configuration
                .middleware
                .iter()
                .map(|path| Middleware::from_path(path))
                .collect(),
            dependencies,
            settings: SettingsSummary {
                databases: configuration.databases,
                static_url: configuration.static_url,
                media_url: configuration.media_url,
                templates: configuration.templates,
            },
            errors: diagnostics,
        }
    }

    /// Total number of recorded diagnostics
    pub fn diagnostic_count(&self) -> usize {
        self.errors.len()
    }

    /// Serialize as JSON
    pub fn to_json(&self, pretty: bool) -> crate::error::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigurationRecord;
    use std::path::PathBuf;

    fn project() -> Project {
        let mut configuration = ConfigurationRecord {
            debug: Some(false),
            static_url: Some("/static/".to_string()),
            middleware: vec!["django.middleware.common.CommonMiddleware".to_string()],
            ..Default::default()
        };
        configuration
            .databases
            .insert("default".to_string(), DatabaseDescriptor::unknown());

        let mut diagnostics = Diagnostics::default();
        diagnostics.parsing_error("Could not find settings.py file");

        Project {
            name: "mysite".to_string(),
            root: PathBuf::from("/srv/mysite"),
            apps: vec![Application::declared("blog")],
            configuration,
            framework_version: "4.2".to_string(),
            diagnostics,
        }
    }

    #[test]
    fn test_assemble_metadata_and_settings() {
        let mut extracted = ExtractionContext::new();
        extracted.entities.push(Entity::new("Post", "blog"));
        extracted
            .diagnostics
            .parsing_error("Error parsing views in blog: bad");

        let report = Report::assemble(project(), extracted, Vec::new(), Utc::now());
        assert_eq!(report.metadata.project_name, "mysite");
        assert_eq!(report.metadata.total_apps, 1);
        assert_eq!(report.metadata.total_models, 1);
        assert_eq!(report.metadata.total_views, 0);
        assert_eq!(report.metadata.django.version, "4.2");
        assert_eq!(report.metadata.django.debug, Some(false));
        assert_eq!(report.middleware[0].name, "CommonMiddleware");
        assert_eq!(report.settings.static_url.as_deref(), Some("/static/"));
        assert_eq!(report.errors.parsing.len(), 2);
        assert_eq!(report.diagnostic_count(), 2);
    }

    #[test]
    fn test_json_contract_keys() {
        let report = Report::assemble(project(), ExtractionContext::new(), Vec::new(), Utc::now());
        let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();

        for key in [
            "metadata",
            "apps",
            "models",
            "views",
            "urls",
            "forms",
            "serializers",
            "middleware",
            "dependencies",
            "settings",
            "errors",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        let metadata = &value["metadata"];
        assert_eq!(metadata["projectName"], "mysite");
        assert_eq!(metadata["totalApps"], 1);
        assert!(metadata["analyzedAt"].is_string());
        assert_eq!(metadata["django"]["version"], "4.2");
        assert_eq!(value["settings"]["databases"]["default"]["engine"], "Unknown");
        assert!(value["errors"]["validation"].as_array().unwrap().is_empty());
    }
}
