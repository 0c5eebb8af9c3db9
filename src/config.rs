use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub discovery: DiscoveryConfig,
    pub conventions: Conventions,
    pub output: OutputConfig,
}

/// Project metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Overrides the project name (defaults to the root directory name)
    pub name: Option<String>,
}

/// How the project tree is searched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File name of the settings module
    pub settings_file: String,
    /// Glob patterns (relative to the root) skipped when looking for settings
    pub exclude: Vec<String>,
    /// A directory holding any of these files is treated as an application
    /// when the registry yields nothing
    pub app_markers: Vec<String>,
}

/// Framework vocabulary the extractors match syntax against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Attribute name that marks an entity base (`models.Model`)
    pub entity_base: String,
    /// Name fragment that marks a class-based handler base
    pub handler_base: String,
    /// Bare-name call that renders a template
    pub render_call: String,
    /// Suffix of the reverse related-object accessor (`post_set`)
    pub related_set_suffix: String,
    /// Top-level name holding the route list
    pub route_list: String,
    /// Bare-name call that nests another route module
    pub include_call: String,
    /// Base names that mark a validation form
    pub form_bases: Vec<String>,
    /// Form base that binds a form to an entity through its options block
    pub model_form_base: String,
    /// Name fragment that marks an API serializer base
    pub serializer_fragment: String,
    /// First dotted segment of the framework's own applications
    pub reserved_namespace: String,
    /// Suffix of application config class identifiers
    pub config_suffix: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Destination file; stdout when unset
    pub path: Option<PathBuf>,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Mermaid flowcharts with more nodes are collapsed to one node per app
    pub diagram_max_nodes: usize,
    /// Mermaid layout direction
    pub diagram_direction: String,
}

const DIAGRAM_DIRECTIONS: &[&str] = &["TB", "TD", "BT", "LR", "RL"];

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
    Mermaid,
}

impl OutputFormat {
    /// Parse a format name as given on the command line
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            other => Err(Error::config_validation(format!("unknown output format: {}", other))),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            settings_file: "settings.py".to_string(),
            exclude: vec![
                ".*/**".to_string(),
                "venv/**".to_string(),
                ".venv/**".to_string(),
                "env/**".to_string(),
                "node_modules/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/site-packages/**".to_string(),
            ],
            app_markers: vec![
                "models.py".to_string(),
                "views.py".to_string(),
                "urls.py".to_string(),
                "apps.py".to_string(),
            ],
        }
    }
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            entity_base: "Model".to_string(),
            handler_base: "View".to_string(),
            render_call: "render".to_string(),
            related_set_suffix: "_set".to_string(),
            route_list: "urlpatterns".to_string(),
            include_call: "include".to_string(),
            form_bases: vec!["Form".to_string(), "ModelForm".to_string()],
            model_form_base: "ModelForm".to_string(),
            serializer_fragment: "Serializer".to_string(),
            reserved_namespace: "django".to_string(),
            config_suffix: "Config".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
            pretty: true,
            diagram_max_nodes: 100,
            diagram_direction: "LR".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        format: Option<OutputFormat>,
        name: Option<String>,
        compact: bool,
    ) {
        if let Some(out) = output {
            self.output.path = Some(out);
        }

        if let Some(fmt) = format {
            self.output.format = fmt;
        }

        if let Some(n) = name {
            self.project.name = Some(n);
        }

        if compact {
            self.output.pretty = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.discovery.settings_file.trim().is_empty() {
            return Err(Error::config_validation("discovery.settings_file must not be empty"));
        }

        if self.discovery.app_markers.is_empty() {
            return Err(Error::config_validation("at least one app marker file required"));
        }

        for pattern in &self.discovery.exclude {
            glob::Pattern::new(pattern)?;
        }

        let c = &self.conventions;
        let required = [
            ("entity_base", &c.entity_base),
            ("handler_base", &c.handler_base),
            ("render_call", &c.render_call),
            ("related_set_suffix", &c.related_set_suffix),
            ("route_list", &c.route_list),
            ("include_call", &c.include_call),
            ("model_form_base", &c.model_form_base),
            ("serializer_fragment", &c.serializer_fragment),
            ("reserved_namespace", &c.reserved_namespace),
            ("config_suffix", &c.config_suffix),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config_validation(format!(
                    "conventions.{} must not be empty",
                    key
                )));
            }
        }

        if c.form_bases.is_empty() {
            return Err(Error::config_validation("conventions.form_bases must not be empty"));
        }

        if self.output.diagram_max_nodes == 0 {
            return Err(Error::config_validation("output.diagram_max_nodes must be at least 1"));
        }

        if !DIAGRAM_DIRECTIONS.contains(&self.output.diagram_direction.as_str()) {
            return Err(Error::config_validation(format!(
                "output.diagram_direction must be one of {}",
                DIAGRAM_DIRECTIONS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.project.name.is_none());
        assert_eq!(config.discovery.settings_file, "settings.py");
        assert_eq!(config.conventions.entity_base, "Model");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[project]
name = "shop"

[discovery]
settings_file = "base.py"

[conventions]
render_call = "render_to_response"

[output]
format = "markdown"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("shop"));
        assert_eq!(config.discovery.settings_file, "base.py");
        assert_eq!(config.conventions.render_call, "render_to_response");
        // untouched keys keep their defaults
        assert_eq!(config.conventions.handler_base, "View");
        assert_eq!(config.output.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_diagram_options() {
        let output: OutputConfig =
            toml::from_str("diagram_max_nodes = 25\ndiagram_direction = \"TB\"").unwrap();
        assert_eq!(output.diagram_max_nodes, 25);
        assert_eq!(output.diagram_direction, "TB");
        assert!(output.pretty);

        let mut config = Config::default();
        config.output.diagram_direction = "up".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("diagram_direction"));

        config.output.diagram_direction = "RL".to_string();
        config.output.diagram_max_nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/surveyor.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/surveyor.toml")).unwrap();
        assert_eq!(config.discovery.settings_file, "settings.py");
    }

    #[test]
    fn test_validation_empty_vocabulary() {
        let mut config = Config::default();
        config.conventions.entity_base = " ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("entity_base"));
    }

    #[test]
    fn test_validation_empty_markers() {
        let mut config = Config::default();
        config.discovery.app_markers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_glob() {
        let mut config = Config::default();
        config.discovery.exclude.push("[".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_cli() {
        let mut config = Config::default();
        config.merge_cli(
            Some(PathBuf::from("/tmp/report.md")),
            Some(OutputFormat::Markdown),
            Some("blogsite".to_string()),
            true,
        );
        assert_eq!(config.output.path, Some(PathBuf::from("/tmp/report.md")));
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert_eq!(config.project.name.as_deref(), Some("blogsite"));
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_merge_cli_keeps_config_values() {
        let mut config = Config::default();
        config.output.format = OutputFormat::Mermaid;
        config.merge_cli(None, None, None, false);
        assert_eq!(config.output.format, OutputFormat::Mermaid);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::from_name("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_name("mermaid").unwrap(), OutputFormat::Mermaid);
        assert!(OutputFormat::from_name("html").is_err());
    }

    #[test]
    fn test_output_format_parsing() {
        let toml_str = r#"format = "mermaid""#;
        let output: OutputConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(output.format, OutputFormat::Mermaid);
    }
}
