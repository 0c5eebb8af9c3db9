//! CLI module for Surveyor

mod args;

pub use args::{Args, Command};

use crate::analysis::{Analyzer, Report};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "surveyor.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    // ignore an already-installed logger
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            output,
            format,
            config,
            name,
            compact,
            verbose,
        } => {
            init_logging(verbose);

            let mut cfg = load_config(config.as_deref())?;
            let format = format.as_deref().map(OutputFormat::from_name).transpose()?;
            cfg.merge_cli(output, format, name, compact);

            log::debug!("Analyzing: {}", path.display());
            log::debug!("Format: {:?}", cfg.output.format);

            let mut analyzer = Analyzer::new(cfg.clone())?.with_verbose(verbose);
            let report = analyzer.analyze(&path)?;

            let rendered = output::render(&report, &cfg.output)?;
            write_output(cfg.output.path.as_deref(), &rendered)?;

            print_summary(&report, cfg.output.path.as_deref());
            Ok(())
        }

        Command::Version => {
            println!("surveyor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// `--config` must exist; the default file is optional
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG)),
    }
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Console summary; goes to stderr when the report itself is on stdout
fn print_summary(report: &Report, output: Option<&Path>) {
    let summary = summary_lines(report, output.map(Path::to_path_buf));
    if output.is_some() {
        println!("{}", summary);
    } else {
        eprintln!("{}", summary);
    }
}

fn summary_lines(report: &Report, output: Option<PathBuf>) -> String {
    let meta = &report.metadata;
    let mut lines = vec![
        format!("Project: {}", meta.project_name),
        format!(
            "Found {} apps, {} models, {} views",
            meta.total_apps, meta.total_models, meta.total_views
        ),
    ];

    let diagnostics = report.diagnostic_count();
    if diagnostics > 0 {
        lines.push(format!("Diagnostics: {}", diagnostics));
        for message in report.errors.parsing.iter().take(5) {
            lines.push(format!("  {}", message));
        }
        if report.errors.parsing.len() > 5 {
            lines.push(format!("  ... and {} more", report.errors.parsing.len() - 5));
        }
    }

    if let Some(path) = output {
        lines.push(format!("Report written to: {}", path.display()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionContext;
    use crate::model::{Application, ConfigurationRecord, Diagnostics, Project};

    fn report(errors: usize) -> Report {
        let mut extracted = ExtractionContext::new();
        for i in 0..errors {
            extracted
                .diagnostics
                .parsing_error(format!("Error parsing views in app{}: bad", i));
        }
        let project = Project {
            name: "mysite".to_string(),
            root: PathBuf::from("/srv/mysite"),
            apps: vec![Application::declared("blog")],
            configuration: ConfigurationRecord::default(),
            framework_version: "Unknown".to_string(),
            diagnostics: Diagnostics::default(),
        };
        Report::assemble(project, extracted, Vec::new(), chrono::Utc::now())
    }

    #[test]
    fn test_summary_without_diagnostics() {
        let summary = summary_lines(&report(0), None);
        assert_eq!(summary, "Project: mysite\nFound 1 apps, 0 models, 0 views");
    }

    #[test]
    fn test_summary_truncates_diagnostics() {
        let summary = summary_lines(&report(7), Some(PathBuf::from("out.json")));
        assert!(summary.contains("Diagnostics: 7"));
        assert!(summary.contains("Error parsing views in app4: bad"));
        assert!(!summary.contains("app5"));
        assert!(summary.contains("... and 2 more"));
        assert!(summary.ends_with("Report written to: out.json"));
    }

    #[test]
    fn test_load_config_explicit_missing() {
        assert!(load_config(Some(Path::new("/nonexistent/surveyor.toml"))).is_err());
    }

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs/report.json");
        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
