// Analysis pipeline: settings, applications, extraction, dependencies, report

pub mod graph;
pub mod report;

pub use graph::{synthesize, Component, ComponentKind, DependencyGraph, Hotspot};
pub use report::{FrameworkInfo, Metadata, Report, SettingsSummary};

use crate::config::Config;
use crate::error::Result;
use crate::extract::{forms, models, urls, views, EntityIndex, ExtractionContext, FileKind};
use crate::model::{Application, Diagnostics, Project};
use crate::parser::PythonParser;
use crate::project::{
    detect_framework_version, locate_applications, read_settings, FsTree, ProjectTree,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::Path;

/// Main analyzer that orchestrates the extraction pipeline
pub struct Analyzer {
    config: Config,
    parser: PythonParser,
    verbose: bool,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let parser = PythonParser::new()?;

        Ok(Self {
            config,
            parser,
            verbose: false,
        })
    }

    /// Show a progress bar while extracting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Analyze the project rooted at `root`
    ///
    /// Only an inaccessible root is an error; everything else ends up in the
    /// report's diagnostics.
    pub fn analyze(&mut self, root: &Path) -> Result<Report> {
        let tree = FsTree::open(root, &self.config.discovery.exclude)?;
        let report = self.analyze_tree(&tree);
        log::info!(
            "Analyzed {}: {} apps, {} models, {} views, {} diagnostics",
            tree.root().display(),
            report.metadata.total_apps,
            report.metadata.total_models,
            report.metadata.total_views,
            report.diagnostic_count()
        );
        Ok(report)
    }

    /// Run the pipeline over any project tree
    pub fn analyze_tree<T: ProjectTree + ?Sized>(&mut self, tree: &T) -> Report {
        let project = self.discover(tree);
        let extracted = self.extract(tree, &project.apps);
        let dependencies = synthesize(&extracted, &self.config.conventions);
        Report::assemble(project, extracted, dependencies, chrono::Utc::now())
    }

    /// Settings, applications and framework version
    fn discover<T: ProjectTree + ?Sized>(&mut self, tree: &T) -> Project {
        let mut diagnostics = Diagnostics::default();
        let (configuration, settings_path) = read_settings(
            tree,
            &mut self.parser,
            &self.config.discovery.settings_file,
            &mut diagnostics,
        );
        if let Some(path) = settings_path {
            log::debug!("Settings module: {}", path.display());
        }

        let apps = locate_applications(
            tree,
            &configuration.installed_apps,
            &self.config.discovery.app_markers,
            &self.config.conventions,
        );
        log::info!("Found {} apps", apps.len());

        let name = self.config.project.name.clone().unwrap_or_else(|| tree.name());

        Project {
            name,
            root: tree.root().to_path_buf(),
            apps,
            configuration,
            framework_version: detect_framework_version(tree),
            diagnostics,
        }
    }

    /// Extract every application in parallel
    ///
    /// Entities go first: handlers cross-reference the entity set of the
    /// whole project. Worker results are merged in application order.
    fn extract<T: ProjectTree + ?Sized>(&self, tree: &T, apps: &[Application]) -> ExtractionContext {
        let conventions = &self.config.conventions;
        let progress = self.progress_bar(apps.len() as u64 * 2);

        let entity_phase = run_per_app(apps, progress.as_ref(), |ctx, parser, app| {
            ctx.with_file(tree, parser, app, FileKind::Models, |ctx, file| {
                ctx.entities
                    .extend(models::extract_entities(&app.name, file, conventions));
            });
        });

        let mut all = ExtractionContext::new();
        for ctx in entity_phase {
            all.merge(ctx);
        }

        let index = EntityIndex::new(&all.entities, conventions);
        let rest = run_per_app(apps, progress.as_ref(), |ctx, parser, app| {
            ctx.with_file(tree, parser, app, FileKind::Views, |ctx, file| {
                ctx.handlers
                    .extend(views::extract_handlers(&app.name, file, conventions, &index));
            });
            ctx.with_file(tree, parser, app, FileKind::Urls, |ctx, file| {
                ctx.routes
                    .extend(urls::extract_routes(&app.name, file, conventions));
            });
            ctx.with_file(tree, parser, app, FileKind::Forms, |ctx, file| {
                ctx.forms
                    .extend(forms::extract_forms(&app.name, file, conventions));
            });
            ctx.with_file(tree, parser, app, FileKind::Serializers, |ctx, file| {
                ctx.serializers
                    .extend(forms::extract_serializers(&app.name, file, conventions));
            });
        });

        for ctx in rest {
            all.merge(ctx);
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Extraction complete");
        }

        all
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new(len);
        match ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Progress style rejected: {}", e),
        }
        Some(pb)
    }
}

/// Run `work` once per application, each worker with its own parser and context
fn run_per_app<F>(apps: &[Application], progress: Option<&ProgressBar>, work: F) -> Vec<ExtractionContext>
where
    F: Fn(&mut ExtractionContext, &mut PythonParser, &Application) + Sync + Send,
{
    apps.par_iter()
        .map_init(PythonParser::new, |parser, app| {
            let mut ctx = ExtractionContext::new();
            match parser {
                Ok(parser) => work(&mut ctx, parser, app),
                Err(e) => ctx
                    .diagnostics
                    .parsing_error(format!("Error parsing {}: {}", app.name, e)),
            }
            if let Some(pb) = progress {
                pb.set_message(app.name.clone());
                pb.inc(1);
            }
            ctx
        })
        .collect()
}
