//! Surveyor - extract architecture maps from Django projects
//!
//! Reads a project's settings and per-application source files as syntax
//! trees, never importing or executing them, and reports the models,
//! views, routes, forms, serializers and the dependencies between them.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod parser;
pub mod project;

// Re-export main types
pub use analysis::{Analyzer, Report};
pub use config::{Config, OutputConfig, OutputFormat};
pub use error::{Error, Result};
