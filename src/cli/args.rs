//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract architecture maps from Django projects
#[derive(Parser, Debug)]
#[command(name = "surveyor")]
#[command(about = "Extract architecture maps from Django projects without running them")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a Django project and write its architecture report
    Analyze {
        /// Root of the project to analyze
        path: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json, markdown, mermaid)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project name shown in the report
        #[arg(long)]
        name: Option<String>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults() {
        let args = Args::try_parse_from(["surveyor", "analyze", "./mysite"]).unwrap();
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
                assert_eq!(path, PathBuf::from("./mysite"));
                assert!(output.is_none());
                assert!(format.is_none());
                assert!(config.is_none());
                assert!(name.is_none());
                assert!(!compact);
                assert!(!verbose);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_options() {
        let args = Args::try_parse_from([
            "surveyor", "analyze", "./project",
            "--output", "/tmp/report.md",
            "--format", "markdown",
            "--config", "custom.toml",
            "--name", "Storefront",
            "--compact",
            "--verbose",
        ])
        .unwrap();

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
                assert_eq!(path, PathBuf::from("./project"));
                assert_eq!(output, Some(PathBuf::from("/tmp/report.md")));
                assert_eq!(format.as_deref(), Some("markdown"));
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
                assert_eq!(name.as_deref(), Some("Storefront"));
                assert!(compact);
                assert!(verbose);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_short_flags() {
        let args =
            Args::try_parse_from(["surveyor", "analyze", ".", "-o", "out.json", "-c", "s.toml", "-v"])
                .unwrap();
        match args.command {
            Command::Analyze {
                output,
                config,
                verbose,
                ..
            } => {
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert_eq!(config, Some(PathBuf::from("s.toml")));
                assert!(verbose);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_missing_path_rejected() {
        assert!(Args::try_parse_from(["surveyor", "analyze"]).is_err());
    }

    #[test]
    fn test_version_command() {
        let args = Args::try_parse_from(["surveyor", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));
    }
}
