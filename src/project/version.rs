// Framework version detection from dependency manifests

use crate::project::ProjectTree;
use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const UNKNOWN_VERSION: &str = "Unknown";

/// Requirement files, relative to the root
const REQUIREMENT_PATTERNS: &[&str] = &["requirements*.txt", "requirements/*.txt"];

/// Project metadata files, checked after every requirement file
const PROJECT_MANIFESTS: &[&str] = &["pyproject.toml", "Pipfile", "setup.py", "setup.cfg"];

/// Declared Django version, or `Unknown`
///
/// `Django==4.2.7` yields `4.2.7`; looser constraints (`>=4.2,<5`, `^4.2`)
/// are reported as written.
pub fn detect_framework_version<T: ProjectTree + ?Sized>(tree: &T) -> String {
    let Some(matcher) = VersionMatcher::new() else {
        return UNKNOWN_VERSION.to_string();
    };

    for manifest in manifests(tree.root()) {
        let text = match tree.read(&manifest) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => {
                log::debug!("Skipping {}: {}", manifest.display(), e);
                continue;
            }
        };
        if let Some(version) = matcher.find(&text) {
            log::debug!("Django {} declared in {}", version, manifest.display());
            return version;
        }
    }

    UNKNOWN_VERSION.to_string()
}

/// Manifests in the order they are consulted: `requirements.txt`, the other
/// `requirements*.txt` files, `requirements/*.txt`, then project metadata
fn manifests(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for pattern in REQUIREMENT_PATTERNS {
        let mut matched = matching_files(root, pattern);
        matched.sort_by_key(|p| (p != Path::new("requirements.txt"), p.clone()));
        found.extend(matched);
    }
    found.extend(PROJECT_MANIFESTS.iter().map(PathBuf::from));
    found
}

/// Files under `root` matching a relative glob, as relative paths
fn matching_files(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!("{}/{}", Pattern::escape(&root.to_string_lossy()), pattern);
    let paths = match glob::glob(&full) {
        Ok(paths) => paths,
        Err(e) => {
            log::debug!("Bad manifest pattern {}: {}", pattern, e);
            return Vec::new();
        }
    };
    paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter_map(|path| path.strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

struct VersionMatcher {
    requirement: Regex,
    table_entry: Regex,
}

impl VersionMatcher {
    fn new() -> Option<Self> {
        // `Django==4.2`, `"django>=4.2,<5.0"`, `django[argon2]~=4.2`
        let requirement = Regex::new(
            r#"(?im)^\s*["']?django\s*(?:\[[^\]]*\])?\s*((?:===|==|~=|!=|>=|<=|>|<)\s*[0-9][^\s"',;#]*(?:\s*,\s*(?:===|==|~=|!=|>=|<=|>|<)\s*[0-9][^\s"',;#]*)*)"#,
        )
        .ok()?;
        // `django = "^4.2"` in pyproject tables and Pipfiles
        let table_entry = Regex::new(r#"(?im)^\s*django\s*=\s*["']([^"']+)["']"#).ok()?;
        Some(Self {
            requirement,
            table_entry,
        })
    }

    fn find(&self, text: &str) -> Option<String> {
        let constraint = self
            .requirement
            .captures(text)
            .or_else(|| self.table_entry.captures(text))?
            .get(1)?
            .as_str()
            .split_whitespace()
            .collect::<String>();

        match constraint.strip_prefix("==") {
            Some(exact) if !exact.contains(',') => Some(exact.trim_start_matches('=').to_string()),
            _ => Some(constraint),
        }
    }
}
