// Application locator

use crate::config::Conventions;
use crate::model::Application;
use crate::project::ProjectTree;
use std::path::Path;

/// Reduce a registry entry to an application directory name
///
/// `None` for the framework's own applications (`django.contrib.admin`).
/// Dotted entries ending in the config suffix take the second-to-last
/// segment, other dotted entries the last one.
pub fn normalize_app_label(entry: &str, conventions: &Conventions) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let reserved = format!("{}.", conventions.reserved_namespace);
    if entry.starts_with(&reserved) {
        return None;
    }

    if !entry.contains('.') {
        return Some(entry.to_string());
    }

    let segments: Vec<&str> = entry.split('.').collect();
    let label = if entry.ends_with(&conventions.config_suffix) && segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        segments[segments.len() - 1]
    };
    (!label.is_empty()).then(|| label.to_string())
}

/// Applications of the project
///
/// Registry entries with a same-named directory under the root come first,
/// in registry order. When none match, every non-hidden subdirectory holding
/// one of `markers` is taken as an inferred application.
pub fn locate_applications<T: ProjectTree + ?Sized>(
    tree: &T,
    registry: &[String],
    markers: &[String],
    conventions: &Conventions,
) -> Vec<Application> {
    let mut apps: Vec<Application> = Vec::new();

    for entry in registry {
        let Some(label) = normalize_app_label(entry, conventions) else {
            continue;
        };
        if apps.iter().any(|a| a.name == label) {
            continue;
        }
        if tree.is_dir(Path::new(&label)) {
            log::debug!("Found declared app {} ({})", label, entry);
            apps.push(Application::declared(&label));
        } else {
            log::debug!("No directory for registry entry {}", entry);
        }
    }

    if !apps.is_empty() {
        return apps;
    }

    let subdirs = match tree.subdirectories() {
        Ok(dirs) => dirs,
        Err(e) => {
            log::warn!("Could not list project directories: {}", e);
            return apps;
        }
    };

    for dir in subdirs {
        if dir.starts_with('.') || dir.starts_with('_') {
            continue;
        }
        let has_marker = markers
            .iter()
            .any(|m| tree.is_file(&Path::new(&dir).join(m)));
        if has_marker {
            log::debug!("Inferred app {} from directory layout", dir);
            apps.push(Application::inferred(&dir));
        }
    }

    apps
}
