// Settings module reader
//
// Reads the recognised top-level assignments of the settings file into a
// ConfigurationRecord. Only literal syntax is understood; anything computed
// at runtime is skipped.

use crate::model::{ConfigurationRecord, DatabaseDescriptor, Diagnostics, TemplateDescriptor};
use crate::parser::walk::named_children;
use crate::parser::{assignment, extract_value, string_literal, PythonParser, SourceFile};
use crate::project::ProjectTree;
use std::path::PathBuf;
use tree_sitter::Node;

/// Locate, parse and read the settings file
///
/// Never fails: a missing or broken settings file is reported through
/// `diagnostics` and yields an empty record.
pub fn read_settings<T: ProjectTree + ?Sized>(
    tree: &T,
    parser: &mut PythonParser,
    settings_file: &str,
    diagnostics: &mut Diagnostics,
) -> (ConfigurationRecord, Option<PathBuf>) {
    let Some(path) = tree.find_files(settings_file).into_iter().next() else {
        diagnostics.parsing_error(format!("Could not find {} file", settings_file));
        return (ConfigurationRecord::default(), None);
    };
    log::info!("Reading settings from {}", path.display());

    let parsed = tree.read(&path).and_then(|text| {
        let text = text.unwrap_or_default();
        parser.parse_source(text, path.clone())
    });

    match parsed {
        Ok(file) => (parse_settings(&file), Some(path)),
        Err(e) => {
            diagnostics.parsing_error(format!("Error parsing settings file: {}", e));
            (ConfigurationRecord::default(), Some(path))
        }
    }
}

/// Build a record from an already parsed settings module
pub fn parse_settings(file: &SourceFile) -> ConfigurationRecord {
    let source = file.bytes();
    let mut record = ConfigurationRecord::default();

    for statement in file.statements() {
        let Some(assign) = assignment(&statement) else {
            continue;
        };
        let Some(value) = assign.value else {
            continue;
        };

        for name in assign.target_names(source) {
            match name.as_str() {
                "INSTALLED_APPS" => {
                    if let Some(items) = string_list(&value, source) {
                        if !assign.augmented {
                            record.installed_apps.clear();
                        }
                        record.installed_apps.extend(items);
                    }
                }
                "MIDDLEWARE" => {
                    if let Some(items) = string_list(&value, source) {
                        if !assign.augmented {
                            record.middleware.clear();
                        }
                        record.middleware.extend(items);
                    }
                }
                "STATIC_URL" if !assign.augmented => {
                    if let Some(s) = string_literal(&value, source) {
                        record.static_url = Some(s);
                    }
                }
                "MEDIA_URL" if !assign.augmented => {
                    if let Some(s) = string_literal(&value, source) {
                        record.media_url = Some(s);
                    }
                }
                "ROOT_URLCONF" if !assign.augmented => {
                    if let Some(s) = string_literal(&value, source) {
                        record.root_urlconf = Some(s);
                    }
                }
                "DEBUG" if !assign.augmented => {
                    record.debug = extract_value(&value, source).as_bool();
                }
                "DATABASES" if !assign.augmented => {
                    if let Some(default) = default_database(&value, source) {
                        record.databases.insert("default".to_string(), default);
                    }
                }
                "TEMPLATES" => {
                    if is_sequence(&value) {
                        if !assign.augmented {
                            record.templates.clear();
                        }
                        record.templates.extend(
                            named_children(&value)
                                .iter()
                                .filter(|item| item.kind() == "dictionary")
                                .map(|item| template_descriptor(item, source)),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    log::debug!(
        "Settings: {} installed apps, {} middleware",
        record.installed_apps.len(),
        record.middleware.len()
    );
    record
}

fn is_sequence(node: &Node) -> bool {
    matches!(node.kind(), "list" | "tuple")
}

/// String elements of a list or tuple literal; other elements are skipped
fn string_list(node: &Node, source: &[u8]) -> Option<Vec<String>> {
    if !is_sequence(node) {
        return None;
    }
    Some(
        named_children(node)
            .iter()
            .filter_map(|item| string_literal(item, source))
            .collect(),
    )
}

/// `(key, value)` pairs of a dictionary literal whose key is a string literal
fn string_keyed_pairs<'t>(node: &Node<'t>, source: &[u8]) -> Vec<(String, Node<'t>)> {
    if node.kind() != "dictionary" {
        return Vec::new();
    }
    named_children(node)
        .into_iter()
        .filter(|p| p.kind() == "pair")
        .filter_map(|pair| {
            let key = string_literal(&pair.child_by_field_name("key")?, source)?;
            Some((key, pair.child_by_field_name("value")?))
        })
        .collect()
}

/// Only the `"default"` connection is read
fn default_database(node: &Node, source: &[u8]) -> Option<DatabaseDescriptor> {
    let (_, connection) = string_keyed_pairs(node, source)
        .into_iter()
        .find(|(key, _)| key == "default")?;

    let engine = string_keyed_pairs(&connection, source)
        .into_iter()
        .find(|(key, _)| key == "ENGINE")
        .and_then(|(_, value)| string_literal(&value, source));

    Some(match engine {
        Some(engine) => DatabaseDescriptor { engine },
        None => DatabaseDescriptor::unknown(),
    })
}

fn template_descriptor(node: &Node, source: &[u8]) -> TemplateDescriptor {
    let mut descriptor = TemplateDescriptor::default();
    for (key, value) in string_keyed_pairs(node, source) {
        match key.as_str() {
            "BACKEND" => descriptor.backend = string_literal(&value, source),
            // `BASE_DIR / "templates"` and friends are not literals
            "DIRS" => descriptor.dirs = Some(string_list(&value, source).unwrap_or_default()),
            "APP_DIRS" => descriptor.app_dirs = extract_value(&value, source).as_bool(),
            _ => {}
        }
    }
    descriptor
}
