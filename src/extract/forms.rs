// Form and serializer extraction from forms.py and serializers.py

use crate::config::Conventions;
use crate::extract::{declared_fields, meta_options};
use crate::model::{Serializer, ValidationForm};
use crate::parser::walk::nodes_of_kind;
use crate::parser::{class_def, simple_name, ClassDef, SourceFile};

/// Classes deriving from one of the form base names (`forms.Form`, `ModelForm`)
pub fn extract_forms(app: &str, file: &SourceFile, conventions: &Conventions) -> Vec<ValidationForm> {
    let source = file.bytes();
    classes(file)
        .into_iter()
        .filter_map(|class| {
            let bases = matching_bases(&class, source, |name| {
                conventions.form_bases.iter().any(|b| b == name)
            });
            if bases.is_empty() {
                return None;
            }
            Some(ValidationForm {
                name: class.name.clone(),
                app: app.to_string(),
                bases,
                fields: declared_fields(&class, source),
                options: meta_options(&class, source),
            })
        })
        .collect()
}

/// Classes with a base whose name contains the serializer fragment
pub fn extract_serializers(app: &str, file: &SourceFile, conventions: &Conventions) -> Vec<Serializer> {
    let source = file.bytes();
    classes(file)
        .into_iter()
        .filter_map(|class| {
            let bases = matching_bases(&class, source, |name| {
                name.contains(conventions.serializer_fragment.as_str())
            });
            if bases.is_empty() {
                return None;
            }
            Some(Serializer {
                name: class.name.clone(),
                app: app.to_string(),
                bases,
                fields: declared_fields(&class, source),
                options: meta_options(&class, source),
            })
        })
        .collect()
}

fn classes(file: &SourceFile) -> Vec<ClassDef<'_>> {
    nodes_of_kind(file.root(), "class_definition")
        .filter_map(|node| class_def(&node, file.bytes()))
        .collect()
}

/// Trailing names of bare or attribute bases accepted by `accept`
fn matching_bases<F>(class: &ClassDef, source: &[u8], accept: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    class
        .bases
        .iter()
        .filter(|b| matches!(b.kind(), "identifier" | "attribute"))
        .filter_map(|b| simple_name(b, source))
        .filter(|name| accept(name.as_str()))
        .collect()
}
