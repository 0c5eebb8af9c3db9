// Per-application extractors
//
// Each extractor reads one conventional file of an application and returns
// plain model values. Failures stop at the file boundary: the file adds a
// parsing diagnostic and nothing else.

pub mod forms;
pub mod models;
pub mod urls;
pub mod views;

pub use views::EntityIndex;

use crate::model::{
    Application, DeclaredField, Diagnostics, Entity, Handler, OptionMap, Route, Serializer,
    ValidationForm,
};
use crate::parser::{assignment, call_site, extract_value, simple_name, ClassDef, PythonParser, SourceFile};
use crate::project::ProjectTree;
use std::path::Path;

/// The conventional files an application is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Models,
    Views,
    Urls,
    Forms,
    Serializers,
}

impl FileKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Models => "models.py",
            FileKind::Views => "views.py",
            FileKind::Urls => "urls.py",
            FileKind::Forms => "forms.py",
            FileKind::Serializers => "serializers.py",
        }
    }

    /// Name used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Models => "models",
            FileKind::Views => "views",
            FileKind::Urls => "urls",
            FileKind::Forms => "forms",
            FileKind::Serializers => "serializers",
        }
    }
}

/// Results of one extraction worker, merged into the run's totals
#[derive(Debug, Default)]
pub struct ExtractionContext {
    pub entities: Vec<Entity>,
    pub handlers: Vec<Handler>,
    pub routes: Vec<Route>,
    pub forms: Vec<ValidationForm>,
    pub serializers: Vec<Serializer>,
    pub diagnostics: Diagnostics,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another context's results after this one's
    pub fn merge(&mut self, other: ExtractionContext) {
        self.entities.extend(other.entities);
        self.handlers.extend(other.handlers);
        self.routes.extend(other.routes);
        self.forms.extend(other.forms);
        self.serializers.extend(other.serializers);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Parse one of `app`'s files and hand it to `extract`
    ///
    /// A missing file is skipped silently. A file that cannot be read or
    /// parsed records one diagnostic naming the app and file kind.
    pub fn with_file<T, F>(
        &mut self,
        tree: &T,
        parser: &mut PythonParser,
        app: &Application,
        kind: FileKind,
        extract: F,
    ) where
        T: ProjectTree + ?Sized,
        F: FnOnce(&mut Self, &SourceFile),
    {
        let relative = Path::new(&app.path).join(kind.file_name());
        let parsed = match tree.read(&relative) {
            Ok(None) => return,
            Ok(Some(text)) => parser.parse_source(text, relative),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(file) => {
                log::debug!("Extracting {} of {}", kind.label(), app.name);
                extract(self, &file);
            }
            Err(e) => self.diagnostics.parsing_error(format!(
                "Error parsing {} in {}: {}",
                kind.label(),
                app.name,
                e
            )),
        }
    }
}

/// Literal assignments of an options block (`class Meta:`)
pub(crate) fn options_block(meta: &ClassDef, source: &[u8]) -> OptionMap {
    let mut options = OptionMap::new();
    for member in meta.members() {
        let Some(assign) = assignment(&member) else {
            continue;
        };
        let Some(value) = assign.value.filter(|_| !assign.augmented) else {
            continue;
        };
        for name in assign.target_names(source) {
            options.insert(name, extract_value(&value, source));
        }
    }
    options
}

/// Options of the class's nested `Meta`, empty when there is none
pub(crate) fn meta_options(class: &ClassDef, source: &[u8]) -> OptionMap {
    class
        .nested_class("Meta", source)
        .map(|meta| options_block(&meta, source))
        .unwrap_or_default()
}

/// Class attributes assigned from a constructor call, with the constructor name
pub(crate) fn declared_fields(class: &ClassDef, source: &[u8]) -> Vec<DeclaredField> {
    let mut fields = Vec::new();
    for member in class.members() {
        let Some(assign) = assignment(&member) else {
            continue;
        };
        if assign.augmented {
            continue;
        }
        let Some(call) = assign.value.and_then(|v| call_site(&v, source)) else {
            continue;
        };
        let Some(field_type) = simple_name(&call.function, source) else {
            continue;
        };
        for name in assign.target_names(source) {
            fields.push(DeclaredField {
                name,
                field_type: field_type.clone(),
            });
        }
    }
    fields
}
