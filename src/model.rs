// Architecture model extracted from a Django project
//
// Serialized names follow the report contract consumed by the writers
// (`models`, `views`, `urls`, ...), Rust names follow what the types are.

use crate::parser::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Options block (`class Meta:`) or keyword arguments, by name
pub type OptionMap = BTreeMap<String, Value>;

/// How an application was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Listed in the settings application registry
    Declared,
    /// Guessed from the directory layout
    Inferred,
}

/// A sub-project of the analyzed project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    /// Path relative to the project root
    pub path: String,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Application {
    pub fn declared(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            provenance: Provenance::Declared,
            note: None,
        }
    }

    pub fn inferred(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            provenance: Provenance::Inferred,
            note: Some("Found by directory structure, not in INSTALLED_APPS".to_string()),
        }
    }
}

/// A typed attribute of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Constructor name as written (`CharField`, `ForeignKey`, a project's own field class...)
    #[serde(rename = "type")]
    pub field_type: String,
    /// Keyword arguments of the constructor call
    pub attributes: OptionMap,
}

/// Relationship field constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "ForeignKey")]
    ForeignKey,
    #[serde(rename = "OneToOneField")]
    OneToOne,
    #[serde(rename = "ManyToManyField")]
    ManyToMany,
}

impl RelationKind {
    /// Classify a field constructor name
    pub fn from_field_type(field_type: &str) -> Option<Self> {
        match field_type {
            "ForeignKey" => Some(RelationKind::ForeignKey),
            "OneToOneField" => Some(RelationKind::OneToOne),
            "ManyToManyField" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::ForeignKey => "ForeignKey",
            RelationKind::OneToOne => "OneToOneField",
            RelationKind::ManyToMany => "ManyToManyField",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field that points at another entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub field_name: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// Only resolved when the first constructor argument is a bare name
    #[serde(rename = "related_model")]
    pub target: Option<String>,
    #[serde(rename = "related_name")]
    pub inverse: Option<String>,
}

/// A method and its parameter names, receiver excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub name: String,
    pub parameters: Vec<String>,
}

/// A persisted data model class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub app: String,
    pub fields: Vec<Field>,
    #[serde(rename = "methods")]
    pub behaviors: Vec<Behavior>,
    #[serde(rename = "meta")]
    pub options: OptionMap,
    pub relationships: Vec<Relationship>,
}

impl Entity {
    pub fn new(name: &str, app: &str) -> Self {
        Self {
            name: name.to_string(),
            app: app.to_string(),
            fields: Vec::new(),
            behaviors: Vec::new(),
            options: OptionMap::new(),
            relationships: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Function or class request handler details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HandlerKind {
    Function {
        parameters: Vec<String>,
        decorators: Vec<String>,
    },
    Class {
        #[serde(rename = "parent_views")]
        bases: Vec<String>,
        methods: Vec<Behavior>,
    },
}

/// A view: function or class producing HTTP responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    pub name: String,
    pub app: String,
    #[serde(flatten)]
    pub kind: HandlerKind,
    /// Entity names referenced in the body, first-seen order, no repeats
    #[serde(rename = "models_used")]
    pub entities: Vec<String>,
    pub template: Option<String>,
}

impl Handler {
    pub fn is_class(&self) -> bool {
        matches!(self.kind, HandlerKind::Class { .. })
    }

    pub fn references(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }
}

/// One entry of a route list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub app: String,
    /// Literal path pattern; unset when computed
    pub path: Option<String>,
    #[serde(rename = "view")]
    pub handler: Option<String>,
    pub name: Option<String>,
    /// Module path of a nested route list
    pub include: Option<String>,
}

/// A declared field of a form or serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// An input-validation form class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationForm {
    pub name: String,
    pub app: String,
    #[serde(rename = "parent_forms")]
    pub bases: Vec<String>,
    pub fields: Vec<DeclaredField>,
    #[serde(rename = "meta")]
    pub options: OptionMap,
}

/// An API serializer class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serializer {
    pub name: String,
    pub app: String,
    #[serde(rename = "parent_serializers")]
    pub bases: Vec<String>,
    pub fields: Vec<DeclaredField>,
    #[serde(rename = "meta")]
    pub options: OptionMap,
}

/// Kind of dependency edge, with kind-specific details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EdgeKind {
    #[serde(rename = "model_relationship")]
    EntityRelationship {
        relationship_type: RelationKind,
        field_name: String,
    },
    #[serde(rename = "view_uses_model")]
    HandlerUsesEntity,
    #[serde(rename = "url_maps_to_view")]
    RouteTargetsHandler { url_name: Option<String> },
    #[serde(rename = "form_uses_model")]
    FormBoundToEntity,
    #[serde(rename = "serializer_uses_model")]
    SerializerBoundToEntity,
}

impl EdgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::EntityRelationship { .. } => "model_relationship",
            EdgeKind::HandlerUsesEntity => "view_uses_model",
            EdgeKind::RouteTargetsHandler { .. } => "url_maps_to_view",
            EdgeKind::FormBoundToEntity => "form_uses_model",
            EdgeKind::SerializerBoundToEntity => "serializer_uses_model",
        }
    }
}

/// A directed, typed relation between two extracted constructs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Unset only for routes whose path is not a literal
    pub source: Option<String>,
    pub source_app: String,
    pub target: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

/// Database connection summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub engine: String,
}

impl DatabaseDescriptor {
    pub const UNKNOWN_ENGINE: &'static str = "Unknown";

    pub fn unknown() -> Self {
        Self {
            engine: Self::UNKNOWN_ENGINE.to_string(),
        }
    }
}

/// Template engine declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_dirs: Option<bool>,
}

/// Values read from the settings module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    /// Registry entries as written, before normalization
    pub installed_apps: Vec<String>,
    pub middleware: Vec<String>,
    pub databases: BTreeMap<String, DatabaseDescriptor>,
    pub static_url: Option<String>,
    pub media_url: Option<String>,
    pub templates: Vec<TemplateDescriptor>,
    pub root_urlconf: Option<String>,
    /// `None` when absent or not a literal
    pub debug: Option<bool>,
}

/// A middleware class in the request chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Middleware {
    pub name: String,
    pub path: String,
}

impl Middleware {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('.').next().unwrap_or(path);
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Project-wide facts gathered before per-application extraction
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
    pub apps: Vec<Application>,
    pub configuration: ConfigurationRecord,
    pub framework_version: String,
    /// Settings-phase diagnostics; extraction adds its own on assembly
    pub diagnostics: Diagnostics,
}

/// Messages collected while reading the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub parsing: Vec<String>,
    /// Reserved for semantic checks layered on top of extraction
    pub validation: Vec<String>,
}

impl Diagnostics {
    pub fn parsing_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.parsing.push(message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.parsing.extend(other.parsing);
        self.validation.extend(other.validation);
    }

    pub fn len(&self) -> usize {
        self.parsing.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
