// Entity extraction from models.py

use crate::config::Conventions;
use crate::extract::meta_options;
use crate::model::{Behavior, Entity, Field, OptionMap, RelationKind, Relationship};
use crate::parser::walk::nodes_of_kind;
use crate::parser::{
    assignment, call_site, class_def, extract_value, function_def, identifier, simple_name,
    ClassDef, SourceFile,
};

/// Every entity class in the file, nested classes included
///
/// A class is an entity when one of its bases is an attribute access ending
/// in the entity base name (`models.Model`).
pub fn extract_entities(app: &str, file: &SourceFile, conventions: &Conventions) -> Vec<Entity> {
    let source = file.bytes();
    nodes_of_kind(file.root(), "class_definition")
        .filter_map(|node| class_def(&node, source))
        .filter(|class| is_entity_class(class, source, conventions))
        .map(|class| build_entity(app, &class, source))
        .collect()
}

fn is_entity_class(class: &ClassDef, source: &[u8], conventions: &Conventions) -> bool {
    class.bases.iter().any(|base| {
        base.kind() == "attribute"
            && simple_name(base, source).as_deref() == Some(conventions.entity_base.as_str())
    })
}

fn build_entity(app: &str, class: &ClassDef, source: &[u8]) -> Entity {
    let mut entity = Entity::new(&class.name, app);

    for member in class.members() {
        match member.kind() {
            "expression_statement" => {
                let Some(assign) = assignment(&member).filter(|a| !a.augmented) else {
                    continue;
                };
                let Some(call) = assign.value.and_then(|v| call_site(&v, source)) else {
                    continue;
                };
                let Some(field_type) = simple_name(&call.function, source) else {
                    continue;
                };

                let attributes: OptionMap = call
                    .keywords
                    .iter()
                    .map(|(name, value)| (name.clone(), extract_value(value, source)))
                    .collect();

                for name in assign.target_names(source) {
                    if let Some(kind) = RelationKind::from_field_type(&field_type) {
                        entity.relationships.push(Relationship {
                            field_name: name.clone(),
                            kind,
                            target: call.positional.first().and_then(|arg| identifier(arg, source)),
                            inverse: attributes
                                .get("related_name")
                                .and_then(|v| v.as_name())
                                .map(str::to_string),
                        });
                    }
                    entity.fields.push(Field {
                        name,
                        field_type: field_type.clone(),
                        attributes: attributes.clone(),
                    });
                }
            }
            "function_definition" => {
                if let Some(method) = function_def(&member, source) {
                    entity.behaviors.push(Behavior {
                        parameters: method.parameters_without_self(),
                        name: method.name,
                    });
                }
            }
            _ => {}
        }
    }

    entity.options = meta_options(class, source);
    log::debug!(
        "Entity {}.{}: {} fields, {} relationships",
        app,
        entity.name,
        entity.fields.len(),
        entity.relationships.len()
    );
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{PythonParser, Value};
    use indoc::indoc;

    fn extract(source: &str) -> Vec<Entity> {
        let file = PythonParser::new()
            .unwrap()
            .parse_source(source.to_string(), "models.py".into())
            .unwrap();
        extract_entities("blog", &file, &Conventions::default())
    }

    #[test]
    fn test_entity_with_fields_relationships_and_meta() {
        let entities = extract(indoc! {r#"
            from django.db import models
            from django.contrib.auth.models import User

            class Post(models.Model):
                title = models.CharField(max_length=200, blank=False)
                author = models.ForeignKey(User, on_delete=models.CASCADE, related_name="posts")
                tags = models.ManyToManyField("Tag")
                status = models.CharField(choices=[("d", "Draft")], default="d")

                class Meta:
                    ordering = ["-created"]
                    verbose_name = "post"

                def __str__(self):
                    return self.title

                def publish(self, when, notify=True):
                    pass
        "#});

        assert_eq!(entities.len(), 1);
        let post = &entities[0];
        assert_eq!(post.name, "Post");
        assert_eq!(post.app, "blog");

        let names: Vec<_> = post.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "author", "tags", "status"]);

        let title = post.field("title").unwrap();
        assert_eq!(title.field_type, "CharField");
        assert_eq!(title.attributes["max_length"], Value::Int(200));
        assert_eq!(title.attributes["blank"], Value::Bool(false));
        assert_eq!(
            post.field("author").unwrap().attributes["on_delete"],
            Value::Reference("models.CASCADE".to_string())
        );

        assert_eq!(post.relationships.len(), 2);
        let author = &post.relationships[0];
        assert_eq!(author.field_name, "author");
        assert_eq!(author.kind, RelationKind::ForeignKey);
        assert_eq!(author.target.as_deref(), Some("User"));
        assert_eq!(author.inverse.as_deref(), Some("posts"));

        // string forward references stay unresolved
        let tags = &post.relationships[1];
        assert_eq!(tags.kind, RelationKind::ManyToMany);
        assert_eq!(tags.target, None);
        assert_eq!(tags.inverse, None);

        assert_eq!(
            post.options["ordering"],
            Value::List(vec![Value::String("-created".to_string())])
        );
        assert_eq!(post.options["verbose_name"], Value::String("post".to_string()));

        let behaviors: Vec<_> = post.behaviors.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(behaviors, vec!["__str__", "publish"]);
        assert!(post.behaviors[0].parameters.is_empty());
        assert_eq!(post.behaviors[1].parameters, vec!["when", "notify"]);
    }

    #[test]
    fn test_every_relationship_is_a_field() {
        let entities = extract(indoc! {r#"
            class Profile(models.Model):
                user = models.OneToOneField(settings.AUTH_USER_MODEL, on_delete=models.CASCADE)
                manager = ForeignKey(Employee, related_name=RELATED)
        "#});
        let profile = &entities[0];
        for rel in &profile.relationships {
            let field = profile.field(&rel.field_name).unwrap();
            assert_eq!(field.field_type, rel.kind.as_str());
        }
        assert_eq!(profile.relationships[0].kind, RelationKind::OneToOne);
        assert_eq!(profile.relationships[0].target, None);
        assert_eq!(profile.relationships[1].target.as_deref(), Some("Employee"));
        assert_eq!(profile.relationships[1].inverse.as_deref(), Some("RELATED"));
    }

    #[test]
    fn test_non_entity_classes_skipped() {
        let entities = extract(indoc! {r#"
            class Plain:
                name = models.CharField()

            class Mixin(Model):
                pass

            class Managed(models.Manager):
                pass

            class Article(BaseArticle, db.models.Model):
                pass
        "#});
        let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Article"]);
    }

    #[test]
    fn test_nested_entity_classes_found() {
        let entities = extract(indoc! {r#"
            def make():
                class Dynamic(models.Model):
                    label = models.TextField()
                return Dynamic
        "#});
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Dynamic");
        assert!(entities[0].options.is_empty());
    }
}
