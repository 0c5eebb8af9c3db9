// Literal value extraction
//
// Turns a literal expression into a plain value. Anything that is not
// statically a literal (names, calls, lookups, arithmetic) is kept as a
// reference carrying its source text.

use crate::parser::python::{dotted_name, node_text, string_literal};
use crate::parser::walk::named_children;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tree_sitter::Node;

/// A value read from source without evaluating it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A name, dotted path or any non-literal expression, as written
    Reference(String),
}

impl Value {
    /// String content of a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// A string literal or a reference, e.g. `model = Post` or `model = "Post"`
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Reference(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text used when this value is a mapping key
    pub fn key_string(&self) -> String {
        match self {
            Value::String(s) | Value::Reference(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::List(_) | Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

/// Extract the value of a literal expression node
pub fn extract_value(node: &Node, source: &[u8]) -> Value {
    match node.kind() {
        "string" | "concatenated_string" => string_literal(node, source)
            .map(Value::String)
            .unwrap_or_else(|| reference(node, source)),
        "integer" => parse_int(node_text(node, source))
            .map(Value::Int)
            .unwrap_or_else(|| reference(node, source)),
        "float" => parse_float(node_text(node, source))
            .map(Value::Float)
            .unwrap_or_else(|| reference(node, source)),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "none" => Value::Null,
        "unary_operator" => signed_number(node, source).unwrap_or_else(|| reference(node, source)),
        "list" | "tuple" => Value::List(
            named_children(node)
                .iter()
                .map(|item| extract_value(item, source))
                .collect(),
        ),
        "dictionary" => {
            let mut map = BTreeMap::new();
            for pair in named_children(node).iter().filter(|p| p.kind() == "pair") {
                if let (Some(key), Some(value)) =
                    (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
                {
                    map.insert(
                        extract_value(&key, source).key_string(),
                        extract_value(&value, source),
                    );
                }
            }
            Value::Map(map)
        }
        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) => extract_value(inner, source),
            None => reference(node, source),
        },
        _ => reference(node, source),
    }
}

fn reference(node: &Node, source: &[u8]) -> Value {
    let text = dotted_name(node, source).unwrap_or_else(|| node_text(node, source).to_string());
    Value::Reference(text)
}

fn parse_int(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

/// Finite floats only; `1e400` overflows and stays a reference
fn parse_float(text: &str) -> Option<f64> {
    text.replace('_', "")
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

/// `-1`, `+2.5`
fn signed_number(node: &Node, source: &[u8]) -> Option<Value> {
    let operator = node.child_by_field_name("operator")?;
    let argument = node.child_by_field_name("argument")?;
    let negate = match operator.kind() {
        "-" => true,
        "+" => false,
        _ => return None,
    };

    match extract_value(&argument, source) {
        Value::Int(i) if negate => i.checked_neg().map(Value::Int),
        Value::Float(f) if negate => Some(Value::Float(-f)),
        v @ (Value::Int(_) | Value::Float(_)) => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::python::assignment;
    use crate::parser::PythonParser;

    fn value_of(expr: &str) -> Value {
        let file = PythonParser::new()
            .unwrap()
            .parse_source(format!("x = {}\n", expr), "test.py".into())
            .unwrap();
        let stmt = file.statements()[0];
        let value = assignment(&stmt).unwrap().value.unwrap();
        extract_value(&value, file.bytes())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(value_of("'blog'"), Value::String("blog".to_string()));
        assert_eq!(value_of("200"), Value::Int(200));
        assert_eq!(value_of("1_000"), Value::Int(1000));
        assert_eq!(value_of("0x1F"), Value::Int(31));
        assert_eq!(value_of("-5"), Value::Int(-5));
        assert_eq!(value_of("2.5"), Value::Float(2.5));
        assert_eq!(value_of("-0.5"), Value::Float(-0.5));
        assert_eq!(value_of("True"), Value::Bool(true));
        assert_eq!(value_of("False"), Value::Bool(false));
        assert_eq!(value_of("None"), Value::Null);
    }

    #[test]
    fn test_overflowing_float_is_reference() {
        assert_eq!(value_of("1e400"), Value::Reference("1e400".to_string()));
        assert_eq!(value_of("-1e400"), Value::Reference("-1e400".to_string()));
        assert_eq!(value_of("1e300"), Value::Float(1e300));
    }

    #[test]
    fn test_references() {
        assert_eq!(value_of("Post"), Value::Reference("Post".to_string()));
        assert_eq!(
            value_of("models.CASCADE"),
            Value::Reference("models.CASCADE".to_string())
        );
        assert_eq!(
            value_of("os.environ.get('DEBUG')"),
            Value::Reference("os.environ.get('DEBUG')".to_string())
        );
        assert_eq!(value_of("f'{a}'"), Value::Reference("f'{a}'".to_string()));
        assert_eq!(value_of("not flag"), Value::Reference("not flag".to_string()));
    }

    #[test]
    fn test_collections() {
        assert_eq!(
            value_of("['-created', 'title']"),
            Value::List(vec![
                Value::String("-created".to_string()),
                Value::String("title".to_string()),
            ])
        );
        assert_eq!(
            value_of("('a', 1)"),
            Value::List(vec![Value::String("a".to_string()), Value::Int(1)])
        );

        let map = value_of("{'max_length': 200, 'choices': [('d', 'Draft')], Post: None}");
        let Value::Map(map) = map else {
            panic!("expected a map");
        };
        assert_eq!(map["max_length"], Value::Int(200));
        assert_eq!(
            map["choices"],
            Value::List(vec![Value::List(vec![
                Value::String("d".to_string()),
                Value::String("Draft".to_string()),
            ])])
        );
        assert_eq!(map["Post"], Value::Null);
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(value_of("(42)"), Value::Int(42));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::String("Post".to_string()).as_name(), Some("Post"));
        assert_eq!(Value::Reference("Post".to_string()).as_name(), Some("Post"));
        assert_eq!(Value::Reference("Post".to_string()).as_str(), None);
        assert_eq!(Value::Int(1).as_name(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).key_string(), "3");
    }

    #[test]
    fn test_serializes_like_plain_json() {
        let value = Value::List(vec![
            Value::String("a".to_string()),
            Value::Reference("Post".to_string()),
            Value::Null,
            Value::Int(3),
        ]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a","Post",null,3]"#);
    }
}
