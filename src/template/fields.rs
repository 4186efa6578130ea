// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

//! Parsing of a fields definition and conversion to Elasticsearch
//! mapping properties.
//!
//! A fields definition is a YAML list of field sets:
//!
//! ```yaml
//! - key: flow
//!   title: Flow
//!   fields:
//!     - name: flow.bytes_toserver
//!       type: long
//! ```

use serde_json::json;
use serde_json::Map;

use crate::prelude::*;

const DEFAULT_IGNORE_ABOVE: u64 = 1024;
const DEFAULT_SCALING_FACTOR: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("field \"{0}\": unknown type \"{1}\"")]
    UnknownType(String, String),
    #[error("field \"{0}\" conflicts with an existing field")]
    Conflict(String),
    #[error("field with empty name")]
    EmptyName,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldSet {
    pub key: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub description: String,
    pub format: Option<String>,
    pub scaling_factor: Option<u64>,
    pub ignore_above: Option<u64>,
    pub index: Option<bool>,
    pub doc_values: Option<bool>,
    pub enabled: Option<bool>,
    pub dynamic: Option<JsonValue>,
    pub fields: Vec<Field>,
}

pub fn parse(bytes: &[u8]) -> Result<Vec<FieldSet>, FieldError> {
    // An empty definition is valid, it just has no fields.
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_slice(bytes)?)
}

/// Build the mapping properties for all field sets.
pub fn properties(sets: &[FieldSet]) -> Result<Map<String, JsonValue>, FieldError> {
    let mut properties = Map::new();
    for set in sets {
        trace!("Adding fields for set {}", set.key);
        for field in &set.fields {
            insert(&mut properties, field)?;
        }
    }
    Ok(properties)
}

fn insert(properties: &mut Map<String, JsonValue>, field: &Field) -> Result<(), FieldError> {
    if field.name.is_empty() || field.name.split('.').any(|part| part.is_empty()) {
        return Err(FieldError::EmptyName);
    }

    // Walk down through dotted names, creating objects as needed.
    let parts: Vec<&str> = field.name.split('.').collect();
    let (last, parents) = parts.split_last().ok_or(FieldError::EmptyName)?;
    let mut current = properties;
    for part in parents {
        current = child_properties(current, part, &field.name)?;
    }

    if field.field_type.as_deref() == Some("group") {
        let children = child_properties(current, last, &field.name)?;
        for child in &field.fields {
            insert(children, child)?;
        }
        return Ok(());
    }

    if let Some(mapping) = mapping(field)? {
        if current.contains_key(*last) {
            return Err(FieldError::Conflict(field.name.clone()));
        }
        current.insert(last.to_string(), JsonValue::Object(mapping));
    }
    Ok(())
}

/// Get, or create, the properties of the object named name.
fn child_properties<'a>(
    properties: &'a mut Map<String, JsonValue>,
    name: &str,
    full_name: &str,
) -> Result<&'a mut Map<String, JsonValue>, FieldError> {
    let entry = properties
        .entry(name.to_string())
        .or_insert_with(|| json!({"properties": {}}));
    entry
        .get_mut("properties")
        .and_then(|p| p.as_object_mut())
        .ok_or_else(|| FieldError::Conflict(full_name.to_string()))
}

fn mapping(field: &Field) -> Result<Option<Map<String, JsonValue>>, FieldError> {
    let field_type = field.field_type.as_deref().unwrap_or("keyword");
    let mut mapping = Map::new();
    match field_type {
        "keyword" => {
            mapping.insert("type".into(), "keyword".into());
            mapping.insert(
                "ignore_above".into(),
                field.ignore_above.unwrap_or(DEFAULT_IGNORE_ABOVE).into(),
            );
        }
        "text" | "long" | "integer" | "short" | "byte" | "float" | "half_float" | "double"
        | "boolean" | "ip" | "geo_point" => {
            mapping.insert("type".into(), field_type.into());
        }
        "scaled_float" => {
            mapping.insert("type".into(), field_type.into());
            mapping.insert(
                "scaling_factor".into(),
                field.scaling_factor.unwrap_or(DEFAULT_SCALING_FACTOR).into(),
            );
        }
        "date" => {
            mapping.insert("type".into(), field_type.into());
            if let Some(format) = &field.format {
                mapping.insert("format".into(), format.as_str().into());
            }
        }
        "object" => {
            mapping.insert("type".into(), field_type.into());
            if let Some(enabled) = field.enabled {
                mapping.insert("enabled".into(), enabled.into());
            }
            if let Some(dynamic) = &field.dynamic {
                mapping.insert("dynamic".into(), dynamic.clone());
            }
        }
        // Arrays take the mapping of their elements, which Elasticsearch
        // detects dynamically.
        "array" => return Ok(None),
        _ => {
            return Err(FieldError::UnknownType(
                field.name.clone(),
                field_type.to_string(),
            ))
        }
    }
    if field.index == Some(false) {
        mapping.insert("index".into(), false.into());
    }
    if field.doc_values == Some(false) {
        mapping.insert("doc_values".into(), false.into());
    }
    Ok(Some(mapping))
}

#[cfg(test)]
mod test {
    use super::*;

    fn props(yaml: &str) -> Result<Map<String, JsonValue>, FieldError> {
        properties(&parse(yaml.as_bytes())?)
    }

    #[test]
    fn test_simple_fields() {
        let props = props(
            r#"
- key: base
  fields:
    - name: "@timestamp"
      type: date
    - name: host
    - name: bytes
      type: long
      index: false
"#,
        )
        .unwrap();
        assert_eq!(props["@timestamp"], json!({"type": "date"}));
        assert_eq!(props["host"], json!({"type": "keyword", "ignore_above": 1024}));
        assert_eq!(props["bytes"], json!({"type": "long", "index": false}));
    }

    #[test]
    fn test_dotted_names_and_groups_merge() {
        let props = props(
            r#"
- key: flow
  fields:
    - name: flow.bytes
      type: long
    - name: flow
      type: group
      fields:
        - name: state
          type: keyword
          ignore_above: 64
"#,
        )
        .unwrap();
        assert_eq!(
            props["flow"],
            json!({
                "properties": {
                    "bytes": {"type": "long"},
                    "state": {"type": "keyword", "ignore_above": 64},
                }
            })
        );
    }

    #[test]
    fn test_special_types() {
        let props = props(
            r#"
- key: misc
  fields:
    - name: load
      type: scaled_float
    - name: seen
      type: date
      format: epoch_millis
    - name: metadata
      type: object
      enabled: false
    - name: list
      type: array
"#,
        )
        .unwrap();
        assert_eq!(props["load"]["scaling_factor"], 1000);
        assert_eq!(props["seen"]["format"], "epoch_millis");
        assert_eq!(props["metadata"], json!({"type": "object", "enabled": false}));
        assert!(!props.contains_key("list"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            props("- fields:\n    - name: x\n      type: nope\n"),
            Err(FieldError::UnknownType(..))
        ));
        assert!(matches!(
            props("- fields:\n    - name: a\n    - name: a.b\n"),
            Err(FieldError::Conflict(_))
        ));
        assert!(matches!(
            props("- fields:\n    - name: a..b\n"),
            Err(FieldError::EmptyName)
        ));
        assert!(matches!(props("not: [a list"), Err(FieldError::Yaml(_))));
    }

    #[test]
    fn test_empty() {
        assert!(props("").unwrap().is_empty());
        assert!(props("  \n").unwrap().is_empty());
    }
}
