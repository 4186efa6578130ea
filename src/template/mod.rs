// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use std::path::Path;

use serde_json::json;
use serde_json::Map;

use crate::config::{TemplateConfig, TemplateSettings};
use crate::elastic::Version;
use crate::prelude::*;

pub mod fields;
pub mod loader;

/// A template document, as sent to Elasticsearch.
pub type Document = Map<String, JsonValue>;

/// The location reported in errors for the embedded fields definition.
pub const EMBEDDED: &str = "embedded";

const MIN_ELASTIC_MAJOR: u64 = 5;

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    pattern: String,
    beat_version: Version,
    es_version: Version,
    settings: TemplateSettings,
}

impl Template {
    /// Create a new template for the given software and Elasticsearch
    /// versions. An empty Elasticsearch version falls back to the software
    /// version.
    pub fn new(
        beat_version: &str,
        index_prefix: &str,
        es_version: &str,
        config: &TemplateConfig,
    ) -> Result<Self, TemplateError> {
        let beat_version = Version::parse(beat_version)
            .map_err(|err| TemplateError::Construction(err.to_string()))?;
        let es_version = if es_version.is_empty() {
            beat_version.clone()
        } else {
            Version::parse(es_version)
                .map_err(|err| TemplateError::Construction(err.to_string()))?
        };
        if es_version.major < MIN_ELASTIC_MAJOR {
            return Err(TemplateError::Construction(format!(
                "Elasticsearch version {} is not supported",
                es_version.version
            )));
        }

        let name = if !config.name.is_empty() {
            if config.pattern.is_empty() {
                return Err(TemplateError::Construction(
                    "pattern needs to be set if name is set".to_string(),
                ));
            }
            config.name.clone()
        } else if index_prefix.is_empty() {
            return Err(TemplateError::Construction(
                "index prefix must not be empty".to_string(),
            ));
        } else {
            format!("{}-{}", index_prefix, beat_version.version)
        };

        let pattern = if config.pattern.is_empty() {
            format!("{}-*", name)
        } else {
            config.pattern.clone()
        };

        Ok(Self {
            name,
            pattern,
            beat_version,
            es_version,
            settings: config.settings.clone(),
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_pattern(&self) -> &str {
        &self.pattern
    }

    /// Build the template document from a fields definition on disk.
    pub fn load_file(&self, path: &Path) -> Result<Document, TemplateError> {
        let location = path.display().to_string();
        let bytes =
            std::fs::read(path).map_err(|err| TemplateError::fields_load(&location, err))?;
        self.generate(&bytes)
            .map_err(|err| TemplateError::fields_load(location, err))
    }

    /// Build the template document from an in-memory fields definition.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Document, TemplateError> {
        self.generate(bytes)
            .map_err(|err| TemplateError::fields_load(EMBEDDED, err))
    }

    fn generate(&self, bytes: &[u8]) -> Result<Document, fields::FieldError> {
        let sets = fields::parse(bytes)?;
        let properties = fields::properties(&sets)?;
        Ok(self.document(properties))
    }

    fn document(&self, properties: Map<String, JsonValue>) -> Document {
        let major = self.es_version.major;

        let mut index = json!({
            "refresh_interval": "5s",
            "mapping": {
                "total_fields": {
                    "limit": 10000,
                },
            },
        });
        if major == 6 {
            index["number_of_routing_shards"] = 30.into();
        }
        if let Some(index) = index.as_object_mut() {
            merge(index, &self.settings.index);
        }

        let mut mapping = Map::new();
        mapping.insert(
            "_meta".into(),
            json!({"version": self.beat_version.version}),
        );
        mapping.insert("date_detection".into(), false.into());
        mapping.insert(
            "dynamic_templates".into(),
            json!([{
                "strings_as_keyword": {
                    "match_mapping_type": "string",
                    "mapping": {
                        "type": "keyword",
                        "ignore_above": 1024,
                    },
                },
            }]),
        );
        mapping.insert("properties".into(), JsonValue::Object(properties));
        if !self.settings.source.is_empty() {
            mapping.insert(
                "_source".into(),
                JsonValue::Object(self.settings.source.clone()),
            );
        }

        let mappings = match major {
            5 => json!({"_default_": mapping}),
            6 => json!({"doc": mapping}),
            _ => JsonValue::Object(mapping),
        };

        let mut document = Document::new();
        if major >= 6 {
            document.insert("index_patterns".into(), json!([self.pattern]));
        } else {
            document.insert("template".into(), self.pattern.as_str().into());
        }
        document.insert("order".into(), 1.into());
        document.insert("settings".into(), json!({"index": index}));
        document.insert("mappings".into(), mappings);
        document
    }
}

/// Merge src into dst, recursing into objects present in both.
fn merge(dst: &mut Map<String, JsonValue>, src: &Map<String, JsonValue>) {
    for (key, value) in src {
        match (dst.get_mut(key), value) {
            (Some(JsonValue::Object(dst)), JsonValue::Object(src)) => merge(dst, src),
            _ => {
                dst.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FIELDS: &str = r#"
- key: base
  fields:
    - name: src_ip
      type: ip
"#;

    fn template(es_version: &str) -> Template {
        Template::new("1.2.0", "logstash", es_version, &TemplateConfig::default()).unwrap()
    }

    #[test]
    fn test_name_and_pattern() {
        let t = template("7.10.0");
        assert_eq!(t.get_name(), "logstash-1.2.0");
        assert_eq!(t.get_pattern(), "logstash-1.2.0-*");

        let config = TemplateConfig {
            name: "suricata".into(),
            pattern: "suricata-*".into(),
            ..Default::default()
        };
        let t = Template::new("1.2.0", "logstash", "7.10.0", &config).unwrap();
        assert_eq!(t.get_name(), "suricata");
        assert_eq!(t.get_pattern(), "suricata-*");
    }

    #[test]
    fn test_construction_errors() {
        let config = TemplateConfig {
            name: "suricata".into(),
            ..Default::default()
        };
        assert!(matches!(
            Template::new("1.2.0", "logstash", "7.10.0", &config),
            Err(TemplateError::Construction(_))
        ));

        let config = TemplateConfig::default();
        for (beat, prefix, es) in [
            ("bad", "logstash", "7.10.0"),
            ("1.2.0", "logstash", "bad"),
            ("1.2.0", "logstash", "2.4.6"),
            ("1.2.0", "", "7.10.0"),
        ] {
            assert!(matches!(
                Template::new(beat, prefix, es, &config),
                Err(TemplateError::Construction(_))
            ));
        }
    }

    #[test]
    fn test_empty_es_version_uses_beat_version() {
        let t = Template::new("6.8.0", "logstash", "", &TemplateConfig::default()).unwrap();
        let doc = t.load_bytes(FIELDS.as_bytes()).unwrap();
        assert!(doc["mappings"].get("doc").is_some());
    }

    #[test]
    fn test_document_es7() {
        let doc = template("7.17.0").load_bytes(FIELDS.as_bytes()).unwrap();
        assert_eq!(doc["index_patterns"], json!(["logstash-1.2.0-*"]));
        assert_eq!(doc["order"], 1);
        assert_eq!(doc["settings"]["index"]["refresh_interval"], "5s");
        assert!(doc["settings"]["index"].get("number_of_routing_shards").is_none());
        assert_eq!(doc["mappings"]["_meta"]["version"], "1.2.0");
        assert_eq!(
            doc["mappings"]["properties"]["src_ip"],
            json!({"type": "ip"})
        );
        assert!(doc["mappings"].get("_source").is_none());
    }

    #[test]
    fn test_document_es6() {
        let doc = template("6.8.0").load_bytes(FIELDS.as_bytes()).unwrap();
        assert_eq!(doc["index_patterns"], json!(["logstash-1.2.0-*"]));
        assert_eq!(doc["settings"]["index"]["number_of_routing_shards"], 30);
        assert_eq!(
            doc["mappings"]["doc"]["properties"]["src_ip"]["type"],
            "ip"
        );
    }

    #[test]
    fn test_document_es5() {
        let doc = template("5.6.16").load_bytes(FIELDS.as_bytes()).unwrap();
        assert_eq!(doc["template"], "logstash-1.2.0-*");
        assert!(doc.get("index_patterns").is_none());
        assert!(doc["mappings"].get("_default_").is_some());
    }

    #[test]
    fn test_settings_merged() {
        let config = TemplateConfig::from_yaml_str(
            r#"
settings:
  index:
    number_of_shards: 1
    mapping:
      total_fields:
        limit: 20000
  _source:
    enabled: false
"#,
        )
        .unwrap();
        let t = Template::new("1.2.0", "logstash", "8.0.0", &config).unwrap();
        let doc = t.load_bytes(FIELDS.as_bytes()).unwrap();
        let index = &doc["settings"]["index"];
        assert_eq!(index["number_of_shards"], 1);
        assert_eq!(index["mapping"]["total_fields"]["limit"], 20000);
        assert_eq!(index["refresh_interval"], "5s");
        assert_eq!(doc["mappings"]["_source"], json!({"enabled": false}));
    }

    #[test]
    fn test_load_errors_name_location() {
        let t = template("7.10.0");
        match t.load_bytes(b"- fields: [{name: x, type: nope}]") {
            Err(TemplateError::FieldsLoad { location, .. }) => assert_eq!(location, EMBEDDED),
            other => panic!("unexpected: {:?}", other),
        }
        let path = Path::new("/nonexistent/fields.yml");
        match t.load_file(path) {
            Err(TemplateError::FieldsLoad { location, .. }) => {
                assert_eq!(location, path.display().to_string())
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
