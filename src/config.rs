// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::error::TemplateError;

/// Template loading configuration, typically found under `setup.template`
/// in the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub enabled: bool,

    /// Upload the template even if it already exists.
    pub overwrite: bool,

    /// Path to a fields definition. When empty the embedded default is used.
    pub fields: String,

    /// Overrides the derived template name. Requires `pattern`.
    pub name: String,

    pub pattern: String,

    pub settings: TemplateSettings,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            overwrite: false,
            fields: String::new(),
            name: String::new(),
            pattern: String::new(),
            settings: TemplateSettings::default(),
        }
    }
}

/// Extra settings merged into the generated template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub index: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "_source")]
    pub source: serde_json::Map<String, serde_json::Value>,
}

impl TemplateConfig {
    /// Unpack a configuration value over the defaults. A null value (such as
    /// a missing section) results in the defaults.
    pub fn from_value(value: &serde_yaml::Value) -> Result<Self, TemplateError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_value(value.clone())?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, TemplateError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(&value)
    }
}
