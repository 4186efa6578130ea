// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use super::Template;
use crate::config::TemplateConfig;
use crate::elastic::{ElasticClient, Method};
use crate::paths::Paths;
use crate::prelude::*;

/// Information about the software the template is being loaded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatInfo {
    pub version: String,
    pub index_prefix: String,
}

/// Loads the index template into Elasticsearch if it doesn't already exist,
/// or if overwriting is enabled.
pub struct Loader {
    config: TemplateConfig,
    client: Arc<dyn ElasticClient>,
    beat: BeatInfo,
    paths: Paths,
    fields: Vec<u8>,
}

impl Loader {
    /// Create a loader, unpacking the template configuration over the
    /// defaults.
    pub fn new(
        config: &serde_yaml::Value,
        client: Arc<dyn ElasticClient>,
        beat: BeatInfo,
        fields: Vec<u8>,
    ) -> Result<Self, TemplateError> {
        let config = TemplateConfig::from_value(config)?;
        Ok(Self::with_config(config, client, beat, fields))
    }

    pub fn with_config(
        config: TemplateConfig,
        client: Arc<dyn ElasticClient>,
        beat: BeatInfo,
        fields: Vec<u8>,
    ) -> Self {
        Self {
            config,
            client,
            beat,
            paths: Paths::default(),
            fields,
        }
    }

    /// Set the paths the fields file is resolved against.
    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths = paths;
        self
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Check if the template should be loaded, and load it. The template is
    /// loaded if it doesn't exist, or overwrite is enabled.
    pub async fn load(&self) -> Result<(), TemplateError> {
        let es_version = self.client.get_version();
        let template = Template::new(
            &self.beat.version,
            &self.beat.index_prefix,
            &es_version,
            &self.config,
        )?;
        let name = template.get_name();

        let exists = self.check_template(name).await;
        if exists && !self.config.overwrite {
            info!("Template {} already exists and will not be overwritten", name);
            return Ok(());
        }

        info!("Loading template for Elasticsearch version: {}", es_version);
        if exists {
            info!("Existing template will be overwritten, as overwrite is enabled");
        }

        let document = if !self.config.fields.is_empty() {
            debug!("Loading fields from file: {}", self.config.fields);
            let path = self.paths.resolve(&self.config.fields);
            template.load_file(&path)?
        } else {
            debug!("Loading default fields");
            template.load_bytes(&self.fields)?
        };

        self.load_template(name, &document).await
    }

    /// Load a template into Elasticsearch, overwriting any existing template
    /// of the same name. Use `check_template` first to avoid overwriting.
    pub async fn load_template(&self, name: &str, template: &Document) -> Result<(), TemplateError> {
        debug!("Trying to load template with name: {}", name);
        let path = template_path(name);
        self.client
            .load_json(&path, template)
            .await
            .map_err(|err| TemplateError::upload(err, template))?;
        info!("Elasticsearch template with name '{}' loaded", name);
        Ok(())
    }

    /// Check if a template exists. Returns true only if Elasticsearch
    /// responds with a 200 status; any other status or error is treated as
    /// the template not existing.
    pub async fn check_template(&self, name: &str) -> bool {
        let path = template_path(name);
        match self
            .client
            .request(Method::HEAD, &path, "", &HashMap::new(), None)
            .await
        {
            Ok((200, _)) => {
                debug!("Found template {}", name);
                true
            }
            Ok((status, _)) => {
                debug!("Template {} not found: status={}", name, status);
                false
            }
            Err(err) => {
                warn!("Failed to check if template {} exists: {}", name, err);
                false
            }
        }
    }
}

fn template_path(name: &str) -> String {
    format!("/_template/{}", name)
}
