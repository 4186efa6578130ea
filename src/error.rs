// SPDX-FileCopyrightText: (C) 2024 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::elastic::ClientError;
use crate::template::Document;

/// Errors returned from loading a template. Nothing is retried, every
/// failure is handed back to the caller.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("invalid template configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// The template could not be built from the version and configuration
    /// inputs.
    #[error("error creating template instance: {0}")]
    Construction(String),

    /// The fields definition could not be turned into a template document.
    /// The location is either the resolved file path, or "embedded".
    #[error("error creating template from {location}: {reason}")]
    FieldsLoad { location: String, reason: String },

    /// Includes the response body and the template that was sent.
    #[error("could not load template: {error}. Response body: {body}. Template is: {template}")]
    Upload {
        error: ClientError,
        body: String,
        template: String,
    },
}

impl TemplateError {
    pub(crate) fn fields_load<S: Into<String>, E: std::fmt::Display>(location: S, err: E) -> Self {
        Self::FieldsLoad {
            location: location.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn upload(error: ClientError, template: &Document) -> Self {
        let body = error.response_body().unwrap_or_default().to_string();
        let template = serde_json::to_string(template).unwrap_or_default();
        Self::Upload {
            error,
            body,
            template,
        }
    }
}
