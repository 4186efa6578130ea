// Copyright (C) 2020 Jason Ish
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::collections::HashMap;

use serde::Deserialize;

use crate::template::Document;

pub mod client;
pub use client::{Client, ClientBuilder};

pub use reqwest::Method;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("json: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("failed to parse version: {0}")]
    VersionParseError(String),
    #[error("elasticsearch returned status {status}")]
    ErrorResponse { status: u16, body: String },
    #[error("{0}")]
    StringError(String),
}

impl ClientError {
    /// The body of the response that caused this error, if there was one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::ErrorResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// The subset of the Elasticsearch client API needed to load a template.
#[async_trait::async_trait]
pub trait ElasticClient: Send + Sync {
    /// Upsert a JSON document at path, returning the raw response body.
    async fn load_json(&self, path: &str, document: &Document) -> Result<Vec<u8>, ClientError>;

    /// Perform a generic request. Unlike `load_json`, a non-success status
    /// is returned as a status, not an error.
    async fn request(
        &self,
        method: Method,
        path: &str,
        pipeline: &str,
        params: &HashMap<String, String>,
        body: Option<&serde_json::Value>,
    ) -> Result<(u16, Vec<u8>), ClientError>;

    /// The version of Elasticsearch as reported by the cluster, or an empty
    /// string if not known.
    fn get_version(&self) -> String;
}

#[derive(Deserialize, Debug)]
pub(crate) struct InfoResponse {
    pub version: Option<response::Version>,
    pub error: Option<ResponseError>,
}

pub(crate) mod response {
    use super::Deserialize;
    #[derive(Deserialize, Debug)]
    pub struct Version {
        pub number: String,
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct ResponseError {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub version: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse a version like "7.17.3". Minor and patch are optional, and
    /// anything after a "-" (eg. "-SNAPSHOT") is ignored.
    pub fn parse(s: &str) -> Result<Version, ClientError> {
        let numeric = s.split('-').next().unwrap_or_default();
        if numeric.is_empty() {
            return Err(ClientError::VersionParseError(s.to_string()));
        }
        let mut parts = [0u64; 3];
        for (i, part) in numeric.split('.').enumerate() {
            if i > 2 {
                break;
            }
            parts[i] = part
                .parse::<u64>()
                .map_err(|_| ClientError::VersionParseError(s.to_string()))?;
        }
        Ok(Version {
            version: s.to_string(),
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_version_parse() {
        let version = Version::parse("8.11.0-SNAPSHOT").unwrap();
        assert_eq!(version.major, 8);
        assert_eq!(version.minor, 11);
        assert_eq!(version.version, "8.11.0-SNAPSHOT");

        let version = Version::parse("19.2").unwrap();
        assert_eq!((version.major, version.minor, version.patch), (19, 2, 0));

        assert!(Version::parse("").is_err());
        assert!(Version::parse("seven").is_err());
        assert!(Version::parse("7.x").is_err());
    }

    #[test]
    fn test_response_body() {
        let err = ClientError::ErrorResponse {
            status: 400,
            body: "bad".to_string(),
        };
        assert_eq!(err.response_body(), Some("bad"));
        assert_eq!(ClientError::StringError("x".into()).response_body(), None);
    }
}
