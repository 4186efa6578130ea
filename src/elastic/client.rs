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
use std::sync::RwLock;

use super::{ClientError, ElasticClient, InfoResponse, Method, Version};
use crate::prelude::*;

/// An Elasticsearch client over HTTP.
#[derive(Debug, Default)]
pub struct Client {
    url: String,
    disable_certificate_validation: bool,
    username: Option<String>,
    password: Option<String>,
    version: RwLock<Option<Version>>,
}

impl Client {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn get_http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if self.disable_certificate_validation {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build()
    }

    /// Build a request for path, which may or may not start with a "/".
    pub fn request_builder(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, reqwest::Error> {
        let url = format!("{}/{}", self.url, path.trim_start_matches('/'));
        let request = self
            .get_http_client()?
            .request(method, &url)
            .header("Content-Type", "application/json");
        let request = if let Some(username) = &self.username {
            request.basic_auth(username, self.password.clone())
        } else {
            request
        };
        Ok(request)
    }

    /// Query the cluster for its version, caching the result for
    /// `get_version`.
    pub async fn fetch_version(&self) -> Result<Version, ClientError> {
        if let Ok(version) = self.version.read() {
            if let Some(version) = &*version {
                return Ok(version.clone());
            }
        }
        let body = self
            .request_builder(Method::GET, "")?
            .send()
            .await?
            .text()
            .await?;
        let response: InfoResponse = serde_json::from_str(&body)?;
        if let Some(error) = response.error {
            return Err(ClientError::StringError(error.reason));
        }
        let number = response.version.map(|v| v.number).ok_or_else(|| {
            ClientError::StringError("request for version did not return a version".to_string())
        })?;
        let version = Version::parse(&number)?;
        debug!("Elasticsearch at {} reports version {}", self.url, number);
        if let Ok(mut locked) = self.version.write() {
            *locked = Some(version.clone());
        }
        Ok(version)
    }
}

#[async_trait::async_trait]
impl ElasticClient for Client {
    async fn load_json(&self, path: &str, document: &Document) -> Result<Vec<u8>, ClientError> {
        let body = serde_json::to_vec(document)?;
        let response = self
            .request_builder(Method::PUT, path)?
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        if status.is_success() {
            return Ok(body);
        }
        Err(ClientError::ErrorResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        pipeline: &str,
        params: &HashMap<String, String>,
        body: Option<&JsonValue>,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        let mut request = self.request_builder(method, path)?;
        if !pipeline.is_empty() {
            request = request.query(&[("pipeline", pipeline)]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }

    fn get_version(&self) -> String {
        match self.version.read() {
            Ok(version) => version
                .as_ref()
                .map(|v| v.version.clone())
                .unwrap_or_default(),
            Err(_) => String::new(),
        }
    }
}

#[derive(Default, Debug)]
pub struct ClientBuilder {
    url: String,
    disable_certificate_validation: bool,
    username: Option<String>,
    password: Option<String>,
}

impl ClientBuilder {
    pub fn new(url: &str) -> ClientBuilder {
        ClientBuilder {
            url: url.to_string(),
            ..ClientBuilder::default()
        }
    }

    pub fn disable_certificate_validation(&mut self, yes: bool) -> &mut Self {
        self.disable_certificate_validation = yes;
        self
    }

    pub fn with_username(&mut self, username: &str) -> &mut Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_password(&mut self, password: &str) -> &mut Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn build(&self) -> Client {
        Client {
            url: self.url.trim_end_matches('/').to_string(),
            disable_certificate_validation: self.disable_certificate_validation,
            username: self.username.clone(),
            password: self.password.clone(),
            version: RwLock::new(None),
        }
    }
}
