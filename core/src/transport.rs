//! Executing requests over the network.
//!
//! `Transport` is the seam between the plain-data requests the client builds
//! and an actual HTTP stack. `ReqwestTransport` is the default; tests swap in
//! recording fakes.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody};

#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("no response from {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The request could not be turned into a valid HTTP message.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Performs one HTTP round-trip. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `reqwest`-backed transport. Non-2xx statuses are returned as data.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.path.clone();
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(text)) => builder.body(text),
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)?),
            None => builder,
        };

        // Builder errors (bad header values, bad URL) fail before anything is sent.
        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Unreachable {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Unreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        debug!(%url, status, "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}
