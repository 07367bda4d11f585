//! Endpoint paths and JSON encoding for the platform API.
//!
//! Holds no decision logic: status handling lives in the transport and the
//! reconciler.

use std::time::Duration;

use http::header::ACCEPT;
use http::Method;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::error::{ClientError, Result};

const BENCHMARKS_V2: [&str; 2] = ["v2", "benchmarks"];
const BENCHMARKS_V1: [&str; 2] = ["v1", "benchmarks"];

#[derive(Debug, Clone)]
pub struct RequestRouter {
    base_url: Url,
    client: Client,
}

impl RequestRouter {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid api base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!("api base_url '{}' cannot carry paths", base_url)));
        }
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self { base_url, client })
    }

    /// `POST` (create) and `GET` (list) endpoint.
    pub fn benchmarks_url(&self) -> Result<String> {
        self.endpoint(&BENCHMARKS_V2)
    }

    /// `DELETE` endpoint for one benchmark; `id` is encoded as a path segment.
    pub fn benchmark_url(&self, id: &str) -> Result<String> {
        let [version, collection] = BENCHMARKS_V1;
        self.endpoint(&[version, collection, id])
    }

    pub fn build_request(&self, method: &Method, url: &str, body: Option<&Value>) -> RequestBuilder {
        let request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");
        match body {
            Some(body) => request.json(body),
            None => request,
        }
    }

    /// Read the body and decode it as JSON, keeping the raw body on failure.
    pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Self::decode_body(body)
    }

    /// Decode an already-read body; the body is moved into the error on failure.
    pub fn decode_body<T: DeserializeOwned>(body: String) -> Result<T> {
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "response decode failed");
            ClientError::Decode {
                message: e.to_string(),
                body,
            }
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("api base_url '{}' cannot carry paths", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}
