//! Bearer-token REST client for the console backend.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::AuthContext;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};

/// JSON client that attaches the current credential to every request.
///
/// A `401` from any endpoint invalidates the [`AuthContext`] (clearing the
/// stored credential and signalling logout) before the error is returned.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig, auth: AuthContext) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(json_headers())
            .build()
            .map_err(|e| ConsoleError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        decode(resp).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut req = self.request(Method::POST, path);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = self.send(req).await?;
        decode(resp).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self.send(self.request(Method::PUT, path).json(body)).await?;
        decode(resp).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(self.request(Method::DELETE, path)).await?;
        decode(resp).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.url(path));
        match self.auth.authorization() {
            Some(value) => req.header(AUTHORIZATION, value),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().path().to_string();
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %url, "backend rejected credential; logging out");
            self.auth.invalidate();
        } else {
            tracing::debug!(path = %url, status = status.as_u16(), "backend returned error status");
        }
        Err(status_to_error(status.as_u16(), &body))
    }
}

/// Whether `segment` can be appended to a URL path as a single segment
/// without changing which endpoint it addresses.
pub fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '?', '#', '%'])
}

/// Default headers for the JSON API.
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ConsoleError {
    let message = extract_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        401 => ConsoleError::Unauthorized(message),
        _ => ConsoleError::api(status, message),
    }
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    // Some mutation endpoints answer with an empty body.
    if bytes.is_empty() {
        return serde_json::from_slice(b"null").map_err(ConsoleError::from);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
