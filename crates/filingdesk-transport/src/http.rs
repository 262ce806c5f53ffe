//! HTTP seam for the request client.
//!
//! [`HttpTransport`] executes exactly one attempt; retrying is the client's
//! job. The production implementation is reqwest.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::RequestError;

/// A request description that can be replayed verbatim on retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the client's base URL, e.g. `"/insider-trades"`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body. An empty body (e.g. 204) decodes as JSON `null`, so
    /// `()` and `Option<T>` targets succeed.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        let body = if self.body.trim().is_empty() { "null" } else { self.body.as_str() };
        serde_json::from_str(body).map_err(|e| RequestError::Decode(e.to_string()))
    }
}

/// Executes a single request attempt.
///
/// Any response, whatever its status, is `Ok`; `Err` means no response was
/// obtained (network failure, timeout, invalid URL).
pub trait HttpTransport: Send + Sync + 'static {
    fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<ApiResponse, RequestError>> + Send;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("filingdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, RequestError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url_for(&request.path))
            .timeout(self.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_handles_slashes() {
        let t = ReqwestTransport::with_client(
            reqwest::Client::new(),
            "http://api.test/v1/",
            Duration::from_secs(1),
        );
        assert_eq!(t.url_for("/trades"), "http://api.test/v1/trades");
        assert_eq!(t.url_for("trades"), "http://api.test/v1/trades");
    }

    #[test]
    fn request_builders() {
        let req = ApiRequest::get("/congress-trades")
            .with_query("chamber", "senate")
            .with_query("limit", "50");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query.len(), 2);
        assert!(req.body.is_none());

        let req = ApiRequest::post("/watchlist", serde_json::json!({"ticker": "ACME"}));
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body.unwrap()["ticker"], "ACME");
    }

    #[test]
    fn response_success_range_and_json() {
        let ok = ApiResponse {
            status: 204,
            body: "{\"n\":1}".into(),
        };
        assert!(ok.is_success());
        let v: serde_json::Value = ok.json().unwrap();
        assert_eq!(v["n"], 1);

        let no_content = ApiResponse {
            status: 204,
            body: String::new(),
        };
        no_content.json::<()>().unwrap();
        assert_eq!(no_content.json::<Option<serde_json::Value>>().unwrap(), None);
        assert!(matches!(
            no_content.json::<Vec<u32>>(),
            Err(RequestError::Decode(_))
        ));

        let redirect = ApiResponse {
            status: 302,
            body: "<a href=\"/login\">Found</a>".into(),
        };
        assert!(!redirect.is_success());
        assert!(matches!(
            redirect.json::<serde_json::Value>(),
            Err(RequestError::Decode(_))
        ));
    }
}
