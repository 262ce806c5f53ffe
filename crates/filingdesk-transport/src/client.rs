//! Request client with bearer credentials and bounded retry on 5xx.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use filingdesk_core::credential::bearer_credential;
use filingdesk_core::retry::{RetryContext, RetryDecision, RetryPolicy};
use filingdesk_core::TransportConfig;

use crate::error::RequestError;
use crate::http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::token::TokenAccessor;

/// Wraps an [`HttpTransport`] with credential attachment and the retry
/// policy. Cheap to clone; clones share the transport and token accessor
/// but never retry state.
pub struct RetryingRequestClient<T = ReqwestTransport> {
    transport: Arc<T>,
    token: Arc<dyn TokenAccessor>,
    policy: RetryPolicy,
}

impl<T> Clone for RetryingRequestClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            token: Arc::clone(&self.token),
            policy: self.policy.clone(),
        }
    }
}

impl RetryingRequestClient<ReqwestTransport> {
    /// reqwest-backed client against `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl TokenAccessor,
        config: &TransportConfig,
    ) -> Result<Self, RequestError> {
        let transport = ReqwestTransport::new(base_url, config.request_timeout())?;
        Ok(Self::with_transport(transport, token, config.retry.clone()))
    }
}

impl<T: HttpTransport> RetryingRequestClient<T> {
    pub fn with_transport(transport: T, token: impl TokenAccessor, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            token: Arc::new(token),
            policy,
        }
    }

    /// Issue `request`, retrying transient server failures.
    ///
    /// The credential is read and validated before every attempt; a missing
    /// or malformed token sends the attempt unauthenticated. The final error
    /// looks the same whether or not retries happened.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
        let mut retry = RetryContext::new();

        loop {
            let token = self.token.token();
            let bearer = bearer_credential(token.as_deref());

            let err = match self.transport.execute(&request, bearer).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => RequestError::Status {
                    status: response.status,
                    body: response.body,
                },
                Err(e) => e,
            };

            match retry.on_failure(&self.policy, err.status()) {
                RetryDecision::Retry { after } => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        status = err.status(),
                        retry = retry.retries(),
                        delay_ms = after.as_millis() as u64,
                        "request: server error, retrying"
                    );
                    tokio::time::sleep(after).await;
                }
                RetryDecision::GiveUp => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        retries = retry.retries(),
                        "request failed: {err}"
                    );
                    return Err(err);
                }
            }
        }
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, RequestError> {
        let mut request = ApiRequest::get(path);
        for (k, v) in query {
            request = request.with_query(*k, *v);
        }
        self.send(request).await?.json()
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RequestError> {
        let body = serde_json::to_value(body).map_err(|e| RequestError::Encode(e.to_string()))?;
        self.send(ApiRequest::post(path, body)).await?.json()
    }
}

// ─── Tests ───────────────────────────────────────────────────────
