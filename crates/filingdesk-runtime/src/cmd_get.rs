//! `filingdesk get` — one request through the retrying client.

use filingdesk_core::TransportConfig;
use filingdesk_transport::{ApiRequest, EnvToken, RequestError, RetryingRequestClient};

/// Returns `Ok(false)` when the request itself failed (already reported on
/// stderr); `Err` is reserved for local setup problems.
pub async fn cmd_get(
    api_base: &str,
    config: &TransportConfig,
    path: &str,
    query: &[(String, String)],
) -> anyhow::Result<bool> {
    let client = RetryingRequestClient::new(api_base, EnvToken::default(), config)?;

    let mut request = ApiRequest::get(path);
    for (k, v) in query {
        request = request.with_query(k.as_str(), v.as_str());
    }

    match client.send(request).await {
        Ok(response) => {
            println!("{}", render_body(&response.body));
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}", describe_failure(&e));
            Ok(false)
        }
    }
}

/// Pretty-print JSON bodies; pass anything else through untouched.
pub(crate) fn render_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => serde_json::to_string_pretty(&v).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

pub(crate) fn describe_failure(err: &RequestError) -> String {
    match err {
        RequestError::Status { status: 401 | 403, .. } => {
            format!("request rejected ({err}); check FILINGDESK_TOKEN")
        }
        _ => format!("request failed: {err}"),
    }
}
