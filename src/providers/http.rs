//! Shared reqwest plumbing for the service clients

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Build a client whose requests give up after `timeout`
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Join a base URL and an endpoint path
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// GET `url` with `query` and decode a JSON body.
///
/// Errors come back as messages so each client can wrap them in its own
/// error variant.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> std::result::Result<T, String> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| format!("request to {} failed: {}", url, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("reading body from {} failed: {}", url, e))?;

    if !status.is_success() {
        return Err(format!("{} returned {}: {}", url, status, body));
    }

    serde_json::from_str(&body).map_err(|e| format!("malformed response from {}: {}", url, e))
}
