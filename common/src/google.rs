// Shared HTTP plumbing for the Google REST adapters (Sheets, Drive, Calendar)

use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;

/// Authorized HTTP client for Google APIs
///
/// The bearer token is supplied by the host platform; nothing here refreshes it.
#[derive(Clone)]
pub struct GoogleClient {
    client: Client,
    access_token: String,
}

impl GoogleClient {
    /// Create a new client with the specified timeout
    pub fn new(access_token: impl Into<String>, timeout_seconds: u64) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
        })
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    pub fn put(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.put(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.access_token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.access_token)
        }
    }
}

/// Join `segments` onto `base`, percent-encoding each one
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| format!("Invalid API base '{}': {}", base, e))?;
    url.path_segments_mut()
        .map_err(|_| format!("API base '{}' cannot carry a path", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Split a response into success or `(status, body)`
pub async fn check_status(response: Response) -> Result<Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err((status.as_u16(), body))
}
