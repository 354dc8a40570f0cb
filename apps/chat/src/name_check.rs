//! Username availability check (`GET /api/check-name`).

use parley_protocol::NameAvailability;
use parley_protocol::constants::check_name_url;

/// Errors from the name check.
#[derive(Debug, thiserror::Error)]
pub enum NameCheckError {
    #[error("name must not be empty")]
    Empty,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("error fetching name availability: status {0}")]
    Status(u16),
}

/// HTTP client for the name check endpoint.
pub struct NameChecker {
    http: reqwest::Client,
    url: String,
}

impl NameChecker {
    /// Creates a checker for the server at `host[:port]`.
    pub fn new(host: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: check_name_url(host),
        }
    }

    /// Asks the server whether `name` is free. Surrounding whitespace is
    /// trimmed; an empty name is rejected without a request.
    pub async fn is_available(&self, name: &str) -> Result<bool, NameCheckError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NameCheckError::Empty);
        }

        let resp = self
            .http
            .get(&self.url)
            .query(&[("username", name)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NameCheckError::Status(status.as_u16()));
        }

        let body: NameAvailability = resp.json().await?;
        tracing::debug!(name, available = body.available, "name check");
        Ok(body.available)
    }
}
