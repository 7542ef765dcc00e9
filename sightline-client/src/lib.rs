//! Sightline Storage Client
//!
//! HTTP client for the remote data management service that holds input media,
//! annotations and result artifacts.
//!
//! The worker depends only on the [`RemoteStorage`] trait; [`StorageClient`]
//! is the REST implementation used in production.
//!
//! # Example
//!
//! ```no_run
//! use sightline_client::{RemoteStorage, StorageClient};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sightline_client::ClientError> {
//!     let client = StorageClient::new("http://localhost:8080/api/v1").with_token("secret");
//!
//!     let items = client.list_items("5f1c0a").await?;
//!     for item in items {
//!         client.download_item(&item.id, Path::new("/tmp"), &item.name).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod files;
mod folders;
mod items;
mod storage;

#[cfg(test)]
mod test_server;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use storage::RemoteStorage;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Header carrying the authentication token
pub const TOKEN_HEADER: &str = "Girder-Token";

/// HTTP client for the remote storage API
///
/// Endpoints are grouped by resource:
/// - Folders (listing, metadata, recursive download)
/// - Items (listing, download, metadata, deletion)
/// - Files (upload)
#[derive(Debug, Clone)]
pub struct StorageClient {
    /// Base URL of the API (e.g., "http://localhost:8080/api/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Authentication token sent with every request
    token: Option<String>,
}

impl StorageClient {
    /// Create a new storage client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the storage API
    ///
    /// # Example
    /// ```
    /// use sightline_client::StorageClient;
    ///
    /// let client = StorageClient::new("http://localhost:8080/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new storage client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Returns a copy of this client authenticated with `token`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the storage API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Starts a request with the authentication header attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
