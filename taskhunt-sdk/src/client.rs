//! HTTP client implementation
//!
//! This module provides the core HTTP client for the SDK. Each call is a
//! single GET with no retries; anything beyond the transport defaults
//! (timeouts, extra headers) comes from [`SdkConfig`].

use crate::config::SdkConfig;
use crate::error::{SdkError, SdkResult};
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The HTTP client for making API requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<SdkConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Add custom headers
        for (name, value) in &config.custom_headers {
            match (
                header::HeaderName::try_from(name.as_str()),
                header::HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "Skipping invalid custom header"),
            }
        }

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder.build().map_err(SdkError::NetworkError)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Build the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SdkResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> SdkResult<T> {
        self.request(Method::GET, path, Some(query)).await
    }

    /// Send one request and decode the JSON body
    async fn request<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
    ) -> SdkResult<T> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);

        if let Some(q) = query {
            request = request.query(q);
        }

        if self.config.enable_logging {
            debug!("Request: {} {}", method, url);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, url = %url, "Request failed before a response arrived");
            SdkError::NetworkError(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(SdkError::NetworkError)?;

        if self.config.enable_logging {
            debug!("Response {}: {}", status, text);
        }

        if status.is_success() {
            serde_json::from_str(&text).map_err(SdkError::SerializationError)
        } else {
            Err(self.handle_error_response(status, &text))
        }
    }

    /// Handle an error response
    fn handle_error_response(&self, status: StatusCode, body: &str) -> SdkError {
        if status == StatusCode::NOT_FOUND {
            debug!("Resource not found");
        } else {
            warn!(status = status.as_u16(), "API returned an error status");
        }
        SdkError::from_response(status.as_u16(), body)
    }
}
