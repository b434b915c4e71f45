use async_trait::async_trait;
use snafu::Snafu;
use std::collections::HashMap;

#[derive(Debug, Snafu)]
pub enum HttpError {
    #[snafu(display("HttpError: {message}"))]
    RequestError { message: String },

    #[snafu(display("Request failed with status {status}: {body}"))]
    StatusError { status: u16, body: String },
}

impl HttpError {
    /// The HTTP status code when the server answered with a non-success status.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::StatusError { status, .. } => Some(*status),
            HttpError::RequestError { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

#[async_trait]
/// This trait must be implemented by any HTTP client used to talk to an Aptos node.
/// The implementing type provides the base URL and default headers; callers pass paths only.
pub trait HttpClient: Send + Sync {
    async fn request(
        &self,
        http_method: HttpMethod,
        path: String,
        query: Option<HashMap<String, String>>,
        body: Option<Vec<u8>>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError>;

    async fn get(&self, path: String) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Get, path, None, None, None).await
    }
}

#[cfg(feature = "default_client")]
pub struct DefaultHttpClient {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "default_client")]
impl DefaultHttpClient {
    /// Builds the client without touching the network.
    pub fn new(base_url: &str) -> Self {
        DefaultHttpClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(feature = "default_client")]
#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        path: String,
        query: Option<HashMap<String, String>>,
        body: Option<Vec<u8>>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.url(&path);
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|e| {
            HttpError::RequestError {
                message: e.to_string(),
            }
        })?;

        let mut request_builder = self.client.request(method, &url);

        if let Some(query_params) = query {
            request_builder = request_builder.query(&query_params);
        }

        if let Some(header_params) = headers {
            for (key, value) in header_params {
                request_builder = request_builder.header(key, value);
            }
        }

        if let Some(body_data) = body {
            request_builder = request_builder.body(body_data);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| HttpError::RequestError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response text".to_string());
            return Err(HttpError::StatusError { status, body });
        }

        let response_headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::RequestError {
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            body,
            headers: response_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_exposed_only_for_status_errors() {
        let not_found = HttpError::StatusError {
            status: 404,
            body: "account not found".to_string(),
        };
        let transport = HttpError::RequestError {
            message: "connection refused".to_string(),
        };

        assert_eq!(not_found.status(), Some(404));
        assert_eq!(transport.status(), None);
        assert_eq!(
            not_found.to_string(),
            "Request failed with status 404: account not found"
        );
    }

    #[cfg(feature = "default_client")]
    #[test]
    fn test_default_client_trims_trailing_slash() {
        let client = DefaultHttpClient::new("https://fullnode.testnet.aptoslabs.com/");
        assert_eq!(
            client.url("/v1/accounts/0x1"),
            "https://fullnode.testnet.aptoslabs.com/v1/accounts/0x1"
        );
    }
}
