//! HTTP client for a running Boardwalk server, used by the CLI commands.
//!
//! Configuration is via environment variables:
//! - `BOARDWALK_URL` - Base URL (default: `http://localhost:17020/api/v1`)
//! - `BOARDWALK_API_KEY` - API key for authentication (optional for local)

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

pub const DEFAULT_URL: &str = "http://localhost:17020/api/v1";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

impl ClientError {
    fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
            StatusCode::CONFLICT => ClientError::Conflict(body),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardwalkClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl BoardwalkClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("BOARDWALK_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("BOARDWALK_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::from_status(status, body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        self.handle_response(response).await
    }

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.get("/boards").await
    }

    pub async fn get_board(&self, id: Uuid) -> Result<BoardDetail, ClientError> {
        self.get(&format!("/boards/{}", id)).await
    }

    pub async fn dashboard(&self, board_id: Uuid) -> Result<Dashboard, ClientError> {
        self.get(&format!("/boards/{}/dashboard", board_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = BoardwalkClient::new("http://example.test/api/v1/", None);
        assert_eq!(client.base_url(), "http://example.test/api/v1");
        assert_eq!(client.url("/boards"), "http://example.test/api/v1/boards");
    }

    #[test]
    fn statuses_map_to_errors() {
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, "Board not found".into()),
            ClientError::NotFound(m) if m == "Board not found"
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, "WIP".into()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            ClientError::Server(_)
        ));
    }

    #[test]
    fn unreachable_server_is_an_http_error() {
        // Port 9 (discard) is closed on any sane test host.
        let client = BoardwalkClient::new("http://127.0.0.1:9/api/v1", None);
        let result = tokio_test::block_on(async {
            tokio::time::timeout(std::time::Duration::from_secs(10), client.health()).await
        });
        if let Ok(result) = result {
            assert!(matches!(result, Err(ClientError::Http(_))));
        }
    }
}
