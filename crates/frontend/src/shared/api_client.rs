//! Authenticated HTTP client for the backend API.

use contracts::shared::error::CatalogError;
use contracts::shared::logger::{CreateLogRequest, LogSource};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::shared::api_utils::api_base;

/// Base URL plus bearer token. Built once when the operator enters a token
/// and passed to the components that talk to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into().trim().to_string(),
        }
    }

    /// Client for the backend the page was loaded from.
    pub fn for_current_location(token: impl Into<String>) -> Self {
        Self::new(api_base(), token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorization(&self) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.token))
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.authorization() {
            Some(value) => builder.header("Authorization", &value),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let response = self
            .authorize(Request::get(&self.url(path)))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, CatalogError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = self
            .authorize(Request::post(&self.url(path)))
            .json(body)
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        let response = request.send().await.map_err(transport)?;
        read_json(response).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, CatalogError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = self
            .authorize(Request::put(&self.url(path)))
            .json(body)
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        let response = request.send().await.map_err(transport)?;
        read_json(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), CatalogError> {
        let response = self
            .authorize(Request::delete(&self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    /// Cheap authenticated request used to validate a freshly entered token.
    pub async fn check_access(&self) -> Result<(), CatalogError> {
        let _: serde_json::Value = self.get_json("/api/logs?limit=1").await?;
        Ok(())
    }

    /// Persist an error shown to the operator in the server log.
    pub async fn report_error(&self, category: &str, error: &CatalogError) {
        let entry = CreateLogRequest {
            source: LogSource::Client,
            category: category.to_string(),
            message: format!("[{}] {}", error.kind().as_str(), error),
        };
        let result = match self.authorize(Request::post(&self.url("/api/logs"))).json(&entry) {
            Ok(request) => request.send().await.map_err(transport),
            Err(e) => Err(CatalogError::Decode(e.to_string())),
        };
        match result {
            Ok(response) if response.ok() => {}
            Ok(response) => log::warn!("error report rejected: HTTP {}", response.status()),
            Err(e) => log::warn!("error report not sent: {}", e),
        }
    }
}

/// Fire-and-forget variant of [`ApiClient::report_error`].
pub fn spawn_error_report(client: ApiClient, category: &'static str, error: CatalogError) {
    wasm_bindgen_futures::spawn_local(async move {
        client.report_error(category, &error).await;
    });
}

fn transport(error: gloo_net::Error) -> CatalogError {
    CatalogError::Transport(error.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, CatalogError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(CatalogError::from_response(status, &text))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_inputs() {
        let client = ApiClient::new("http://localhost:3000/", "  secret ");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/logs"), "http://localhost:3000/api/logs");
        assert_eq!(client.authorization().as_deref(), Some("Bearer secret"));
    }

    #[test]
    fn test_empty_token_sends_no_header() {
        let client = ApiClient::new("http://localhost:3000", "");
        assert!(client.authorization().is_none());
    }
}
