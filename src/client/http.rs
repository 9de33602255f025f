//! HTTP implementation of the authentication service client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::models::{ErrorBody, LoginGrant, RefreshGrant};
use super::{AuthApi, bearer};
use crate::config::{Config, join_url};
use crate::error::{ApiError, Result};

/// Client for the authentication service endpoints
pub struct HttpAuthClient {
    http: HttpClient,
    base_url: String,
}

impl HttpAuthClient {
    /// Create a client rooted at the auth service base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.auth_url(), Duration::from_secs(config.timeout_secs))
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// POST to an auth endpoint, optionally with a bearer credential and JSON body
    async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.endpoint(path);
        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer(token));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        log::debug!("POST {}", url);
        let response = request.send().await.map_err(ApiError::from)?;
        Ok(response)
    }
}

/// Parse a successful JSON body, or turn an error status into an `ApiError`
async fn parse_response<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(status_error(status, &text).into());
    }

    serde_json::from_str(&text).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "Failed to parse {} response: {}. Body was: {}",
            what, e, text
        ))
        .into()
    })
}

/// Map an error status and body to the matching `ApiError`
pub(crate) fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(
            message.unwrap_or_else(|| "credential rejected".to_string()),
        ),
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => {
            ApiError::NotFound(message.unwrap_or_else(|| "Resource not found".to_string()))
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::BadRequest(message.unwrap_or_else(|| "Bad request".to_string()))
        }
        status if status.is_server_error() => ApiError::ServerError(
            message.unwrap_or_else(|| format!("Server error: {}", status)),
        ),
        status => ApiError::InvalidResponse(format!("Unexpected status code: {}", status)),
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, login: &str, password: &str) -> Result<LoginGrant> {
        let body = json!({ "login": login, "password": password });
        let response = self.post("/login", None, Some(body)).await?;
        parse_response(response, "login").await
    }

    async fn logout(&self, access: &str) -> Result<()> {
        let response = self.post("/logout", Some(access), None).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(status_error(status, &text).into())
    }

    async fn refresh(&self, renewal: &str) -> Result<RefreshGrant> {
        let response = self.post("/refresh", Some(renewal), None).await?;
        parse_response(response, "refresh").await
    }
}
