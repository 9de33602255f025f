//! Authorized request execution
//!
//! [`AuthorizedClient`] attaches the current access credential to outbound
//! calls. On an authorization rejection it renews the credential once and
//! reissues the request once. There is never more than one renewal and one
//! retry per call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::client::bearer;
use crate::client::http::status_error;
use crate::config::{Config, join_url};
use crate::error::{ApiError, Result};
use crate::session::{CredentialRenewer, SessionState, fingerprint};

/// Method, headers, body and query of an authorized call.
///
/// Kept separate from the credential so the same request can be rebuilt
/// for the retry.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub json: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            json: None,
            query: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// HTTP client that decorates calls with the session's access credential
pub struct AuthorizedClient {
    http: HttpClient,
    base_url: String,
    session: Arc<SessionState>,
    renewer: Arc<CredentialRenewer>,
}

impl AuthorizedClient {
    pub fn new(
        session: Arc<SessionState>,
        renewer: Arc<CredentialRenewer>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            session,
            renewer,
        })
    }

    pub fn from_config(
        config: &Config,
        session: Arc<SessionState>,
        renewer: Arc<CredentialRenewer>,
    ) -> Result<Self> {
        Self::new(
            session,
            renewer,
            config.api_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Absolute URLs pass through; anything else is a path below the API base
    pub fn resolve_target(&self, target: &str) -> Result<Url> {
        let raw = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            join_url(&self.base_url, target)
        };
        Url::parse(&raw).map_err(|e| ApiError::InvalidTarget(format!("{}: {}", target, e)).into())
    }

    /// Issue an authorized call.
    ///
    /// Fails with [`ApiError::NoCredential`] before any request when no
    /// credential can be obtained. Otherwise the response is returned as
    /// is, including a 401 the renewal could not fix. At most one renewal
    /// and one retry happen per call.
    pub async fn call(&self, target: &str, options: &RequestOptions) -> Result<Response> {
        let url = self.resolve_target(target)?;

        let (token, renewed) = match self.session.access() {
            Some(access) => (access, false),
            None if self.session.renewal().is_some() => {
                let fresh = self
                    .renewer
                    .renew_stale(None)
                    .await
                    .ok_or(ApiError::NoCredential)?;
                (fresh, true)
            }
            None => return Err(ApiError::NoCredential.into()),
        };

        let response = self.send(&url, options, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // A call renews at most once.
        if renewed {
            log::debug!("{} {} rejected with a freshly renewed credential", options.method, url);
            return Ok(response);
        }

        if self.session.renewal().is_none() {
            log::debug!("{} {} rejected, no renewal credential held", options.method, url);
            return Ok(response);
        }

        match self.renewer.renew_stale(Some(&token)).await {
            Some(fresh) => {
                log::debug!(
                    "{} {} rejected, retrying once with {}",
                    options.method,
                    url,
                    fingerprint(&fresh)
                );
                self.send(&url, options, &fresh).await
            }
            None => Ok(response),
        }
    }

    /// Authorized GET
    pub async fn get(&self, target: &str) -> Result<Response> {
        self.call(target, &RequestOptions::new(Method::GET)).await
    }

    /// Authorized POST with a JSON body
    pub async fn post_json(&self, target: &str, body: serde_json::Value) -> Result<Response> {
        self.call(target, &RequestOptions::new(Method::POST).with_json(body))
            .await
    }

    /// Authorized GET decoding a JSON body; error statuses become `ApiError`s
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        let response = self.get(target).await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &text).into());
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response: {}", e)).into()
        })
    }

    async fn send(&self, url: &Url, options: &RequestOptions, token: &str) -> Result<Response> {
        let mut headers = options.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let authorization =
            HeaderValue::from_str(&bearer(token)).map_err(|_| ApiError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, authorization);

        let mut request = self
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(ref body) = options.json {
            request = request.json(body);
        }

        log::debug!("{} {}", options.method, url);
        let response = request.send().await.map_err(ApiError::from)?;
        Ok(response)
    }
}
