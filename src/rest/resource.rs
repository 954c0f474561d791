use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::session::{SessionManager, TokenCell};
use crate::error::{ClientError, Result};
use crate::rest::response::RestResponse;

/// One remote operation, kept as data so the retry policy can re-issue it
/// after a token refresh.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub method: reqwest::Method,
    pub operation: String,
    pub query_id: Option<String>,
    pub data: Option<Value>,
    pub params: Vec<(String, String)>,
}

impl ResourceRequest {
    pub fn get(operation: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::GET,
            operation: operation.into(),
            query_id: None,
            data: None,
            params: Vec::new(),
        }
    }

    pub fn post(operation: impl Into<String>, data: Value) -> Self {
        Self {
            method: reqwest::Method::POST,
            operation: operation.into(),
            query_id: None,
            data: Some(data),
            params: Vec::new(),
        }
    }

    /// Entity id placed between the category and the operation in the path.
    pub fn query_id(mut self, id: impl Into<String>) -> Self {
        self.query_id = Some(id.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Client for one resource category. All instances of a facade share the
/// same HTTP connection pool and session manager; each holds its own token
/// cell, rewritten in place by the manager on login, refresh and logout.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    category: &'static str,
    api_root: reqwest::Url,
    http: reqwest::Client,
    token: TokenCell,
    manager: Arc<SessionManager>,
}

impl ResourceClient {
    pub(crate) fn new(
        category: &'static str,
        api_root: reqwest::Url,
        http: reqwest::Client,
        manager: Arc<SessionManager>,
    ) -> Self {
        let token = TokenCell::new(manager.token());
        manager.register_cell(token.clone());
        Self {
            category,
            api_root,
            http,
            token,
            manager,
        }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Token this client would authorize its next call with.
    pub fn token(&self) -> Option<String> {
        self.token.get()
    }

    /// Issue the request, transparently recovering from a single session
    /// expiry: on 401 the retry callback is notified, the session manager
    /// refreshes the token, and the request is re-issued exactly once. A
    /// second 401, or a failed refresh, surfaces as an authentication error.
    pub async fn call(&self, request: ResourceRequest) -> Result<RestResponse> {
        let token = self.token.get();
        match self.execute(&request, token.as_deref()).await {
            Err(err) if err.is_session_expired() && self.manager.auto_refresh() => {
                warn!(
                    category = self.category,
                    operation = %request.operation,
                    "session expired, refreshing and retrying once"
                );
                self.manager.notify_retry(self.category, &err, &request.operation);
                self.manager.refresh(token).await?;

                let fresh = self.token.get();
                self.execute(&request, fresh.as_deref())
                    .await
                    .map_err(|retry_err| {
                        if retry_err.is_session_expired() {
                            ClientError::Authentication(format!(
                                "call rejected again after token refresh: {}",
                                retry_err
                            ))
                        } else {
                            retry_err
                        }
                    })
            }
            other => other,
        }
    }

    async fn execute(&self, request: &ResourceRequest, token: Option<&str>) -> Result<RestResponse> {
        let mut path = String::from(self.category);
        if let Some(id) = &request.query_id {
            path.push('/');
            path.push_str(id);
        }
        path.push('/');
        path.push_str(&request.operation);

        let url = self
            .api_root
            .join(&path)
            .map_err(|e| ClientError::Configuration(format!("invalid path '{}': {}", path, e)))?;

        debug!(category = self.category, operation = %request.operation, "issuing request");

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            let detail = RestResponse::error_detail(&body)
                .unwrap_or_else(|| "session token is expired or invalid".to_string());
            return Err(ClientError::remote(Some(status.as_u16()), detail));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = RestResponse::error_detail(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::remote(Some(status.as_u16()), detail));
        }

        response.json::<RestResponse>().await.map_err(|e| {
            ClientError::remote(
                Some(status.as_u16()),
                format!("invalid response body: {}", e),
            )
        })
    }
}
