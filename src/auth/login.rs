use std::fmt;

use serde_json::json;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::rest::response::RestResponse;

/// Which of the two authentication flows to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Initial login: submits user and password.
    Credentials,
    /// Session continuation: submits the user only, authorized by the
    /// current bearer token. The password is not resent.
    Refresh,
}

/// Capability object performing (re-)authentication against the users
/// endpoint. The password is captured at construction and never leaves
/// this struct: there is no accessor for it and `Debug` redacts it.
pub struct LoginHandler {
    user: String,
    password: String,
    api_root: reqwest::Url,
    http: reqwest::Client,
}

impl LoginHandler {
    pub(crate) fn new(
        http: reqwest::Client,
        api_root: reqwest::Url,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            api_root,
            http,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Run one authentication round trip and return the new token.
    pub(crate) async fn authenticate(
        &self,
        mode: AuthMode,
        current_token: Option<&str>,
    ) -> Result<String> {
        let url = self
            .api_root
            .join(&format!("users/{}/login", self.user))
            .map_err(|e| ClientError::Configuration(format!("invalid login url: {}", e)))?;

        let data = match mode {
            AuthMode::Credentials => json!({ "password": self.password }),
            AuthMode::Refresh => json!({}),
        };

        debug!(user = %self.user, refresh = matches!(mode, AuthMode::Refresh), "authenticating");

        let mut request = self.http.post(url).json(&data);
        if mode == AuthMode::Refresh {
            if let Some(token) = current_token {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = RestResponse::error_detail(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::Authentication(format!(
                "login rejected for user '{}': {}",
                self.user, detail
            )));
        }

        let body: RestResponse = response.json().await?;
        body.get_result(0)
            .and_then(|r| r.get("token"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| {
                ClientError::Authentication("login response carries no token".to_string())
            })
    }
}

impl fmt::Debug for LoginHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginHandler")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("api_root", &self.api_root.as_str())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_password() {
        let handler = LoginHandler::new(
            reqwest::Client::new(),
            reqwest::Url::parse("http://localhost/webservices/rest/v2/").unwrap(),
            "demo",
            "hunter2-very-secret",
        );
        let printed = format!("{:?}", handler);
        assert!(!printed.contains("hunter2-very-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
