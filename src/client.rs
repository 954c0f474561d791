use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::auth::login::{AuthMode, LoginHandler};
use crate::auth::session::{RetryCallback, SessionManager};
use crate::config::settings::ClientConfiguration;
use crate::error::{ClientError, Result};
use crate::jobs::{self, ExecutionStatus, JobTarget};
use crate::rest::resource::{ResourceClient, ResourceRequest};

/// Single entry point to a VarHub deployment.
///
/// Owns one sub-client per resource category, all wired to the same HTTP
/// connection pool and session manager. Logging in, refreshing and logging
/// out rewrite every sub-client's token in one pass, so no sub-client ever
/// serves a call with a stale token once an update has completed.
pub struct VarhubClient {
    configuration: ClientConfiguration,
    api_root: reqwest::Url,
    http: reqwest::Client,
    manager: Arc<SessionManager>,

    pub users: ResourceClient,
    pub projects: ResourceClient,
    pub studies: ResourceClient,
    pub files: ResourceClient,
    pub jobs: ResourceClient,
    pub samples: ResourceClient,
    pub individuals: ResourceClient,
    pub families: ResourceClient,
    pub cohorts: ResourceClient,
    pub panels: ResourceClient,
    pub variants: ResourceClient,
    pub meta: ResourceClient,
}

impl VarhubClient {
    pub fn new(configuration: ClientConfiguration) -> Result<Self> {
        Self::builder(configuration).build()
    }

    pub fn builder(configuration: ClientConfiguration) -> VarhubClientBuilder {
        VarhubClientBuilder {
            configuration,
            token: None,
            on_retry: None,
            auto_refresh: true,
        }
    }

    /// Authenticate with user and password and distribute the obtained
    /// token to every sub-client. The credentials are captured inside a
    /// login handler kept for later refreshes; the password itself is not
    /// reachable from the facade.
    pub async fn login(&self, user: &str, password: &str) -> Result<()> {
        let handler = Arc::new(LoginHandler::new(
            self.http.clone(),
            self.api_root.clone(),
            user,
            password,
        ));
        let token = handler.authenticate(AuthMode::Credentials, None).await?;
        self.manager.install_handler(handler);
        self.manager.set_session(Some(token), Some(user.to_string()));
        info!(user, "logged in");
        Ok(())
    }

    /// Re-run a previously installed login handler in credentials mode.
    pub async fn login_stored(&self) -> Result<()> {
        let handler = self.manager.handler().ok_or_else(|| {
            ClientError::Usage(
                "no stored credentials; call login with user and password first".to_string(),
            )
        })?;
        let token = handler.authenticate(AuthMode::Credentials, None).await?;
        let user = handler.user().to_string();
        self.manager.set_session(Some(token), Some(user));
        Ok(())
    }

    /// Drop the session everywhere. Safe to call when already logged out.
    pub fn logout(&self) {
        self.manager.set_session(None, None);
        info!("logged out");
    }

    pub fn token(&self) -> Option<String> {
        self.manager.token()
    }

    pub fn user_id(&self) -> Option<String> {
        self.manager.user_id()
    }

    pub fn configuration(&self) -> &ClientConfiguration {
        &self.configuration
    }

    /// Poll the targeted job until it reaches a terminal state, returning
    /// its final status on success and failing with `JobFailed` on ERROR
    /// or ABORTED. The wait is unbounded; wrap it in `tokio::time::timeout`
    /// to impose a deadline.
    pub async fn wait_for_job(&self, target: JobTarget) -> Result<ExecutionStatus> {
        jobs::wait_for_job(&self.jobs, &target).await
    }

    /// Liveness probe against the meta category, no auth required.
    pub async fn ping(&self) -> Result<()> {
        self.meta.call(ResourceRequest::get("ping")).await.map(|_| ())
    }
}

impl std::fmt::Debug for VarhubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarhubClient")
            .field("host", &self.configuration.rest.host)
            .field("version", &self.configuration.version)
            .field("logged_in", &self.manager.token().is_some())
            .finish()
    }
}

pub struct VarhubClientBuilder {
    configuration: ClientConfiguration,
    token: Option<String>,
    on_retry: Option<RetryCallback>,
    auto_refresh: bool,
}

impl VarhubClientBuilder {
    /// Start from an existing bearer token instead of logging in.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Observe refresh-and-retry cycles with (category, error, operation).
    /// The callback cannot alter control flow.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &ClientError, &str) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Disable the transparent refresh-and-retry policy. Session expiries
    /// then propagate to the caller unchanged.
    pub fn auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    pub fn build(self) -> Result<VarhubClient> {
        crate::config::loader::validate(&self.configuration)?;
        let api_root = self.configuration.api_root()?;

        let mut http = reqwest::Client::builder();
        if let Some(secs) = self.configuration.rest.timeout_seconds {
            http = http.timeout(Duration::from_secs(secs));
        }
        let http = http
            .build()
            .map_err(|e| ClientError::Configuration(format!("cannot build HTTP client: {}", e)))?;

        let manager = Arc::new(SessionManager::new(
            self.token,
            self.auto_refresh,
            self.on_retry,
        ));

        let resource = |category: &'static str| {
            ResourceClient::new(category, api_root.clone(), http.clone(), manager.clone())
        };

        Ok(VarhubClient {
            users: resource("users"),
            projects: resource("projects"),
            studies: resource("studies"),
            files: resource("files"),
            jobs: resource("jobs"),
            samples: resource("samples"),
            individuals: resource("individuals"),
            families: resource("families"),
            cohorts: resource("cohorts"),
            panels: resource("panels"),
            variants: resource("analysis/variant"),
            meta: resource("meta"),
            configuration: self.configuration,
            api_root,
            http,
            manager,
        })
    }
}
