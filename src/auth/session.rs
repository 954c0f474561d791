use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::auth::login::{AuthMode, LoginHandler};
use crate::error::{ClientError, Result};

/// Current authenticated session as seen by the facade.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<String>,
}

/// Shared mutable token slot owned by one resource client. The facade keeps
/// a reference to every cell it handed out and rewrites them in place on
/// login, refresh and logout; the cell itself is never replaced, so clones
/// held elsewhere keep observing updates.
#[derive(Debug, Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn new(token: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(token)))
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().clone()
    }

    pub(crate) fn set(&self, token: Option<String>) {
        *self.0.write() = token;
    }
}

/// Callback invoked when a call is about to be retried after a session
/// expiry, with (category, error, operation). Observational only.
pub type RetryCallback = Arc<dyn Fn(&str, &ClientError, &str) + Send + Sync>;

/// Shared session state: the token, the registered cells, the installed
/// login handler and the refresh gate. One instance per facade, shared by
/// every resource client through an Arc.
pub struct SessionManager {
    session: RwLock<Session>,
    cells: RwLock<Vec<TokenCell>>,
    login_handler: RwLock<Option<Arc<LoginHandler>>>,
    // serializes refreshes so concurrent 401 detections trigger one refresh
    refresh_gate: tokio::sync::Mutex<()>,
    auto_refresh: bool,
    on_retry: Option<RetryCallback>,
}

impl SessionManager {
    pub(crate) fn new(
        token: Option<String>,
        auto_refresh: bool,
        on_retry: Option<RetryCallback>,
    ) -> Self {
        Self {
            session: RwLock::new(Session {
                token,
                user_id: None,
            }),
            cells: RwLock::new(Vec::new()),
            login_handler: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
            auto_refresh,
            on_retry,
        }
    }

    pub(crate) fn register_cell(&self, cell: TokenCell) {
        self.cells.write().push(cell);
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.read().user_id.clone()
    }

    pub(crate) fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub(crate) fn install_handler(&self, handler: Arc<LoginHandler>) {
        *self.login_handler.write() = Some(handler);
    }

    pub(crate) fn handler(&self) -> Option<Arc<LoginHandler>> {
        self.login_handler.read().clone()
    }

    /// Write the session and every registered cell in one synchronous pass.
    /// There is no await point between the first and the last cell write, so
    /// callers on the async side observe the update as all-or-nothing.
    pub(crate) fn set_session(&self, token: Option<String>, user_id: Option<String>) {
        let mut session = self.session.write();
        let cells = self.cells.read();
        for cell in cells.iter() {
            cell.set(token.clone());
        }
        session.token = token;
        session.user_id = user_id;
    }

    /// Same single-pass update, keeping the owning user (refresh path).
    fn set_token(&self, token: Option<String>) {
        let mut session = self.session.write();
        let cells = self.cells.read();
        for cell in cells.iter() {
            cell.set(token.clone());
        }
        session.token = token;
    }

    pub(crate) fn notify_retry(&self, category: &str, error: &ClientError, operation: &str) {
        if let Some(cb) = &self.on_retry {
            cb(category, error, operation);
        }
    }

    /// Re-authenticate in refresh mode and propagate the new token.
    ///
    /// `stale_token` is the token the failed call was issued with. At most
    /// one refresh is in flight at a time: latecomers queue on the gate and,
    /// once inside, find the token already changed and return without a
    /// second round trip.
    pub(crate) async fn refresh(&self, stale_token: Option<String>) -> Result<()> {
        let _gate = self.refresh_gate.lock().await;

        if self.token() != stale_token {
            debug!("token already refreshed by a concurrent caller");
            return Ok(());
        }

        let handler = self.handler().ok_or_else(|| {
            ClientError::Authentication(
                "session expired and no login handler is installed".to_string(),
            )
        })?;

        info!(user = handler.user(), "session expired, refreshing token");
        let token = handler
            .authenticate(AuthMode::Refresh, self.token().as_deref())
            .await
            .map_err(|e| match e {
                ClientError::Authentication(_) => e,
                other => {
                    warn!("token refresh failed: {other}");
                    ClientError::Authentication(format!("token refresh failed: {other}"))
                }
            })?;

        self.set_token(Some(token));
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("auto_refresh", &self.auto_refresh)
            .field("cells", &self.cells.read().len())
            .field("logged_in", &self.session.read().token.is_some())
            .finish()
    }
}
