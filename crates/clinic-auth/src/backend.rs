//! The backend collaborator behind [`SessionManager`](crate::SessionManager).

use async_trait::async_trait;
use clinic_api::{ApiClient, MessageField};
use clinic_core::User;
use clinic_core::constants::{
    AUTH_FIND_ID_PATH, AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_REGISTER_PATH, AUTH_USER_PATH,
};

use crate::errors::{AuthError, Result};
use crate::forms::{FindIdForm, LoginRequest, RegisterForm};

/// Auth endpoints the session manager talks to.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Probe the current session. A rejection (401) is `Ok(None)`.
    async fn fetch_user(&self) -> Result<Option<User>>;

    /// Exchange credentials for a session.
    async fn login(&self, request: &LoginRequest) -> Result<User>;

    /// End the session.
    async fn logout(&self) -> Result<()>;

    /// Create an account.
    async fn register(&self, form: &RegisterForm) -> Result<()>;

    /// Ask the backend to send the user ID to the registered email.
    async fn find_id(&self, form: &FindIdForm) -> Result<()>;
}

/// [`AuthBackend`] over the real HTTP endpoints.
#[derive(Clone, Debug)]
pub struct HttpAuthBackend {
    client: ApiClient,
}

impl HttpAuthBackend {
    /// Wrap an API client. The client's cookie store carries the session.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[tracing::instrument(skip_all)]
    async fn fetch_user(&self) -> Result<Option<User>> {
        match self.client.get_json::<Option<User>>(AUTH_USER_PATH).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("session probe rejected");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip_all, fields(username = %request.username))]
    async fn login(&self, request: &LoginRequest) -> Result<User> {
        Ok(self.client.post_json(AUTH_LOGIN_PATH, request).await?)
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self) -> Result<()> {
        Ok(self.client.post_empty(AUTH_LOGOUT_PATH).await?)
    }

    #[tracing::instrument(skip_all, fields(username = %form.username))]
    async fn register(&self, form: &RegisterForm) -> Result<()> {
        self.client
            .post_json_unit(AUTH_REGISTER_PATH, form)
            .await
            .map_err(|e| AuthError::from_api(e, MessageField::Message))
    }

    #[tracing::instrument(skip_all)]
    async fn find_id(&self, form: &FindIdForm) -> Result<()> {
        self.client
            .post_json_unit(AUTH_FIND_ID_PATH, form)
            .await
            .map_err(|e| AuthError::from_api(e, MessageField::Message))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
