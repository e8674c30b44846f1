//! Login and token ownership.

use crate::config::{ApiConfig, CLIENT_ID, Credentials, PRODUCT_ID};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::LoginResponse;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use url::Url;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    senha: &'a str,
    idcliente: u32,
    idproduto: u32,
}

/// Authenticated session against the occurrence-tracking service
///
/// Owns the credentials and the current access token. The token is replaced
/// wholesale on every successful login and cleared on a failed one. Logins are
/// serialized so concurrent callers never race a re-authentication.
pub struct AuthSession {
    transport: Transport,
    credentials: Credentials,
    login_url: Url,
    token: RwLock<Option<String>>,
    login_lock: Mutex<()>,
}

impl AuthSession {
    /// Create an unauthenticated session
    ///
    /// # Errors
    /// Returns error if the login URL cannot be built
    pub fn new(transport: Transport, credentials: Credentials, api: &ApiConfig) -> Result<Self> {
        Ok(Self {
            transport,
            credentials,
            login_url: api.login_url()?,
            token: RwLock::new(None),
            login_lock: Mutex::new(()),
        })
    }

    /// Log in and store the returned token
    ///
    /// On any failure (network, non-2xx, missing token) the stored token is
    /// cleared and the cause is logged and returned as
    /// [`Error::Authentication`].
    pub async fn authenticate(&self) -> Result<()> {
        let _guard = self.login_lock.lock().await;

        match self.login().await {
            Ok(token) => {
                *self.token.write().await = Some(token);
                tracing::info!(identity = %self.credentials.identity, "authenticated");
                Ok(())
            }
            Err(e) => {
                *self.token.write().await = None;
                tracing::error!(identity = %self.credentials.identity, error = %e, "authentication failed");
                Err(Error::Authentication(e.to_string()))
            }
        }
    }

    /// Current token, if authenticated
    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Transport shared with the rest of the run
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    async fn login(&self) -> Result<String> {
        let body = LoginRequest {
            email: &self.credentials.identity,
            senha: &self.credentials.secret,
            idcliente: CLIENT_ID,
            idproduto: PRODUCT_ID,
        };

        let request = self.transport.post(self.login_url.clone()).json(&body);
        let response = self.transport.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed: LoginResponse = serde_json::from_slice(&bytes)?;
        parsed
            .into_token()
            .ok_or_else(|| Error::Other("login response carried no token".to_string()))
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("credentials", &self.credentials)
            .field("login_url", &self.login_url.as_str())
            .finish_non_exhaustive()
    }
}
