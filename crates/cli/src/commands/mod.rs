//! Command implementations.

pub mod account;
pub mod offers;
pub mod requests;
pub mod watch;

use std::sync::Arc;

use herool_client::config::ConfigError;
use herool_client::controllers::SessionBound;
use herool_client::session::SessionError;
use herool_client::{
    ClientConfig, ClientError, FileStore, Gateway, GatewayError, HttpGateway, SessionStore,
};
use herool_core::User;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("{}", .0.user_message("Request failed"))]
    Gateway(#[from] GatewayError),

    #[error("{}", .0.user_message("Command failed"))]
    Client(#[from] ClientError),

    #[error("Not signed in. Run `herool login` first")]
    NotSignedIn,
}

/// Shared handles every command works with.
pub struct Context {
    pub config: ClientConfig,
    pub gateway: Arc<HttpGateway>,
    pub session: SessionStore,
}

impl Context {
    /// Load configuration, build the gateway and restore the session.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the HTTP client cannot
    /// be built or the session store cannot be read.
    pub fn load() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let gateway = Arc::new(HttpGateway::new(&config.api)?);
        let session = SessionStore::load(FileStore::new(&config.session_dir))?;

        tracing::debug!(
            base_url = gateway.base_url(),
            environment = ?config.api.environment,
            "Context ready"
        );
        Ok(Self {
            config,
            gateway,
            session,
        })
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.gateway) as Arc<dyn Gateway>
    }

    /// The signed-in user, or [`CliError::NotSignedIn`].
    pub fn user(&self) -> Result<User, CliError> {
        self.session.current().ok_or(CliError::NotSignedIn)
    }

    /// Activate `controller` for the signed-in user.
    pub async fn activate<C: SessionBound>(&self, controller: &C) -> Result<User, CliError> {
        let user = self.user()?;
        controller.activate(user.clone()).await?;
        Ok(user)
    }
}
