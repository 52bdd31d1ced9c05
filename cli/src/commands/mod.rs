//! CLI command implementations.

pub mod auth;
pub mod contacts;

use contacts_core::{
    AuthService, ClientConfig, ContactService, ContactsClient, Dispatcher, ReqwestTransport,
    SessionStore,
};

use crate::error::CliError;

/// Everything a command needs: the persisted session and both facades.
pub struct App {
    pub session: SessionStore,
    pub auth: AuthService<ReqwestTransport>,
    pub contacts: ContactService<ReqwestTransport>,
}

impl App {
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        tracing::debug!(
            base_url = %config.base_url,
            flavor = %config.flavor,
            session_file = %config.session_file.display(),
            "loaded configuration"
        );
        Self::from_config(&config)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, CliError> {
        let session = SessionStore::file(&config.session_file);
        let transport = ReqwestTransport::new(config.timeout)?;
        let client = ContactsClient::with_endpoints(&config.base_url, config.endpoints());
        let dispatcher = Dispatcher::new(transport, session.clone());
        Ok(Self {
            session,
            auth: AuthService::new(client.clone(), dispatcher.clone()),
            contacts: ContactService::new(client, dispatcher),
        })
    }

    /// Fail early when there is no token to send.
    pub fn require_session(&self) -> Result<(), CliError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotLoggedIn)
        }
    }
}
