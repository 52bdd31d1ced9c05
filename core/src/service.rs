//! Named operations over the dispatcher.
//!
//! Each method builds a request with `ContactsClient`, sends it through the
//! `Dispatcher` and parses the reply. No caching, no business rules; errors
//! come back exactly as the dispatcher classified them. Persisting the
//! session after a successful login or registration is left to the caller.

use tracing::instrument;

use crate::client::ContactsClient;
use crate::dispatch::Dispatcher;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{
    AuthResponse, Contact, ContactPage, ContactUpdate, Credentials, DeleteAck, ListQuery,
    NewContact, Registration, TokenCheck,
};

#[derive(Debug, Clone)]
pub struct AuthService<T> {
    client: ContactsClient,
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> AuthService<T> {
    pub fn new(client: ContactsClient, dispatcher: Dispatcher<T>) -> Self {
        Self { client, dispatcher }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// `ApiError::Invalid` without any network call when the password
    /// confirmation differs; otherwise whatever the dispatcher classified.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_register(form)?;
        let response = self.dispatcher.send(request).await?;
        self.client.parse_register(response)
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_login(credentials)?;
        let response = self.dispatcher.send(request).await?;
        self.client.parse_login(response)
    }

    /// Ask the server whether the stored token is still accepted.
    #[instrument(skip_all)]
    pub async fn verify_token(&self) -> Result<TokenCheck, ApiError> {
        let response = self
            .dispatcher
            .send(self.client.build_verify_token())
            .await?;
        self.client.parse_verify_token(response)
    }
}

#[derive(Debug, Clone)]
pub struct ContactService<T> {
    client: ContactsClient,
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> ContactService<T> {
    pub fn new(client: ContactsClient, dispatcher: Dispatcher<T>) -> Self {
        Self { client, dispatcher }
    }

    #[instrument(skip(self), fields(page = query.page, per_page = query.per_page))]
    pub async fn list(&self, query: &ListQuery) -> Result<ContactPage, ApiError> {
        let response = self
            .dispatcher
            .send(self.client.build_list_contacts(query))
            .await?;
        self.client.parse_list_contacts(response)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Contact, ApiError> {
        let response = self
            .dispatcher
            .send(self.client.build_get_contact(id))
            .await?;
        self.client.parse_get_contact(response)
    }

    #[instrument(skip_all)]
    pub async fn create(&self, input: &NewContact) -> Result<Contact, ApiError> {
        let request = self.client.build_create_contact(input)?;
        let response = self.dispatcher.send(request).await?;
        self.client.parse_create_contact(response)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: &ContactUpdate) -> Result<Contact, ApiError> {
        let request = self.client.build_update_contact(id, input)?;
        let response = self.dispatcher.send(request).await?;
        self.client.parse_update_contact(response)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteAck, ApiError> {
        let response = self
            .dispatcher
            .send(self.client.build_delete_contact(id))
            .await?;
        self.client.parse_delete_contact(response)
    }
}
