//! Client core for the contacts service.
//!
//! # Overview
//! Registration, login and contact CRUD against the contacts REST backend,
//! with the bearer token and user profile persisted between runs.
//!
//! # Design
//! - `ContactsClient` is stateless: `build_*` produces plain-data requests,
//!   `parse_*` classifies and decodes responses (host-does-IO). Hosts without
//!   an async runtime can drive the API with these alone.
//! - `Dispatcher` is the single path for network calls: it attaches the
//!   stored bearer token, executes once through a `Transport` and classifies
//!   the outcome into `ApiError`.
//! - `AuthService` / `ContactService` are thin facades tying the two
//!   together. They never touch the session; the caller saves it after login
//!   and clears it on logout.
//! - `SessionStore` sits on an injected `KeyValueStore` (in-memory or file).

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod phone;
pub mod service;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ContactsClient;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{classify, Dispatcher};
pub use endpoints::{ApiFlavor, Endpoints};
pub use error::{ApiError, ErrorDetail, ValidationError};
pub use http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody, RequestScope};
pub use phone::PhoneNumbers;
pub use service::{AuthService, ContactService};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionError, SessionStore, StoreError};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    AuthResponse, Contact, ContactPage, ContactUpdate, Credentials, DeleteAck, Gender, ListQuery,
    NewContact, ProfilePicture, Registration, TokenCheck, UserProfile,
};
