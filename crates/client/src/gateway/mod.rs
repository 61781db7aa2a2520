//! Remote gateway: one method per remote operation.
//!
//! The gateway is a thin typed wrapper around the remote JSON API. It holds
//! no business logic and performs no retries; callers decide what a failure
//! means. [`HttpGateway`] is the reqwest-backed implementation.
//!
//! | Method | Verb / path |
//! |---|---|
//! | `login` | `POST /usuarios/login` |
//! | `register` | `POST /usuarios/register` |
//! | `get_user` | `GET /usuarios/:id` |
//! | `list_services` | `GET /servicios` |
//! | `create_request` | `POST /solicitudes` |
//! | `list_requests_by_customer` | `GET /solicitudes/cliente/:id` |
//! | `list_requests_by_service` | `GET /solicitudes/servicio/:id` |
//! | `list_open_requests` | `GET /solicitudes/abiertas` |
//! | `get_request` | `GET /solicitudes/:id` |
//! | `create_offer` | `POST /ofertas` |
//! | `list_offers_for_request` | `GET /ofertas/solicitud/:id` |
//! | `list_offers_for_technician` | `GET /ofertas/tecnico/:id` |
//! | `accept_offer` | `PUT /ofertas/:id/aceptar` |
//! | `reject_offer` | `PUT /ofertas/:id/rechazar` |

mod http;
mod wire;

pub use http::HttpGateway;

use async_trait::async_trait;
use herool_core::{
    NewOffer, NewRequest, Offer, OfferId, Request, RequestId, ServiceCatalogEntry, ServiceId,
    User, UserId,
};
use thiserror::Error;

use crate::auth::{Credentials, Registration};

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never got a response (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("remote error ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the raw body when it had none.
        message: String,
    },

    /// A 2xx body could not be decoded into the expected type.
    #[error("decode error: {0}")]
    Decode(String),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// HTTP status for remote failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's message when it sent one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Remote { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

/// Typed access to the remote marketplace API.
///
/// Every method maps to exactly one HTTP call.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Authenticate and return the account as the remote knows it.
    async fn login(&self, credentials: &Credentials) -> Result<User, GatewayError>;

    /// Create an account. Does not sign in.
    async fn register(&self, registration: &Registration) -> Result<User, GatewayError>;

    async fn get_user(&self, id: UserId) -> Result<User, GatewayError>;

    /// The service catalog.
    async fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, GatewayError>;

    /// Post a new request and return it with its assigned id.
    async fn create_request(&self, request: &NewRequest) -> Result<Request, GatewayError>;

    async fn list_requests_by_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Request>, GatewayError>;

    /// Open requests for a single service category.
    async fn list_requests_by_service(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<Request>, GatewayError>;

    /// Every open request, across all services.
    async fn list_open_requests(&self) -> Result<Vec<Request>, GatewayError>;

    async fn get_request(&self, id: RequestId) -> Result<Request, GatewayError>;

    /// Submit an offer and return it with its assigned id.
    async fn create_offer(&self, offer: &NewOffer) -> Result<Offer, GatewayError>;

    /// Offers on one request, cheapest first.
    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Offer>, GatewayError>;

    /// Offers made by one technician, newest first.
    async fn list_offers_for_technician(
        &self,
        technician_id: UserId,
    ) -> Result<Vec<Offer>, GatewayError>;

    /// Accept an offer. The remote rejects its siblings and moves the
    /// request to in-progress.
    async fn accept_offer(&self, id: OfferId) -> Result<(), GatewayError>;

    async fn reject_offer(&self, id: OfferId) -> Result<(), GatewayError>;
}
