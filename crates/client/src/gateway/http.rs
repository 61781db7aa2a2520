//! Reqwest-backed gateway.
//!
//! Owns transport details only: URL construction, JSON encoding, status
//! mapping and decoding. Every method issues exactly one request.

use std::sync::Arc;

use async_trait::async_trait;
use herool_core::{
    NewOffer, NewRequest, Offer, OfferId, Request, RequestId, ServiceCatalogEntry, ServiceId,
    User, UserId,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::wire::{CreatedOr, ErrorBody, LoginBody, RegisterBody};
use super::{Gateway, GatewayError};
use crate::auth::{Credentials, Registration};
use crate::config::ApiConfig;

/// HTTP client for the remote marketplace API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(HttpGatewayInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// The base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, GatewayError> {
        let raw = format!("{}{path}", self.inner.base_url);
        reqwest::Url::parse(&raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self.inner.client.get(url).send().await?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self.inner.client.post(url).json(body).send().await?;
        handle_response(response).await
    }

    /// PUT with an empty JSON object; the response body is ignored.
    async fn put_empty(&self, path: &str) -> Result<(), GatewayError> {
        let url = self.url(path)?;
        debug!(%url, "PUT");
        let response = self
            .inner
            .client
            .put(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(parse_error(response).await)
    }
}

/// Decode a 2xx body, or map the status to a [`GatewayError::Remote`].
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(parse_error(response).await);
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| GatewayError::Decode(format!("Failed to parse response: {e}")))
}

/// Build a remote error, preferring the server's `{"error": ...}` message.
async fn parse_error(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| body.trim().to_owned(), |parsed| parsed.error);
            GatewayError::Remote { status, message }
        }
        Err(e) => GatewayError::Transport(e),
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn login(&self, credentials: &Credentials) -> Result<User, GatewayError> {
        let body = LoginBody {
            email: credentials.email().as_str(),
            contrasena: credentials.password().expose_secret(),
        };
        self.post("/usuarios/login", &body).await
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<User, GatewayError> {
        let body = RegisterBody {
            nombre: &registration.name,
            email: registration.email.as_str(),
            contrasena: registration.password.expose_secret(),
            tipo_usuario: registration.role,
            telefono: &registration.phone,
        };
        self.post("/usuarios/register", &body).await
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<User, GatewayError> {
        self.get(&format!("/usuarios/{id}")).await
    }

    #[instrument(skip(self))]
    async fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, GatewayError> {
        self.get("/servicios").await
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    async fn create_request(&self, request: &NewRequest) -> Result<Request, GatewayError> {
        match self.post::<CreatedOr<Request>, _>("/solicitudes", request).await? {
            CreatedOr::Entity(created) => Ok(created),
            CreatedOr::Ack(ack) => {
                debug!(id = ack.id, message = ?ack.message, "Request created");
                Ok(request.clone().into_request(RequestId::new(ack.id)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_requests_by_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Request>, GatewayError> {
        self.get(&format!("/solicitudes/cliente/{customer_id}")).await
    }

    #[instrument(skip(self))]
    async fn list_requests_by_service(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<Request>, GatewayError> {
        self.get(&format!("/solicitudes/servicio/{service_id}")).await
    }

    #[instrument(skip(self))]
    async fn list_open_requests(&self) -> Result<Vec<Request>, GatewayError> {
        self.get("/solicitudes/abiertas").await
    }

    #[instrument(skip(self))]
    async fn get_request(&self, id: RequestId) -> Result<Request, GatewayError> {
        self.get(&format!("/solicitudes/{id}")).await
    }

    #[instrument(skip(self, offer), fields(request_id = %offer.request_id))]
    async fn create_offer(&self, offer: &NewOffer) -> Result<Offer, GatewayError> {
        match self.post::<CreatedOr<Offer>, _>("/ofertas", offer).await? {
            CreatedOr::Entity(created) => Ok(created),
            CreatedOr::Ack(ack) => {
                debug!(id = ack.id, message = ?ack.message, "Offer created");
                Ok(offer.clone().into_offer(OfferId::new(ack.id)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Offer>, GatewayError> {
        self.get(&format!("/ofertas/solicitud/{request_id}")).await
    }

    #[instrument(skip(self))]
    async fn list_offers_for_technician(
        &self,
        technician_id: UserId,
    ) -> Result<Vec<Offer>, GatewayError> {
        self.get(&format!("/ofertas/tecnico/{technician_id}")).await
    }

    #[instrument(skip(self))]
    async fn accept_offer(&self, id: OfferId) -> Result<(), GatewayError> {
        self.put_empty(&format!("/ofertas/{id}/aceptar")).await
    }

    #[instrument(skip(self))]
    async fn reject_offer(&self, id: OfferId) -> Result<(), GatewayError> {
        self.put_empty(&format!("/ofertas/{id}/rechazar")).await
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
