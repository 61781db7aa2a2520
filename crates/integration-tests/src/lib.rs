//! End-to-end tests for the HerOol client.
//!
//! [`StubApi`] is an in-process axum server that speaks the remote API's
//! wire format (Spanish field names, `{id, mensaje}` creation
//! acknowledgements, `{"error": ...}` failure bodies). Tests point a real
//! [`HttpGateway`] at it and drive the controllers over loopback HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p herool-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_wire` - Paths, creation merges and error bodies
//! - `customer_flow` - Sign-in, posting requests, offer aggregation, acceptance
//! - `technician_flow` - Open requests, bidding, request detail, polling

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use herool_client::config::ConfigError;
use herool_client::{ApiConfig, Gateway, GatewayError, HttpGateway};
use herool_core::{
    Email, EmailError, NewOffer, NewRequest, Offer, OfferId, OfferStatus, Price, Request,
    RequestId, RequestStatus, ServiceCatalogEntry, ServiceId, User, UserId, UserRole,
    service_name,
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Failures while standing up a test fixture.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),
}

/// Error responses in the remote's `{"error": "..."}` shape.
#[derive(Debug, Error)]
enum StubError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{1}")]
    Scripted(StatusCode, String),
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Scripted(status, _) => *status,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

const WAIT_LIMIT: Duration = Duration::from_secs(5);

type Shared = Arc<Mutex<StubState>>;

#[derive(Default)]
struct StubState {
    accounts: Vec<(User, String)>,
    services: Vec<ServiceCatalogEntry>,
    requests: Vec<Request>,
    offers: Vec<Offer>,
    next_id: i32,
    hits: Vec<String>,
    failures: HashMap<String, (StatusCode, String)>,
}

impl StubState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.accounts
            .iter()
            .map(|(user, _)| user)
            .find(|user| user.id == id)
    }

    /// Request row joined with customer and service names, as list
    /// endpoints return it.
    fn joined_request(&self, request: &Request) -> Request {
        Request {
            customer_name: self.user(request.customer_id).map(|u| u.name.clone()),
            service_name: service_name(&self.services, request.service_id).map(str::to_owned),
            ..request.clone()
        }
    }

    fn requests_where(&self, keep: impl Fn(&Request) -> bool) -> Vec<Request> {
        self.requests
            .iter()
            .filter(|r| keep(r))
            .map(|r| self.joined_request(r))
            .collect()
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the remote marketplace API.
///
/// Every call is recorded as `"METHOD /path"` (without the `/api` prefix)
/// so tests can assert exactly which remote operations a flow issued.
pub struct StubApi {
    base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl StubApi {
    /// Bind to an ephemeral loopback port and serve the stub, seeded with
    /// a three-entry service catalog (ids 1-3).
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> Result<Self, SetupError> {
        let state: Shared = Arc::new(Mutex::new(StubState {
            services: catalog(),
            next_id: 100,
            ..StubState::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Stub API server stopped");
            }
        });

        Ok(Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A reqwest-backed gateway pointed at this stub.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn gateway(&self) -> Result<Arc<dyn Gateway>, SetupError> {
        let config = ApiConfig::with_base_url(&self.base_url)?;
        Ok(Arc::new(HttpGateway::new(&config)?))
    }

    /// Register an account directly in the stub.
    ///
    /// # Errors
    ///
    /// Returns an error if `email` is malformed.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, SetupError> {
        let mut state = lock(&self.state);
        let user = User {
            id: UserId::new(state.next_id()),
            name: name.to_owned(),
            email: Email::parse(email)?,
            role,
            phone: "555-0100".to_owned(),
            rating: Some(4.5),
            bio: None,
        };
        state.accounts.push((user.clone(), password.to_owned()));
        Ok(user)
    }

    /// Insert an open request.
    pub fn seed_request(
        &self,
        customer_id: UserId,
        service_id: ServiceId,
        description: &str,
    ) -> RequestId {
        let mut state = lock(&self.state);
        let id = RequestId::new(state.next_id());
        let request = NewRequest {
            customer_id,
            service_id,
            description: description.to_owned(),
            location: "Centro".to_owned(),
            latitude: None,
            longitude: None,
        };
        let mut request = request.into_request(id);
        request.status = Some(RequestStatus::Open);
        state.requests.push(request);
        id
    }

    /// Insert a pending offer.
    pub fn seed_offer(&self, request_id: RequestId, technician_id: UserId, price: i64) -> OfferId {
        let mut state = lock(&self.state);
        let id = OfferId::new(state.next_id());
        let offer = NewOffer {
            request_id,
            technician_id,
            price: Price::from_units(price),
            description: format!("Offer {id}"),
        };
        let mut offer = offer.into_offer(id);
        offer.status = Some(OfferStatus::Pending);
        state.offers.push(offer);
        id
    }

    #[must_use]
    pub fn offer_status(&self, id: OfferId) -> Option<OfferStatus> {
        lock(&self.state)
            .offers
            .iter()
            .find(|o| o.id == id)
            .and_then(|o| o.status.clone())
    }

    #[must_use]
    pub fn request_status(&self, id: RequestId) -> Option<RequestStatus> {
        lock(&self.state)
            .requests
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.status.clone())
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        lock(&self.state).hits.clone()
    }

    /// How many times `hit` (e.g. `"GET /solicitudes/abiertas"`) was called.
    #[must_use]
    pub fn count(&self, hit: &str) -> usize {
        lock(&self.state).hits.iter().filter(|h| *h == hit).count()
    }

    pub fn clear_hits(&self) {
        lock(&self.state).hits.clear();
    }

    /// Answer the next `hit` with `status` and `{"error": message}`.
    pub fn fail_next(&self, hit: &str, status: u16, message: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.state)
            .failures
            .insert(hit.to_owned(), (status, message.to_owned()));
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn catalog() -> Vec<ServiceCatalogEntry> {
    [(1, "Plomería"), (2, "Electricidad"), (3, "Carpintería")]
        .into_iter()
        .map(|(id, name)| ServiceCatalogEntry {
            id: ServiceId::new(id),
            name: name.to_owned(),
            description: format!("Servicios de {}", name.to_lowercase()),
            icon_ref: String::new(),
        })
        .collect()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/usuarios/login", post(login))
        .route("/api/usuarios/register", post(register))
        .route("/api/usuarios/{id}", get(get_user))
        .route("/api/servicios", get(list_services))
        .route("/api/solicitudes", post(create_request))
        .route("/api/solicitudes/abiertas", get(open_requests))
        .route("/api/solicitudes/cliente/{id}", get(requests_by_customer))
        .route("/api/solicitudes/servicio/{id}", get(requests_by_service))
        .route("/api/solicitudes/{id}", get(get_request))
        .route("/api/ofertas", post(create_offer))
        .route("/api/ofertas/solicitud/{id}", get(offers_for_request))
        .route("/api/ofertas/tecnico/{id}", get(offers_for_technician))
        .route("/api/ofertas/{id}/aceptar", put(accept_offer))
        .route("/api/ofertas/{id}/rechazar", put(reject_offer))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

/// Record the call and short-circuit it when a failure is scripted.
async fn record(
    State(state): State<Shared>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let hit = format!(
        "{} {}",
        request.method(),
        path.strip_prefix("/api").unwrap_or(path)
    );
    let failure = {
        let mut state = lock(&state);
        let failure = state.failures.remove(&hit);
        state.hits.push(hit);
        failure
    };

    match failure {
        Some((status, message)) => StubError::Scripted(status, message).into_response(),
        None => next.run(request).await,
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    contrasena: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    nombre: String,
    email: String,
    contrasena: String,
    tipo_usuario: UserRole,
    #[serde(default)]
    telefono: String,
}

async fn login(
    State(state): State<Shared>,
    Json(body): Json<LoginBody>,
) -> Result<Json<User>, StubError> {
    let state = lock(&state);
    state
        .accounts
        .iter()
        .find(|(user, password)| user.email.matches(&body.email) && *password == body.contrasena)
        .map(|(user, _)| Json(user.clone()))
        .ok_or(StubError::Unauthorized("Credenciales inválidas"))
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let mut state = lock(&state);
    let email = Email::parse(&body.email).map_err(|_| StubError::BadRequest("Email inválido"))?;
    if state
        .accounts
        .iter()
        .any(|(user, _)| user.email.matches(email.as_str()))
    {
        return Err(StubError::BadRequest("El email ya está registrado"));
    }

    let user = User {
        id: UserId::new(state.next_id()),
        name: body.nombre,
        email,
        role: body.tipo_usuario,
        phone: body.telefono,
        rating: None,
        bio: None,
    };
    // Registration echoes the account without phone or rating.
    let response = json!({
        "id": user.id,
        "nombre": user.name,
        "email": user.email,
        "tipo_usuario": user.role,
    });
    state.accounts.push((user, body.contrasena));
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_user(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<User>, StubError> {
    lock(&state)
        .user(UserId::new(id))
        .cloned()
        .map(Json)
        .ok_or(StubError::NotFound("Usuario no encontrado"))
}

async fn list_services(State(state): State<Shared>) -> Json<Vec<ServiceCatalogEntry>> {
    Json(lock(&state).services.clone())
}

async fn create_request(
    State(state): State<Shared>,
    Json(body): Json<NewRequest>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let mut state = lock(&state);
    if body.description.trim().is_empty() || body.location.trim().is_empty() {
        return Err(StubError::BadRequest("Faltan campos requeridos"));
    }
    if state.user(body.customer_id).is_none() {
        return Err(StubError::NotFound("Usuario no encontrado"));
    }

    let id = RequestId::new(state.next_id());
    let mut request = body.into_request(id);
    request.status = Some(RequestStatus::Open);
    state.requests.push(request);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "mensaje": "Solicitud creada exitosamente" })),
    ))
}

async fn open_requests(State(state): State<Shared>) -> Json<Vec<Request>> {
    Json(lock(&state).requests_where(Request::is_open))
}

async fn requests_by_customer(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Json<Vec<Request>> {
    let customer_id = UserId::new(id);
    Json(lock(&state).requests_where(|r| r.customer_id == customer_id))
}

async fn requests_by_service(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Json<Vec<Request>> {
    let service_id = ServiceId::new(id);
    Json(lock(&state).requests_where(|r| r.service_id == service_id && r.is_open()))
}

async fn get_request(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Request>, StubError> {
    let state = lock(&state);
    state
        .requests
        .iter()
        .find(|r| r.id == RequestId::new(id))
        .map(|r| Json(state.joined_request(r)))
        .ok_or(StubError::NotFound("Solicitud no encontrada"))
}

async fn create_offer(
    State(state): State<Shared>,
    Json(body): Json<NewOffer>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let mut state = lock(&state);
    let request = state
        .requests
        .iter()
        .find(|r| r.id == body.request_id)
        .ok_or(StubError::NotFound("Solicitud no encontrada"))?;
    if !request.is_open() {
        return Err(StubError::BadRequest("La solicitud ya no está abierta"));
    }
    if state
        .offers
        .iter()
        .any(|o| o.request_id == body.request_id && o.technician_id == body.technician_id)
    {
        return Err(StubError::BadRequest(
            "Ya enviaste una oferta para esta solicitud",
        ));
    }

    let id = OfferId::new(state.next_id());
    let mut offer = body.into_offer(id);
    offer.status = Some(OfferStatus::Pending);
    state.offers.push(offer);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "mensaje": "Oferta enviada exitosamente" })),
    ))
}

async fn offers_for_request(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Json<Vec<Offer>> {
    let state = lock(&state);
    let request_id = RequestId::new(id);
    let mut offers: Vec<Offer> = state
        .offers
        .iter()
        .filter(|o| o.request_id == request_id)
        .map(|o| {
            let technician = state.user(o.technician_id);
            Offer {
                technician_name: technician.map(|t| t.name.clone()),
                rating: technician.and_then(|t| t.rating),
                technician_phone: technician.map(|t| t.phone.clone()),
                ..o.clone()
            }
        })
        .collect();
    offers.sort_by_key(|o| o.price);
    Json(offers)
}

async fn offers_for_technician(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Json<Vec<Offer>> {
    let state = lock(&state);
    let technician_id = UserId::new(id);
    let offers = state
        .offers
        .iter()
        .filter(|o| o.technician_id == technician_id)
        .map(|o| {
            let request = state.requests.iter().find(|r| r.id == o.request_id);
            Offer {
                request_description: request.map(|r| r.description.clone()),
                location: request.map(|r| r.location.clone()),
                service_name: request
                    .and_then(|r| service_name(&state.services, r.service_id))
                    .map(str::to_owned),
                customer_name: request
                    .and_then(|r| state.user(r.customer_id))
                    .map(|c| c.name.clone()),
                ..o.clone()
            }
        })
        .collect();
    Json(offers)
}

async fn accept_offer(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, StubError> {
    let mut state = lock(&state);
    let offer_id = OfferId::new(id);
    let request_id = state
        .offers
        .iter()
        .find(|o| o.id == offer_id)
        .map(|o| o.request_id)
        .ok_or(StubError::NotFound("Oferta no encontrada"))?;

    for offer in state.offers.iter_mut().filter(|o| o.request_id == request_id) {
        offer.status = Some(if offer.id == offer_id {
            OfferStatus::Accepted
        } else {
            OfferStatus::Rejected
        });
    }
    if let Some(request) = state.requests.iter_mut().find(|r| r.id == request_id) {
        request.status = Some(RequestStatus::InProgress);
    }
    Ok(Json(json!({ "mensaje": "Oferta aceptada" })))
}

async fn reject_offer(
    State(state): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, StubError> {
    let mut state = lock(&state);
    let offer = state
        .offers
        .iter_mut()
        .find(|o| o.id == OfferId::new(id))
        .ok_or(StubError::NotFound("Oferta no encontrada"))?;
    offer.status = Some(OfferStatus::Rejected);
    Ok(Json(json!({ "mensaje": "Oferta rechazada" })))
}

/// Wait until the watched value satisfies `done`, returning that value.
///
/// Returns `None` after five seconds or once the sender is gone.
pub async fn wait_for<T, F>(views: &mut watch::Receiver<T>, done: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    let wait = async {
        loop {
            {
                let view = views.borrow_and_update();
                if done(&view) {
                    return Some(view.clone());
                }
            }
            if views.changed().await.is_err() {
                return None;
            }
        }
    };
    tokio::time::timeout(WAIT_LIMIT, wait).await.ok().flatten()
}
