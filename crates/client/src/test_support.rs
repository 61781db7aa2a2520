//! In-memory gateway and fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use herool_core::{
    Email, NewOffer, NewRequest, Offer, OfferId, OfferStatus, Price, Request, RequestId,
    RequestStatus, ServiceCatalogEntry, ServiceId, User, UserId, UserRole,
};
use secrecy::ExposeSecret;

use crate::auth::{Credentials, Registration};
use crate::gateway::{Gateway, GatewayError};

/// A recorded gateway call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login,
    Register,
    GetUser(UserId),
    ListServices,
    CreateRequest(NewRequest),
    ListRequestsByCustomer(UserId),
    ListRequestsByService(ServiceId),
    ListOpenRequests,
    GetRequest(RequestId),
    CreateOffer(NewOffer),
    ListOffersForRequest(RequestId),
    ListOffersForTechnician(UserId),
    AcceptOffer(OfferId),
    RejectOffer(OfferId),
}

/// Gateway operation, without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    Register,
    GetUser,
    ListServices,
    CreateRequest,
    ListRequestsByCustomer,
    ListRequestsByService,
    ListOpenRequests,
    GetRequest,
    CreateOffer,
    ListOffersForRequest,
    ListOffersForTechnician,
    AcceptOffer,
    RejectOffer,
}

impl Call {
    pub const fn op(&self) -> Op {
        match self {
            Self::Login => Op::Login,
            Self::Register => Op::Register,
            Self::GetUser(_) => Op::GetUser,
            Self::ListServices => Op::ListServices,
            Self::CreateRequest(_) => Op::CreateRequest,
            Self::ListRequestsByCustomer(_) => Op::ListRequestsByCustomer,
            Self::ListRequestsByService(_) => Op::ListRequestsByService,
            Self::ListOpenRequests => Op::ListOpenRequests,
            Self::GetRequest(_) => Op::GetRequest,
            Self::CreateOffer(_) => Op::CreateOffer,
            Self::ListOffersForRequest(_) => Op::ListOffersForRequest,
            Self::ListOffersForTechnician(_) => Op::ListOffersForTechnician,
            Self::AcceptOffer(_) => Op::AcceptOffer,
            Self::RejectOffer(_) => Op::RejectOffer,
        }
    }
}

#[derive(Default)]
struct State {
    services: Vec<ServiceCatalogEntry>,
    users: Vec<(User, String)>,
    requests: Vec<Request>,
    offers: Vec<Offer>,
    next_id: i32,
    calls: Vec<Call>,
    delays: HashMap<Op, Duration>,
    failures: HashMap<Op, (u16, String)>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Gateway backed by vectors, mimicking the remote's side effects.
///
/// Responses are computed when the call arrives; a scripted delay is
/// applied afterwards, so a delayed call returns the data as it was when
/// the call started.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose catalog holds three services (ids 1 to 3).
    pub fn with_catalog() -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.lock();
            for (id, name) in [(1, "Plomería"), (2, "Electricidad"), (3, "Carpintería")] {
                state.services.push(ServiceCatalogEntry {
                    id: ServiceId::new(id),
                    name: name.to_owned(),
                    description: String::new(),
                    icon_ref: String::new(),
                });
            }
        }
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, user: User, password: &str) {
        self.lock().users.push((user, password.to_owned()));
    }

    pub fn seed_request(
        &self,
        customer: UserId,
        service: ServiceId,
        description: &str,
    ) -> RequestId {
        let mut state = self.lock();
        let id = RequestId::new(state.next_id());
        let mut request = NewRequest {
            customer_id: customer,
            service_id: service,
            description: description.to_owned(),
            location: "Centro".to_owned(),
            latitude: None,
            longitude: None,
        }
        .into_request(id);
        request.status = Some(RequestStatus::Open);
        state.requests.push(request);
        id
    }

    pub fn seed_offer(&self, request: RequestId, technician: UserId, price: i64) -> OfferId {
        let mut state = self.lock();
        let id = OfferId::new(state.next_id());
        let mut offer = NewOffer {
            request_id: request,
            technician_id: technician,
            price: Price::from_units(price),
            description: String::new(),
        }
        .into_offer(id);
        offer.status = Some(OfferStatus::Pending);
        state.offers.push(offer);
        id
    }

    /// Make the next call of `op` fail with a remote error.
    pub fn fail_next(&self, op: Op, status: u16, message: &str) {
        self.lock().failures.insert(op, (status, message.to_owned()));
    }

    /// Delay the next call of `op`.
    pub fn delay_next(&self, op: Op, delay: Duration) {
        self.lock().delays.insert(op, delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.lock().calls.iter().map(Call::op).collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    async fn respond<T, F>(&self, call: Call, compute: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&mut State) -> Result<T, GatewayError> + Send,
        T: Send,
    {
        let op = call.op();
        let (delay, outcome) = {
            let mut state = self.lock();
            state.calls.push(call);
            let delay = state.delays.remove(&op);
            let outcome = match state.failures.remove(&op) {
                Some((status, message)) => Err(GatewayError::Remote { status, message }),
                None => compute(&mut *state),
            };
            (delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

fn not_found(message: &str) -> GatewayError {
    GatewayError::Remote {
        status: 404,
        message: message.to_owned(),
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn login(&self, credentials: &Credentials) -> Result<User, GatewayError> {
        let email = credentials.email().clone();
        let password = credentials.password().expose_secret().to_owned();
        self.respond(Call::Login, move |state| {
            state
                .users
                .iter()
                .find(|(user, secret)| user.email.matches(email.as_str()) && *secret == password)
                .map(|(user, _)| user.clone())
                .ok_or_else(|| GatewayError::Remote {
                    status: 401,
                    message: "Credenciales inválidas".to_owned(),
                })
        })
        .await
    }

    async fn register(&self, registration: &Registration) -> Result<User, GatewayError> {
        let registration = registration.clone();
        self.respond(Call::Register, move |state| {
            if state
                .users
                .iter()
                .any(|(u, _)| u.email.matches(registration.email.as_str()))
            {
                return Err(GatewayError::Remote {
                    status: 400,
                    message: "El email ya está registrado".to_owned(),
                });
            }
            let user = User {
                id: UserId::new(state.next_id()),
                name: registration.name,
                email: registration.email,
                role: registration.role,
                phone: registration.phone,
                rating: None,
                bio: None,
            };
            state.users.push((
                user.clone(),
                registration.password.expose_secret().to_owned(),
            ));
            Ok(user)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<User, GatewayError> {
        self.respond(Call::GetUser(id), move |state| {
            state
                .users
                .iter()
                .find(|(u, _)| u.id == id)
                .map(|(u, _)| u.clone())
                .ok_or_else(|| not_found("Usuario no encontrado"))
        })
        .await
    }

    async fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, GatewayError> {
        self.respond(Call::ListServices, |state| Ok(state.services.clone()))
            .await
    }

    async fn create_request(&self, request: &NewRequest) -> Result<Request, GatewayError> {
        let new_request = request.clone();
        self.respond(Call::CreateRequest(request.clone()), move |state| {
            let id = RequestId::new(state.next_id());
            let mut created = new_request.into_request(id);
            created.status = Some(RequestStatus::Open);
            state.requests.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn list_requests_by_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Request>, GatewayError> {
        self.respond(Call::ListRequestsByCustomer(customer_id), move |state| {
            Ok(state
                .requests
                .iter()
                .filter(|r| r.customer_id == customer_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn list_requests_by_service(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<Request>, GatewayError> {
        self.respond(Call::ListRequestsByService(service_id), move |state| {
            Ok(state
                .requests
                .iter()
                .filter(|r| r.service_id == service_id && r.is_open())
                .cloned()
                .collect())
        })
        .await
    }

    async fn list_open_requests(&self) -> Result<Vec<Request>, GatewayError> {
        self.respond(Call::ListOpenRequests, |state| {
            Ok(state.requests.iter().filter(|r| r.is_open()).cloned().collect())
        })
        .await
    }

    async fn get_request(&self, id: RequestId) -> Result<Request, GatewayError> {
        self.respond(Call::GetRequest(id), move |state| {
            state
                .requests
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| not_found("Solicitud no encontrada"))
        })
        .await
    }

    async fn create_offer(&self, offer: &NewOffer) -> Result<Offer, GatewayError> {
        let new_offer = offer.clone();
        self.respond(Call::CreateOffer(offer.clone()), move |state| {
            if !state.requests.iter().any(|r| r.id == new_offer.request_id) {
                return Err(not_found("Solicitud no encontrada"));
            }
            let id = OfferId::new(state.next_id());
            let mut created = new_offer.into_offer(id);
            created.status = Some(OfferStatus::Pending);
            state.offers.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Offer>, GatewayError> {
        self.respond(Call::ListOffersForRequest(request_id), move |state| {
            let mut offers: Vec<Offer> = state
                .offers
                .iter()
                .filter(|o| o.request_id == request_id)
                .cloned()
                .collect();
            offers.sort_by_key(|o| o.price);
            Ok(offers)
        })
        .await
    }

    async fn list_offers_for_technician(
        &self,
        technician_id: UserId,
    ) -> Result<Vec<Offer>, GatewayError> {
        self.respond(Call::ListOffersForTechnician(technician_id), move |state| {
            Ok(state
                .offers
                .iter()
                .filter(|o| o.technician_id == technician_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn accept_offer(&self, id: OfferId) -> Result<(), GatewayError> {
        self.respond(Call::AcceptOffer(id), move |state| {
            let request_id = state
                .offers
                .iter()
                .find(|o| o.id == id)
                .map(|o| o.request_id)
                .ok_or_else(|| not_found("Oferta no encontrada"))?;

            for offer in state.offers.iter_mut().filter(|o| o.request_id == request_id) {
                offer.status = Some(if offer.id == id {
                    OfferStatus::Accepted
                } else {
                    OfferStatus::Rejected
                });
            }
            if let Some(request) = state.requests.iter_mut().find(|r| r.id == request_id) {
                request.status = Some(RequestStatus::InProgress);
            }
            Ok(())
        })
        .await
    }

    async fn reject_offer(&self, id: OfferId) -> Result<(), GatewayError> {
        self.respond(Call::RejectOffer(id), move |state| {
            let offer = state
                .offers
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| not_found("Oferta no encontrada"))?;
            offer.status = Some(OfferStatus::Rejected);
            Ok(())
        })
        .await
    }
}

fn user(id: i32, role: UserRole) -> User {
    User {
        id: UserId::new(id),
        name: format!("User {id}"),
        email: Email::parse(&format!("user{id}@example.com")).unwrap(),
        role,
        phone: "555-0100".to_owned(),
        rating: None,
        bio: None,
    }
}

pub fn customer(id: i32) -> User {
    user(id, UserRole::Customer)
}

pub fn technician(id: i32) -> User {
    user(id, UserRole::Technician)
}
