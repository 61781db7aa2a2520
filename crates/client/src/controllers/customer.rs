//! Customer view: my requests and the offers made on them.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use herool_core::{
    NewRequest, Offer, OfferId, Request, RequestId, ServiceCatalogEntry, ServiceId, User,
    UserRole, service_name,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{SessionBound, ViewPhase};
use crate::config::PollSettings;
use crate::error::{ClientError, ValidationError};
use crate::gateway::{Gateway, GatewayError};
use crate::generation::{Generation, Ticket};
use crate::poller::Poller;

const UNKNOWN_SERVICE: &str = "Unknown";

/// Customer tabs. Only [`CustomerTab::Requests`] refreshes on schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomerTab {
    #[default]
    Home,
    Requests,
    Profile,
}

/// Everything the customer screens render.
#[derive(Debug, Clone, Default)]
pub struct CustomerView {
    pub phase: ViewPhase,
    pub user: Option<User>,
    pub tab: CustomerTab,
    pub services: Vec<ServiceCatalogEntry>,
    pub requests: Vec<Request>,
    /// Offers per request id, for the requests currently listed.
    pub offers_by_request: BTreeMap<RequestId, Vec<Offer>>,
    /// Sum of the lengths of every list in `offers_by_request`.
    pub total_offers: usize,
    /// An action is in progress.
    pub busy: bool,
    /// Message from the last failed action.
    pub error: Option<String>,
}

/// New-request form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub service_id: Option<ServiceId>,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RequestDraft {
    fn into_new_request(self, customer: &User) -> Result<NewRequest, ValidationError> {
        let Some(service_id) = self.service_id else {
            return Err(ValidationError::MissingFields);
        };
        let description = self.description.trim();
        let location = self.location.trim();
        if description.is_empty() || location.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        Ok(NewRequest {
            customer_id: customer.id,
            service_id,
            description: description.to_owned(),
            location: location.to_owned(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Keeps a customer's requests and their offers in step with the remote.
///
/// Cheap to clone; clones drive the same view.
#[derive(Clone)]
pub struct CustomerController {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn Gateway>,
    settings: PollSettings,
    state: watch::Sender<CustomerView>,
    poller: Poller,
    activation: Generation,
    requests_generation: Generation,
    offers_generation: Generation,
}

impl CustomerController {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, settings: PollSettings) -> Self {
        let (state, _) = watch::channel(CustomerView::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                settings,
                state,
                poller: Poller::new("customer-requests"),
                activation: Generation::new(),
                requests_generation: Generation::new(),
                offers_generation: Generation::new(),
            }),
        }
    }

    /// Observe the view. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CustomerView> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> CustomerView {
        self.inner.state.borrow().clone()
    }

    /// Switch tabs. Entering the requests tab refreshes at once; the
    /// schedule itself keeps its cadence.
    pub async fn select_tab(&self, tab: CustomerTab) {
        self.inner.state.send_if_modified(|view| {
            let changed = view.tab != tab;
            view.tab = tab;
            changed
        });

        if tab == CustomerTab::Requests && self.inner.is_synced() {
            if let Err(e) = self.inner.refresh().await {
                warn!(error = %e, "Refresh on tab switch failed");
            }
        }
    }

    /// Refresh the request list and the offers on every listed request.
    ///
    /// # Errors
    ///
    /// Returns an error if no customer is signed in or the request list
    /// cannot be fetched.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.inner.refresh().await
    }

    /// Post a new request, then refresh the list once.
    ///
    /// # Errors
    ///
    /// Returns a validation error (without calling the remote) when a
    /// required field is empty, or the gateway failure. Either way the
    /// message is also stored in the view.
    #[instrument(skip(self, draft))]
    pub async fn create_request(&self, draft: RequestDraft) -> Result<Request, ClientError> {
        let user = self.inner.current_user()?;
        let new_request = match draft.into_new_request(&user) {
            Ok(new_request) => new_request,
            Err(e) => {
                self.inner.fail(e.to_string());
                return Err(e.into());
            }
        };

        self.inner.begin_action();
        match self.inner.gateway.create_request(&new_request).await {
            Ok(created) => {
                info!(request_id = %created.id, "Request created");
                self.inner.end_action();
                if let Err(e) = self.inner.refresh().await {
                    warn!(error = %e, "Refresh after create failed");
                }
                Ok(created)
            }
            Err(e) => {
                self.inner.fail(e.user_message("Error creating request"));
                Err(e.into())
            }
        }
    }

    /// Accept an offer, then refresh the list once.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure; its message is stored in the view.
    #[instrument(skip(self))]
    pub async fn accept_offer(&self, offer_id: OfferId) -> Result<(), ClientError> {
        self.inner.current_user()?;

        self.inner.begin_action();
        match self.inner.gateway.accept_offer(offer_id).await {
            Ok(()) => {
                info!(%offer_id, "Offer accepted");
                self.inner.end_action();
                if let Err(e) = self.inner.refresh().await {
                    warn!(error = %e, "Refresh after accept failed");
                }
                Ok(())
            }
            Err(e) => {
                self.inner.fail(e.user_message("Error accepting offer"));
                Err(e.into())
            }
        }
    }

    /// Catalog name for a service id, `"Unknown"` if not in the catalog.
    #[must_use]
    pub fn service_name(&self, id: ServiceId) -> String {
        let view = self.inner.state.borrow();
        service_name(&view.services, id)
            .unwrap_or(UNKNOWN_SERVICE)
            .to_owned()
    }

}

#[async_trait]
impl SessionBound for CustomerController {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn activate(&self, user: User) -> Result<(), ClientError> {
        if !user.is_customer() {
            self.deactivate();
            return Err(ClientError::RoleMismatch {
                expected: UserRole::Customer,
                actual: user.role,
            });
        }

        self.inner.reset();
        let ticket = self.inner.activation.issue();
        let tab = self.inner.state.borrow().tab;
        self.inner.state.send_replace(CustomerView {
            phase: ViewPhase::Loading,
            user: Some(user),
            tab,
            ..CustomerView::default()
        });

        let loaded = self.inner.load_catalog(ticket).await;
        if loaded.is_err() && self.inner.activation.is_current(ticket) {
            self.inner.retry_catalog(ticket);
        }
        loaded
    }

    fn deactivate(&self) {
        self.inner.activation.invalidate();
        self.inner.reset();
        self.inner.state.send_replace(CustomerView::default());
    }
}

impl Inner {
    fn current_user(&self) -> Result<User, ClientError> {
        self.state.borrow().user.clone().ok_or(ClientError::NotSignedIn)
    }

    fn on_tab(&self, tab: CustomerTab) -> bool {
        self.state.borrow().tab == tab
    }

    fn is_synced(&self) -> bool {
        self.state.borrow().phase == ViewPhase::Synced
    }

    fn is_loading(&self) -> bool {
        self.state.borrow().phase == ViewPhase::Loading
    }

    /// Stop polling and orphan every fetch still in flight.
    fn reset(&self) {
        self.poller.stop();
        self.requests_generation.invalidate();
        self.offers_generation.invalidate();
    }

    fn begin_action(&self) {
        self.state.send_modify(|view| {
            view.busy = true;
            view.error = None;
        });
    }

    fn end_action(&self) {
        self.state.send_modify(|view| view.busy = false);
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|view| {
            view.busy = false;
            view.error = Some(message);
        });
    }

    /// Fetch the catalog; on success go to `Synced`, load the lists and
    /// start polling.
    async fn load_catalog(self: &Arc<Self>, ticket: Ticket) -> Result<(), ClientError> {
        let services = match self.gateway.list_services().await {
            Ok(services) => services,
            Err(e) => {
                let message = e.user_message("Error loading services");
                self.state.send_if_modified(|view| {
                    if !self.activation.is_current(ticket) {
                        return false;
                    }
                    view.error = Some(message);
                    true
                });
                return Err(e.into());
            }
        };

        let applied = self.state.send_if_modified(|view| {
            if !self.activation.is_current(ticket) {
                return false;
            }
            view.services = services;
            view.phase = ViewPhase::Synced;
            view.error = None;
            true
        });
        if !applied {
            debug!("Activation superseded");
            return Ok(());
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Initial refresh failed");
        }
        if self.activation.is_current(ticket) {
            self.start_polling();
        }
        Ok(())
    }

    /// Keep re-fetching the catalog on the polling cadence until it loads.
    fn retry_catalog(self: &Arc<Self>, ticket: Ticket) {
        let weak = Arc::downgrade(self);
        let fetch_weak = Weak::clone(&weak);
        self.poller.resume(
            self.settings.interval,
            move || weak.upgrade().is_some_and(|inner| inner.is_loading()),
            move || {
                let inner = fetch_weak.upgrade();
                async move {
                    match inner {
                        Some(inner) => inner.load_catalog(ticket).await,
                        None => Ok(()),
                    }
                }
            },
        );
    }

    fn start_polling(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let fetch_weak = Weak::clone(&weak);
        self.poller.resume(
            self.settings.interval,
            move || {
                weak.upgrade()
                    .is_some_and(|inner| inner.on_tab(CustomerTab::Requests))
            },
            move || {
                let inner = fetch_weak.upgrade();
                async move {
                    match inner {
                        Some(inner) => inner.refresh().await,
                        None => Ok(()),
                    }
                }
            },
        );
    }

    async fn refresh(&self) -> Result<(), ClientError> {
        let user = self.current_user()?;
        let ticket = self.requests_generation.issue();
        let requests = self.gateway.list_requests_by_customer(user.id).await?;

        let ids: Vec<RequestId> = requests.iter().map(|r| r.id).collect();
        let applied = self.state.send_if_modified(|view| {
            if !self.requests_generation.is_current(ticket) {
                return false;
            }
            view.requests = requests;
            true
        });
        if !applied {
            debug!("Discarding stale request list");
            return Ok(());
        }

        self.refresh_offers(ids).await;
        Ok(())
    }

    /// Fetch the offers of every listed request with bounded concurrency
    /// and apply them in one update.
    async fn refresh_offers(&self, request_ids: Vec<RequestId>) {
        let ticket = self.offers_generation.issue();
        let results: Vec<(RequestId, Result<Vec<Offer>, GatewayError>)> =
            stream::iter(request_ids)
                .map(|id| {
                    let gateway = Arc::clone(&self.gateway);
                    async move { (id, gateway.list_offers_for_request(id).await) }
                })
                .buffer_unordered(self.settings.max_concurrent_fetches.max(1))
                .collect()
                .await;

        let applied = self.state.send_if_modified(|view| {
            if !self.offers_generation.is_current(ticket) {
                return false;
            }

            let mut merged = BTreeMap::new();
            for (id, result) in results {
                match result {
                    Ok(offers) => {
                        merged.insert(id, offers);
                    }
                    Err(e) => {
                        warn!(request_id = %id, error = %e, "Failed to load offers");
                        if let Some(previous) = view.offers_by_request.remove(&id) {
                            merged.insert(id, previous);
                        }
                    }
                }
            }
            view.total_offers = merged.values().map(Vec::len).sum();
            view.offers_by_request = merged;
            true
        });
        if !applied {
            debug!("Discarding stale offer aggregation");
        }
    }
}

impl std::fmt::Debug for CustomerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerController")
            .field("poller", &self.inner.poller)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use herool_core::{NewOffer, Price};

    use super::*;
    use crate::test_support::{Call, FakeGateway, Op, customer, technician};

    fn settings() -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(60),
            max_concurrent_fetches: 2,
        }
    }

    async fn signed_in(gateway: &Arc<FakeGateway>) -> CustomerController {
        let controller = CustomerController::new(gateway.clone(), settings());
        controller.activate(customer(1)).await.unwrap();
        controller
    }

    fn draft(description: &str) -> RequestDraft {
        RequestDraft {
            service_id: Some(ServiceId::new(1)),
            description: description.to_owned(),
            location: "Calle 10 #5-20".to_owned(),
            ..RequestDraft::default()
        }
    }

    #[tokio::test]
    async fn test_activation_loads_catalog_then_syncs() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;

        let view = controller.snapshot();
        assert_eq!(view.phase, ViewPhase::Synced);
        assert_eq!(view.services.len(), 3);
        assert_eq!(controller.service_name(ServiceId::new(1)), "Plomería");
        assert_eq!(controller.service_name(ServiceId::new(99)), "Unknown");
        assert_eq!(gateway.ops()[0], Op::ListServices);
    }

    #[tokio::test]
    async fn test_activation_rejects_technician() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = CustomerController::new(gateway.clone(), settings());

        let err = controller.activate(technician(3)).await.unwrap_err();
        assert!(matches!(err, ClientError::RoleMismatch { .. }));
        assert_eq!(controller.snapshot().phase, ViewPhase::Inactive);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_request_posts_once_and_refetches() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        let created = controller
            .create_request(draft("Fuga en el lavamanos"))
            .await
            .unwrap();

        let posts: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateRequest(body) => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].customer_id.as_i32(), 1);
        assert_eq!(posts[0].description, "Fuga en el lavamanos");

        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 1);
        let view = controller.snapshot();
        assert!(view.requests.iter().any(|r| r.id == created.id));
        assert!(!view.busy);
        assert_eq!(view.error, None);
    }

    #[tokio::test]
    async fn test_create_request_with_empty_description_never_calls_gateway() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        let err = controller.create_request(draft("   ")).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::MissingFields)
        ));
        assert!(gateway.calls().is_empty());
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("All fields are required")
        );
    }

    #[tokio::test]
    async fn test_create_request_surfaces_remote_message() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        let before = controller.snapshot().requests;
        gateway.fail_next(Op::CreateRequest, 400, "Datos incompletos");

        let err = controller.create_request(draft("Fuga")).await.unwrap_err();

        assert!(matches!(err, ClientError::Gateway(_)));
        let view = controller.snapshot();
        assert_eq!(view.error.as_deref(), Some("Datos incompletos"));
        assert_eq!(view.requests, before);
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn test_create_request_without_server_message_uses_fallback() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.fail_next(Op::CreateRequest, 500, "");

        controller.create_request(draft("Fuga")).await.unwrap_err();
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("Error creating request")
        );
    }

    #[tokio::test]
    async fn test_offers_are_aggregated_per_request() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let first = gateway.seed_request(customer(1).id, ServiceId::new(1), "Fuga");
        let second = gateway.seed_request(customer(1).id, ServiceId::new(2), "Enchufe");
        gateway.seed_request(customer(2).id, ServiceId::new(2), "Not mine");
        gateway.seed_offer(first, technician(3).id, 50);
        gateway.seed_offer(first, technician(4).id, 65);
        gateway.seed_offer(second, technician(3).id, 30);

        let controller = signed_in(&gateway).await;
        let view = controller.snapshot();

        assert_eq!(view.requests.len(), 2);
        assert_eq!(view.offers_by_request[&first].len(), 2);
        assert_eq!(view.offers_by_request[&second].len(), 1);
        assert_eq!(view.total_offers, 3);
    }

    #[tokio::test]
    async fn test_failed_offer_fetch_keeps_previous_offers() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let request = gateway.seed_request(customer(1).id, ServiceId::new(1), "Fuga");
        gateway.seed_offer(request, technician(3).id, 50);
        let controller = signed_in(&gateway).await;

        gateway.fail_next(Op::ListOffersForRequest, 503, "Servicio no disponible");
        controller.refresh().await.unwrap();

        let view = controller.snapshot();
        assert_eq!(view.offers_by_request[&request].len(), 1);
        assert_eq!(view.total_offers, 1);
        assert_eq!(view.error, None);
    }

    #[tokio::test]
    async fn test_technician_offer_appears_after_refresh() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let request = gateway.seed_request(customer(1).id, ServiceId::new(1), "Fuga");
        let controller = signed_in(&gateway).await;
        assert_eq!(controller.snapshot().total_offers, 0);

        gateway
            .create_offer(&NewOffer {
                request_id: request,
                technician_id: technician(3).id,
                price: Price::from_units(50),
                description: String::new(),
            })
            .await
            .unwrap();
        controller.refresh().await.unwrap();

        let view = controller.snapshot();
        let offers = &view.offers_by_request[&request];
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].price, Price::from_units(50));
    }

    #[tokio::test]
    async fn test_accept_offer_puts_once_and_refreshes_once() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let request = gateway.seed_request(customer(1).id, ServiceId::new(1), "Fuga");
        let offer = gateway.seed_offer(request, technician(3).id, 50);
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        controller.accept_offer(offer).await.unwrap();

        assert_eq!(gateway.count(Op::AcceptOffer), 1);
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 1);
        let view = controller.snapshot();
        assert!(view.offers_by_request[&request][0].is_accepted());
    }

    #[tokio::test]
    async fn test_accept_offer_failure_sets_message() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        let err = controller.accept_offer(OfferId::new(404)).await.unwrap_err();

        assert!(matches!(err, ClientError::Gateway(_)));
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 0);
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("Oferta no encontrada")
        );
    }

    #[tokio::test]
    async fn test_stale_request_list_is_discarded() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        gateway.seed_request(customer(1).id, ServiceId::new(1), "Old");
        let controller = signed_in(&gateway).await;

        // The slow fetch snapshots one request; the fast one sees two.
        gateway.delay_next(Op::ListRequestsByCustomer, Duration::from_millis(200));
        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        gateway.seed_request(customer(1).id, ServiceId::new(2), "New");
        controller.refresh().await.unwrap();
        assert_eq!(controller.snapshot().requests.len(), 2);

        slow.await.unwrap().unwrap();
        assert_eq!(controller.snapshot().requests.len(), 2);
    }

    #[tokio::test]
    async fn test_tab_switch_to_requests_refreshes() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        controller.select_tab(CustomerTab::Profile).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 0);

        controller.select_tab(CustomerTab::Requests).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 1);
        assert_eq!(controller.snapshot().tab, CustomerTab::Requests);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_only_on_requests_tab() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        let controller = signed_in(&gateway).await;
        gateway.clear_calls();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 0);

        controller.select_tab(CustomerTab::Requests).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_failure_is_retried_on_schedule() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        gateway.fail_next(Op::ListServices, 503, "Servicio no disponible");
        let controller = CustomerController::new(gateway.clone(), settings());
        controller.select_tab(CustomerTab::Requests).await;

        let err = controller.activate(customer(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Gateway(_)));
        let view = controller.snapshot();
        assert_eq!(view.phase, ViewPhase::Loading);
        assert_eq!(view.error.as_deref(), Some("Servicio no disponible"));
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 0);

        tokio::time::sleep(Duration::from_secs(61)).await;
        let view = controller.snapshot();
        assert_eq!(view.phase, ViewPhase::Synced);
        assert_eq!(view.services.len(), 3);
        assert_eq!(view.error, None);
        assert_eq!(gateway.count(Op::ListServices), 2);
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 1);

        // Once synced the schedule refreshes the list, not the catalog.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.count(Op::ListServices), 2);
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_retry_stops_on_deactivate() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        gateway.fail_next(Op::ListServices, 503, "Servicio no disponible");
        let controller = CustomerController::new(gateway.clone(), settings());
        controller.activate(customer(1)).await.unwrap_err();

        controller.deactivate();
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert_eq!(gateway.count(Op::ListServices), 1);
        assert_eq!(controller.snapshot().phase, ViewPhase::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_switch_during_slow_poll_keeps_fresh_list() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        gateway.seed_request(customer(1).id, ServiceId::new(1), "Old");
        let controller = signed_in(&gateway).await;
        controller.select_tab(CustomerTab::Requests).await;
        gateway.clear_calls();

        // The tick at 60s sees one request and answers 30s later.
        gateway.delay_next(Op::ListRequestsByCustomer, Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 1);

        gateway.seed_request(customer(1).id, ServiceId::new(2), "New");
        controller.select_tab(CustomerTab::Home).await;
        controller.select_tab(CustomerTab::Requests).await;
        assert_eq!(controller.snapshot().requests.len(), 2);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(controller.snapshot().requests.len(), 2);

        // The cadence is untouched by the manual refresh.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(gateway.count(Op::ListRequestsByCustomer), 3);
    }

    #[tokio::test]
    async fn test_deactivate_discards_state() {
        let gateway = Arc::new(FakeGateway::with_catalog());
        gateway.seed_request(customer(1).id, ServiceId::new(1), "Fuga");
        let controller = signed_in(&gateway).await;
        assert_eq!(controller.snapshot().requests.len(), 1);

        controller.deactivate();

        let view = controller.snapshot();
        assert_eq!(view.phase, ViewPhase::Inactive);
        assert!(view.requests.is_empty());
        assert!(view.user.is_none());
        assert!(matches!(
            controller.refresh().await.unwrap_err(),
            ClientError::NotSignedIn
        ));
    }
}
