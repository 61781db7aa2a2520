//! Technician view: open requests to bid on and the technician's own offers.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use herool_core::{
    NewOffer, Offer, Price, Request, RequestId, ServiceCatalogEntry, ServiceId, User, UserRole,
    service_name,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{SessionBound, ViewPhase};
use crate::config::PollSettings;
use crate::error::{ClientError, ValidationError};
use crate::gateway::Gateway;
use crate::generation::{Generation, Ticket};
use crate::poller::Poller;

const UNKNOWN_SERVICE: &str = "Unknown";
const UNKNOWN_SERVICE_LABEL: &str = "Unknown service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TechnicianTab {
    #[default]
    Requests,
    Offers,
    Profile,
}

/// Everything the technician screens render.
#[derive(Debug, Clone, Default)]
pub struct TechnicianView {
    pub phase: ViewPhase,
    pub user: Option<User>,
    pub tab: TechnicianTab,
    pub services: Vec<ServiceCatalogEntry>,
    /// Open requests across all services, with `service_name` filled in.
    pub open_requests: Vec<Request>,
    /// Offers this technician has made.
    pub offers: Vec<Offer>,
    /// Request the offer form is open for.
    pub selected: Option<Request>,
    pub busy: bool,
    pub error: Option<String>,
}

/// Offer form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferDraft {
    pub price: Option<Price>,
    pub description: String,
}

/// Keeps the open-request list and the technician's offers current.
#[derive(Clone)]
pub struct TechnicianController {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn Gateway>,
    settings: PollSettings,
    state: watch::Sender<TechnicianView>,
    requests_poller: Poller,
    offers_poller: Poller,
    activation: Generation,
    requests_generation: Generation,
    offers_generation: Generation,
}

impl TechnicianController {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, settings: PollSettings) -> Self {
        let (state, _) = watch::channel(TechnicianView::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                settings,
                state,
                requests_poller: Poller::new("technician-open-requests"),
                offers_poller: Poller::new("technician-offers"),
                activation: Generation::new(),
                requests_generation: Generation::new(),
                offers_generation: Generation::new(),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TechnicianView> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> TechnicianView {
        self.inner.state.borrow().clone()
    }

    /// Switch tabs, refreshing the list the new tab shows.
    pub async fn select_tab(&self, tab: TechnicianTab) {
        self.inner.state.send_if_modified(|view| {
            let changed = view.tab != tab;
            view.tab = tab;
            changed
        });
        if !self.inner.is_synced() {
            return;
        }

        let result = match tab {
            TechnicianTab::Requests => self.inner.refresh_open_requests().await,
            TechnicianTab::Offers => self.inner.refresh_offers().await,
            TechnicianTab::Profile => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Refresh on tab switch failed");
        }
    }

    /// Refresh both lists.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the other list is still attempted.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.inner.refresh_all().await
    }

    /// Open the offer form for one of the listed requests.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownRequest`] if the id is not in the
    /// open-request list.
    pub fn select_request(&self, request_id: RequestId) -> Result<(), ClientError> {
        let mut outcome = Ok(());
        self.inner.state.send_modify(|view| {
            match view.open_requests.iter().find(|r| r.id == request_id) {
                Some(request) => {
                    view.selected = Some(request.clone());
                    view.error = None;
                }
                None => outcome = Err(ValidationError::UnknownRequest(request_id)),
            }
        });
        outcome.map_err(ClientError::from)
    }

    /// Close the offer form without submitting.
    pub fn cancel_offer(&self) {
        self.inner.state.send_modify(|view| {
            view.selected = None;
            view.error = None;
        });
    }

    /// Submit an offer on the selected request, then refresh both lists.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the remote when no
    /// request is selected, the price is missing or not positive, or this
    /// technician already has an offer on the request. Gateway failures
    /// are returned as-is. The message is stored in the view either way.
    #[instrument(skip(self, draft))]
    pub async fn submit_offer(&self, draft: OfferDraft) -> Result<Offer, ClientError> {
        let user = self.inner.current_user()?;
        let new_offer = match self.inner.validate_offer(&user, draft) {
            Ok(new_offer) => new_offer,
            Err(e) => {
                self.inner.fail(e.to_string());
                return Err(e.into());
            }
        };

        self.inner.begin_action();
        match self.inner.gateway.create_offer(&new_offer).await {
            Ok(offer) => {
                info!(offer_id = %offer.id, request_id = %offer.request_id, "Offer submitted");
                self.inner.state.send_modify(|view| {
                    view.busy = false;
                    view.selected = None;
                });
                if let Err(e) = self.inner.refresh_all().await {
                    warn!(error = %e, "Refresh after offer failed");
                }
                Ok(offer)
            }
            Err(e) => {
                self.inner.fail(e.user_message("Error creating offer"));
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
impl SessionBound for TechnicianController {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn activate(&self, user: User) -> Result<(), ClientError> {
        if !user.is_technician() {
            self.deactivate();
            return Err(ClientError::RoleMismatch {
                expected: UserRole::Technician,
                actual: user.role,
            });
        }

        self.inner.reset();
        let ticket = self.inner.activation.issue();
        let tab = self.inner.state.borrow().tab;
        self.inner.state.send_replace(TechnicianView {
            phase: ViewPhase::Loading,
            user: Some(user),
            tab,
            ..TechnicianView::default()
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
        self.inner.state.send_replace(TechnicianView::default());
    }
}

impl Inner {
    fn current_user(&self) -> Result<User, ClientError> {
        self.state.borrow().user.clone().ok_or(ClientError::NotSignedIn)
    }

    fn on_tab(&self, tab: TechnicianTab) -> bool {
        self.state.borrow().tab == tab
    }

    fn is_synced(&self) -> bool {
        self.state.borrow().phase == ViewPhase::Synced
    }

    fn is_loading(&self) -> bool {
        self.state.borrow().phase == ViewPhase::Loading
    }

    fn reset(&self) {
        self.requests_poller.stop();
        self.offers_poller.stop();
        self.requests_generation.invalidate();
        self.offers_generation.invalidate();
    }

    fn begin_action(&self) {
        self.state.send_modify(|view| {
            view.busy = true;
            view.error = None;
        });
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|view| {
            view.busy = false;
            view.error = Some(message);
        });
    }

    fn validate_offer(&self, user: &User, draft: OfferDraft) -> Result<NewOffer, ValidationError> {
        let view = self.state.borrow();
        let Some(request) = view.selected.as_ref() else {
            return Err(ValidationError::MissingFields);
        };
        let Some(price) = draft.price.filter(Price::is_positive) else {
            return Err(ValidationError::MissingFields);
        };
        if view
            .offers
            .iter()
            .any(|offer| offer.request_id == request.id && offer.technician_id == user.id)
        {
            return Err(ValidationError::DuplicateOffer(request.id));
        }

        Ok(NewOffer {
            request_id: request.id,
            technician_id: user.id,
            price,
            description: draft.description.trim().to_owned(),
        })
    }

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

        if let Err(e) = self.refresh_all().await {
            warn!(error = %e, "Initial refresh failed");
        }
        if self.activation.is_current(ticket) {
            self.start_polling();
        }
        Ok(())
    }

    /// Re-fetch the catalog on the open-request schedule until it loads.
    fn retry_catalog(self: &Arc<Self>, ticket: Ticket) {
        let weak = Arc::downgrade(self);
        let fetch_weak = Weak::clone(&weak);
        self.requests_poller.resume(
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
        let interval = self.settings.interval;

        let weak = Arc::downgrade(self);
        let fetch_weak = Weak::clone(&weak);
        self.requests_poller.resume(
            interval,
            move || {
                weak.upgrade()
                    .is_some_and(|inner| inner.on_tab(TechnicianTab::Requests))
            },
            move || {
                let inner = fetch_weak.upgrade();
                async move {
                    match inner {
                        Some(inner) => inner.refresh_open_requests().await,
                        None => Ok(()),
                    }
                }
            },
        );

        let weak = Arc::downgrade(self);
        let fetch_weak = Weak::clone(&weak);
        self.offers_poller.resume(
            interval,
            move || {
                weak.upgrade()
                    .is_some_and(|inner| inner.on_tab(TechnicianTab::Offers))
            },
            move || {
                let inner = fetch_weak.upgrade();
                async move {
                    match inner {
                        Some(inner) => inner.refresh_offers().await,
                        None => Ok(()),
                    }
                }
            },
        );
    }

    /// Both lists; the first failure is returned after both are attempted.
    async fn refresh_all(&self) -> Result<(), ClientError> {
        let requests = self.refresh_open_requests().await;
        let offers = self.refresh_offers().await;
        requests.and(offers)
    }

    async fn refresh_open_requests(&self) -> Result<(), ClientError> {
        self.current_user()?;
        let ticket = self.requests_generation.issue();
        let mut requests = self.gateway.list_open_requests().await?;

        let applied = self.state.send_if_modified(|view| {
            if !self.requests_generation.is_current(ticket) {
                return false;
            }
            for request in &mut requests {
                request.service_name = Some(
                    service_name(&view.services, request.service_id)
                        .unwrap_or(UNKNOWN_SERVICE_LABEL)
                        .to_owned(),
                );
            }
            view.open_requests = requests;
            true
        });
        if !applied {
            debug!("Discarding stale open-request list");
        }
        Ok(())
    }

    async fn refresh_offers(&self) -> Result<(), ClientError> {
        let user = self.current_user()?;
        let ticket = self.offers_generation.issue();
        let offers = self.gateway.list_offers_for_technician(user.id).await?;

        let applied = self.state.send_if_modified(|view| {
            if !self.offers_generation.is_current(ticket) {
                return false;
            }
            view.offers = offers;
            true
        });
        if !applied {
            debug!("Discarding stale offer list");
        }
        Ok(())
    }
}

impl std::fmt::Debug for TechnicianController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechnicianController")
            .field("requests_poller", &self.inner.requests_poller)
            .field("offers_poller", &self.inner.offers_poller)
            .finish_non_exhaustive()
    }
}
