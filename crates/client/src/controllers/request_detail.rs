//! Single-request view with its offers.

use std::sync::Arc;

use async_trait::async_trait;
use herool_core::{Offer, OfferId, Request, RequestId, User};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{SessionBound, ViewPhase};
use crate::config::PollSettings;
use crate::error::ClientError;
use crate::gateway::Gateway;
use crate::generation::Generation;
use crate::poller::Poller;

#[derive(Debug, Clone, Default)]
pub struct RequestDetailView {
    pub phase: ViewPhase,
    pub user: Option<User>,
    pub request: Option<Request>,
    pub offers: Vec<Offer>,
    /// Offer accepted from this view, once the remote confirmed it.
    pub accepted_offer: Option<OfferId>,
    pub busy: bool,
    pub error: Option<String>,
}

/// Loads one request, then keeps its offers current while open.
#[derive(Clone)]
pub struct RequestDetailController {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn Gateway>,
    settings: PollSettings,
    state: watch::Sender<RequestDetailView>,
    poller: Poller,
    request_generation: Generation,
    offers_generation: Generation,
}

impl RequestDetailController {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, settings: PollSettings) -> Self {
        let (state, _) = watch::channel(RequestDetailView::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                settings,
                state,
                poller: Poller::new("request-offers"),
                request_generation: Generation::new(),
                offers_generation: Generation::new(),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RequestDetailView> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> RequestDetailView {
        self.inner.state.borrow().clone()
    }

    /// Show `request_id`: load the request, then its offers, then poll the
    /// offers.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotSignedIn`] before activation, or the
    /// failure loading the request. A failure loading the offers is shown
    /// in the view but does not fail the call; polling retries it.
    #[instrument(skip(self))]
    pub async fn open(&self, request_id: RequestId) -> Result<(), ClientError> {
        let user = self
            .inner
            .state
            .borrow()
            .user
            .clone()
            .ok_or(ClientError::NotSignedIn)?;

        self.inner.reset();
        let ticket = self.inner.request_generation.issue();
        self.inner.state.send_replace(RequestDetailView {
            phase: ViewPhase::Loading,
            user: Some(user),
            ..RequestDetailView::default()
        });

        match self.inner.gateway.get_request(request_id).await {
            Ok(request) => {
                let applied = self.inner.state.send_if_modified(|view| {
                    if !self.inner.request_generation.is_current(ticket) {
                        return false;
                    }
                    view.request = Some(request);
                    view.phase = ViewPhase::Synced;
                    true
                });
                if !applied {
                    debug!("Discarding stale request");
                    return Ok(());
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load request");
                self.inner.state.send_if_modified(|view| {
                    if !self.inner.request_generation.is_current(ticket) {
                        return false;
                    }
                    view.phase = ViewPhase::Inactive;
                    view.error = Some("Error loading request".to_owned());
                    true
                });
                return Err(e.into());
            }
        }

        if let Err(e) = self.inner.refresh_offers().await {
            warn!(error = %e, "Failed to load offers");
            self.inner.state.send_if_modified(|view| {
                if !self.inner.request_generation.is_current(ticket) {
                    return false;
                }
                view.error = Some("Error loading offers".to_owned());
                true
            });
        }

        if self.inner.request_generation.is_current(ticket) {
            self.start_polling();
        }
        Ok(())
    }

    /// Stop polling and forget the request.
    pub fn close(&self) {
        self.inner.reset();
        self.inner.request_generation.invalidate();
        self.inner.state.send_modify(|view| {
            let user = view.user.take();
            *view = RequestDetailView {
                user,
                ..RequestDetailView::default()
            };
        });
    }

    /// Re-fetch the offers of the open request. Does nothing when no
    /// request is open.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.inner.refresh_offers().await
    }

    /// Accept an offer on the open request, then refresh once.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure; its message is stored in the view.
    #[instrument(skip(self))]
    pub async fn accept_offer(&self, offer_id: OfferId) -> Result<(), ClientError> {
        self.inner.begin_action();
        match self.inner.gateway.accept_offer(offer_id).await {
            Ok(()) => {
                info!(%offer_id, "Offer accepted");
                self.inner.state.send_modify(|view| {
                    view.busy = false;
                    view.accepted_offer = Some(offer_id);
                });
                self.inner.refresh_all().await;
                Ok(())
            }
            Err(e) => {
                self.inner.fail(e.user_message("Error accepting offer"));
                Err(e.into())
            }
        }
    }

    /// Reject an offer on the open request, then refresh its offers.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure; its message is stored in the view.
    #[instrument(skip(self))]
    pub async fn reject_offer(&self, offer_id: OfferId) -> Result<(), ClientError> {
        self.inner.begin_action();
        match self.inner.gateway.reject_offer(offer_id).await {
            Ok(()) => {
                info!(%offer_id, "Offer rejected");
                self.inner.state.send_modify(|view| view.busy = false);
                if let Err(e) = self.inner.refresh_offers().await {
                    warn!(error = %e, "Refresh after reject failed");
                }
                Ok(())
            }
            Err(e) => {
                self.inner.fail(e.user_message("Error rejecting offer"));
                Err(e.into())
            }
        }
    }

    fn start_polling(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.poller.resume(
            self.inner.settings.interval,
            || true,
            move || {
                let inner = weak.upgrade();
                async move {
                    match inner {
                        Some(inner) => inner.refresh_offers().await,
                        None => Ok(()),
                    }
                }
            },
        );
    }
}

#[async_trait]
impl SessionBound for RequestDetailController {
    async fn activate(&self, user: User) -> Result<(), ClientError> {
        let same_user = self
            .inner
            .state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|current| current.id == user.id);
        if !same_user {
            self.deactivate();
        }
        self.inner.state.send_modify(|view| view.user = Some(user));
        Ok(())
    }

    fn deactivate(&self) {
        self.inner.reset();
        self.inner.request_generation.invalidate();
        self.inner.state.send_replace(RequestDetailView::default());
    }
}

impl Inner {
    fn reset(&self) {
        self.poller.stop();
        self.offers_generation.invalidate();
    }

    fn open_request_id(&self) -> Option<RequestId> {
        self.state.borrow().request.as_ref().map(|r| r.id)
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

    async fn refresh_offers(&self) -> Result<(), ClientError> {
        let Some(request_id) = self.open_request_id() else {
            return Ok(());
        };
        let ticket = self.offers_generation.issue();
        let offers = self.gateway.list_offers_for_request(request_id).await?;

        let applied = self.state.send_if_modified(|view| {
            let still_open = view.request.as_ref().is_some_and(|r| r.id == request_id);
            if !still_open || !self.offers_generation.is_current(ticket) {
                return false;
            }
            view.offers = offers;
            true
        });
        if !applied {
            debug!(%request_id, "Discarding stale offers");
        }
        Ok(())
    }

    /// Re-fetch the request (its status changes on accept) and its offers.
    async fn refresh_all(&self) {
        let Some(request_id) = self.open_request_id() else {
            return;
        };
        let ticket = self.request_generation.issue();
        match self.gateway.get_request(request_id).await {
            Ok(request) => {
                self.state.send_if_modified(|view| {
                    if !self.request_generation.is_current(ticket) {
                        return false;
                    }
                    view.request = Some(request);
                    true
                });
            }
            Err(e) => warn!(error = %e, "Failed to reload request"),
        }
        if let Err(e) = self.refresh_offers().await {
            warn!(error = %e, "Failed to reload offers");
        }
    }
}

impl std::fmt::Debug for RequestDetailController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDetailController")
            .field("poller", &self.inner.poller)
            .finish_non_exhaustive()
    }
}
