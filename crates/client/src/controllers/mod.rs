//! View controllers.
//!
//! Each controller owns one slice of view state, published through a
//! `watch` channel, and keeps it current by composing the session, the
//! gateway and one or more pollers.
//!
//! ```text
//! Inactive --session user--> Loading --catalog fetched--> Synced
//!    ^                                                      |
//!    +---------------------- sign-out ----------------------+
//! ```

pub mod customer;
pub mod request_detail;
pub mod technician;

pub use customer::{CustomerController, CustomerTab, CustomerView, RequestDraft};
pub use request_detail::{RequestDetailController, RequestDetailView};
pub use technician::{OfferDraft, TechnicianController, TechnicianTab, TechnicianView};

use async_trait::async_trait;
use herool_core::User;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::SessionStore;

/// Lifecycle phase shared by every controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    /// No user, or torn down. Nothing cached.
    #[default]
    Inactive,
    /// Reference data is being fetched.
    Loading,
    /// Reference data present; lists refresh on schedule.
    Synced,
}

/// A controller that follows the signed-in user.
#[async_trait]
pub trait SessionBound: Send + Sync + 'static {
    /// A user signed in (or the session was restored).
    async fn activate(&self, user: User) -> Result<(), ClientError>;

    /// The session was cleared. Stops polling and discards cached state.
    fn deactivate(&self);
}

/// Drive `controller` from `session` until the session store is dropped.
///
/// The current session is delivered first, so a restored user activates
/// the controller straight away.
pub fn bind_session<C>(controller: C, session: &SessionStore) -> JoinHandle<()>
where
    C: SessionBound,
{
    let mut receiver = session.subscribe();
    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let user = receiver.borrow_and_update().clone();
            match user {
                Some(user) => match controller.activate(user).await {
                    Ok(()) => {}
                    Err(e @ ClientError::RoleMismatch { .. }) => {
                        debug!(error = %e, "Controller not applicable to this user");
                    }
                    Err(e) => warn!(error = %e, "Controller activation failed"),
                },
                None => controller.deactivate(),
            }
        }
    })
}
