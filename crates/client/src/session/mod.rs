//! Who is signed in.
//!
//! [`SessionStore`] is an explicitly owned, cloneable handle. It persists
//! the current [`User`] to a [`KeyValueStore`] under a single key and
//! broadcasts every change through a `watch` channel, so a new subscriber
//! always sees the latest value first.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;

use herool_core::User;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Key the serialized user is stored under.
pub const SESSION_KEY: &str = "usuario";

/// Errors raised while persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Current-user holder with replay-latest change notification.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Box<dyn KeyValueStore>,
    current: watch::Sender<Option<User>>,
}

impl SessionStore {
    /// Restore the session persisted in `store`.
    ///
    /// A value that no longer parses is discarded and the session starts
    /// signed out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the store cannot be read.
    pub fn load(store: impl KeyValueStore) -> Result<Self, SessionError> {
        let restored = match store.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    debug!(user_id = %user.id, "Restored session");
                    Some(user)
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session");
                    None
                }
            },
            None => None,
        };

        let (current, _) = watch::channel(restored);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                current,
            }),
        })
    }

    /// A session backed by a [`MemoryStore`], starting signed out.
    #[must_use]
    pub fn in_memory() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(MemoryStore::new()),
                current,
            }),
        }
    }

    /// Snapshot of the signed-in user.
    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.inner.current.borrow().clone()
    }

    /// Subscribe to session changes.
    ///
    /// The receiver is marked changed, so the first `changed().await`
    /// resolves at once with the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        let mut receiver = self.inner.current.subscribe();
        receiver.mark_changed();
        receiver
    }

    /// Persist `user` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be serialized or written; the
    /// in-memory value is left unchanged in that case.
    pub fn set(&self, user: User) -> Result<(), SessionError> {
        let raw = serde_json::to_string(&user)?;
        self.inner.store.set(SESSION_KEY, &raw)?;
        self.inner.current.send_replace(Some(user));
        Ok(())
    }

    /// Remove the persisted user and notify subscribers with `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted value cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.inner.store.remove(SESSION_KEY)?;
        self.inner.current.send_replace(None);
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("signed_in", &self.inner.current.borrow().is_some())
            .finish_non_exhaustive()
    }
}
