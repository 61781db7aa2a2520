//! Latest-response-wins guard.
//!
//! Every fetch of a cached resource takes a [`Ticket`] before it starts.
//! When the response arrives it is applied only if its ticket is still the
//! newest one issued; an older, slower response is dropped instead of
//! overwriting fresher data.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter for one cached resource.
#[derive(Debug, Default)]
pub struct Generation {
    latest: AtomicU64,
}

/// Proof that a fetch was issued at a particular generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Generation {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Start a new fetch, superseding every earlier ticket.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is still the newest issued.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede every outstanding ticket without starting a fetch.
    ///
    /// Used on teardown so responses still in flight are discarded.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
