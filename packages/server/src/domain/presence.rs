//! Instance-local presence tracking
//!
//! `LocalConnectionTracker` counts the connections this process has added to
//! the global counter and not yet removed. The count and a "drained" flag
//! share one atomic word so that shutdown reconciliation can take the count
//! and refuse further changes in a single step.

use std::sync::atomic::{AtomicU64, Ordering};

use super::value_object::ConnectionId;

const DRAINED: u64 = 1 << 63;
const COUNT_MASK: u64 = !DRAINED;

#[derive(Debug, Default)]
pub struct LocalConnectionTracker {
    state: AtomicU64,
}

impl LocalConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track one more connection. `false` once the tracker has been drained.
    pub fn register(&self) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (state & DRAINED == 0).then_some(state + 1)
            })
            .is_ok()
    }

    /// Stop tracking one connection.
    ///
    /// `false` when the tracker has been drained (the connection was already
    /// compensated by reconciliation) or nothing is tracked.
    pub fn release(&self) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (state & DRAINED == 0 && state > 0).then(|| state - 1)
            })
            .is_ok()
    }

    /// Take the current count and refuse every later `register`/`release`.
    ///
    /// Returns 0 on every call after the first.
    pub fn drain(&self) -> u64 {
        let previous = self.state.swap(DRAINED, Ordering::SeqCst);
        if previous & DRAINED != 0 {
            0
        } else {
            previous & COUNT_MASK
        }
    }

    pub fn current(&self) -> u64 {
        let state = self.state.load(Ordering::SeqCst);
        if state & DRAINED != 0 {
            0
        } else {
            state & COUNT_MASK
        }
    }

    pub fn is_drained(&self) -> bool {
        self.state.load(Ordering::SeqCst) & DRAINED != 0
    }
}

/// Proof that a connection went through the connect sequence
///
/// Produced by the connect use case and consumed by the disconnect use case,
/// so a connection's disconnect can only run after its connect completed.
#[derive(Debug, PartialEq, Eq)]
pub struct PresenceTicket {
    connection_id: ConnectionId,
    counted: bool,
}

impl PresenceTicket {
    pub(crate) fn new(connection_id: ConnectionId, counted: bool) -> Self {
        Self {
            connection_id,
            counted,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Whether the global counter was incremented for this connection
    pub fn is_counted(&self) -> bool {
        self.counted
    }
}
