//! The consumer registry: every registered machine's dispatch-facing half.
//!
//! The registry is the only shared mutable state in the core. Setup code
//! appends to it through registration while the multiplexer scans it for
//! fan-out, so both sides go through one mutex with bounded-wait acquisition.
//! Entries are never removed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::{Mutex, MutexGuard};

use crate::descriptor::{EventNameFn, FilterFn};
use crate::event::Event;
use crate::fault::Fault;

/// The dispatch-facing half of one registered machine. The executor task
/// owns the other half (state table, transition function, mailbox receiver).
pub(crate) struct Consumer {
    pub(crate) name: Arc<str>,
    pub(crate) filter: FilterFn,
    pub(crate) event_name: Option<EventNameFn>,
    pub(crate) mailbox: mpsc::Sender<Event>,
}

impl Consumer {
    /// Debug-only event label for dispatch logs.
    pub(crate) fn event_label(&self, event: Event) -> Option<&'static str> {
        self.event_name.as_ref().and_then(|f| f(event))
    }
}

pub(crate) struct Registry {
    consumers: Mutex<Vec<Consumer>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Registry {
            consumers: Mutex::new(Vec::new()),
        }
    }

    /// Acquires the registry lock, waiting at most `wait`. Expiry is an
    /// unrecoverable fault: the lock is only ever held for a registration
    /// append or one event's fan-out, so contention beyond the bound means a
    /// stalled consumer is blocking the multiplexer mid-scan.
    pub(crate) async fn lock_timed(
        &self,
        wait: Duration,
    ) -> Result<MutexGuard<'_, Vec<Consumer>>, Fault> {
        tokio::time::timeout(wait, self.consumers.lock())
            .await
            .map_err(|_| Fault::RegistryLockTimeout)
    }
}
