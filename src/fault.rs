//! Unrecoverable faults and the halt latch.
//!
//! The core has exactly one failure path: every contract violation is a
//! programmer error with no safe degraded mode, so nothing here is retried or
//! propagated back to a caller for recovery. Instead the first fault is
//! recorded in a latch, logged at error level, and the core's tasks park
//! forever: the async equivalent of the original hardware design's
//! watchdog-visible halt loop, but observable from a test harness via
//! [`Core::fault`](crate::Core::fault) without hanging the process.

use tokio::sync::watch;
use tracing::error;

/// An unrecoverable fault. Raising any of these halts the core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// A descriptor failed registration-time validation.
    #[error("invalid descriptor for `{name}`: {reason}")]
    InvalidDescriptor {
        /// Display name of the rejected machine.
        name: String,
        /// Which validation check failed.
        reason: &'static str,
    },

    /// The global event mailbox was full when a producer posted.
    #[error("global event mailbox full; producer outpaced the multiplexer")]
    IngressOverflow,

    /// A consumer mailbox did not accept an event within the send timeout.
    /// The design assumes consumers always drain faster than the global
    /// dispatch rate; sustained overflow means a stalled consumer.
    #[error("mailbox for `{name}` did not accept an event within the send timeout")]
    MailboxOverflow {
        /// Display name of the stalled machine.
        name: String,
    },

    /// The registry lock was not acquired within the lock timeout.
    #[error("consumer registry lock not acquired within the lock timeout")]
    RegistryLockTimeout,

    /// A receive failed on a channel that must stay open for the process
    /// lifetime.
    #[error("event channel closed while the core was running")]
    ChannelClosed,

    /// A machine's current state fell outside its state table.
    #[error("state {state} out of bounds for `{name}` ({total} states)")]
    StateOutOfBounds {
        /// Display name of the machine.
        name: String,
        /// The out-of-range state code.
        state: u32,
        /// Number of rows in the machine's table.
        total: u32,
    },
}

/// Records the first fault and lets every core task observe it.
pub(crate) struct FaultLatch {
    slot: watch::Sender<Option<Fault>>,
}

impl FaultLatch {
    pub(crate) fn new() -> Self {
        let (slot, _) = watch::channel(None);
        FaultLatch { slot }
    }

    /// Records the fault (first one wins) and logs it. Does not block, so it
    /// is safe from synchronous entry points like `post_event`.
    pub(crate) fn trip(&self, fault: Fault) {
        error!(%fault, "unrecoverable fault; halting core");
        self.slot.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(fault);
                true
            } else {
                false
            }
        });
    }

    /// Records the fault, then parks the calling task forever.
    pub(crate) async fn raise(&self, fault: Fault) {
        self.trip(fault);
        self.park().await;
    }

    /// Never completes. Tasks park here once the core has halted.
    pub(crate) async fn park(&self) {
        std::future::pending::<()>().await;
    }

    /// Resolves once any fault has been recorded.
    pub(crate) async fn tripped(&self) {
        let mut rx = self.slot.subscribe();
        loop {
            if rx.borrow_and_update().is_some() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// The recorded fault, if the core has halted.
    pub(crate) fn current(&self) -> Option<Fault> {
        self.slot.borrow().clone()
    }
}
