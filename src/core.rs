//! The composition root: owns the global mailbox, registry, and halt latch,
//! and spawns the multiplexer and executor tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

use crate::descriptor::Descriptor;
use crate::event::Event;
use crate::executor::Executor;
use crate::fault::{Fault, FaultLatch};
use crate::mux;
use crate::registry::{Consumer, Registry};

/// Tuning knobs for one [`Core`]. The defaults mirror the original embedded
/// deployment: depth-16 queues and 2.5 s bounded waits.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Capacity of the global inbound mailbox drained by the multiplexer.
    pub ingress_capacity: usize,
    /// Default capacity of each machine's private mailbox. A descriptor can
    /// override its own via
    /// [`mailbox_capacity`](crate::DescriptorBuilder::mailbox_capacity).
    pub mailbox_capacity: usize,
    /// How long the multiplexer waits on a full consumer mailbox before
    /// declaring the consumer stalled ([`Fault::MailboxOverflow`]).
    pub send_timeout: Duration,
    /// Bounded wait for the registry lock.
    pub lock_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            ingress_capacity: 16,
            mailbox_capacity: 16,
            send_timeout: Duration::from_millis(2500),
            lock_timeout: Duration::from_millis(2500),
        }
    }
}

pub(crate) struct Shared {
    pub(crate) config: CoreConfig,
    pub(crate) registry: Registry,
    pub(crate) halt: Arc<FaultLatch>,
}

/// Handle to one running dispatch core.
///
/// Creating a `Core` spawns the event multiplexer; registering a machine
/// spawns its executor. The handle is cheap to clone and every clone posts
/// into the same global mailbox. Tasks run until the process exits or the
/// core [faults](Core::fault).
#[derive(Clone)]
pub struct Core {
    shared: Arc<Shared>,
    ingress: mpsc::Sender<Event>,
}

impl Core {
    /// Creates a core and spawns its multiplexer task. Must be called from
    /// within a Tokio runtime.
    pub fn new(config: CoreConfig) -> Self {
        let (ingress, ingress_rx) = mpsc::channel(config.ingress_capacity);
        let shared = Arc::new(Shared {
            config,
            registry: Registry::new(),
            halt: Arc::new(FaultLatch::new()),
        });
        tokio::spawn(mux::run(Arc::clone(&shared), ingress_rx));
        Core { shared, ingress }
    }

    /// Validates the descriptor, registers it with the multiplexer, and
    /// spawns its executor task.
    ///
    /// An invalid descriptor is rejected before any task is spawned; the
    /// fault is both returned and latched, since a misconfigured machine has
    /// no safe degraded mode.
    pub async fn register(&self, descriptor: Descriptor) -> Result<(), Fault> {
        let parts = descriptor.into_validated().inspect_err(|fault| {
            self.shared.halt.trip(fault.clone());
        })?;

        let name: Arc<str> = Arc::from(parts.name.as_str());
        let capacity = parts
            .mailbox_capacity
            .unwrap_or(self.shared.config.mailbox_capacity);
        let (mailbox_tx, mailbox_rx) = mpsc::channel(capacity);

        {
            let mut consumers = self
                .shared
                .registry
                .lock_timed(self.shared.config.lock_timeout)
                .await
                .inspect_err(|fault| self.shared.halt.trip(fault.clone()))?;
            consumers.push(Consumer {
                name: Arc::clone(&name),
                filter: Arc::clone(&parts.filter),
                event_name: parts.event_name.clone(),
                mailbox: mailbox_tx,
            });
        }

        info!(
            machine = %name,
            states = parts.table.len(),
            capacity,
            "registered state machine"
        );

        let executor = Executor::new(
            Arc::clone(&name),
            parts,
            mailbox_rx,
            Arc::clone(&self.shared.halt),
        );
        tokio::spawn(executor.run());
        Ok(())
    }

    /// Posts an event for dispatch. Non-blocking: a full global mailbox is a
    /// fatal overflow ([`Fault::IngressOverflow`]) rather than backpressure,
    /// and the producer is never suspended.
    pub fn post_event(&self, event: Event) {
        match self.ingress.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.shared.halt.trip(Fault::IngressOverflow),
            Err(TrySendError::Closed(_)) => self.shared.halt.trip(Fault::ChannelClosed),
        }
    }

    /// The fault that halted this core, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.shared.halt.current()
    }

    /// Waits for the core to halt and returns the fault that tripped it.
    pub async fn faulted(&self) -> Fault {
        self.shared.halt.tripped().await;
        self.shared
            .halt
            .current()
            .expect("latch resolved without a fault")
    }
}

impl Default for Core {
    fn default() -> Self {
        Core::new(CoreConfig::default())
    }
}
