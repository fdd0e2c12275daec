//! The event multiplexer: the core's sole distribution point.
//!
//! One task drains the global mailbox and, for each event, scans the
//! registry under its lock, forwarding the event into every consumer mailbox
//! whose filter accepts it. Fan-out of one event completes before the next
//! global event is dequeued, so per-consumer delivery order matches global
//! dequeue order; nothing more is promised across consumers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::core::Shared;
use crate::event::Event;
use crate::fault::Fault;

pub(crate) async fn run(shared: Arc<Shared>, mut ingress: mpsc::Receiver<Event>) {
    info!("event multiplexer running");

    loop {
        let event = tokio::select! {
            () = shared.halt.tripped() => return shared.halt.park().await,
            received = ingress.recv() => match received {
                Some(event) => event,
                // Every Core handle holds a sender, so this channel must
                // outlive the multiplexer.
                None => return shared.halt.raise(Fault::ChannelClosed).await,
            },
        };

        debug!(%event, "dispatching event");

        let consumers = match shared.registry.lock_timed(shared.config.lock_timeout).await {
            Ok(guard) => guard,
            Err(fault) => return shared.halt.raise(fault).await,
        };

        let mut stalled: Option<Fault> = None;
        for consumer in consumers.iter() {
            if !(consumer.filter)(event) {
                trace!(machine = %consumer.name, %event, "filtered out");
                continue;
            }

            debug!(
                machine = %consumer.name,
                %event,
                label = consumer.event_label(event).unwrap_or("?"),
                "delivering event"
            );

            match timeout(shared.config.send_timeout, consumer.mailbox.send(event)).await {
                Ok(Ok(())) => {}
                // Timed out or the executor dropped its receiver; either way
                // this consumer has stalled and the core halts rather than
                // drop or reorder the event.
                Ok(Err(_)) | Err(_) => {
                    stalled = Some(Fault::MailboxOverflow {
                        name: consumer.name.to_string(),
                    });
                    break;
                }
            }
        }
        drop(consumers);

        if let Some(fault) = stalled {
            return shared.halt.raise(fault).await;
        }
    }
}
