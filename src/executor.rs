//! The per-machine execution loop.
//!
//! One task per registered machine, owning its state table, transition
//! function, and mailbox receiver; nothing here is shared with other
//! machines. Each pass runs the current state's action, then either follows
//! a forced transition immediately or awaits the mailbox, re-running the
//! action on loop-timer expiry and consulting the transition function on
//! real events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::descriptor::{EventNameFn, StateRow, TransitionFn, Validated};
use crate::event::{Event, State};
use crate::fault::{Fault, FaultLatch};

pub(crate) struct Executor {
    name: Arc<str>,
    table: Vec<StateRow>,
    starting_state: State,
    transition: TransitionFn,
    event_name: Option<EventNameFn>,
    mailbox: mpsc::Receiver<Event>,
    halt: Arc<FaultLatch>,
}

impl Executor {
    pub(crate) fn new(
        name: Arc<str>,
        parts: Validated,
        mailbox: mpsc::Receiver<Event>,
        halt: Arc<FaultLatch>,
    ) -> Self {
        Executor {
            name,
            table: parts.table,
            starting_state: parts.starting_state,
            transition: parts.transition,
            event_name: parts.event_name,
            mailbox,
            halt,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut state = self.starting_state;
        info!(machine = %self.name, %state, "state machine running");

        loop {
            // Action phase. The current state must have a table row.
            let total = self.table.len() as u32;
            let Some(row) = self.table.get_mut(state.index()) else {
                let fault = Fault::StateOutOfBounds {
                    name: self.name.to_string(),
                    state: state.code(),
                    total,
                };
                return self.halt.raise(fault).await;
            };

            let forced = (row.action)();
            if !forced.is_null() {
                // Forced transition: the state picked its own successor, so
                // no event is consumed. Cleanup fires on the way out.
                debug!(machine = %self.name, from = %state, to = %forced, "forced transition");
                if let Some(cleanup) = row.cleanup.as_mut() {
                    cleanup();
                }
                state = forced;
                // A table of mutually-forcing states would otherwise never
                // hit a suspension point, so this is also where a forcing
                // machine observes a halted core.
                tokio::select! {
                    () = self.halt.tripped() => return self.halt.park().await,
                    () = tokio::task::yield_now() => {}
                }
                continue;
            }

            // Await phase. The row borrow cannot live across the waits, so
            // take what the phase needs up front.
            let entered = state;
            let loop_timer = row.loop_timer;

            loop {
                let received = tokio::select! {
                    () = self.halt.tripped() => return self.halt.park().await,
                    received = next_event(&mut self.mailbox, loop_timer) => received,
                };

                let Some(event) = received else {
                    return self.halt.raise(Fault::ChannelClosed).await;
                };

                if !event.is_valid() {
                    // Loop timer expired: re-run the same state's action.
                    break;
                }

                debug!(
                    machine = %self.name,
                    %state,
                    %event,
                    label = self.event_label(event).unwrap_or("?"),
                    "received event"
                );
                (self.transition)(&mut state, event);

                if state != entered {
                    debug!(machine = %self.name, from = %entered, to = %state, "transition");
                    if let Some(cleanup) = self.table[entered.index()].cleanup.as_mut() {
                        cleanup();
                    }
                    break;
                }
                // Event did not apply to this state; keep waiting.
            }
        }
    }

    fn event_label(&self, event: Event) -> Option<&'static str> {
        self.event_name.as_ref().and_then(|f| f(event))
    }
}

/// Waits on the mailbox for up to `loop_timer` (indefinitely when zero).
/// Expiry synthesizes [`Event::INVALID`]; `None` means the channel closed.
async fn next_event(mailbox: &mut mpsc::Receiver<Event>, loop_timer: Duration) -> Option<Event> {
    if loop_timer.is_zero() {
        mailbox.recv().await
    } else {
        match timeout(loop_timer, mailbox.recv()).await {
            Ok(received) => received,
            Err(_) => Some(Event::INVALID),
        }
    }
}
