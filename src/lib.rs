//! # statecore
//!
//! An event-multiplexed state machine execution core on Tokio.
//!
//! Applications define independent state machines (a table of states, a
//! transition function, and an event filter) and register them with a
//! [`Core`]. Each machine runs on its own Tokio task with a bounded private
//! mailbox, while a single multiplexer task fans every posted event out to
//! the machines whose filters accept it. The core gives every machine one
//! uniform execution contract: run the current state's action, follow a
//! forced transition or await an event, optionally re-run on a loop timer,
//! and clean up on the way out of a state.
//!
//! Contract violations (descriptor misconfiguration, mailbox overflow, a
//! stalled consumer) are not recoverable errors: the first one halts the
//! whole core, and the fault is observable via [`Core::fault`] /
//! [`Core::faulted`].
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use statecore::{Core, Descriptor, Event, State, StateRow};
//!
//! const EVENT_GO: Event = Event::new(Event::APP_BASE);
//! const IDLE: State = State::new(0);
//! const ACTIVE: State = State::new(1);
//!
//! #[tokio::main]
//! async fn main() {
//!     let core = Core::default();
//!
//!     let machine = Descriptor::builder("demo")
//!         .state(StateRow::new(|| State::NULL))
//!         .state(StateRow::new(|| State::NULL).loop_every(Duration::from_millis(250)))
//!         .starting_state(IDLE)
//!         .transition(|state, event| {
//!             if *state == IDLE && event == EVENT_GO {
//!                 *state = ACTIVE;
//!             }
//!         })
//!         .filter(|event| event == EVENT_GO)
//!         .build();
//!
//!     core.register(machine).await.unwrap();
//!     core.post_event(EVENT_GO);
//! }
//! ```

mod core;
mod descriptor;
mod event;
mod executor;
mod fault;
mod mux;
mod registry;

pub use crate::core::{Core, CoreConfig};
pub use crate::descriptor::{Descriptor, DescriptorBuilder, StateRow};
pub use crate::event::{Event, State};
pub use crate::fault::Fault;
