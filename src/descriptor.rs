//! State machine configuration: per-state rows, the descriptor, and its
//! builder.

use std::sync::Arc;
use std::time::Duration;

use crate::event::{Event, State};
use crate::fault::Fault;

pub(crate) type ActionFn = Box<dyn FnMut() -> State + Send>;
pub(crate) type CleanupFn = Box<dyn FnMut() + Send>;
pub(crate) type TransitionFn = Box<dyn FnMut(&mut State, Event) + Send>;
pub(crate) type FilterFn = Arc<dyn Fn(Event) -> bool + Send + Sync>;
pub(crate) type EventNameFn = Arc<dyn Fn(Event) -> Option<&'static str> + Send + Sync>;

/// One entry in a machine's state table.
///
/// The action runs every time the machine enters or re-enters the state. It
/// either forces the next state by returning it, or returns [`State::NULL`]
/// to have the executor await an event instead.
pub struct StateRow {
    pub(crate) action: ActionFn,
    pub(crate) cleanup: Option<CleanupFn>,
    pub(crate) loop_timer: Duration,
}

impl StateRow {
    /// Creates a row from its action. No cleanup, no loop timer.
    pub fn new(action: impl FnMut() -> State + Send + 'static) -> Self {
        StateRow {
            action: Box::new(action),
            cleanup: None,
            loop_timer: Duration::ZERO,
        }
    }

    /// Re-runs the action after `period` even when no event arrives.
    /// [`Duration::ZERO`] (the default) blocks indefinitely.
    pub fn loop_every(mut self, period: Duration) -> Self {
        self.loop_timer = period;
        self
    }

    /// Runs `cleanup` on every transition out of this state, forced or
    /// event-driven.
    pub fn on_exit(mut self, cleanup: impl FnMut() + Send + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

/// The configuration for one state machine, built via
/// [`Descriptor::builder`] and consumed by
/// [`Core::register`](crate::Core::register).
///
/// The transition function and filter predicate are required; they are
/// checked at registration time (not build time) so that a misconfigured
/// descriptor surfaces as [`Fault::InvalidDescriptor`] before any task is
/// spawned.
pub struct Descriptor {
    pub(crate) name: String,
    pub(crate) table: Vec<StateRow>,
    pub(crate) starting_state: State,
    pub(crate) transition: Option<TransitionFn>,
    pub(crate) filter: Option<FilterFn>,
    pub(crate) event_name: Option<EventNameFn>,
    pub(crate) mailbox_capacity: Option<usize>,
}

impl Descriptor {
    /// Starts building a descriptor. The name is used in logs and fault
    /// diagnostics only.
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            descriptor: Descriptor {
                name: name.into(),
                table: Vec::new(),
                starting_state: State::new(0),
                transition: None,
                filter: None,
                event_name: None,
                mailbox_capacity: None,
            },
        }
    }

    /// Splits the descriptor into validated parts, or reports which
    /// registration check failed.
    pub(crate) fn into_validated(self) -> Result<Validated, Fault> {
        let reject = |reason| Fault::InvalidDescriptor {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(reject("machine name is empty"));
        }
        if self.table.is_empty() {
            return Err(reject("state table is empty"));
        }
        if self.starting_state.is_null() || self.starting_state.index() >= self.table.len() {
            return Err(reject("starting state out of bounds"));
        }
        if self.mailbox_capacity == Some(0) {
            return Err(reject("mailbox capacity is zero"));
        }
        let Some(transition) = self.transition else {
            return Err(reject("no transition function"));
        };
        let Some(filter) = self.filter else {
            return Err(reject("no filter predicate"));
        };

        Ok(Validated {
            name: self.name,
            table: self.table,
            starting_state: self.starting_state,
            transition,
            filter,
            event_name: self.event_name,
            mailbox_capacity: self.mailbox_capacity,
        })
    }
}

/// A descriptor that passed registration-time validation.
pub(crate) struct Validated {
    pub(crate) name: String,
    pub(crate) table: Vec<StateRow>,
    pub(crate) starting_state: State,
    pub(crate) transition: TransitionFn,
    pub(crate) filter: FilterFn,
    pub(crate) event_name: Option<EventNameFn>,
    pub(crate) mailbox_capacity: Option<usize>,
}

/// Builder for [`Descriptor`].
pub struct DescriptorBuilder {
    descriptor: Descriptor,
}

impl DescriptorBuilder {
    /// Appends a state row. The row's state index is its position in the
    /// table, in call order.
    pub fn state(mut self, row: StateRow) -> Self {
        self.descriptor.table.push(row);
        self
    }

    /// Sets the initial state. Defaults to the first table entry.
    pub fn starting_state(mut self, state: State) -> Self {
        self.descriptor.starting_state = state;
        self
    }

    /// Sets the transition function: `(current_state, event)`, mutating the
    /// state in place, or leaving it unchanged when the event does not apply.
    pub fn transition(mut self, f: impl FnMut(&mut State, Event) + Send + 'static) -> Self {
        self.descriptor.transition = Some(Box::new(f));
        self
    }

    /// Sets the filter predicate deciding which dispatched events this
    /// machine receives.
    pub fn filter(mut self, f: impl Fn(Event) -> bool + Send + Sync + 'static) -> Self {
        self.descriptor.filter = Some(Arc::new(f));
        self
    }

    /// Sets a debug-only event namer used in dispatch and transition logs.
    pub fn event_name(
        mut self,
        f: impl Fn(Event) -> Option<&'static str> + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.event_name = Some(Arc::new(f));
        self
    }

    /// Overrides the core's default mailbox capacity for this machine.
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.descriptor.mailbox_capacity = Some(capacity);
        self
    }

    /// Finishes the build. Validation happens at registration.
    pub fn build(self) -> Descriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DescriptorBuilder {
        Descriptor::builder("machine")
            .state(StateRow::new(|| State::NULL))
            .transition(|_, _| {})
            .filter(|_| true)
    }

    fn reason(descriptor: Descriptor) -> &'static str {
        match descriptor.into_validated() {
            Err(Fault::InvalidDescriptor { reason, .. }) => reason,
            Err(other) => panic!("unexpected fault: {other}"),
            Ok(_) => panic!("descriptor unexpectedly valid"),
        }
    }

    #[test]
    fn accepts_minimal_descriptor() {
        assert!(valid().build().into_validated().is_ok());
    }

    #[test]
    fn rejects_empty_table() {
        let descriptor = Descriptor::builder("machine")
            .transition(|_, _| {})
            .filter(|_| true)
            .build();
        assert_eq!(reason(descriptor), "state table is empty");
    }

    #[test]
    fn rejects_missing_transition() {
        let descriptor = Descriptor::builder("machine")
            .state(StateRow::new(|| State::NULL))
            .filter(|_| true)
            .build();
        assert_eq!(reason(descriptor), "no transition function");
    }

    #[test]
    fn rejects_missing_filter() {
        let descriptor = Descriptor::builder("machine")
            .state(StateRow::new(|| State::NULL))
            .transition(|_, _| {})
            .build();
        assert_eq!(reason(descriptor), "no filter predicate");
    }

    #[test]
    fn rejects_starting_state_out_of_bounds() {
        let descriptor = valid().starting_state(State::new(7)).build();
        assert_eq!(reason(descriptor), "starting state out of bounds");
    }

    #[test]
    fn rejects_zero_capacity_mailbox() {
        let descriptor = valid().mailbox_capacity(0).build();
        assert_eq!(reason(descriptor), "mailbox capacity is zero");
    }

    #[test]
    fn rejects_empty_name() {
        let descriptor = Descriptor::builder("")
            .state(StateRow::new(|| State::NULL))
            .transition(|_, _| {})
            .filter(|_| true)
            .build();
        assert_eq!(reason(descriptor), "machine name is empty");
    }
}
