//! Event and state value types.
//!
//! Both are opaque `u32` identifiers with one reserved sentinel each:
//! [`Event::INVALID`] marks a wait that timed out rather than a real event,
//! and [`State::NULL`] marks "no forced transition". Neither sentinel is ever
//! a valid application value.

use std::fmt;

/// An application event identifier.
///
/// Events are plain values: they are copied into every interested consumer's
/// mailbox, never shared. Application-defined codes start at
/// [`Event::APP_BASE`]; the range below it is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event(u32);

impl Event {
    /// Sentinel delivered to a state's action when its loop timer expired
    /// with no event pending.
    pub const INVALID: Event = Event(u32::MAX);

    /// First code available for application-defined events.
    pub const APP_BASE: u32 = 100;

    /// Creates an event from a raw code.
    pub const fn new(code: u32) -> Self {
        Event(code)
    }

    /// Returns the raw event code.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Returns `false` for the timed-out sentinel.
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("INVALID_EVENT")
        }
    }
}

/// An index into one state machine's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State(u32);

impl State {
    /// Sentinel returned by an action that does not force a transition; the
    /// executor awaits an event instead.
    pub const NULL: State = State(0xFFFF);

    /// Creates a state from a raw table index.
    pub const fn new(index: u32) -> Self {
        State(index)
    }

    /// Returns the raw index.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Returns the table index as a `usize`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for the no-forced-transition sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("NULL_STATE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
