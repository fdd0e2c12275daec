//! Two-state demo machine.
//!
//! State A blocks until `TEST_EVENT_A` arrives; state B re-runs on a 250 ms
//! loop timer and forces a return to A after its tenth entry. The main loop
//! posts `TEST_EVENT_A` every five seconds.

use std::time::Duration;

use statecore::{Core, Descriptor, Event, State, StateRow};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TEST_EVENT_A: Event = Event::new(Event::APP_BASE);
const STATE_A: State = State::new(0);
const STATE_B: State = State::new(1);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let core = Core::default();

    let mut entries = 0u32;
    let machine = Descriptor::builder("test_state")
        .state(
            StateRow::new(|| {
                info!("entering state A");
                State::NULL
            })
            .on_exit(|| info!("leaving state A")),
        )
        .state(
            StateRow::new(move || {
                entries += 1;
                info!(entry = entries, "entering state B");
                if entries == 10 {
                    entries = 0;
                    return STATE_A;
                }
                State::NULL
            })
            .loop_every(Duration::from_millis(250)),
        )
        .starting_state(STATE_A)
        .transition(|state, event| {
            if *state == STATE_A && event == TEST_EVENT_A {
                *state = STATE_B;
            }
        })
        .filter(|event| event == TEST_EVENT_A)
        .event_name(|event| (event == TEST_EVENT_A).then_some("TEST_EVENT_A"))
        .build();

    core.register(machine).await.expect("descriptor is valid");

    loop {
        core.post_event(TEST_EVENT_A);
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
