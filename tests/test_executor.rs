//! Executor loop behavior: event-driven transitions, forced transitions,
//! loop timers, and transition no-ops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use statecore::{Core, Descriptor, Event, State, StateRow};

const EVENT_X: Event = Event::new(Event::APP_BASE);
const EVENT_Y: Event = Event::new(Event::APP_BASE + 1);
const STATE_A: State = State::new(0);
const STATE_B: State = State::new(1);

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(30), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn counting(counter: Arc<AtomicUsize>) -> impl FnMut() -> State + Send + 'static {
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        State::NULL
    }
}

fn bump(counter: Arc<AtomicUsize>) -> impl FnMut() + Send + 'static {
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn event_transition_then_loop_timer() {
    let core = Core::default();

    let a_cleanups = Arc::new(AtomicUsize::new(0));
    let b_actions = Arc::new(AtomicUsize::new(0));

    // State A blocks indefinitely; state B re-runs every 200 ms with no
    // cleanup of its own.
    let machine = Descriptor::builder("looper")
        .state(StateRow::new(|| State::NULL).on_exit(bump(Arc::clone(&a_cleanups))))
        .state(StateRow::new(counting(Arc::clone(&b_actions))).loop_every(Duration::from_millis(200)))
        .starting_state(STATE_A)
        .transition(|state, event| {
            if *state == STATE_A && event == EVENT_X {
                *state = STATE_B;
            }
        })
        .filter(|event| event == EVENT_X)
        .build();
    core.register(machine).await.unwrap();

    let start = tokio::time::Instant::now();
    core.post_event(EVENT_X);

    // B's action runs once on entry, then once per expired loop timer.
    let count = Arc::clone(&b_actions);
    wait_until(move || count.load(Ordering::SeqCst) >= 1).await;
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 1);

    let count = Arc::clone(&b_actions);
    wait_until(move || count.load(Ordering::SeqCst) >= 4).await;
    // Three re-runs need three 200 ms expiries of virtual time.
    assert!(start.elapsed() >= Duration::from_millis(600));

    // Looping never fires cleanup; only a real state change does.
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(core.fault(), None);
}

#[tokio::test]
async fn forced_transition_skips_the_mailbox() {
    let core = Core::default();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let push = |label: &'static str| {
        let log = Arc::clone(&log);
        move || log.lock().unwrap().push(label)
    };

    // S0 always forces S1; no event is ever posted.
    let machine = Descriptor::builder("forcer")
        .state(
            StateRow::new({
                let log = Arc::clone(&log);
                move || {
                    log.lock().unwrap().push("s0_action");
                    STATE_B
                }
            })
            .on_exit(push("s0_cleanup")),
        )
        .state(StateRow::new({
            let log = Arc::clone(&log);
            move || {
                log.lock().unwrap().push("s1_action");
                State::NULL
            }
        }))
        .starting_state(STATE_A)
        .transition(|_, _| {})
        .filter(|_| false)
        .build();
    core.register(machine).await.unwrap();

    wait_until(|| log.lock().unwrap().contains(&"s1_action")).await;
    assert_eq!(
        *log.lock().unwrap(),
        vec!["s0_action", "s0_cleanup", "s1_action"]
    );
}

#[tokio::test]
async fn inapplicable_event_keeps_waiting() {
    let core = Core::default();

    let a_actions = Arc::new(AtomicUsize::new(0));
    let a_cleanups = Arc::new(AtomicUsize::new(0));
    let b_actions = Arc::new(AtomicUsize::new(0));
    let transitions = Arc::new(AtomicUsize::new(0));

    let machine = Descriptor::builder("selective")
        .state(StateRow::new(counting(Arc::clone(&a_actions))).on_exit(bump(Arc::clone(&a_cleanups))))
        .state(StateRow::new(counting(Arc::clone(&b_actions))))
        .starting_state(STATE_A)
        .transition({
            let transitions = Arc::clone(&transitions);
            move |state, event| {
                transitions.fetch_add(1, Ordering::SeqCst);
                if *state == STATE_A && event == EVENT_Y {
                    *state = STATE_B;
                }
            }
        })
        .filter(|_| true)
        .build();
    core.register(machine).await.unwrap();

    // EVENT_X reaches the transition function but does not apply: no
    // cleanup, no action re-run, machine keeps waiting.
    core.post_event(EVENT_X);
    let seen = Arc::clone(&transitions);
    wait_until(move || seen.load(Ordering::SeqCst) >= 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(a_actions.load(Ordering::SeqCst), 1);
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 0);

    // The machine is still responsive to an applicable event.
    core.post_event(EVENT_Y);
    let entered_b = Arc::clone(&b_actions);
    wait_until(move || entered_b.load(Ordering::SeqCst) >= 1).await;
    assert_eq!(a_cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(a_actions.load(Ordering::SeqCst), 1);
}
