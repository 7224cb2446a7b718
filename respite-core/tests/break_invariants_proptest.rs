//! Property-based tests for the break cycle
//!
//! Random scripts of clock jumps and collaborator changes are replayed
//! against a manager; after every tick the state invariants must hold.

use proptest::prelude::*;
use respite_core::core::{BreakKind, SessionState};
use respite_core::endpoint::EndpointId;
use respite_core::engine::{BreakManager, Phase};
use respite_core::resilience::{BackoffConfig, ReconnectBackoff};
use respite_core::schedule::Clock;
use respite_core::testing::{ConnectBehavior, Harness};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Action {
    Tick,
    /// Jump the clock forward by this many seconds, then tick
    Jump(u64),
    DropSession,
    RestoreSession(u32),
    SetBusy(bool),
    Behavior(ConnectBehavior),
    IgnoreDisconnects(bool),
    RemoveProfile(bool),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        8 => Just(Action::Tick),
        3 => (1u64..7200).prop_map(Action::Jump),
        1 => Just(Action::DropSession),
        1 => (1u32..7).prop_map(Action::RestoreSession),
        1 => any::<bool>().prop_map(Action::SetBusy),
        1 => prop_oneof![
            Just(ConnectBehavior::Succeed),
            Just(ConnectBehavior::Hang),
            Just(ConnectBehavior::NotInitiated),
            Just(ConnectBehavior::Fail),
        ]
        .prop_map(Action::Behavior),
        1 => any::<bool>().prop_map(Action::IgnoreDisconnects),
        1 => any::<bool>().prop_map(Action::RemoveProfile),
    ]
}

fn config_variant() -> impl Strategy<Value = (bool, bool, bool)> {
    // (disconnect_on_break, safety_check_enabled, auto_reconnect)
    (any::<bool>(), any::<bool>(), any::<bool>())
}

/// What was true just before a tick ran
#[derive(Debug, Clone, Copy)]
struct BeforeTick {
    connected: bool,
    /// `Waiting` with the scheduled break already in the past
    break_due: bool,
}

/// Apply one action; `Some` when it ticked the manager
fn apply(harness: &Harness, manager: &mut BreakManager, action: &Action) -> Option<BeforeTick> {
    match action {
        Action::Tick => harness.advance(Duration::from_secs(1)),
        Action::Jump(secs) => harness.advance(Duration::from_secs(*secs)),
        Action::DropSession => {
            harness.session.drop_connection();
            return None;
        }
        Action::RestoreSession(id) => {
            harness.session.restore(EndpointId(*id));
            return None;
        }
        Action::SetBusy(busy) => {
            harness.activity.set_busy(*busy);
            return None;
        }
        Action::Behavior(behavior) => {
            harness.session.set_connect_behavior(*behavior);
            return None;
        }
        Action::IgnoreDisconnects(ignore) => {
            harness.session.ignore_disconnects(*ignore);
            return None;
        }
        Action::RemoveProfile(remove) => {
            let profile = if *remove {
                None
            } else {
                Some(respite_core::testing::test_profile())
            };
            harness.profiles.replace(profile);
            return None;
        }
    }

    let now = harness.clock.now();
    let before = BeforeTick {
        connected: harness.session.is_connected_now(),
        break_due: manager.phase() == Phase::Waiting
            && manager.window().next_break_at.is_some_and(|at| now > at),
    };
    // Connect failures surface as tick errors; the machine must stay consistent
    let _ = manager.tick();
    Some(before)
}

fn check_invariants(manager: &BreakManager, before: BeforeTick) -> Result<(), TestCaseError> {
    let connected_at_tick = before.connected;
    let window = manager.window();
    let phase = manager.phase();
    let state = manager.state();

    // A break end is only ever set while a break is underway
    if window.break_ends_at.is_some() {
        prop_assert!(
            matches!(
                phase,
                Phase::InPlaceBreak
                    | Phase::SuspendPending { .. }
                    | Phase::DisconnectRequested { .. }
                    | Phase::Disconnected
            ),
            "break_ends_at set in {:?}",
            phase
        );
    }
    if matches!(
        phase,
        Phase::InPlaceBreak | Phase::DisconnectRequested { .. } | Phase::Disconnected
    ) {
        prop_assert!(window.break_ends_at.is_some(), "{:?} without break end", phase);
    }
    if window.kind == Some(BreakKind::InPlace) {
        prop_assert_eq!(phase, Phase::InPlaceBreak);
    }

    prop_assert!(manager.retry_state().attempt_count <= 10);

    // A session seen connected during a disconnect break is handled that tick
    if connected_at_tick && window.is_disconnect_break() {
        prop_assert!(
            matches!(
                phase,
                Phase::SuspendPending { .. } | Phase::DisconnectRequested { .. }
            ),
            "connected during disconnect break left in {:?}",
            phase
        );
    }

    // A due break starts on the next tick, whatever the session is doing
    if before.break_due {
        prop_assert_eq!(
            state,
            SessionState::BreakRequested,
            "due break did not start (connected before tick: {})",
            before.connected
        );
    }

    prop_assert_eq!(manager.status().current_state(), state);
    prop_assert_eq!(
        manager.status().seconds_remaining_in_break() >= 0,
        window.break_ends_at.is_some()
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ===== STATE MACHINE INVARIANTS =====

    /// Property: invariants hold after every tick of a random script
    #[test]
    fn prop_invariants_hold_for_random_scripts(
        (disconnect_on_break, safety, auto_reconnect) in config_variant(),
        actions in prop::collection::vec(action(), 1..400),
    ) {
        let mut config = respite_core::testing::test_config();
        config.behavior.disconnect_on_break = disconnect_on_break;
        config.behavior.safety_check_enabled = safety;
        config.reconnect.auto_reconnect = auto_reconnect;

        let harness = Harness::with_config(config);
        let mut manager = harness.manager();

        for action in &actions {
            if let Some(before) = apply(&harness, &mut manager, action) {
                check_invariants(&manager, before)?;
            }
        }

        manager.shutdown();
        prop_assert_eq!(manager.state(), SessionState::Waiting);
        prop_assert_eq!(manager.status().seconds_until_break(), -1);
        prop_assert_eq!(manager.retry_state().attempt_count, 0);
    }

    // ===== BACKOFF PROPERTIES =====

    /// Property: the default backoff never shrinks
    #[test]
    fn prop_default_backoff_monotonic(attempt in 0u32..1000) {
        let backoff = ReconnectBackoff::default();
        prop_assert!(backoff.delay(attempt) <= backoff.delay(attempt + 1));
    }

    /// Property: any backoff whose linear step is at least the fast delay
    /// never shrinks
    #[test]
    fn prop_backoff_monotonic(
        fast_retries in 0u32..10,
        fast_secs in 1u64..60,
        extra_secs in 0u64..120,
        attempt in 0u32..50,
    ) {
        let backoff = ReconnectBackoff::new(BackoffConfig {
            fast_retries,
            fast_delay: Duration::from_secs(fast_secs),
            base_delay: Duration::from_secs(fast_secs + extra_secs),
            ..BackoffConfig::default()
        });
        prop_assert!(backoff.delay(attempt) <= backoff.delay(attempt + 1));
    }
}
