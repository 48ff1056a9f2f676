//! Integration tests for the entry points the device runtime calls directly
//! and for runtime initialization.

mod common;

use ember_sdk::{
    Callback, DispatchOutcome, EmberError, PAUSE_MS, install_host, is_initialized,
    on_gpio_changed, on_timer_fired, pause, poll, register_gpio_callback,
    register_timer_callback, sleep, unregister_timer_callback,
};
use ember_test::{CallCounter, MockHost, on_fresh_thread, timer_event};

#[test]
fn timer_notification_dispatches_without_fetching() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_event(timer_event(4)));
        let counter = CallCounter::new();
        register_timer_callback(4, counter.callback()).unwrap();

        assert_eq!(on_timer_fired(4), DispatchOutcome::Invoked);
        assert_eq!(counter.count(), 1);
        assert_eq!(host.fetch_calls(), 0);
        assert_eq!(host.pending_events(), 1);
    });
}

#[test]
fn timer_notification_without_handler_is_harmless() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new());
        assert_eq!(on_timer_fired(3), DispatchOutcome::NoHandler);
        assert_eq!(on_timer_fired(-8), DispatchOutcome::NoHandler);
        assert_eq!(on_timer_fired(1_000), DispatchOutcome::NoHandler);

        let misses = host.journal_entries("debug", "No timer callback registered");
        assert_eq!(misses.len(), 3);
        assert!(misses[1].ends_with("timer_id=-8"));
    });
}

#[test]
fn gpio_notification_dispatches_immediately() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new());
        let counter = CallCounter::new();
        register_gpio_callback(3, 2, counter.callback()).unwrap();

        assert_eq!(on_gpio_changed(3, 1, 2), DispatchOutcome::Invoked);
        assert_eq!(on_gpio_changed(3, 1, 1), DispatchOutcome::NoHandler);
        assert_eq!(counter.count(), 1);
        assert!(host.suspend_calls().is_empty());
        assert_eq!(
            host.journal_entries("debug", "No GPIO callback registered"),
            vec!["No GPIO callback registered: pin=3, port=1".to_owned()]
        );
    });
}

#[test]
fn runtime_initializes_once() {
    on_fresh_thread(|| {
        assert!(!is_initialized());
        let first = common::install(MockHost::new());
        assert!(is_initialized());

        // A second host is ignored; the first keeps receiving calls.
        let second = MockHost::new();
        assert!(!install_host(second.clone()));
        poll();
        assert_eq!(first.suspend_calls().len(), 1);
        assert!(second.suspend_calls().is_empty());
    });
}

#[test]
fn detached_runtime_refuses_registration() {
    on_fresh_thread(|| {
        let err = register_timer_callback(1, || {}).unwrap_err();
        assert!(matches!(err, EmberError::HostCallFailed { .. }));
        assert!(is_initialized());
        assert!(!install_host(MockHost::new()));
    });
}

#[test]
fn callbacks_may_change_registrations() {
    on_fresh_thread(|| {
        common::install(MockHost::new());
        let follow_up = CallCounter::new();

        let cb = Callback::new({
            let follow_up = follow_up.clone();
            move || {
                unregister_timer_callback(0).unwrap();
                register_timer_callback(1, follow_up.callback()).unwrap();
            }
        });
        register_timer_callback(0, cb).unwrap();

        assert_eq!(on_timer_fired(0), DispatchOutcome::Invoked);
        assert_eq!(on_timer_fired(0), DispatchOutcome::NoHandler);
        assert_eq!(on_timer_fired(1), DispatchOutcome::Invoked);
        assert_eq!(follow_up.count(), 1);
    });
}

#[test]
fn sleep_and_pause_suspend_through_host() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new());
        sleep(25).unwrap();
        pause().unwrap();
        assert_eq!(host.suspend_calls(), vec![25, PAUSE_MS]);
    });
}
