//! Integration tests for the event pump driven through `poll`.

mod common;

use ember_sdk::{RawEvent, poll, register_gpio_callback, register_timer_callback, with_runtime};
use ember_test::{
    CallCounter, MockHost, gpio_event, on_fresh_thread, sensor_event, timer_event,
    timer_event_on_port,
};

#[test]
fn idle_poll_suspends_exactly_once() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new());
        let report = poll();

        assert!(report.suspended);
        assert_eq!(report.processed, 0);
        assert_eq!(host.suspend_calls(), vec![10]);
        assert_eq!(host.fetch_calls(), 1);
    });
}

#[test]
fn busy_poll_does_not_suspend() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_event(timer_event(1)));
        let report = poll();

        assert!(!report.suspended);
        assert!(host.suspend_calls().is_empty());
    });
}

#[test]
fn batch_limit_leaves_sixth_event_for_next_poll() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_events((0..6).map(timer_event)));
        let counters: Vec<CallCounter> = (0..6).map(|_| CallCounter::new()).collect();
        for (id, counter) in (0..).zip(&counters) {
            register_timer_callback(id, counter.callback()).unwrap();
        }

        let first = poll();
        assert_eq!(first.processed, 5);
        assert_eq!(first.dispatched, 5);
        assert_eq!(host.pending_events(), 1);
        assert_eq!(counters[5].count(), 0);

        let second = poll();
        assert_eq!(second.processed, 1);
        assert_eq!(counters[5].count(), 1);
        assert!(counters.iter().all(|c| c.count() == 1));
        assert!(host.suspend_calls().is_empty());
    });
}

#[test]
fn malformed_records_are_discarded() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_events([
            RawEvent::new(3, 1, 0, 0),
            RawEvent::new(-1, 1, 0, 0),
            RawEvent::new(0, -1, 0, 0),
            RawEvent::new(1, 3, -2, 1),
        ]));
        let timer = CallCounter::new();
        let gpio = CallCounter::new();
        register_timer_callback(1, timer.callback()).unwrap();
        register_gpio_callback(3, 2, gpio.callback()).unwrap();

        let report = poll();
        assert_eq!(report.fetched, 4);
        assert_eq!(report.discarded, 4);
        assert_eq!(report.processed, 0);
        assert_eq!(timer.count(), 0);
        assert_eq!(gpio.count(), 0);

        // Nothing well-formed arrived, so the guest backs off.
        assert_eq!(host.suspend_calls(), vec![10]);

        let invalid = host.journal_entries("warn", "Invalid event");
        assert_eq!(invalid.len(), 4);
        assert!(invalid[0].contains("type=3, id=1"));
        assert!(invalid[3].contains("port=-2"));
    });
}

#[test]
fn gpio_record_with_invalid_state_is_discarded() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_event(gpio_event(3, 2, 2)));
        let counter = CallCounter::new();
        register_gpio_callback(3, 2, counter.callback()).unwrap();

        let report = poll();
        assert_eq!(report.discarded, 1);
        assert_eq!(counter.count(), 0);
        assert_eq!(host.suspend_calls().len(), 1);
    });
}

#[test]
fn malformed_records_do_not_use_batch_quota() {
    on_fresh_thread(|| {
        let mut events = vec![RawEvent::new(9, 0, 0, 0); 12];
        events.extend((0..5).map(timer_event));
        events.push(timer_event(5));
        let host = common::install(MockHost::new().with_events(events));

        let report = poll();
        assert_eq!(report.discarded, 12);
        assert_eq!(report.processed, 5);
        assert_eq!(host.pending_events(), 1);
    });
}

#[test]
fn timer_event_on_nonzero_port_is_not_dispatched() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_event(timer_event(5)));
        let counter = CallCounter::new();
        register_timer_callback(5, counter.callback()).unwrap();

        poll();
        assert_eq!(counter.count(), 1);

        host.queue_event(timer_event_on_port(5, 1));
        let report = poll();
        assert_eq!(report.processed, 1);
        assert_eq!(report.dispatched, 0);
        assert_eq!(counter.count(), 1);
        assert!(host.suspend_calls().is_empty());
        assert_eq!(
            host.journal_entries("warn", "Unknown event"),
            vec!["Unknown event: type=timer, id=5, port=1, state=0".to_owned()]
        );
    });
}

#[test]
fn sensor_events_count_but_never_dispatch() {
    on_fresh_thread(|| {
        let host = common::install(MockHost::new().with_event(sensor_event(0)));
        let counter = CallCounter::new();
        register_timer_callback(0, counter.callback()).unwrap();

        let report = poll();
        assert_eq!(report.processed, 1);
        assert_eq!(report.dispatched, 0);
        assert_eq!(counter.count(), 0);
        assert!(host.suspend_calls().is_empty());
        assert_eq!(host.journal_entries("warn", "Unknown event").len(), 1);
        assert!(host.journal_entries("debug", "No timer callback").is_empty());
    });
}

#[test]
fn gpio_events_route_from_any_port() {
    on_fresh_thread(|| {
        common::install(
            MockHost::new()
                .with_event(gpio_event(3, 0, 1))
                .with_event(gpio_event(3, 7, 0)),
        );
        let port0 = CallCounter::new();
        let port7 = CallCounter::new();
        register_gpio_callback(3, 0, port0.callback()).unwrap();
        register_gpio_callback(3, 7, port7.callback()).unwrap();

        let report = poll();
        assert_eq!(report.dispatched, 2);
        assert_eq!(port0.count(), 1);
        assert_eq!(port7.count(), 1);
    });
}

#[test]
fn pump_settings_come_from_host_config() {
    on_fresh_thread(|| {
        let host = common::install(
            MockHost::new()
                .with_config_json(
                    "event_pump",
                    &serde_json::json!({ "batch_limit": 2, "idle_backoff_ms": 40 }),
                )
                .with_events((0..3).map(timer_event)),
        );
        assert_eq!(with_runtime(|rt| rt.pump().config().batch_limit), 2);

        assert_eq!(poll().processed, 2);
        assert_eq!(poll().processed, 1);
        assert!(poll().suspended);
        assert_eq!(host.suspend_calls(), vec![40]);
    });
}

#[test]
fn unusable_config_falls_back_to_defaults() {
    on_fresh_thread(|| {
        common::install(
            MockHost::new().with_config_json("event_pump", &serde_json::json!({ "batch_limit": 0 })),
        );
        with_runtime(|rt| {
            assert_eq!(rt.pump().config().batch_limit, 5);
            assert_eq!(rt.pump().config().idle_backoff_ms, 10);
        });
    });
}
