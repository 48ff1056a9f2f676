//! The event pump: drain a bounded batch of host events per invocation.
//!
//! Each invocation fetches records one at a time until the host runs dry or
//! `batch_limit` records have been processed. Malformed records are dropped
//! and do not count toward the batch. When nothing was processed the guest
//! suspends for `idle_backoff_ms` before returning, which throttles hosts
//! that call `poll_events` in a tight loop.
//!
//! Because malformed records are free, a host that only ever produces
//! malformed records keeps a single invocation fetching forever and never
//! reaches the idle suspend. Nothing caps the number of fetches.
//!
//! The defaults (5 records, 10 ms) are the documented pump contract. A host
//! that sets `batch_limit` or `idle_backoff_ms` under the `event_pump` config
//! key changes that contract for its guest: batches end at its limit and idle
//! invocations suspend for its interval.
//!
//! Discarded and unrouted records are reported to the host journal through
//! [`Host::log`] as well as through `tracing`.

use tracing::{Level, debug, warn};

use crate::config::PumpConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::event::{EventRecord, Route};
use crate::host::Host;

/// What one invocation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Records returned by the host, malformed ones included.
    pub fetched: u32,
    /// Well-formed records consumed against the batch limit.
    pub processed: u32,
    /// Malformed records dropped.
    pub discarded: u32,
    /// Callbacks actually invoked.
    pub dispatched: u32,
    /// Whether the idle suspend was issued.
    pub suspended: bool,
}

/// Bounded polling loop over [`Host::fetch_event`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventPump {
    config: PumpConfig,
}

impl EventPump {
    #[must_use]
    pub fn new(config: PumpConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Run one invocation against `host`, dispatching through `dispatcher`.
    ///
    /// Never fails: every problem is logged and skipped.
    pub fn run(&self, host: &(impl Host + ?Sized), dispatcher: &Dispatcher) -> PumpReport {
        let mut report = PumpReport::default();

        while report.processed < self.config.batch_limit {
            let Some(raw) = host.fetch_event() else {
                break;
            };
            report.fetched = report.fetched.saturating_add(1);

            let record = match EventRecord::try_from(raw) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(
                        kind = raw.kind,
                        id = raw.id,
                        port = raw.port,
                        state = raw.state,
                        %reason,
                        "Invalid event"
                    );
                    host.log(
                        Level::WARN,
                        &format!(
                            "Invalid event: type={}, id={}, port={}, state={}: {reason}",
                            raw.kind, raw.id, raw.port, raw.state
                        ),
                    );
                    report.discarded = report.discarded.saturating_add(1);
                    continue;
                },
            };
            debug!(event = %record, "Retrieved event");

            match record.route() {
                Route::Unrouted => {
                    warn!(event = %record, "Unknown event");
                    host.log(Level::WARN, &format!("Unknown event: {record}"));
                },
                route => {
                    if dispatcher.dispatch(host, route) == Some(DispatchOutcome::Invoked) {
                        report.dispatched = report.dispatched.saturating_add(1);
                    }
                },
            }
            report.processed = report.processed.saturating_add(1);
        }

        if report.processed == 0 {
            if let Err(e) = host.suspend(self.config.idle_backoff_ms) {
                warn!(error = %e, "Idle suspend failed");
                host.log(Level::WARN, &format!("Idle suspend failed: {e}"));
            }
            report.suspended = true;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Callback;
    use crate::error::EmberResult;
    use crate::event::{RawEvent, ResourceKind};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct QueueHost {
        events: RefCell<VecDeque<RawEvent>>,
        suspends: RefCell<Vec<u32>>,
        journal: RefCell<Vec<(Level, String)>>,
    }

    impl QueueHost {
        fn with(events: impl IntoIterator<Item = RawEvent>) -> Self {
            Self {
                events: RefCell::new(events.into_iter().collect()),
                ..Self::default()
            }
        }
    }

    impl Host for QueueHost {
        fn register_dispatcher(&self, _kind: ResourceKind, _entry_point: &str) -> EmberResult<()> {
            Ok(())
        }

        fn fetch_event(&self) -> Option<RawEvent> {
            self.events.borrow_mut().pop_front()
        }

        fn suspend(&self, duration_ms: u32) -> EmberResult<()> {
            self.suspends.borrow_mut().push(duration_ms);
            Ok(())
        }

        fn log(&self, level: Level, message: &str) {
            self.journal.borrow_mut().push((level, message.to_owned()));
        }
    }

    #[test]
    fn idle_invocation_suspends_once() {
        let host = QueueHost::default();
        let report = EventPump::default().run(&host, &Dispatcher::new());

        assert!(report.suspended);
        assert_eq!(report.fetched, 0);
        assert_eq!(*host.suspends.borrow(), vec![10]);
    }

    #[test]
    fn unhandled_but_valid_events_still_count() {
        let host = QueueHost::with([RawEvent::new(2, 0, 0, 0), RawEvent::new(0, 3, 1, 0)]);
        let report = EventPump::default().run(&host, &Dispatcher::new());

        assert_eq!(report.processed, 2);
        assert_eq!(report.dispatched, 0);
        assert!(!report.suspended);
        assert!(host.suspends.borrow().is_empty());
    }

    #[test]
    fn custom_batch_limit_and_backoff() {
        let host = QueueHost::with((0..4).map(|id| RawEvent::new(0, id, 0, 0)));
        let pump = EventPump::new(PumpConfig {
            batch_limit: 3,
            idle_backoff_ms: 250,
        });
        let dispatcher = Dispatcher::new();

        assert_eq!(pump.run(&host, &dispatcher).processed, 3);
        assert_eq!(pump.run(&host, &dispatcher).processed, 1);
        assert!(pump.run(&host, &dispatcher).suspended);
        assert_eq!(*host.suspends.borrow(), vec![250]);
    }

    #[test]
    fn malformed_events_do_not_consume_quota() {
        let mut events = vec![RawEvent::new(7, 0, 0, 0); 8];
        events.push(RawEvent::new(0, 1, 0, 0));
        let host = QueueHost::with(events);

        let hits = Rc::new(Cell::new(0));
        let dispatcher = Dispatcher::new();
        dispatcher
            .register_timer(
                &host,
                1,
                Some(Callback::new({
                    let hits = Rc::clone(&hits);
                    move || hits.set(hits.get() + 1)
                })),
            )
            .unwrap();

        let report = EventPump::default().run(&host, &dispatcher);
        assert_eq!(report.fetched, 9);
        assert_eq!(report.discarded, 8);
        assert_eq!(report.processed, 1);
        assert_eq!(report.dispatched, 1);
        assert!(!report.suspended);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn discarded_and_unrouted_records_are_journaled() {
        let host = QueueHost::with([
            RawEvent::new(9, 1, 0, 0),
            RawEvent::new(2, 4, 0, 0),
            RawEvent::new(0, 3, 1, 0),
        ]);
        let report = EventPump::default().run(&host, &Dispatcher::new());
        assert_eq!(report.discarded, 1);
        assert_eq!(report.processed, 2);

        let journal = host.journal.borrow();
        let messages: Vec<&str> = journal.iter().map(|(_, m)| m.as_str()).collect();
        assert!(journal.iter().all(|(level, _)| *level == Level::WARN));
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("Invalid event: type=9, id=1"));
        assert!(messages[1].starts_with("Unknown event"));
        assert!(messages[2].starts_with("Unknown event"));
    }
}
