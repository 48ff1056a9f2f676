//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use ember_sdk::{EmberError, EmberResult, Host, Level, RawEvent, ResourceKind, journal_level};

/// Scriptable device runtime.
///
/// Clones share state, so a test can install one clone into the SDK runtime
/// and keep another to queue events and inspect recorded calls. Uses
/// `std::sync::Mutex` so it can be built on one thread and installed on
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    /// Events returned by `fetch_event`, front first.
    events: Arc<Mutex<VecDeque<RawEvent>>>,
    /// Successful dispatcher registrations, in call order.
    registrations: Arc<Mutex<Vec<(ResourceKind, String)>>>,
    /// Kinds whose dispatcher registration fails, with the status returned.
    refusals: Arc<Mutex<HashMap<ResourceKind, i32>>>,
    /// Durations passed to `suspend`.
    suspends: Arc<Mutex<Vec<u32>>>,
    /// Number of `fetch_event` calls, including empty ones.
    fetches: Arc<Mutex<usize>>,
    /// Configuration values by key.
    config: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Journal writes as (level, message), in call order.
    journal: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockHost {
    /// Create a host with no events that accepts every registration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    #[must_use]
    pub fn with_event(self, event: RawEvent) -> Self {
        self.queue_event(event);
        self
    }

    /// Queue several events in order.
    #[must_use]
    pub fn with_events(self, events: impl IntoIterator<Item = RawEvent>) -> Self {
        for event in events {
            self.queue_event(event);
        }
        self
    }

    /// Make dispatcher registration for `kind` fail with `status`.
    #[must_use]
    pub fn refusing(self, kind: ResourceKind, status: i32) -> Self {
        if let Ok(mut guard) = self.refusals.lock() {
            guard.insert(kind, status);
        }
        self
    }

    /// Serve `value` as JSON for configuration `key`.
    #[must_use]
    pub fn with_config_json(self, key: &str, value: &serde_json::Value) -> Self {
        if let Ok(mut guard) = self.config.lock() {
            guard.insert(key.to_owned(), value.to_string().into_bytes());
        }
        self
    }

    /// Queue an event after construction.
    pub fn queue_event(&self, event: RawEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push_back(event);
        }
    }

    /// Events not fetched yet.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.lock().map(|g| g.len()).unwrap_or_default()
    }

    /// Durations of every suspend so far.
    #[must_use]
    pub fn suspend_calls(&self) -> Vec<u32> {
        self.suspends.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Successful dispatcher registrations so far.
    #[must_use]
    pub fn registrations(&self) -> Vec<(ResourceKind, String)> {
        self.registrations
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Number of `fetch_event` calls so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetches.lock().map(|g| *g).unwrap_or_default()
    }

    /// Journal writes so far, as (level, message).
    #[must_use]
    pub fn journal(&self) -> Vec<(String, String)> {
        self.journal.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Journal messages written at `level` that start with `prefix`.
    #[must_use]
    pub fn journal_entries(&self, level: &str, prefix: &str) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|(l, m)| l == level && m.starts_with(prefix))
            .map(|(_, m)| m)
            .collect()
    }
}

impl Host for MockHost {
    fn register_dispatcher(&self, kind: ResourceKind, entry_point: &str) -> EmberResult<()> {
        let refused = self
            .refusals
            .lock()
            .ok()
            .and_then(|g| g.get(&kind).copied());
        if let Some(status) = refused {
            return Err(EmberError::HostCallFailed { kind, status });
        }
        if let Ok(mut guard) = self.registrations.lock() {
            guard.push((kind, entry_point.to_owned()));
        }
        Ok(())
    }

    fn fetch_event(&self) -> Option<RawEvent> {
        if let Ok(mut guard) = self.fetches.lock() {
            *guard = guard.saturating_add(1);
        }
        self.events.lock().ok().and_then(|mut g| g.pop_front())
    }

    fn suspend(&self, duration_ms: u32) -> EmberResult<()> {
        if let Ok(mut guard) = self.suspends.lock() {
            guard.push(duration_ms);
        }
        Ok(())
    }

    fn get_config(&self, key: &str) -> Option<Vec<u8>> {
        self.config.lock().ok().and_then(|g| g.get(key).cloned())
    }

    fn log(&self, level: Level, message: &str) {
        if let Ok(mut guard) = self.journal.lock() {
            guard.push((journal_level(level).to_owned(), message.to_owned()));
        }
    }
}
