//! Test fixtures for events and callbacks.

use std::cell::Cell;
use std::rc::Rc;

use ember_sdk::{Callback, RawEvent, ResourceKind};

/// A well-formed timer event on port 0.
#[must_use]
pub fn timer_event(id: i32) -> RawEvent {
    RawEvent::new(ResourceKind::Timer.code(), id, 0, 0)
}

/// A timer event on an arbitrary port.
#[must_use]
pub fn timer_event_on_port(id: i32, port: i32) -> RawEvent {
    RawEvent::new(ResourceKind::Timer.code(), id, port, 0)
}

/// A GPIO event for (pin, port) at `state`.
#[must_use]
pub fn gpio_event(pin: i32, port: i32, state: i32) -> RawEvent {
    RawEvent::new(ResourceKind::Gpio.code(), pin, port, state)
}

/// A sensor event. Well-formed, never dispatched.
#[must_use]
pub fn sensor_event(id: i32) -> RawEvent {
    RawEvent::new(ResourceKind::Sensor.code(), id, 0, 0)
}

/// Counts how often callbacks created from it run.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Rc<Cell<usize>>,
}

impl CallCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that increments this counter.
    #[must_use]
    pub fn callback(&self) -> Callback {
        let count = Rc::clone(&self.count);
        Callback::new(move || count.set(count.get().saturating_add(1)))
    }

    /// Invocations so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }
}
