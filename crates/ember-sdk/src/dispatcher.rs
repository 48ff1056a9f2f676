//! Routes timer and GPIO notifications to registered callbacks.
//!
//! The dispatcher owns both registries. Registration first binds the
//! resource kind to its guest export on the host; a refusal aborts the
//! registration before the registry is touched.
//!
//! Dispatch clones the callback out of the registry and releases the borrow
//! before invoking it, so a callback may register or unregister callbacks
//! (including itself).

use std::cell::{Ref, RefCell};

use tracing::{Level, debug, warn};

use crate::callback::Callback;
use crate::error::EmberResult;
use crate::event::{ResourceKind, Route};
use crate::host::Host;
use crate::registry::{GpioRegistry, TimerRegistry};

/// Export the host calls with a timer id.
pub const TIMER_ENTRY_POINT: &str = "timer_callback";

/// Export the host calls with (pin, state, port).
pub const GPIO_ENTRY_POINT: &str = "gpio_callback";

/// Export the host calls to run one pump invocation.
pub const POLL_ENTRY_POINT: &str = "poll_events";

/// Result of a single dispatch. A missing handler is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Invoked,
    NoHandler,
}

/// Callback registries plus the routing between events and callbacks.
#[derive(Debug, Default)]
pub struct Dispatcher {
    timers: RefCell<TimerRegistry>,
    gpio: RefCell<GpioRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher with empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer callback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::HostCallFailed`] if the host refuses the
    /// timer dispatcher, otherwise whatever [`TimerRegistry::register`] returns.
    pub fn register_timer(
        &self,
        host: &(impl Host + ?Sized),
        id: i32,
        callback: Option<Callback>,
    ) -> EmberResult<()> {
        if let Err(e) = host.register_dispatcher(ResourceKind::Timer, TIMER_ENTRY_POINT) {
            warn!(timer_id = id, error = %e, "Failed to register timer dispatcher");
            host.log(
                Level::WARN,
                &format!("Failed to register timer dispatcher: timer_id={id}: {e}"),
            );
            return Err(e);
        }
        self.timers.borrow_mut().register(id, callback)
    }

    /// Remove a timer callback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::InvalidArgument`] if `id` is out of range.
    pub fn unregister_timer(&self, id: i32) -> EmberResult<()> {
        self.timers.borrow_mut().unregister(id)
    }

    /// Register a GPIO callback, returning its slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::HostCallFailed`] if the host refuses the
    /// GPIO dispatcher, otherwise whatever [`GpioRegistry::register`] returns.
    pub fn register_gpio(
        &self,
        host: &(impl Host + ?Sized),
        pin: i32,
        port: i32,
        callback: Option<Callback>,
    ) -> EmberResult<usize> {
        if let Err(e) = host.register_dispatcher(ResourceKind::Gpio, GPIO_ENTRY_POINT) {
            warn!(pin, port, error = %e, "Failed to register GPIO dispatcher");
            host.log(
                Level::WARN,
                &format!("Failed to register GPIO dispatcher: pin={pin}, port={port}: {e}"),
            );
            return Err(e);
        }
        self.gpio.borrow_mut().register(pin, port, callback)
    }

    /// Remove a GPIO callback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::NotFound`] if (pin, port) has no callback.
    pub fn unregister_gpio(&self, pin: i32, port: i32) -> EmberResult<()> {
        self.gpio.borrow_mut().unregister(pin, port)
    }

    /// Invoke the callback registered for timer `id`. A miss is reported to
    /// the host journal.
    pub fn dispatch_timer(&self, host: &(impl Host + ?Sized), id: i32) -> DispatchOutcome {
        let callback = self.timers.borrow().lookup(id);
        match callback {
            Some(callback) => {
                debug!(timer_id = id, "Executing timer callback");
                callback.invoke();
                DispatchOutcome::Invoked
            },
            None => {
                debug!(timer_id = id, "No timer callback registered");
                host.log(
                    Level::DEBUG,
                    &format!("No timer callback registered: timer_id={id}"),
                );
                DispatchOutcome::NoHandler
            },
        }
    }

    /// Invoke the callback registered for (pin, port). `state` is only
    /// reported; callbacks receive no payload.
    pub fn dispatch_gpio(
        &self,
        host: &(impl Host + ?Sized),
        pin: i32,
        state: i32,
        port: i32,
    ) -> DispatchOutcome {
        debug!(pin, port, state, "GPIO event triggered");
        let callback = self.gpio.borrow().lookup_first(pin, port);
        match callback {
            Some(callback) => {
                debug!(pin, port, "Executing GPIO callback");
                callback.invoke();
                DispatchOutcome::Invoked
            },
            None => {
                debug!(pin, port, "No GPIO callback registered");
                host.log(
                    Level::DEBUG,
                    &format!("No GPIO callback registered: pin={pin}, port={port}"),
                );
                DispatchOutcome::NoHandler
            },
        }
    }

    /// Dispatch a routed record. `None` for [`Route::Unrouted`].
    pub fn dispatch(&self, host: &(impl Host + ?Sized), route: Route) -> Option<DispatchOutcome> {
        match route {
            Route::Timer { id } => Some(self.dispatch_timer(host, id)),
            Route::Gpio { pin, state, port } => {
                Some(self.dispatch_gpio(host, pin, state.code(), port))
            },
            Route::Unrouted => None,
        }
    }

    /// Read access to the timer registry.
    ///
    /// # Panics
    ///
    /// The returned guard holds a shared borrow. Registering or unregistering
    /// a timer callback while it is alive panics with a `BorrowMutError`.
    #[must_use]
    pub fn timers(&self) -> Ref<'_, TimerRegistry> {
        self.timers.borrow()
    }

    /// Read access to the GPIO registry.
    ///
    /// # Panics
    ///
    /// The returned guard holds a shared borrow. Registering or unregistering
    /// a GPIO callback while it is alive panics with a `BorrowMutError`.
    #[must_use]
    pub fn gpio(&self) -> Ref<'_, GpioRegistry> {
        self.gpio.borrow()
    }
}
