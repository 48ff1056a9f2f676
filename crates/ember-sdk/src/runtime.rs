//! Process-wide runtime behind the registration API and the exported entry
//! points.
//!
//! The guest executes on a single thread, so the runtime lives in a
//! thread-local [`OnceCell`] and is created on first use. It is only sound
//! under that single-threaded assumption: a runtime that calls into the guest
//! from several threads must serialize those calls itself.

use std::cell::OnceCell;

use tracing::debug;

use crate::callback::Callback;
use crate::config::PumpConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::EmberResult;
use crate::host::Host;
use crate::pump::{EventPump, PumpReport};

/// Duration used by [`pause`]: long enough to mean "until woken".
pub const PAUSE_MS: u32 = 9_999_999;

thread_local! {
    static RUNTIME: OnceCell<Runtime> = const { OnceCell::new() };
}

/// Host, registries and pump for one guest instance.
pub struct Runtime {
    host: Box<dyn Host>,
    dispatcher: Dispatcher,
    pump: EventPump,
}

impl Runtime {
    /// Build a runtime on `host`, reading pump settings from its config.
    pub fn new(host: impl Host + 'static) -> Self {
        let pump = EventPump::new(PumpConfig::load(&host));
        Self {
            host: Box::new(host),
            dispatcher: Dispatcher::new(),
            pump,
        }
    }

    #[must_use]
    pub fn host(&self) -> &dyn Host {
        &*self.host
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn pump(&self) -> &EventPump {
        &self.pump
    }

    /// One event pump invocation.
    pub fn poll(&self) -> PumpReport {
        self.pump.run(self.host(), &self.dispatcher)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("dispatcher", &self.dispatcher)
            .field("pump", &self.pump)
            .finish_non_exhaustive()
    }
}

#[cfg(target_arch = "wasm32")]
fn default_host() -> crate::host::ExtismHost {
    crate::host::ExtismHost
}

#[cfg(not(target_arch = "wasm32"))]
fn default_host() -> crate::host::DetachedHost {
    crate::host::DetachedHost
}

/// Use `host` for this guest instead of the default.
///
/// Only effective before anything else touched the runtime; returns whether
/// it was installed.
pub fn install_host(host: impl Host + 'static) -> bool {
    RUNTIME.with(|cell| {
        if cell.get().is_some() {
            return false;
        }
        cell.set(Runtime::new(host)).is_ok()
    })
}

/// Whether the runtime has been created on this thread.
#[must_use]
pub fn is_initialized() -> bool {
    RUNTIME.with(|cell| cell.get().is_some())
}

/// Run `f` against the runtime, creating it with the default host if needed.
pub fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
    RUNTIME.with(|cell| {
        let runtime = cell.get_or_init(|| {
            debug!("Initializing callback registries");
            Runtime::new(default_host())
        });
        f(runtime)
    })
}

// ---------------------------------------------------------------------------
// Registration API
// ---------------------------------------------------------------------------

/// Call `callback` whenever timer `id` fires. Replaces any previous callback.
///
/// # Errors
///
/// Returns [`crate::EmberError::HostCallFailed`] if the host refuses the
/// timer dispatcher and [`crate::EmberError::InvalidArgument`] if `id` is
/// outside `[0, CAPACITY)`.
pub fn register_timer_callback(id: i32, callback: impl Into<Callback>) -> EmberResult<()> {
    register_timer(id, Some(callback.into()))
}

/// [`register_timer_callback`] for a nullable C function pointer.
///
/// # Errors
///
/// As [`register_timer_callback`], plus
/// [`crate::EmberError::InvalidArgument`] when `callback` is null.
pub fn register_timer_callback_raw(id: i32, callback: Option<extern "C" fn()>) -> EmberResult<()> {
    register_timer(id, Callback::from_raw(callback))
}

fn register_timer(id: i32, callback: Option<Callback>) -> EmberResult<()> {
    with_runtime(|rt| rt.dispatcher.register_timer(rt.host(), id, callback))
}

/// Forget the callback for timer `id`. Succeeds if none was registered.
///
/// # Errors
///
/// Returns [`crate::EmberError::InvalidArgument`] if `id` is out of range.
pub fn unregister_timer_callback(id: i32) -> EmberResult<()> {
    with_runtime(|rt| rt.dispatcher.unregister_timer(id))
}

/// Call `callback` whenever (pin, port) changes level.
///
/// # Errors
///
/// Returns [`crate::EmberError::HostCallFailed`] if the host refuses the GPIO
/// dispatcher, [`crate::EmberError::InvalidArgument`] for a negative pin or
/// port, and [`crate::EmberError::ResourceExhausted`] when every slot holds
/// another key.
pub fn register_gpio_callback(pin: i32, port: i32, callback: impl Into<Callback>) -> EmberResult<()> {
    register_gpio(pin, port, Some(callback.into()))
}

/// [`register_gpio_callback`] for a nullable C function pointer.
///
/// # Errors
///
/// As [`register_gpio_callback`], plus
/// [`crate::EmberError::InvalidArgument`] when `callback` is null.
pub fn register_gpio_callback_raw(
    pin: i32,
    port: i32,
    callback: Option<extern "C" fn()>,
) -> EmberResult<()> {
    register_gpio(pin, port, Callback::from_raw(callback))
}

fn register_gpio(pin: i32, port: i32, callback: Option<Callback>) -> EmberResult<()> {
    with_runtime(|rt| {
        rt.dispatcher
            .register_gpio(rt.host(), pin, port, callback)
            .map(|_| ())
    })
}

/// Forget the callback for (pin, port).
///
/// # Errors
///
/// Returns [`crate::EmberError::NotFound`] if none is registered.
pub fn unregister_gpio_callback(pin: i32, port: i32) -> EmberResult<()> {
    with_runtime(|rt| rt.dispatcher.unregister_gpio(pin, port))
}

// ---------------------------------------------------------------------------
// Host entry points
// ---------------------------------------------------------------------------

/// Host notification that a timer expired. Dispatches immediately.
pub fn on_timer_fired(timer_id: i32) -> DispatchOutcome {
    with_runtime(|rt| rt.dispatcher.dispatch_timer(rt.host(), timer_id))
}

/// Host notification that a pin changed level. Dispatches immediately.
pub fn on_gpio_changed(pin: i32, state: i32, port: i32) -> DispatchOutcome {
    with_runtime(|rt| rt.dispatcher.dispatch_gpio(rt.host(), pin, state, port))
}

/// Host request to drain pending events.
pub fn poll() -> PumpReport {
    with_runtime(Runtime::poll)
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Suspend the guest for `duration_ms`.
///
/// # Errors
///
/// Returns an error if the host rejects the request.
pub fn sleep(duration_ms: u32) -> EmberResult<()> {
    with_runtime(|rt| rt.host().suspend(duration_ms))
}

/// Suspend the guest for [`PAUSE_MS`].
///
/// # Errors
///
/// Returns an error if the host rejects the request.
pub fn pause() -> EmberResult<()> {
    sleep(PAUSE_MS)
}
