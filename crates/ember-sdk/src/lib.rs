//! Guest SDK for Ember device applications.
//!
//! An application registers callbacks for timer expiry and GPIO level
//! changes; the device runtime reports those events either by calling the
//! guest's exports directly or by queueing them for [`poll`]. This crate
//! holds the callback registries, the routing from events to callbacks and
//! the bounded event pump, on top of the raw imports in `ember-sys`.
//!
//! ```rust,ignore
//! use ember_sdk::prelude::*;
//!
//! #[ember_sdk::app]
//! fn start() -> EmberResult<()> {
//!     register_timer_callback(0, || tracing::info!("tick"))?;
//!     register_gpio_callback(3, 2, || tracing::info!("button"))?;
//!     Ok(())
//! }
//! ```

#![allow(unsafe_code)]
#![allow(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod callback;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod host;
pub mod pump;
pub mod registry;
pub mod runtime;

pub use callback::Callback;
pub use config::PumpConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{EmberError, EmberResult, IntoStatus, Status};
pub use event::{EventFrame, EventRecord, MalformedEvent, PinState, RawEvent, ResourceKind, Route};
pub use host::{Host, Level, journal_level};
pub use pump::{EventPump, PumpReport};
pub use registry::{CAPACITY, GpioRegistry, TimerRegistry};
pub use runtime::{
    PAUSE_MS, Runtime, install_host, is_initialized, on_gpio_changed, on_timer_fired, pause,
    poll, register_gpio_callback, register_gpio_callback_raw, register_timer_callback,
    register_timer_callback_raw, sleep, unregister_gpio_callback, unregister_timer_callback,
    with_runtime,
};

#[cfg(feature = "derive")]
pub use ember_sdk_macros::app;

/// Direct access to the device journal and configuration store.
#[cfg(target_arch = "wasm32")]
pub mod sys {
    use ember_sys::{ember_get_config, ember_log};

    use crate::error::EmberError;

    pub fn log(level: impl AsRef<[u8]>, message: impl AsRef<[u8]>) -> Result<(), EmberError> {
        unsafe { ember_log(level.as_ref().to_vec(), message.as_ref().to_vec())? };
        Ok(())
    }

    pub fn get_config_bytes(key: impl AsRef<[u8]>) -> Result<Vec<u8>, EmberError> {
        let result = unsafe { ember_get_config(key.as_ref().to_vec())? };
        Ok(result)
    }

    pub fn get_config_string(key: impl AsRef<[u8]>) -> Result<String, EmberError> {
        let bytes = get_config_bytes(key)?;
        String::from_utf8(bytes).map_err(|e| EmberError::InvalidConfig {
            field: "value".to_owned(),
            message: e.to_string(),
        })
    }
}

pub mod prelude {
    pub use crate::{
        Callback, EmberError, EmberResult, PinState, Status, on_gpio_changed, on_timer_fired,
        pause, poll, register_gpio_callback, register_timer_callback, sleep,
        unregister_gpio_callback, unregister_timer_callback,
    };

    #[cfg(target_arch = "wasm32")]
    pub use crate::sys;

    #[cfg(feature = "derive")]
    pub use ember_sdk_macros::app;
}
