//! The seam between the SDK and the device runtime.
//!
//! Everything the core needs from the outside world goes through [`Host`].
//! Inside the sandbox the implementation is [`ExtismHost`], which calls the
//! raw imports in `ember-sys`. Native builds default to [`DetachedHost`];
//! tests install a mock.

pub use tracing::Level;

use crate::error::EmberResult;
use crate::event::{RawEvent, ResourceKind};

/// Name the device journal uses for `level`.
#[must_use]
pub fn journal_level(level: Level) -> &'static str {
    if level == Level::ERROR {
        "error"
    } else if level == Level::WARN {
        "warn"
    } else if level == Level::INFO {
        "info"
    } else if level == Level::DEBUG {
        "debug"
    } else {
        "trace"
    }
}

/// Services the device runtime provides to the guest.
pub trait Host {
    /// Bind `kind` to the guest export named `entry_point`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EmberError::HostCallFailed`] carrying the runtime's
    /// status when it refuses.
    fn register_dispatcher(&self, kind: ResourceKind, entry_point: &str) -> EmberResult<()>;

    /// Next pending event, or `None` when the runtime has nothing queued.
    fn fetch_event(&self) -> Option<RawEvent>;

    /// Yield the guest for `duration_ms`. Returns once the time has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime rejects the request.
    fn suspend(&self, duration_ms: u32) -> EmberResult<()>;

    /// Raw configuration value for `key`, `None` when unset.
    fn get_config(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    /// Write a diagnostic to the device journal. Best effort.
    fn log(&self, _level: Level, _message: &str) {}
}

impl<H: Host + ?Sized> Host for &H {
    fn register_dispatcher(&self, kind: ResourceKind, entry_point: &str) -> EmberResult<()> {
        (**self).register_dispatcher(kind, entry_point)
    }

    fn fetch_event(&self) -> Option<RawEvent> {
        (**self).fetch_event()
    }

    fn suspend(&self, duration_ms: u32) -> EmberResult<()> {
        (**self).suspend(duration_ms)
    }

    fn get_config(&self, key: &str) -> Option<Vec<u8>> {
        (**self).get_config(key)
    }

    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }
}

/// Host used outside the sandbox when nothing else was installed.
///
/// It has no event source and refuses dispatcher registration, so callbacks
/// can only be registered after a real host is installed.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

#[cfg(not(target_arch = "wasm32"))]
impl Host for DetachedHost {
    fn register_dispatcher(&self, kind: ResourceKind, _entry_point: &str) -> EmberResult<()> {
        Err(crate::EmberError::HostCallFailed {
            kind,
            status: crate::Status::Invalid.code(),
        })
    }

    fn fetch_event(&self) -> Option<RawEvent> {
        None
    }

    fn suspend(&self, duration_ms: u32) -> EmberResult<()> {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(duration_ms)));
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use self::extism::ExtismHost;

#[cfg(target_arch = "wasm32")]
mod extism {
    use ember_sys::{
        ember_fetch_event, ember_get_config, ember_log, ember_register_dispatcher, ember_sleep,
    };
    use tracing::warn;

    use super::{Host, Level, journal_level};
    use crate::error::{EmberError, EmberResult};
    use crate::event::{EventFrame, RawEvent, ResourceKind};

    /// Host backed by the runtime's imports.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ExtismHost;

    fn decode_status(bytes: &[u8]) -> EmberResult<i32> {
        Ok(borsh::from_slice::<i32>(bytes)?)
    }

    impl Host for ExtismHost {
        fn register_dispatcher(&self, kind: ResourceKind, entry_point: &str) -> EmberResult<()> {
            let kind_bytes = borsh::to_vec(&kind.code())?;
            let result =
                unsafe { ember_register_dispatcher(kind_bytes, entry_point.as_bytes().to_vec())? };
            match decode_status(&result)? {
                0 => Ok(()),
                status => Err(EmberError::HostCallFailed { kind, status }),
            }
        }

        fn fetch_event(&self) -> Option<RawEvent> {
            let bytes = match unsafe { ember_fetch_event() } {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Event fetch failed");
                    return None;
                },
            };
            match EventFrame::decode(&bytes) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, len = bytes.len(), "Undecodable event frame");
                    None
                },
            }
        }

        fn suspend(&self, duration_ms: u32) -> EmberResult<()> {
            let result = unsafe { ember_sleep(borsh::to_vec(&duration_ms)?)? };
            match decode_status(&result)? {
                0 => Ok(()),
                status => Err(EmberError::SuspendFailed { status }),
            }
        }

        fn get_config(&self, key: &str) -> Option<Vec<u8>> {
            match unsafe { ember_get_config(key.as_bytes().to_vec()) } {
                Ok(bytes) if bytes.is_empty() => None,
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(key, error = %e, "Config lookup failed");
                    None
                },
            }
        }

        fn log(&self, level: Level, message: &str) {
            // Nowhere left to report a journal failure.
            let _ = unsafe {
                ember_log(
                    journal_level(level).as_bytes().to_vec(),
                    message.as_bytes().to_vec(),
                )
            };
        }
    }
}
