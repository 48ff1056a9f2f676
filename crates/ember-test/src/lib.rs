//! Ember Test - Shared test utilities for the Ember device guest SDK.
//!
//! This crate provides a scriptable [`MockHost`], event fixtures and
//! call-counting callbacks that can be used across Ember crates as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ember_test::{MockHost, CallCounter, timer_event, on_fresh_thread};
//!
//! #[test]
//! fn timer_fires() {
//!     on_fresh_thread(|| {
//!         let host = MockHost::new().with_event(timer_event(5));
//!         ember_sdk::install_host(host.clone());
//!
//!         let counter = CallCounter::new();
//!         ember_sdk::register_timer_callback(5, counter.callback()).unwrap();
//!         ember_sdk::poll();
//!
//!         assert_eq!(counter.count(), 1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `ember_sdk=debug`.
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ember_sdk=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Run `f` on a new thread and return its result.
///
/// The SDK runtime is thread-local, so every call starts from empty
/// registries with no host installed. Panics inside `f` are re-raised.
pub fn on_fresh_thread<R: Send + 'static>(f: impl FnOnce() -> R + Send + 'static) -> R {
    match std::thread::spawn(f).join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
