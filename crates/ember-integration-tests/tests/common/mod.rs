//! Shared helpers for the integration tests.

#![allow(dead_code)]

use ember_sdk::install_host;
use ember_test::{MockHost, init_test_tracing};

/// Install a fresh mock host into this thread's runtime and hand back a
/// handle sharing its state.
pub fn install(host: MockHost) -> MockHost {
    init_test_tracing();
    assert!(install_host(host.clone()), "runtime already initialized");
    host
}
