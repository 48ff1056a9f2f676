//! Raw host imports for Ember device guests.
//!
//! This crate declares the lowest-level ABI between a guest module and the
//! device runtime that hosts it. Every parameter and return value crossing the
//! WASM boundary is raw bytes (`Vec<u8>`); integers travel little-endian and
//! structured records travel as borsh frames. Decoding and validation belong
//! to `ember-sdk`.
//!
//! Status values returned by the host are a little-endian `i32`, `0` meaning
//! success.

#![allow(unsafe_code)]
#![allow(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use extism_pdk::*;

#[host_fn]
extern "ExtismHost" {
    // -----------------------------------------------------------------------
    // Event delivery
    // -----------------------------------------------------------------------
    /// Bind a resource kind (`i32` LE) to the name of a guest export the
    /// runtime calls when an event of that kind fires. Returns a status.
    pub fn ember_register_dispatcher(kind: Vec<u8>, entry_point: Vec<u8>) -> Vec<u8>;
    /// Pop the next pending event as a 20 byte frame
    /// (`status, type, id, port, state`). Empty or nonzero status: no event.
    pub fn ember_fetch_event() -> Vec<u8>;

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------
    /// Suspend the guest for `duration_ms` (`u32` LE). Returns a status.
    pub fn ember_sleep(duration_ms: Vec<u8>) -> Vec<u8>;

    // -----------------------------------------------------------------------
    // Journal & Configuration
    // -----------------------------------------------------------------------
    /// Log a message to the device journal.
    pub fn ember_log(level: Vec<u8>, message: Vec<u8>);
    /// Get a configuration value. Empty when unset.
    pub fn ember_get_config(key: Vec<u8>) -> Vec<u8>;
}
