//! Demo guest for the Ember device runtime.
//!
//! Counts ticks of timer 0 and presses of the button on pin 3, port 2, and
//! reports both to the device journal. Unregisters the button after
//! `MAX_PRESSES` presses.
//!
//! Built as a `cdylib` targeting `wasm32-unknown-unknown`. `#[ember_sdk::app]`
//! provides the `app_main`, `timer_callback`, `gpio_callback` and
//! `poll_events` exports.

use std::cell::Cell;

use ember_sdk::prelude::*;

const TICK_TIMER: i32 = 0;
const BUTTON_PIN: i32 = 3;
const BUTTON_PORT: i32 = 2;
const MAX_PRESSES: u32 = 10;

thread_local! {
    static TICKS: Cell<u32> = const { Cell::new(0) };
    static PRESSES: Cell<u32> = const { Cell::new(0) };
}

#[cfg(target_arch = "wasm32")]
fn journal(message: &str) {
    if let Err(e) = sys::log("info", message) {
        tracing::warn!(error = %e, "journal write failed");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn journal(message: &str) {
    tracing::info!("{message}");
}

extern "C" fn on_tick() {
    let ticks = TICKS.with(|t| {
        let next = t.get().wrapping_add(1);
        t.set(next);
        next
    });
    journal(&format!("tick {ticks}"));
}

fn on_button() {
    let presses = PRESSES.with(|p| {
        let next = p.get().saturating_add(1);
        p.set(next);
        next
    });
    journal(&format!("button pressed {presses} times"));

    if presses >= MAX_PRESSES
        && let Err(e) = unregister_gpio_callback(BUTTON_PIN, BUTTON_PORT)
    {
        journal(&format!("failed to release button: {e}"));
    }
}

#[ember_sdk::app]
fn start() -> EmberResult<()> {
    ember_sdk::register_timer_callback_raw(TICK_TIMER, Some(on_tick))?;
    register_gpio_callback(BUTTON_PIN, BUTTON_PORT, on_button)?;
    journal("demo guest ready");
    Ok(())
}
