//! Procedural macros for building Ember device guests.
//!
//! This crate provides the `#[ember_sdk::app]` attribute, which turns an
//! application's setup function into a guest module: it emits the
//! WebAssembly exports the device runtime calls and routes them into the
//! SDK's registries.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

/// Marks the setup function of an Ember guest.
///
/// The function must take no arguments and return `()`, an
/// `ember_sdk::Status`, or an `EmberResult<T>`. The
/// attribute keeps the function and adds the exports:
///
/// | Export           | Calls                            |
/// |------------------|----------------------------------|
/// | `app_main`       | the annotated function           |
/// | `timer_callback` | `ember_sdk::on_timer_fired`      |
/// | `gpio_callback`  | `ember_sdk::on_gpio_changed`     |
/// | `poll_events`    | `ember_sdk::poll`                |
#[proc_macro_attribute]
pub fn app(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let sig = &input.sig;
    if let Some(arg) = sig.inputs.first() {
        return Err(syn::Error::new_spanned(
            arg,
            "#[ember_sdk::app] function must not take arguments",
        ));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "#[ember_sdk::app] function must not be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[ember_sdk::app] function must not be generic",
        ));
    }

    let name = &sig.ident;

    // Export names must stay in sync with the entry point constants in
    // `ember_sdk::dispatcher`; the host resolves them by string.
    Ok(quote! {
        #input

        #[allow(unsafe_code)]
        #[doc(hidden)]
        #[unsafe(export_name = "app_main")]
        pub extern "C" fn __ember_app_main() -> i32 {
            ::ember_sdk::IntoStatus::into_status(#name())
        }

        #[allow(unsafe_code)]
        #[doc(hidden)]
        #[unsafe(export_name = "timer_callback")]
        pub extern "C" fn __ember_timer_callback(timer_id: i32) {
            let _ = ::ember_sdk::on_timer_fired(timer_id);
        }

        #[allow(unsafe_code)]
        #[doc(hidden)]
        #[unsafe(export_name = "gpio_callback")]
        pub extern "C" fn __ember_gpio_callback(pin: i32, state: i32, port: i32) {
            let _ = ::ember_sdk::on_gpio_changed(pin, state, port);
        }

        #[allow(unsafe_code)]
        #[doc(hidden)]
        #[unsafe(export_name = "poll_events")]
        pub extern "C" fn __ember_poll_events() {
            let _ = ::ember_sdk::poll();
        }
    })
}
