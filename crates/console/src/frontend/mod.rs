//! Leptos frontend for the browser build.

pub mod app;
pub mod layout;
pub mod pages;

use wasm_bindgen::prelude::*;

/// WASM entry point, run when the module loads.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(app::App);
}

/// Blocking browser prompt; a missing window counts as "no".
pub(crate) fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}
