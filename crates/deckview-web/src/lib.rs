#![forbid(unsafe_code)]

//! Browser host for the DeckView bootstrap.
//!
//! This crate wires `deckview-core` to a real page:
//!
//! - [`dom::DomEnvironment`] implements the core `Environment` on `web-sys`
//!   (`location.search`, `getElementById`, `scrollIntoView`, `load`).
//! - [`elm::ElmAppFactory`] starts `globalThis.Elm.<module>.init` and forwards
//!   the scroll port into a `CommandPort`.
//! - [`service_worker::BrowserServiceWorker`] registers or unregisters the
//!   offline-cache worker.
//! - [`console::ConsoleLayer`] routes `tracing` events to the JS console.
//!
//! JS entry point:
//!
//! ```js
//! import init, { boot } from "./pkg/deckview_web.js";
//! import cards from "./cards.json";
//! await init();
//! const view = boot(JSON.stringify({ mount_selector: "#app div" }), JSON.stringify(cards));
//! ```
//!
//! Only [`console`] compiles on native targets; everything touching the DOM
//! is `wasm32`-only.

pub mod console;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod elm;
#[cfg(target_arch = "wasm32")]
pub mod service_worker;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DeckView, boot};
