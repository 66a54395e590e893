#![forbid(unsafe_code)]

//! `deckview-core` is the host-agnostic half of the DeckView page bootstrap.
//!
//! Design goals:
//! - **Injected environment**: every DOM and location access goes through the
//!   [`Environment`] capability, so the whole startup sequence runs natively
//!   against [`HeadlessPage`].
//! - **One-shot startup**: [`Bootstrap`] mounts the UI application, wires the
//!   scroll bridge, arms the deep link and decides the service-worker action,
//!   in that order and exactly once.
//! - **Single-threaded**: shared state is `Rc`/`RefCell`; nothing here blocks.
//!
//! The browser bindings live in `deckview-web`, which implements
//! [`Environment`], [`UiAppFactory`] and [`ServiceWorkerHook`] on top of
//! `web-sys`.

pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod deep_link;
pub mod element;
pub mod environment;
pub mod error;
pub mod flags;
pub mod headless;
pub mod port;

pub use bootstrap::{BootPhase, Bootstrap, BootedPage, ServiceWorkerAction, ServiceWorkerHook};
pub use bootstrap::{UiAppFactory, UiApplication};
pub use bridge::{ScrollBridge, ScrollOutcome};
pub use config::{BootConfig, ConfigError, DataShape};
pub use deep_link::{DeepLinkOutcome, DeepLinkResolver};
pub use element::{ElementId, ScrollBehavior, ScrollOrigin, ScrollRequest};
pub use environment::{ElementLocator, Environment};
pub use error::BootError;
pub use flags::Flags;
pub use headless::{HeadlessElement, HeadlessPage, ScrollRecord};
pub use port::{CommandPort, PortStats, SubscriptionId};

/// Query parameter carrying the card to scroll to on load.
pub const CARD_ID_PARAM: &str = "cardId";
