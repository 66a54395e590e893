#![forbid(unsafe_code)]

//! Scroll bridge: turns scroll-target commands into native scrolling.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::element::{ElementId, ScrollBehavior, ScrollRequest};
use crate::environment::{ElementLocator, Environment};
use crate::port::{CommandPort, SubscriptionId};

/// Result of handling one [`ScrollRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollOutcome {
    Scrolled(ElementId),
    /// No element carries the id right now. Not an error.
    NotFound(ElementId),
}

impl ScrollOutcome {
    #[must_use]
    pub const fn scrolled(&self) -> bool {
        matches!(self, Self::Scrolled(_))
    }
}

/// Locate-then-scroll action shared by the command subscription and the
/// deep-link resolver.
///
/// Each request is handled to completion immediately. Nothing is queued,
/// deduplicated or cancelled: when requests arrive faster than the
/// animation, the most recent target is where the page ends up.
pub struct ScrollBridge<E: Environment> {
    env: Rc<E>,
    locator: ElementLocator<E::Element>,
    behavior: ScrollBehavior,
    scrolled: Cell<u64>,
    missed: Cell<u64>,
}

impl<E: Environment> core::fmt::Debug for ScrollBridge<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScrollBridge")
            .field("behavior", &self.behavior)
            .field("scoped", &self.locator.scope().is_some())
            .field("scrolled", &self.scrolled.get())
            .field("missed", &self.missed.get())
            .finish()
    }
}

impl<E: Environment + 'static> ScrollBridge<E> {
    #[must_use]
    pub fn new(env: Rc<E>, behavior: ScrollBehavior) -> Self {
        Self::with_locator(env, ElementLocator::document(), behavior)
    }

    #[must_use]
    pub fn with_locator(
        env: Rc<E>,
        locator: ElementLocator<E::Element>,
        behavior: ScrollBehavior,
    ) -> Self {
        Self {
            env,
            locator,
            behavior,
            scrolled: Cell::new(0),
            missed: Cell::new(0),
        }
    }

    #[must_use]
    pub const fn behavior(&self) -> ScrollBehavior {
        self.behavior
    }

    /// Number of requests that found their target.
    #[must_use]
    pub fn scrolled_total(&self) -> u64 {
        self.scrolled.get()
    }

    /// Number of requests whose target was absent.
    #[must_use]
    pub fn missed_total(&self) -> u64 {
        self.missed.get()
    }

    pub fn handle(&self, request: &ScrollRequest) -> ScrollOutcome {
        let Some(element) = self.locator.locate(self.env.as_ref(), &request.target) else {
            self.missed.set(self.missed.get().saturating_add(1));
            trace!(
                target: "deckview::bridge",
                id = %request.target,
                origin = request.origin.as_str(),
                "scroll target not found"
            );
            return ScrollOutcome::NotFound(request.target.clone());
        };
        self.env.scroll_into_view(&element, self.behavior);
        self.scrolled.set(self.scrolled.get().saturating_add(1));
        debug!(
            target: "deckview::bridge",
            id = %request.target,
            origin = request.origin.as_str(),
            behavior = self.behavior.as_str(),
            "scrolled into view"
        );
        ScrollOutcome::Scrolled(request.target.clone())
    }

    /// Subscribe to the UI application's scroll-target port.
    ///
    /// Commands the port buffered before this call are handled before it
    /// returns.
    pub fn attach(self: &Rc<Self>, port: &CommandPort) -> SubscriptionId {
        let bridge = Rc::clone(self);
        port.subscribe(move |id| {
            let _ = bridge.handle(&ScrollRequest::command(id.clone()));
        })
    }
}
