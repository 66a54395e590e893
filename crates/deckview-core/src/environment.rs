#![forbid(unsafe_code)]

//! Host capability seam and the element locator built on it.
//!
//! The core never touches `window`, `document` or `location` directly. The
//! host passes an [`Environment`] in, which keeps the bridge, the deep-link
//! resolver and the whole startup sequence runnable against
//! [`HeadlessPage`](crate::HeadlessPage).

use crate::element::{ElementId, ScrollBehavior};

/// Ambient page state and the DOM operations the bootstrap needs.
///
/// Implementations are single-threaded; callbacks registered through
/// [`on_page_load`](Self::on_page_load) run on the host's event loop.
pub trait Environment {
    /// Host element handle. Cloning must be cheap (a reference, not a copy).
    type Element: Clone;

    /// Value of query parameter `name` in the current page URL.
    fn query_parameter(&self, name: &str) -> Option<String>;

    /// Element whose identity attribute equals `id`, anywhere in the document.
    fn find_element_by_id(&self, id: &ElementId) -> Option<Self::Element>;

    /// Whether `element` is `root` or one of its descendants.
    fn contains(&self, root: &Self::Element, element: &Self::Element) -> bool;

    /// Container matched by a CSS `selector`, used as the UI mount point.
    fn find_mount_point(&self, selector: &str) -> Option<Self::Element>;

    /// Bring `element` into the viewport.
    ///
    /// Never cancels an animation already in progress; a later call simply
    /// becomes the final destination.
    fn scroll_into_view(&self, element: &Self::Element, behavior: ScrollBehavior);

    /// Run `callback` once after the page's full load event.
    ///
    /// If the page has already loaded, the callback runs on a later tick,
    /// never synchronously from this call.
    fn on_page_load(&self, callback: Box<dyn FnOnce()>);
}

/// Resolves an [`ElementId`] to a host element.
///
/// Not finding the element is an expected outcome (the card may simply not
/// be rendered), so [`locate`](Self::locate) returns `Option` rather than an
/// error.
#[derive(Debug, Clone)]
pub struct ElementLocator<E> {
    scope: Option<E>,
}

impl<E: Clone> ElementLocator<E> {
    /// Search the whole document.
    #[must_use]
    pub const fn document() -> Self {
        Self { scope: None }
    }

    /// Only accept matches inside `root` (the UI framework's sub-root).
    #[must_use]
    pub const fn within(root: E) -> Self {
        Self { scope: Some(root) }
    }

    #[must_use]
    pub fn scope(&self) -> Option<&E> {
        self.scope.as_ref()
    }

    pub fn locate<Env>(&self, env: &Env, id: &ElementId) -> Option<E>
    where
        Env: Environment<Element = E> + ?Sized,
    {
        let element = env.find_element_by_id(id)?;
        match &self.scope {
            Some(root) if !env.contains(root, &element) => None,
            _ => Some(element),
        }
    }
}

impl<E: Clone> Default for ElementLocator<E> {
    fn default() -> Self {
        Self::document()
    }
}
