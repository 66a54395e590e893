#![forbid(unsafe_code)]

//! `web-sys` implementation of the core [`Environment`].

use deckview_core::{ElementId, Environment, ScrollBehavior};
use tracing::{trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, Node, ScrollIntoViewOptions, ScrollLogicalPosition,
    UrlSearchParams, Window,
};

/// The live page: `window`, `document` and `location`.
#[derive(Debug, Clone)]
pub struct DomEnvironment {
    window: Window,
    document: Document,
}

impl DomEnvironment {
    /// Bind to the global `window`. Fails outside a window context (workers).
    pub fn from_window() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self { window, document })
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn web_behavior(behavior: ScrollBehavior) -> web_sys::ScrollBehavior {
    match behavior {
        ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
    }
}

impl Environment for DomEnvironment {
    type Element = Element;

    fn query_parameter(&self, name: &str) -> Option<String> {
        let search = self.window.location().search().ok()?;
        UrlSearchParams::new_with_str(&search).ok()?.get(name)
    }

    fn find_element_by_id(&self, id: &ElementId) -> Option<Element> {
        self.document.get_element_by_id(id.as_str())
    }

    fn contains(&self, root: &Element, element: &Element) -> bool {
        let node: &Node = element;
        root.contains(Some(node))
    }

    fn find_mount_point(&self, selector: &str) -> Option<Element> {
        // An invalid selector throws in the browser; treat it as "no match".
        self.document.query_selector(selector).ok().flatten()
    }

    fn scroll_into_view(&self, element: &Element, behavior: ScrollBehavior) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(web_behavior(behavior));
        options.set_block(ScrollLogicalPosition::Start);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn on_page_load(&self, callback: Box<dyn FnOnce()>) {
        let listener = Closure::once_into_js(move || callback());
        let function: &js_sys::Function = listener.unchecked_ref();

        // A module loaded with `await init()` can start after `load` already
        // fired; a listener added then would never run, so defer a tick instead.
        if self.document.ready_state() == "complete" {
            trace!(target: "deckview::dom", "page already loaded, deferring callback");
            if self.window.set_timeout_with_callback(function).is_err() {
                warn!(target: "deckview::dom", "setTimeout rejected load callback");
            }
            return;
        }

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if self
            .window
            .add_event_listener_with_callback_and_add_event_listener_options(
                "load", function, &options,
            )
            .is_err()
        {
            warn!(target: "deckview::dom", "failed to add load listener");
        }
    }
}
