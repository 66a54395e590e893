#![forbid(unsafe_code)]

//! In-memory [`Environment`] for native tests and tooling.
//!
//! `HeadlessPage` models just enough of a browser page for the bootstrap:
//! a URL, a tree of elements keyed by identity attribute, selector-addressed
//! mount points, a load event and a log of scroll calls. The host drives it
//! explicitly: tests insert elements, change the URL and call
//! [`HeadlessPage::fire_load`] when the page should be considered loaded.
//! Load callbacks registered after that are held until
//! [`HeadlessPage::run_deferred`], which stands in for the next event-loop
//! tick.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use url::Url;

use crate::element::{ElementId, ScrollBehavior};
use crate::environment::Environment;

const RELATIVE_BASE: &str = "http://headless.invalid/";

/// Handle to an element in a [`HeadlessPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessElement {
    node: usize,
    id: String,
}

impl HeadlessElement {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One recorded `scroll_into_view` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRecord {
    pub target: String,
    pub behavior: ScrollBehavior,
}

#[derive(Debug)]
struct Node {
    id: String,
    parent: Option<usize>,
    attached: bool,
}

#[derive(Default)]
struct PageState {
    url: String,
    nodes: Vec<Node>,
    selectors: HashMap<String, usize>,
    load_callbacks: Vec<Box<dyn FnOnce()>>,
    deferred: Vec<Box<dyn FnOnce()>>,
    loaded: bool,
    scrolls: Vec<ScrollRecord>,
}

/// Host-driven page double. Clones share the same page.
#[derive(Clone, Default)]
pub struct HeadlessPage {
    state: Rc<RefCell<PageState>>,
}

impl core::fmt::Debug for HeadlessPage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessPage")
            .field("url", &state.url)
            .field("nodes", &state.nodes.len())
            .field("loaded", &state.loaded)
            .field("pending_load_callbacks", &state.load_callbacks.len())
            .field("deferred", &state.deferred.len())
            .field("scrolls", &state.scrolls.len())
            .finish()
    }
}

impl HeadlessPage {
    /// Create a page at `url`. Relative URLs such as `?cardId=a` are accepted.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let page = Self::default();
        page.state.borrow_mut().url = url.to_owned();
        page
    }

    /// Replace the page URL. Query parameters are re-read on every lookup.
    pub fn set_url(&self, url: &str) {
        self.state.borrow_mut().url = url.to_owned();
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.state.borrow().url.clone()
    }

    /// Attach a new element with identity attribute `id` under `parent`.
    ///
    /// A missing or detached `parent` attaches the element at document level.
    /// Duplicate ids are allowed; lookups return the first attached match.
    pub fn insert_element(&self, id: &str, parent: Option<&str>) -> HeadlessElement {
        let mut state = self.state.borrow_mut();
        let parent = parent.and_then(|pid| first_attached(&state.nodes, pid));
        let node = state.nodes.len();
        state.nodes.push(Node {
            id: id.to_owned(),
            parent,
            attached: true,
        });
        HeadlessElement {
            node,
            id: id.to_owned(),
        }
    }

    /// Detach the first attached element with `id` and its whole subtree.
    ///
    /// Returns `false` when no such element is attached.
    pub fn remove_element(&self, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(root) = first_attached(&state.nodes, id) else {
            return false;
        };
        let doomed: Vec<usize> = (0..state.nodes.len())
            .filter(|&idx| is_ancestor_or_self(&state.nodes, root, idx))
            .collect();
        for idx in doomed {
            state.nodes[idx].attached = false;
        }
        true
    }

    /// Make `selector` resolve to `element` in [`Environment::find_mount_point`].
    pub fn register_selector(&self, selector: &str, element: &HeadlessElement) {
        self.state
            .borrow_mut()
            .selectors
            .insert(selector.to_owned(), element.node);
    }

    /// Dispatch the load event.
    ///
    /// Callbacks run once, in registration order. Later calls are no-ops;
    /// callbacks registered after the first call are deferred instead.
    pub fn fire_load(&self) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            if state.loaded {
                return;
            }
            state.loaded = true;
            std::mem::take(&mut state.load_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Run callbacks registered after load, in registration order.
    ///
    /// Returns how many ran. Callbacks deferred while these run wait for the
    /// next call.
    pub fn run_deferred(&self) -> usize {
        let callbacks = std::mem::take(&mut self.state.borrow_mut().deferred);
        let ran = callbacks.len();
        for callback in callbacks {
            callback();
        }
        ran
    }

    #[must_use]
    pub fn deferred_callbacks(&self) -> usize {
        self.state.borrow().deferred.len()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    #[must_use]
    pub fn pending_load_callbacks(&self) -> usize {
        self.state.borrow().load_callbacks.len()
    }

    /// Every scroll call so far, oldest first.
    #[must_use]
    pub fn scroll_log(&self) -> Vec<ScrollRecord> {
        self.state.borrow().scrolls.clone()
    }

    /// Final scroll destination: the target of the most recent scroll call.
    #[must_use]
    pub fn viewport_target(&self) -> Option<String> {
        self.state
            .borrow()
            .scrolls
            .last()
            .map(|record| record.target.clone())
    }

    fn parsed_url(&self) -> Option<Url> {
        let raw = self.state.borrow().url.clone();
        Url::parse(&raw)
            .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(&raw)))
            .ok()
    }
}

fn first_attached(nodes: &[Node], id: &str) -> Option<usize> {
    nodes.iter().position(|node| node.attached && node.id == id)
}

fn is_ancestor_or_self(nodes: &[Node], ancestor: usize, mut node: usize) -> bool {
    loop {
        if node == ancestor {
            return true;
        }
        match nodes[node].parent {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}

impl Environment for HeadlessPage {
    type Element = HeadlessElement;

    fn query_parameter(&self, name: &str) -> Option<String> {
        let url = self.parsed_url()?;
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn find_element_by_id(&self, id: &ElementId) -> Option<Self::Element> {
        let state = self.state.borrow();
        first_attached(&state.nodes, id.as_str()).map(|node| HeadlessElement {
            node,
            id: id.as_str().to_owned(),
        })
    }

    fn contains(&self, root: &Self::Element, element: &Self::Element) -> bool {
        let state = self.state.borrow();
        if element.node >= state.nodes.len() || !state.nodes[element.node].attached {
            return false;
        }
        is_ancestor_or_self(&state.nodes, root.node, element.node)
    }

    fn find_mount_point(&self, selector: &str) -> Option<Self::Element> {
        let state = self.state.borrow();
        let node = match state.selectors.get(selector) {
            Some(&node) => Some(node),
            None => selector
                .strip_prefix('#')
                .filter(|id| !id.is_empty() && !id.contains(char::is_whitespace))
                .and_then(|id| first_attached(&state.nodes, id)),
        }?;
        let target = &state.nodes[node];
        target.attached.then(|| HeadlessElement {
            node,
            id: target.id.clone(),
        })
    }

    fn scroll_into_view(&self, element: &Self::Element, behavior: ScrollBehavior) {
        self.state.borrow_mut().scrolls.push(ScrollRecord {
            target: element.id.clone(),
            behavior,
        });
    }

    fn on_page_load(&self, callback: Box<dyn FnOnce()>) {
        let mut state = self.state.borrow_mut();
        if state.loaded {
            state.deferred.push(callback);
        } else {
            state.load_callbacks.push(callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[test]
    fn query_parameter_decodes_values() {
        let page = HeadlessPage::new("https://cards.test/deck?cardId=a%20b&x=1");
        assert_eq!(page.query_parameter("cardId"), Some("a b".to_owned()));
        assert_eq!(page.query_parameter("x"), Some("1".to_owned()));
        assert_eq!(page.query_parameter("y"), None);
    }

    #[test]
    fn query_parameter_first_value_wins() {
        let page = HeadlessPage::new("?cardId=first&cardId=second");
        assert_eq!(page.query_parameter("cardId"), Some("first".to_owned()));
    }

    #[test]
    fn url_changes_are_seen_on_next_lookup() {
        let page = HeadlessPage::new("https://cards.test/");
        assert_eq!(page.query_parameter("cardId"), None);
        page.set_url("https://cards.test/?cardId=z");
        assert_eq!(page.query_parameter("cardId"), Some("z".to_owned()));
    }

    #[test]
    fn removed_subtree_is_not_found() {
        let page = HeadlessPage::new("/");
        page.insert_element("list", None);
        page.insert_element("card", Some("list"));
        assert!(page.remove_element("list"));
        assert!(page.find_element_by_id(&ElementId::new("card")).is_none());
        assert!(!page.remove_element("list"));
    }

    #[test]
    fn mount_point_by_registered_selector_or_id() {
        let page = HeadlessPage::new("/");
        let app = page.insert_element("app", None);
        let inner = page.insert_element("", Some("app"));
        page.register_selector("#app div", &inner);
        assert_eq!(page.find_mount_point("#app div").map(|e| e.node), Some(inner.node));
        assert_eq!(page.find_mount_point("#app").map(|e| e.node), Some(app.node));
        assert!(page.find_mount_point("#missing").is_none());
        assert!(page.find_mount_point("main").is_none());
    }

    #[test]
    fn load_fires_once_in_order() {
        let page = HeadlessPage::new("/");
        let seen = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let seen = Rc::clone(&seen);
            page.on_page_load(Box::new(move || seen.borrow_mut().push(n)));
        }
        page.fire_load();
        page.fire_load();
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn callback_added_after_load_runs_on_next_tick() {
        let page = HeadlessPage::new("/");
        page.fire_load();
        let ran = Rc::new(Cell::new(0));
        let count = Rc::clone(&ran);
        page.on_page_load(Box::new(move || count.set(count.get() + 1)));
        page.fire_load();
        assert_eq!(ran.get(), 0);
        assert_eq!(page.pending_load_callbacks(), 0);
        assert_eq!(page.deferred_callbacks(), 1);

        assert_eq!(page.run_deferred(), 1);
        assert_eq!(page.run_deferred(), 0);
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn viewport_target_tracks_last_scroll() {
        let page = HeadlessPage::new("/");
        let a = page.insert_element("a", None);
        let b = page.insert_element("b", None);
        page.scroll_into_view(&a, ScrollBehavior::Smooth);
        page.scroll_into_view(&b, ScrollBehavior::Instant);
        assert_eq!(page.viewport_target(), Some("b".to_owned()));
        assert_eq!(page.scroll_log().len(), 2);
    }
}
