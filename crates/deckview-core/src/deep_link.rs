#![forbid(unsafe_code)]

//! Deep links: scroll to the card named in the page URL once the page loads.
//!
//! The resolver runs after the full load event, not after the UI mounts. If
//! the UI has not rendered the target by then the lookup misses and nothing
//! happens; there is no retry.

use std::rc::Rc;

use tracing::debug;

use crate::bridge::{ScrollBridge, ScrollOutcome};
use crate::element::{ElementId, ScrollRequest};
use crate::environment::Environment;

/// Result of one deep-link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkOutcome {
    /// The URL carries no deep-link parameter.
    NoParameter,
    Scrolled(ElementId),
    NotFound(ElementId),
}

/// Reads the deep-link parameter and issues the bridge's scroll action.
pub struct DeepLinkResolver<E: Environment> {
    env: Rc<E>,
    bridge: Rc<ScrollBridge<E>>,
    param: String,
}

impl<E: Environment> core::fmt::Debug for DeepLinkResolver<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeepLinkResolver")
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}

impl<E: Environment + 'static> DeepLinkResolver<E> {
    #[must_use]
    pub fn new(env: Rc<E>, bridge: Rc<ScrollBridge<E>>, param: impl Into<String>) -> Self {
        Self {
            env,
            bridge,
            param: param.into(),
        }
    }

    #[must_use]
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Resolve against the URL as it is right now.
    ///
    /// The parameter value is used verbatim as the element id.
    pub fn resolve(&self) -> DeepLinkOutcome {
        let Some(value) = self.env.query_parameter(&self.param) else {
            debug!(
                target: "deckview::deep_link",
                param = %self.param,
                "no deep link requested"
            );
            return DeepLinkOutcome::NoParameter;
        };
        let outcome = match self.bridge.handle(&ScrollRequest::deep_link(value)) {
            ScrollOutcome::Scrolled(id) => DeepLinkOutcome::Scrolled(id),
            ScrollOutcome::NotFound(id) => DeepLinkOutcome::NotFound(id),
        };
        debug!(
            target: "deckview::deep_link",
            param = %self.param,
            outcome = ?outcome,
            "deep link resolved"
        );
        outcome
    }

    /// Register [`resolve`](Self::resolve) to run once on page load.
    pub fn arm(self) {
        let env = Rc::clone(&self.env);
        env.on_page_load(Box::new(move || {
            let _ = self.resolve();
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ScrollBehavior;
    use crate::headless::HeadlessPage;
    use crate::CARD_ID_PARAM;
    use pretty_assertions::assert_eq;

    fn resolver(url: &str, ids: &[&str]) -> (Rc<HeadlessPage>, DeepLinkResolver<HeadlessPage>) {
        let page = Rc::new(HeadlessPage::new(url));
        for id in ids {
            page.insert_element(id, None);
        }
        let bridge = Rc::new(ScrollBridge::new(Rc::clone(&page), ScrollBehavior::Smooth));
        let resolver = DeepLinkResolver::new(Rc::clone(&page), bridge, CARD_ID_PARAM);
        (page, resolver)
    }

    #[test]
    fn present_parameter_scrolls_to_card() {
        let (page, resolver) = resolver("https://cards.test/?cardId=foo", &["foo"]);
        assert_eq!(
            resolver.resolve(),
            DeepLinkOutcome::Scrolled(ElementId::new("foo"))
        );
        assert_eq!(page.viewport_target(), Some("foo".to_owned()));
    }

    #[test]
    fn absent_parameter_does_nothing() {
        let (page, resolver) = resolver("https://cards.test/?other=foo", &["foo"]);
        assert_eq!(resolver.resolve(), DeepLinkOutcome::NoParameter);
        assert!(page.scroll_log().is_empty());
    }

    #[test]
    fn unknown_card_is_silent() {
        let (page, resolver) = resolver("https://cards.test/?cardId=missing", &["foo"]);
        assert_eq!(
            resolver.resolve(),
            DeepLinkOutcome::NotFound(ElementId::new("missing"))
        );
        assert!(page.scroll_log().is_empty());
    }

    #[test]
    fn empty_value_matches_nothing() {
        let (page, resolver) = resolver("https://cards.test/?cardId=", &["foo"]);
        assert_eq!(
            resolver.resolve(),
            DeepLinkOutcome::NotFound(ElementId::new(""))
        );
        assert!(page.scroll_log().is_empty());
    }

    #[test]
    fn armed_resolver_fires_once_on_load() {
        let (page, resolver) = resolver("https://cards.test/?cardId=foo", &["foo"]);
        resolver.arm();
        assert!(page.scroll_log().is_empty());
        page.fire_load();
        page.fire_load();
        assert_eq!(page.scroll_log().len(), 1);
    }

    #[test]
    fn url_is_read_at_load_time() {
        let (page, resolver) = resolver("https://cards.test/", &["late"]);
        resolver.arm();
        page.set_url("https://cards.test/?cardId=late");
        page.fire_load();
        assert_eq!(page.viewport_target(), Some("late".to_owned()));
    }

    #[test]
    fn target_rendered_after_load_is_not_retried() {
        let (page, resolver) = resolver("https://cards.test/?cardId=slow", &[]);
        resolver.arm();
        page.fire_load();
        page.insert_element("slow", None);
        assert!(page.scroll_log().is_empty());
    }
}
