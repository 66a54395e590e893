#![forbid(unsafe_code)]

//! End-to-end startup against a headless page: bootstrap, command port,
//! scroll bridge and deep link together.
//!
//! Run:
//!   cargo test -p deckview-core --test boot_scroll_e2e

use std::cell::RefCell;
use std::rc::Rc;

use deckview_core::{
    BootConfig, BootError, BootPhase, Bootstrap, CommandPort, Flags, HeadlessElement,
    HeadlessPage, ScrollBehavior, ServiceWorkerHook, UiAppFactory, UiApplication,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Test doubles
// ============================================================================

/// UI stand-in. Keeps its port so tests can emit like user interaction would.
struct CardsApp {
    port: CommandPort,
}

impl UiApplication for CardsApp {
    fn scroll_commands(&self) -> &CommandPort {
        &self.port
    }
}

/// Factory whose app emits `emit_on_init` while it is still being built.
#[derive(Default)]
struct CardsFactory {
    render: Vec<&'static str>,
    emit_on_init: Vec<&'static str>,
    page: Option<Rc<HeadlessPage>>,
}

impl UiAppFactory<HeadlessPage> for CardsFactory {
    type App = CardsApp;

    fn init(&self, mount: HeadlessElement, _flags: &Flags) -> Result<CardsApp, BootError> {
        if let Some(page) = &self.page {
            for id in &self.render {
                page.insert_element(id, Some(mount.id()));
            }
        }
        let port = CommandPort::new("scrollToElementById");
        for id in &self.emit_on_init {
            port.emit(*id);
        }
        Ok(CardsApp { port })
    }
}

struct FailingFactory;

impl UiAppFactory<HeadlessPage> for FailingFactory {
    type App = CardsApp;

    fn init(&self, _mount: HeadlessElement, _flags: &Flags) -> Result<CardsApp, BootError> {
        Err(BootError::AppInit("Elm.Main is undefined".into()))
    }
}

#[derive(Default)]
struct NoWorker {
    calls: RefCell<u32>,
}

impl ServiceWorkerHook for NoWorker {
    fn register(&self, _script_url: &str) {
        *self.calls.borrow_mut() += 1;
    }

    fn unregister(&self) {
        *self.calls.borrow_mut() += 1;
    }
}

fn page(url: &str) -> Rc<HeadlessPage> {
    let page = Rc::new(HeadlessPage::new(url));
    page.insert_element("root", None);
    page
}

fn factory(page: &Rc<HeadlessPage>, render: &[&'static str]) -> CardsFactory {
    CardsFactory {
        render: render.to_vec(),
        emit_on_init: Vec::new(),
        page: Some(Rc::clone(page)),
    }
}

// ============================================================================
// Deep links
// ============================================================================

#[test]
fn deep_link_scrolls_exactly_once_after_load() {
    let page = page("https://cards.test/?cardId=foo");
    let mut boot = Bootstrap::new(Rc::clone(&page), BootConfig::default());
    boot.run(&factory(&page, &["foo", "bar"]), "[]", &NoWorker::default())
        .expect("boot");

    assert!(page.scroll_log().is_empty(), "deep link must wait for load");
    page.fire_load();
    page.fire_load();

    let log = page.scroll_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].target, "foo");
    assert_eq!(log[0].behavior, ScrollBehavior::Smooth);
}

#[test]
fn deep_link_fires_when_booted_after_load() {
    let page = page("https://cards.test/?cardId=foo");
    page.fire_load();
    let mut boot = Bootstrap::new(Rc::clone(&page), BootConfig::default());
    boot.run(&factory(&page, &["foo"]), "[]", &NoWorker::default())
        .expect("boot");

    assert!(page.scroll_log().is_empty(), "deep link runs on the next tick");
    assert_eq!(page.deferred_callbacks(), 1);
    page.fire_load();
    assert_eq!(page.run_deferred(), 1);
    assert_eq!(page.run_deferred(), 0);

    let log = page.scroll_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].target, "foo");
}

#[test]
fn no_parameter_means_no_scroll() {
    let page = page("https://cards.test/");
    let mut boot = Bootstrap::new(Rc::clone(&page), BootConfig::default());
    boot.run(&factory(&page, &["foo"]), "[]", &NoWorker::default())
        .expect("boot");
    page.fire_load();
    assert!(page.scroll_log().is_empty());
}

#[test]
fn unknown_card_parameter_is_silent() {
    let page = page("https://cards.test/?cardId=missing");
    let mut boot = Bootstrap::new(Rc::clone(&page), BootConfig::default());
    boot.run(&factory(&page, &["foo"]), "[]", &NoWorker::default())
        .expect("boot");
    page.fire_load();
    assert!(page.scroll_log().is_empty());
}

#[test]
fn custom_parameter_name_and_instant_scroll() {
    let page = page("https://cards.test/?card=deck-2");
    let config = BootConfig {
        deep_link_param: "card".into(),
        smooth_scroll: false,
        ..BootConfig::default()
    };
    Bootstrap::new(Rc::clone(&page), config)
        .run(&factory(&page, &["deck-2"]), "[]", &NoWorker::default())
        .expect("boot");
    page.fire_load();
    let log = page.scroll_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].behavior, ScrollBehavior::Instant);
}

// ============================================================================
// Command channel
// ============================================================================

#[test]
fn commands_emitted_during_construction_are_not_lost() {
    let page = page("https://cards.test/");
    let factory = CardsFactory {
        emit_on_init: vec!["foo", "bar"],
        ..factory(&page, &["foo", "bar"])
    };
    let booted = Bootstrap::new(Rc::clone(&page), BootConfig::default())
        .run(&factory, "[]", &NoWorker::default())
        .expect("boot");

    let targets: Vec<String> = page.scroll_log().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["foo", "bar"]);
    assert_eq!(booted.app.port.stats().dropped_total, 0);
}

#[test]
fn every_command_after_subscription_is_observed() {
    let page = page("https://cards.test/");
    let booted = Bootstrap::new(Rc::clone(&page), BootConfig::default())
        .run(&factory(&page, &["a", "b", "c"]), "[]", &NoWorker::default())
        .expect("boot");

    let commands = ["a", "zzz", "b", "c", "a", "zzz"];
    for id in commands {
        booted.app.port.emit(id);
    }
    let stats = booted.app.port.stats();
    assert_eq!(stats.delivered_total, commands.len() as u64);
    assert_eq!(booted.bridge.scrolled_total(), 4);
    assert_eq!(booted.bridge.missed_total(), 2);
}

#[test]
fn last_command_wins() {
    let page = page("https://cards.test/");
    let booted = Bootstrap::new(Rc::clone(&page), BootConfig::default())
        .run(&factory(&page, &["a", "b"]), "[]", &NoWorker::default())
        .expect("boot");
    booted.app.port.emit("a");
    booted.app.port.emit("b");
    assert_eq!(page.viewport_target(), Some("b".to_owned()));
}

#[test]
fn same_command_twice_is_safe() {
    let page = page("https://cards.test/");
    let booted = Bootstrap::new(Rc::clone(&page), BootConfig::default())
        .run(&factory(&page, &["a"]), "[]", &NoWorker::default())
        .expect("boot");
    booted.app.port.emit("a");
    booted.app.port.emit("a");
    assert_eq!(page.scroll_log().len(), 2);
    assert_eq!(page.viewport_target(), Some("a".to_owned()));
}

#[test]
fn deep_link_and_commands_share_the_viewport() {
    let page = page("https://cards.test/?cardId=a");
    let booted = Bootstrap::new(Rc::clone(&page), BootConfig::default())
        .run(&factory(&page, &["a", "b"]), "[]", &NoWorker::default())
        .expect("boot");
    page.fire_load();
    booted.app.port.emit("b");
    let targets: Vec<String> = page.scroll_log().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["a", "b"]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn factory_failure_is_fatal_and_arms_nothing() {
    let page = page("https://cards.test/?cardId=foo");
    let worker = NoWorker::default();
    let mut boot = Bootstrap::new(Rc::clone(&page), BootConfig::default());
    let err = boot.run(&FailingFactory, "[]", &worker).unwrap_err();
    assert_eq!(err.to_string(), "UI application failed to start: Elm.Main is undefined");
    assert_eq!(boot.phase(), BootPhase::Mounting);
    assert_eq!(page.pending_load_callbacks(), 0);
    assert_eq!(page.deferred_callbacks(), 0);
    assert_eq!(*worker.calls.borrow(), 0);
}

#[test]
fn scope_to_mount_ignores_elements_outside_the_container() {
    let page = page("https://cards.test/?cardId=footer");
    page.insert_element("footer", None);
    let config = BootConfig {
        scope_to_mount: true,
        ..BootConfig::default()
    };
    let booted = Bootstrap::new(Rc::clone(&page), config)
        .run(&factory(&page, &["inside"]), "[]", &NoWorker::default())
        .expect("boot");
    page.fire_load();
    booted.app.port.emit("footer");
    booted.app.port.emit("inside");

    let targets: Vec<String> = page.scroll_log().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["inside".to_owned()]);
    assert_eq!(booted.bridge.missed_total(), 2);
}

#[test]
fn mount_selector_resolves_registered_container() {
    let page = Rc::new(HeadlessPage::new("https://cards.test/"));
    page.insert_element("app", None);
    let inner = page.insert_element("app-inner", Some("app"));
    page.register_selector("#app div", &inner);
    let config = BootConfig {
        mount_selector: "#app div".into(),
        ..BootConfig::default()
    };
    let mut boot = Bootstrap::new(Rc::clone(&page), config);
    boot.run(&factory(&page, &["x"]), "[]", &NoWorker::default())
        .expect("boot");
    assert_eq!(boot.phase(), BootPhase::DeepLinkArmed);
}
