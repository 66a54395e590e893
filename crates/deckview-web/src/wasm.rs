#![forbid(unsafe_code)]

//! `wasm-bindgen` exports.
//!
//! The booted page (Elm instance, port closure, bridge) lives in a
//! thread-local for the rest of the page's life; [`DeckView`] is a handle
//! onto it.

use std::cell::RefCell;
use std::rc::Rc;

use deckview_core::{BootConfig, BootedPage, Bootstrap, ServiceWorkerAction, UiApplication};
use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::console;
use crate::dom::DomEnvironment;
use crate::elm::{ElmApp, ElmAppFactory};
use crate::service_worker::BrowserServiceWorker;

type Page = BootedPage<ElmApp, DomEnvironment>;

thread_local! {
    static BOOTED: RefCell<Option<Page>> = const { RefCell::new(None) };
}

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "deckview panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("deckview panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn js_error(msg: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&msg.to_string()).into()
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Boot the page.
///
/// `config_json` is a `BootConfig` object (empty string for defaults);
/// `flags_json` is the loaded card data. Throws on any fatal boot error.
#[wasm_bindgen]
pub fn boot(config_json: &str, flags_json: &str) -> Result<DeckView, JsValue> {
    install_panic_hook();
    if BOOTED.with(|cell| cell.borrow().is_some()) {
        return Err(js_error("deckview is already booted"));
    }

    let config = if config_json.trim().is_empty() {
        BootConfig::default()
    } else {
        BootConfig::from_json_str(config_json).map_err(js_error)?
    };
    console::install(&config.log_level);

    let env = Rc::new(DomEnvironment::from_window()?);
    let factory = ElmAppFactory::from_config(&config);
    let service_worker = BrowserServiceWorker::new(env.window().clone());
    let page = Bootstrap::new(env, config)
        .run(&factory, flags_json, &service_worker)
        .map_err(js_error)?;

    BOOTED.with(|cell| *cell.borrow_mut() = Some(page));
    Ok(DeckView { _private: () })
}

/// Handle onto the booted page.
#[wasm_bindgen]
pub struct DeckView {
    _private: (),
}

impl DeckView {
    fn with_page<R>(&self, f: impl FnOnce(&Page) -> R) -> Result<R, JsValue> {
        BOOTED.with(|cell| {
            cell.borrow()
                .as_ref()
                .map(f)
                .ok_or_else(|| js_error("deckview is not booted"))
        })
    }
}

#[wasm_bindgen]
impl DeckView {
    /// Emit a scroll command as if the Elm program had sent it.
    #[wasm_bindgen(js_name = scrollToElementById)]
    pub fn scroll_to_element_by_id(&self, id: String) -> Result<(), JsValue> {
        // Clone the port out so the emit (and the scroll it triggers) runs
        // without holding the page borrow.
        let port = self.with_page(|page| page.app.scroll_commands().clone())?;
        port.emit(id);
        Ok(())
    }

    /// The Elm program instance (`app` in `Elm.Main.init`).
    #[wasm_bindgen(getter)]
    pub fn app(&self) -> Result<JsValue, JsValue> {
        self.with_page(|page| page.app.instance().clone())
    }

    /// `{ name, emitted, delivered, dropped, pending, scrolled, missed }`.
    #[wasm_bindgen(js_name = portStats)]
    pub fn port_stats(&self) -> Result<JsValue, JsValue> {
        self.with_page(|page| {
            let port = page.app.scroll_commands();
            let stats = port.stats();
            let obj = Object::new();
            set_js(&obj, "name", JsValue::from_str(&port.name()));
            set_js(&obj, "emitted", JsValue::from_f64(stats.emitted_total as f64));
            set_js(&obj, "delivered", JsValue::from_f64(stats.delivered_total as f64));
            set_js(&obj, "dropped", JsValue::from_f64(stats.dropped_total as f64));
            set_js(&obj, "pending", JsValue::from_f64(stats.pending as f64));
            set_js(&obj, "scrolled", JsValue::from_f64(page.bridge.scrolled_total() as f64));
            set_js(&obj, "missed", JsValue::from_f64(page.bridge.missed_total() as f64));
            obj.into()
        })
    }

    /// `"register"` or `"unregister"`.
    #[wasm_bindgen(js_name = serviceWorkerAction)]
    pub fn service_worker_action(&self) -> Result<String, JsValue> {
        self.with_page(|page| match &page.service_worker {
            ServiceWorkerAction::Register { .. } => "register".to_owned(),
            ServiceWorkerAction::Unregister => "unregister".to_owned(),
        })
    }
}
