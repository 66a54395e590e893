#![forbid(unsafe_code)]

//! Elm application factory.
//!
//! Starts the precompiled Elm program found at `globalThis.Elm.<module>` and
//! bridges its outbound scroll port into a [`CommandPort`]:
//!
//! ```js
//! const app = Elm.Main.init({ node, flags });
//! app.ports.scrollToElementById.subscribe(id => port.emit(id));
//! ```
//!
//! Elm drops ports the program never uses, so a missing port is logged and
//! tolerated: the app simply never emits.

use deckview_core::{BootConfig, BootError, CommandPort, Flags, UiAppFactory, UiApplication};
use js_sys::{Function, JSON, Object, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::DomEnvironment;

/// Best-effort text for a thrown JS value.
pub(crate) fn js_error_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{err:?}")
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, BootError> {
    let value = Reflect::get(target, &JsValue::from_str(key))
        .map_err(|err| BootError::AppInit(js_error_message(&err)))?;
    Ok(value)
}

/// A running Elm program and its forwarded scroll port.
pub struct ElmApp {
    instance: JsValue,
    port: CommandPort,
    // Called by Elm for every port message; must live as long as the page.
    forward: Option<Closure<dyn FnMut(JsValue)>>,
}

impl core::fmt::Debug for ElmApp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElmApp")
            .field("port", &self.port)
            .field("forwarding", &self.forward.is_some())
            .finish_non_exhaustive()
    }
}

impl ElmApp {
    /// The object returned by `Elm.<module>.init`.
    #[must_use]
    pub fn instance(&self) -> &JsValue {
        &self.instance
    }
}

impl UiApplication for ElmApp {
    fn scroll_commands(&self) -> &CommandPort {
        &self.port
    }
}

#[derive(Debug, Clone)]
pub struct ElmAppFactory {
    module_path: Vec<String>,
    port_name: String,
}

impl ElmAppFactory {
    #[must_use]
    pub fn new(module_path: Vec<String>, port_name: impl Into<String>) -> Self {
        Self {
            module_path,
            port_name: port_name.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &BootConfig) -> Self {
        Self::new(
            config.elm_module_path().map(str::to_owned).collect(),
            config.scroll_port.clone(),
        )
    }

    fn resolve_module(&self) -> Result<JsValue, BootError> {
        let missing = |path: &str| {
            BootError::AppInit(format!(
                "Elm.{} not loaded: {path} is undefined",
                self.module_path.join(".")
            ))
        };
        let mut target = get(&js_sys::global(), "Elm")?;
        let mut path = String::from("Elm");
        for segment in &self.module_path {
            if target.is_undefined() || target.is_null() {
                return Err(missing(&path));
            }
            target = get(&target, segment)?;
            path.push('.');
            path.push_str(segment);
        }
        if target.is_undefined() || target.is_null() {
            return Err(missing(&path));
        }
        Ok(target)
    }

    fn forward_port(
        &self,
        instance: &JsValue,
        port: &CommandPort,
    ) -> Result<Option<Closure<dyn FnMut(JsValue)>>, BootError> {
        let ports = get(instance, "ports")?;
        let elm_port = if ports.is_undefined() || ports.is_null() {
            JsValue::UNDEFINED
        } else {
            get(&ports, &self.port_name)?
        };
        if elm_port.is_undefined() || elm_port.is_null() {
            warn!(
                target: "deckview::elm",
                port = %self.port_name,
                "Elm program exposes no such port; scroll commands disabled"
            );
            return Ok(None);
        }
        let subscribe = get(&elm_port, "subscribe")?
            .dyn_into::<Function>()
            .map_err(|_| {
                BootError::AppInit(format!("ports.{}.subscribe is not a function", self.port_name))
            })?;

        let emitter = port.clone();
        let port_name = self.port_name.clone();
        let forward = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            match value.as_string() {
                Some(id) => emitter.emit(id),
                None => warn!(
                    target: "deckview::elm",
                    port = %port_name,
                    value = ?value,
                    "ignoring non-string port message"
                ),
            }
        });
        subscribe
            .call1(&elm_port, forward.as_ref().unchecked_ref())
            .map_err(|err| BootError::AppInit(js_error_message(&err)))?;
        debug!(target: "deckview::elm", port = %self.port_name, "forwarding Elm port");
        Ok(Some(forward))
    }
}

impl UiAppFactory<DomEnvironment> for ElmAppFactory {
    type App = ElmApp;

    fn init(&self, mount: Element, flags: &Flags) -> Result<ElmApp, BootError> {
        let module = self.resolve_module()?;
        let init = get(&module, "init")?
            .dyn_into::<Function>()
            .map_err(|_| BootError::AppInit("Elm module has no init function".into()))?;

        let flags_js = JSON::parse(&flags.to_json()?)
            .map_err(|err| BootError::AppInit(js_error_message(&err)))?;
        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("node"), &mount)
            .and_then(|_| Reflect::set(&options, &JsValue::from_str("flags"), &flags_js))
            .map_err(|err| BootError::AppInit(js_error_message(&err)))?;

        let instance = init
            .call1(&module, &options)
            .map_err(|err| BootError::AppInit(js_error_message(&err)))?;

        let port = CommandPort::new(self.port_name.clone());
        let forward = self.forward_port(&instance, &port)?;
        debug!(
            target: "deckview::elm",
            module = %self.module_path.join("."),
            data_shape = ?flags.shape(),
            "Elm program started"
        );
        Ok(ElmApp {
            instance,
            port,
            forward,
        })
    }
}
