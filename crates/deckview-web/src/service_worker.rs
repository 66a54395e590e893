#![forbid(unsafe_code)]

//! Offline-cache service worker hook.
//!
//! Both directions are fire-and-forget: the promises run on the microtask
//! queue and only log their outcome. Boot never waits on them.

use deckview_core::ServiceWorkerHook;
use js_sys::Reflect;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{ServiceWorkerContainer, ServiceWorkerRegistration, Window};

use crate::elm::js_error_message;

/// `navigator.serviceWorker` of the current window.
#[derive(Debug, Clone)]
pub struct BrowserServiceWorker {
    window: Window,
}

impl BrowserServiceWorker {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// `None` on insecure origins and browsers without the API.
    fn container(&self) -> Option<ServiceWorkerContainer> {
        let navigator = self.window.navigator();
        let supported =
            Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false);
        if !supported {
            debug!(target: "deckview::service_worker", "service workers unavailable");
            return None;
        }
        Some(navigator.service_worker())
    }
}

async fn unregister_ready(container: ServiceWorkerContainer) -> Result<bool, JsValue> {
    let registration: ServiceWorkerRegistration =
        JsFuture::from(container.ready()?).await?.dyn_into()?;
    let removed = JsFuture::from(registration.unregister()?).await?;
    Ok(removed.as_bool().unwrap_or(false))
}

impl ServiceWorkerHook for BrowserServiceWorker {
    fn register(&self, script_url: &str) {
        let Some(container) = self.container() else {
            return;
        };
        let promise = container.register(script_url);
        let script_url = script_url.to_owned();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(registration) => {
                    let scope = registration
                        .dyn_ref::<ServiceWorkerRegistration>()
                        .map(ServiceWorkerRegistration::scope)
                        .unwrap_or_default();
                    info!(
                        target: "deckview::service_worker",
                        script_url = %script_url,
                        scope = %scope,
                        "service worker registered"
                    );
                }
                Err(err) => warn!(
                    target: "deckview::service_worker",
                    script_url = %script_url,
                    error = %js_error_message(&err),
                    "service worker registration failed"
                ),
            }
        });
    }

    fn unregister(&self) {
        let Some(container) = self.container() else {
            return;
        };
        spawn_local(async move {
            match unregister_ready(container).await {
                Ok(removed) => debug!(
                    target: "deckview::service_worker",
                    removed,
                    "service worker unregistered"
                ),
                Err(err) => warn!(
                    target: "deckview::service_worker",
                    error = %js_error_message(&err),
                    "service worker unregistration failed"
                ),
            }
        });
    }
}
