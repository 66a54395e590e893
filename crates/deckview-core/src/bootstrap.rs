#![forbid(unsafe_code)]

//! Startup sequencing.
//!
//! [`Bootstrap::run`] is a strictly linear, one-shot sequence:
//!
//! ```text
//! Uninitialized -> Mounting -> Subscribed -> DeepLinkArmed
//! ```
//!
//! 1. find the mount point,
//! 2. construct the UI application with its flags,
//! 3. attach the scroll bridge to the application's command port,
//! 4. arm the deep-link resolver on page load,
//! 5. register or unregister the service worker.
//!
//! Steps 1 and 2 are fatal on failure; there is no fallback UI and no retry.

use std::rc::Rc;

use tracing::{debug, error, info};

use crate::bridge::ScrollBridge;
use crate::config::BootConfig;
use crate::deep_link::DeepLinkResolver;
use crate::element::ScrollBehavior;
use crate::environment::{ElementLocator, Environment};
use crate::error::BootError;
use crate::flags::Flags;
use crate::port::{CommandPort, SubscriptionId};

/// A constructed UI application.
pub trait UiApplication {
    /// Outbound "scroll to element by id" channel.
    fn scroll_commands(&self) -> &CommandPort;
}

/// Builds the UI application. The one collaborator the core relies on but
/// does not implement.
pub trait UiAppFactory<E: Environment> {
    type App: UiApplication;

    /// Construct the application inside `mount` with immutable `flags`.
    ///
    /// Commands the application emits before this returns must go through
    /// its [`CommandPort`], which buffers them until the bridge subscribes.
    fn init(&self, mount: E::Element, flags: &Flags) -> Result<Self::App, BootError>;
}

/// Offline-cache service worker lifecycle, delegated to the host.
pub trait ServiceWorkerHook {
    fn register(&self, script_url: &str);
    fn unregister(&self);
}

/// What the bootstrap asked the service-worker hook to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceWorkerAction {
    Register { script_url: String },
    Unregister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Uninitialized,
    Mounting,
    Subscribed,
    DeepLinkArmed,
}

impl BootPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Mounting => "mounting",
            Self::Subscribed => "subscribed",
            Self::DeepLinkArmed => "deep_link_armed",
        }
    }
}

/// Everything a successful boot leaves behind.
pub struct BootedPage<A, E: Environment> {
    pub app: A,
    pub bridge: Rc<ScrollBridge<E>>,
    pub subscription: SubscriptionId,
    pub service_worker: ServiceWorkerAction,
}

impl<A, E: Environment> core::fmt::Debug for BootedPage<A, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootedPage")
            .field("bridge", &self.bridge)
            .field("subscription", &self.subscription)
            .field("service_worker", &self.service_worker)
            .finish_non_exhaustive()
    }
}

/// One-shot startup orchestrator.
pub struct Bootstrap<E: Environment> {
    env: Rc<E>,
    config: BootConfig,
    phase: BootPhase,
}

impl<E: Environment> core::fmt::Debug for Bootstrap<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<E: Environment + 'static> Bootstrap<E> {
    #[must_use]
    pub fn new(env: Rc<E>, config: BootConfig) -> Self {
        Self {
            env,
            config,
            phase: BootPhase::Uninitialized,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> BootPhase {
        self.phase
    }

    #[must_use]
    pub const fn config(&self) -> &BootConfig {
        &self.config
    }

    fn enter(&mut self, phase: BootPhase) {
        debug!(
            target: "deckview::bootstrap",
            from = self.phase.as_str(),
            to = phase.as_str(),
            "phase transition"
        );
        self.phase = phase;
    }

    /// Run the whole startup sequence.
    ///
    /// `flags_json` is the data-loading step's output; it is shaped into
    /// [`Flags`] according to the configured data shape.
    pub fn run<F>(
        &mut self,
        factory: &F,
        flags_json: &str,
        service_worker: &dyn ServiceWorkerHook,
    ) -> Result<BootedPage<F::App, E>, BootError>
    where
        F: UiAppFactory<E>,
    {
        if self.phase != BootPhase::Uninitialized {
            return Err(BootError::AlreadyStarted(self.phase));
        }
        let errors = self.config.validate();
        if !errors.is_empty() {
            let err = BootError::InvalidConfig(errors);
            error!(target: "deckview::bootstrap", error = %err, "boot failed");
            return Err(err);
        }
        self.sequence(factory, flags_json, service_worker)
            .inspect_err(|err| {
                error!(
                    target: "deckview::bootstrap",
                    phase = self.phase.as_str(),
                    error = %err,
                    "boot failed"
                );
            })
    }

    fn sequence<F>(
        &mut self,
        factory: &F,
        flags_json: &str,
        service_worker: &dyn ServiceWorkerHook,
    ) -> Result<BootedPage<F::App, E>, BootError>
    where
        F: UiAppFactory<E>,
    {
        self.enter(BootPhase::Mounting);
        let mount = self
            .env
            .find_mount_point(&self.config.mount_selector)
            .ok_or_else(|| BootError::MountPointMissing {
                selector: self.config.mount_selector.clone(),
            })?;
        let flags = Flags::from_json(
            self.config.data_shape,
            flags_json,
            self.config.base_url.as_deref(),
        )?;
        let locator = if self.config.scope_to_mount {
            ElementLocator::within(mount.clone())
        } else {
            ElementLocator::document()
        };
        let app = factory.init(mount, &flags)?;

        let bridge = Rc::new(ScrollBridge::with_locator(
            Rc::clone(&self.env),
            locator,
            ScrollBehavior::from_smooth(self.config.smooth_scroll),
        ));
        let subscription = bridge.attach(app.scroll_commands());
        self.enter(BootPhase::Subscribed);

        DeepLinkResolver::new(
            Rc::clone(&self.env),
            Rc::clone(&bridge),
            self.config.deep_link_param.clone(),
        )
        .arm();
        self.enter(BootPhase::DeepLinkArmed);

        let action = if self.config.enable_service_worker {
            service_worker.register(&self.config.service_worker_url);
            ServiceWorkerAction::Register {
                script_url: self.config.service_worker_url.clone(),
            }
        } else {
            service_worker.unregister();
            ServiceWorkerAction::Unregister
        };

        info!(
            target: "deckview::bootstrap",
            mount = %self.config.mount_selector,
            data_shape = ?flags.shape(),
            service_worker = ?action,
            "boot complete"
        );
        Ok(BootedPage {
            app,
            bridge,
            subscription,
            service_worker: action,
        })
    }
}
