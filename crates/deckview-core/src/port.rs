#![forbid(unsafe_code)]

//! Outbound command port of the UI application.
//!
//! A [`CommandPort`] carries string-valued commands (element ids) out of the
//! UI layer. It is the typed stand-in for a framework port such as Elm's
//! `app.ports.scrollToElementById`.
//!
//! # Delivery rules
//!
//! - Every subscriber sees every command emitted after it subscribed, in
//!   emission order.
//! - Commands emitted before anyone subscribed are buffered (bounded) and
//!   flushed to the first subscriber, so a UI that emits while it is being
//!   constructed loses nothing.
//! - Handlers never overlap. A handler that emits re-entrantly only queues
//!   the command; it is dispatched after the current handler returns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::element::ElementId;

/// Default bound on commands buffered before the first subscriber.
pub const DEFAULT_PENDING_MAX: usize = 512;

/// Handle returned by [`CommandPort::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Delivery counters for host observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub emitted_total: u64,
    pub delivered_total: u64,
    pub dropped_total: u64,
    pub subscribers: usize,
    pub pending: usize,
}

type Handler = Box<dyn FnMut(&ElementId)>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

struct PortState {
    name: String,
    subscribers: Vec<Subscriber>,
    pending: VecDeque<ElementId>,
    pending_max: usize,
    dispatching: bool,
    in_flight: Vec<SubscriptionId>,
    removed: Vec<SubscriptionId>,
    next_id: u32,
    stats: PortStats,
}

/// Single-threaded, buffered, string-valued command channel.
///
/// Clones share the same channel: the UI side keeps one to emit, the
/// bootstrap keeps one to subscribe.
#[derive(Clone)]
pub struct CommandPort {
    state: Rc<RefCell<PortState>>,
}

impl core::fmt::Debug for CommandPort {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CommandPort")
            .field("name", &state.name)
            .field("stats", &state.stats)
            .field("dispatching", &state.dispatching)
            .finish()
    }
}

impl CommandPort {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_pending_max(name, DEFAULT_PENDING_MAX)
    }

    /// Create a port that buffers at most `pending_max` commands (minimum 1)
    /// while nobody is subscribed.
    #[must_use]
    pub fn with_pending_max(name: impl Into<String>, pending_max: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(PortState {
                name: name.into(),
                subscribers: Vec::new(),
                pending: VecDeque::new(),
                pending_max: pending_max.max(1),
                dispatching: false,
                in_flight: Vec::new(),
                removed: Vec::new(),
                next_id: 1,
                stats: PortStats::default(),
            })),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    #[must_use]
    pub fn stats(&self) -> PortStats {
        let state = self.state.borrow();
        PortStats {
            subscribers: state.subscribers.len(),
            pending: state.pending.len(),
            ..state.stats
        }
    }

    /// Emit one command.
    pub fn emit(&self, id: impl Into<ElementId>) {
        let id = id.into();
        {
            let mut state = self.state.borrow_mut();
            state.stats.emitted_total = state.stats.emitted_total.saturating_add(1);
            if state.subscribers.is_empty() && !state.dispatching {
                if state.pending.len() >= state.pending_max {
                    let dropped = state.pending.pop_front();
                    state.stats.dropped_total = state.stats.dropped_total.saturating_add(1);
                    warn!(
                        target: "deckview::port",
                        port = %state.name,
                        dropped = ?dropped.as_ref().map(ElementId::as_str),
                        pending_max = state.pending_max,
                        "pre-subscription buffer full, dropped oldest command"
                    );
                }
                trace!(target: "deckview::port", port = %state.name, id = %id, "buffered command");
                state.pending.push_back(id);
                return;
            }
            state.pending.push_back(id);
            if state.dispatching {
                return;
            }
        }
        self.dispatch_pending();
    }

    /// Register `handler`. Buffered commands are delivered before this returns.
    pub fn subscribe(&self, handler: impl FnMut(&ElementId) + 'static) -> SubscriptionId {
        let (id, flush) = {
            let mut state = self.state.borrow_mut();
            let id = SubscriptionId(state.next_id);
            state.next_id = state.next_id.wrapping_add(1).max(1);
            state.subscribers.push(Subscriber {
                id,
                handler: Box::new(handler),
            });
            debug!(
                target: "deckview::port",
                port = %state.name,
                subscription_id = id.get(),
                buffered = state.pending.len(),
                "subscribed"
            );
            (id, !state.pending.is_empty() && !state.dispatching)
        };
        if flush {
            self.dispatch_pending();
        }
        id
    }

    /// Remove a subscription. Returns `false` for an unknown id.
    ///
    /// A handler may unsubscribe itself (or another handler) while it runs;
    /// the removed handler is not called again.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.subscribers.len();
        state.subscribers.retain(|sub| sub.id != id);
        let removed = if state.subscribers.len() != before {
            true
        } else if state.in_flight.contains(&id) && !state.removed.contains(&id) {
            // Checked out for dispatch; dropped when the list is put back.
            state.removed.push(id);
            true
        } else {
            false
        };
        if removed {
            debug!(
                target: "deckview::port",
                port = %state.name,
                subscription_id = id.get(),
                "unsubscribed"
            );
        }
        removed
    }

    fn dispatch_pending(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        loop {
            let (command, mut subscribers) = {
                let mut state = self.state.borrow_mut();
                if state.subscribers.is_empty() {
                    break;
                }
                let Some(command) = state.pending.pop_front() else {
                    break;
                };
                let subscribers = std::mem::take(&mut state.subscribers);
                state.in_flight = subscribers.iter().map(|sub| sub.id).collect();
                (command, subscribers)
            };
            trace!(target: "deckview::port", id = %command, "dispatching command");
            for sub in &mut subscribers {
                if self.state.borrow().removed.contains(&sub.id) {
                    continue;
                }
                (sub.handler)(&command);
            }
            let mut state = self.state.borrow_mut();
            let removed = std::mem::take(&mut state.removed);
            subscribers.retain(|sub| !removed.contains(&sub.id));
            // Handlers subscribed during dispatch landed on the checked-out
            // (empty) list; they go after the existing ones.
            let added = std::mem::take(&mut state.subscribers);
            subscribers.extend(added);
            state.subscribers = subscribers;
            state.stats.delivered_total = state.stats.delivered_total.saturating_add(1);
        }
        let mut state = self.state.borrow_mut();
        state.dispatching = false;
        state.in_flight.clear();
        state.removed.clear();
    }
}
