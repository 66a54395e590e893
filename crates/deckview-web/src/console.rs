#![forbid(unsafe_code)]

//! `tracing` to JS console bridge.
//!
//! Events are flattened to one line (`[LEVEL target] message key=value ...`)
//! and written with the console method matching their level, so browser
//! devtools filtering keeps working.

use core::fmt::{self, Write as _};

use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Parse a config log level; unknown names fall back to `INFO`.
#[must_use]
pub fn level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Debug,
    Info,
    Warn,
    Error,
}

impl ConsoleMethod {
    #[must_use]
    pub fn for_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Destination for formatted log lines.
pub trait ConsoleSink {
    fn write(&self, method: ConsoleMethod, line: &str);
}

/// Writes through `console.debug/info/warn/error`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserConsole;

#[cfg(target_arch = "wasm32")]
impl ConsoleSink for BrowserConsole {
    fn write(&self, method: ConsoleMethod, line: &str) {
        let line = wasm_bindgen::JsValue::from_str(line);
        match method {
            ConsoleMethod::Debug => web_sys::console::debug_1(&line),
            ConsoleMethod::Info => web_sys::console::info_1(&line),
            ConsoleMethod::Warn => web_sys::console::warn_1(&line),
            ConsoleMethod::Error => web_sys::console::error_1(&line),
        }
    }
}

/// Install the console layer as the global subscriber.
///
/// Returns `false` if a global subscriber was already set (e.g. a second
/// `boot` call); the existing one stays in place.
#[cfg(target_arch = "wasm32")]
pub fn install(level: &str) -> bool {
    use tracing_subscriber::layer::SubscriberExt;

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(level))
        .with(ConsoleLayer::new(BrowserConsole));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// `tracing-subscriber` layer that formats events for a [`ConsoleSink`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleLayer<W> {
    sink: W,
}

impl<W> ConsoleLayer<W> {
    #[must_use]
    pub const fn new(sink: W) -> Self {
        Self { sink }
    }
}

impl<S, W> Layer<S> for ConsoleLayer<W>
where
    S: Subscriber,
    W: ConsoleSink + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = visitor.finish(meta.level(), meta.target());
        self.sink.write(ConsoleMethod::for_level(meta.level()), &line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self, level: &Level, target: &str) -> String {
        let mut line = format!("[{level} {target}] {}", self.message);
        line.push_str(&self.fields);
        line
    }
}

impl tracing::field::Visit for LineVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct VecSink(Arc<Mutex<Vec<(ConsoleMethod, String)>>>);

    impl ConsoleSink for VecSink {
        fn write(&self, method: ConsoleMethod, line: &str) {
            self.0.lock().unwrap().push((method, line.to_owned()));
        }
    }

    fn capture(level: &str, f: impl FnOnce()) -> Vec<(ConsoleMethod, String)> {
        let sink = VecSink::default();
        let subscriber = tracing_subscriber::registry()
            .with(level_filter(level))
            .with(ConsoleLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let lines = sink.0.lock().unwrap().clone();
        lines
    }

    #[test]
    fn level_names_parse() {
        assert_eq!(level_filter("TRACE"), LevelFilter::TRACE);
        assert_eq!(level_filter(" warn "), LevelFilter::WARN);
        assert_eq!(level_filter("off"), LevelFilter::OFF);
        assert_eq!(level_filter("chatty"), LevelFilter::INFO);
    }

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(ConsoleMethod::for_level(&Level::TRACE), ConsoleMethod::Debug);
        assert_eq!(ConsoleMethod::for_level(&Level::DEBUG), ConsoleMethod::Debug);
        assert_eq!(ConsoleMethod::for_level(&Level::INFO), ConsoleMethod::Info);
        assert_eq!(ConsoleMethod::for_level(&Level::WARN), ConsoleMethod::Warn);
        assert_eq!(ConsoleMethod::for_level(&Level::ERROR), ConsoleMethod::Error);
    }

    #[test]
    fn event_is_flattened_to_one_line() {
        let lines = capture("info", || {
            tracing::info!(
                target: "deckview::bootstrap",
                mount = "#root",
                count = 3u64,
                "boot complete"
            );
        });
        assert_eq!(
            lines,
            vec![(
                ConsoleMethod::Info,
                "[INFO deckview::bootstrap] boot complete mount=#root count=3".to_owned()
            )]
        );
    }

    #[test]
    fn filter_drops_lower_levels() {
        let lines = capture("warn", || {
            tracing::debug!(target: "deckview::bridge", id = "a", "scrolled into view");
            tracing::warn!(target: "deckview::port", dropped = "a", "buffer full");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, ConsoleMethod::Warn);
    }
}
