#![forbid(unsafe_code)]

//! Element identifiers and scroll requests.

use core::fmt;

/// Opaque identity-attribute token for a scroll target.
///
/// The value is carried verbatim: no trimming, no character-set checks and no
/// selector escaping. Lookup is by identity attribute, so ids such as `1a` or
/// `card:7` that would break a `#id` selector resolve normally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where a scroll request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
    /// Emitted by the UI application over its command port.
    Command,
    /// Derived from the page URL on load.
    DeepLink,
}

impl ScrollOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::DeepLink => "deep_link",
        }
    }
}

/// Animation mode handed to the host when bringing an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

impl ScrollBehavior {
    #[must_use]
    pub const fn from_smooth(smooth: bool) -> Self {
        if smooth { Self::Smooth } else { Self::Instant }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Instant => "instant",
        }
    }
}

/// One "bring this element into view" intent.
///
/// Consumed as soon as it is built; nothing stores or batches requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: ElementId,
    pub origin: ScrollOrigin,
}

impl ScrollRequest {
    #[must_use]
    pub fn command(target: impl Into<ElementId>) -> Self {
        Self {
            target: target.into(),
            origin: ScrollOrigin::Command,
        }
    }

    #[must_use]
    pub fn deep_link(target: impl Into<ElementId>) -> Self {
        Self {
            target: target.into(),
            origin: ScrollOrigin::DeepLink,
        }
    }
}
