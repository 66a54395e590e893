#![forbid(unsafe_code)]

//! Initial data payload ("flags") for the UI application.
//!
//! The card records themselves are opaque: they are parsed only far enough
//! to hand them over, never inspected or validated.

use serde::Serialize;
use serde_json::Value;

use crate::config::DataShape;
use crate::error::BootError;

/// Immutable flags handed to the UI application at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Flags {
    /// Bare array of cards.
    Flat(Value),
    /// Several decks plus the deployment's base URL.
    Decks {
        decks: Value,
        #[serde(rename = "baseUrl")]
        base_url: String,
    },
}

impl Flags {
    /// Build flags from the data-loading step's JSON output.
    ///
    /// For [`DataShape::DeckStructured`], `json` is the decks value and
    /// `base_url` is attached next to it unmodified.
    pub fn from_json(
        shape: DataShape,
        json: &str,
        base_url: Option<&str>,
    ) -> Result<Self, BootError> {
        let data: Value = serde_json::from_str(json).map_err(BootError::InvalidFlags)?;
        Self::from_value(shape, data, base_url)
    }

    pub fn from_value(
        shape: DataShape,
        data: Value,
        base_url: Option<&str>,
    ) -> Result<Self, BootError> {
        match shape {
            DataShape::Flat if data.is_array() => Ok(Self::Flat(data)),
            DataShape::Flat => Err(BootError::FlatFlagsNotArray),
            DataShape::DeckStructured => {
                let base_url = base_url.ok_or(BootError::MissingBaseUrl)?;
                Ok(Self::Decks {
                    decks: data,
                    base_url: base_url.to_owned(),
                })
            }
        }
    }

    #[must_use]
    pub const fn shape(&self) -> DataShape {
        match self {
            Self::Flat(_) => DataShape::Flat,
            Self::Decks { .. } => DataShape::DeckStructured,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        match self {
            Self::Flat(_) => None,
            Self::Decks { base_url, .. } => Some(base_url),
        }
    }

    /// The value exactly as the UI application receives it.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Flat(cards) => cards.clone(),
            Self::Decks { decks, base_url } => serde_json::json!({
                "decks": decks,
                "baseUrl": base_url,
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, BootError> {
        serde_json::to_string(self).map_err(BootError::InvalidFlags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flat_cards_pass_through() {
        let flags = Flags::from_json(DataShape::Flat, r#"[{"id":"a"},{"id":"b"}]"#, None)
            .expect("flat flags");
        assert_eq!(flags.shape(), DataShape::Flat);
        assert_eq!(flags.to_value(), json!([{"id":"a"},{"id":"b"}]));
        assert_eq!(flags.base_url(), None);
    }

    #[test]
    fn flat_ignores_base_url() {
        let flags =
            Flags::from_json(DataShape::Flat, "[]", Some("https://x.test/")).expect("flags");
        assert_eq!(flags.to_json().expect("json"), "[]");
    }

    #[test]
    fn flat_requires_array() {
        let err = Flags::from_json(DataShape::Flat, r#"{"cards":[]}"#, None).unwrap_err();
        assert!(matches!(err, BootError::FlatFlagsNotArray));
    }

    #[test]
    fn decks_carry_base_url_verbatim() {
        let flags = Flags::from_json(
            DataShape::DeckStructured,
            r#"{"starter":[{"id":"a"}]}"#,
            Some("https://cards.test/base/"),
        )
        .expect("deck flags");
        assert_eq!(
            flags.to_value(),
            json!({"decks": {"starter":[{"id":"a"}]}, "baseUrl": "https://cards.test/base/"})
        );
        let reparsed: Value = serde_json::from_str(&flags.to_json().expect("json")).expect("parse");
        assert_eq!(reparsed, flags.to_value());
    }

    #[test]
    fn decks_without_base_url_fail() {
        let err = Flags::from_json(DataShape::DeckStructured, "[]", None).unwrap_err();
        assert!(matches!(err, BootError::MissingBaseUrl));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let err = Flags::from_json(DataShape::Flat, "[{", None).unwrap_err();
        assert!(matches!(err, BootError::InvalidFlags(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
