//! Typed field storage for cards.
//!
//! Fields transport as strings in rule data and clause text, but each
//! field's type is decided when the card is built: numeric if the
//! initial encoding parses as a number, text otherwise, image when
//! declared. Later writes must respect that type or they are dropped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::value::format_number;

/// Declared type of a card field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Number,
    Text,
    Image,
    /// Returned when asking for the type of a field that doesn't exist.
    Undefined,
}

/// A card field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// Path or asset name of an image; treated as text by comparisons.
    Image(String),
}

impl FieldValue {
    /// Build a field from its string encoding, inferring the type.
    #[must_use]
    pub fn infer(encoded: &str) -> Self {
        match encoded.trim().parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(encoded.to_string()),
        }
    }

    /// Build a field of an explicitly declared kind.
    #[must_use]
    pub fn of_kind(kind: FieldKind, encoded: &str) -> Self {
        match kind {
            FieldKind::Number => FieldValue::Number(encoded.trim().parse().unwrap_or(0.0)),
            FieldKind::Text | FieldKind::Undefined => FieldValue::Text(encoded.to_string()),
            FieldKind::Image => FieldValue::Image(encoded.to_string()),
        }
    }

    /// The declared kind of this value.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Image(_) => FieldKind::Image,
        }
    }

    /// Numeric view of the field.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Image(_) => None,
        }
    }

    /// String encoding of the field.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) | FieldValue::Image(s) => s.clone(),
        }
    }

    /// Overwrite this field from a string encoding, keeping its type.
    ///
    /// A non-numeric write into a number field is a type mismatch:
    /// logged, value unchanged, returns false.
    pub fn write(&mut self, encoded: &str) -> bool {
        match self {
            FieldValue::Number(n) => match encoded.trim().parse::<f64>() {
                Ok(v) => {
                    *n = v;
                    true
                }
                Err(_) => {
                    warn!(value = encoded, "non-numeric write into number field");
                    false
                }
            },
            FieldValue::Text(s) | FieldValue::Image(s) => {
                *s = encoded.to_string();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(FieldValue::infer("3"), FieldValue::Number(3.0));
        assert_eq!(FieldValue::infer("Red"), FieldValue::Text("Red".into()));
    }

    #[test]
    fn test_write_keeps_type() {
        let mut f = FieldValue::Number(1.0);
        assert!(f.write("5"));
        assert_eq!(f, FieldValue::Number(5.0));
        assert!(!f.write("Red"));
        assert_eq!(f, FieldValue::Number(5.0));
    }

    #[test]
    fn test_text_roundtrip() {
        let mut f = FieldValue::Text("a".into());
        assert!(f.write("b"));
        assert_eq!(f.as_text(), "b");
        assert_eq!(f.kind(), FieldKind::Text);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(FieldValue::Number(4.0).as_text(), "4");
    }
}
