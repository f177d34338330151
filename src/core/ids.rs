//! Stable string identifiers for match entities.
//!
//! Ids are assigned once at match setup (`c0001`, `z001`, `r0001`) and
//! never change, so clause text and saved variables can reference
//! entities across the whole match.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident, $prefix:literal, $width:literal) => {
        /// Stable identifier assigned at match setup.
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Build the id for the nth entity (zero-based).
            #[must_use]
            pub fn nth(index: usize) -> Self {
                Self(format!(concat!($prefix, "{:0width$}"), index + 1, width = $width))
            }

            /// The raw id text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(CardId, "c", 4);
entity_id!(ZoneId, "z", 3);
entity_id!(RuleId, "r", 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_formats() {
        assert_eq!(CardId::nth(0).as_str(), "c0001");
        assert_eq!(CardId::nth(41).as_str(), "c0042");
        assert_eq!(ZoneId::nth(0).as_str(), "z001");
        assert_eq!(RuleId::nth(9).as_str(), "r0010");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", ZoneId::nth(2)), "z003");
    }
}
