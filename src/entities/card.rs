//! Card entities and their persisted data form.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ids::{CardId, ZoneId};

use super::fields::{FieldKind, FieldValue};

/// Whether a card's face is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealState {
    #[default]
    FaceDown,
    FaceUp,
}

/// Persisted field definition inside [`CardData`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldData {
    pub name: String,
    pub value: String,
    /// Explicit type; inferred from `value` when absent.
    #[serde(default)]
    pub kind: Option<FieldKind>,
}

/// Persisted card definition, loaded at match setup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CardData {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldData>,
    /// Name, id, or tag of the zone the card starts in.
    #[serde(default)]
    pub zone: Option<String>,
}

/// A live card in a match.
#[derive(Clone, Debug)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub tags: SmallVec<[String; 4]>,
    pub reveal: RevealState,
    /// Current zone; `None` only before initial placement.
    pub zone: Option<ZoneId>,
    fields: FxHashMap<String, FieldValue>,
}

impl Card {
    /// Build a live card from its persisted data.
    #[must_use]
    pub fn from_data(id: CardId, data: &CardData) -> Self {
        let mut fields = FxHashMap::default();
        for field in &data.fields {
            let value = match field.kind {
                Some(kind) => FieldValue::of_kind(kind, &field.value),
                None => FieldValue::infer(&field.value),
            };
            fields.insert(field.name.clone(), value);
        }
        Self {
            id,
            name: data.name.clone(),
            tags: data.tags.iter().cloned().collect(),
            reveal: RevealState::default(),
            zone: None,
            fields,
        }
    }

    /// Whether the card carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag if not already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Remove a tag if present.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Whether the card defines a field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The declared type of a field.
    #[must_use]
    pub fn field_kind(&self, name: &str) -> FieldKind {
        self.fields
            .get(name)
            .map_or(FieldKind::Undefined, FieldValue::kind)
    }

    /// Read a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Read a field numerically.
    #[must_use]
    pub fn num_field(&self, name: &str) -> Option<f64> {
        self.fields.get(name)?.as_number()
    }

    /// Read a field as text.
    #[must_use]
    pub fn text_field(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(FieldValue::as_text)
    }

    /// Write a field from its string encoding, keeping its type.
    ///
    /// Returns false when the field doesn't exist or the write is a
    /// type mismatch.
    pub fn set_field(&mut self, name: &str, encoded: &str) -> bool {
        match self.fields.get_mut(name) {
            Some(value) => value.write(encoded),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> Card {
        Card::from_data(
            CardId::nth(0),
            &CardData {
                name: "Hero".into(),
                tags: vec!["Unit".into()],
                fields: vec![
                    FieldData {
                        name: "Power".into(),
                        value: "3".into(),
                        kind: None,
                    },
                    FieldData {
                        name: "Suit".into(),
                        value: "Red".into(),
                        kind: None,
                    },
                ],
                zone: None,
            },
        )
    }

    #[test]
    fn test_from_data_infers_fields() {
        let card = hero();
        assert_eq!(card.field_kind("Power"), FieldKind::Number);
        assert_eq!(card.field_kind("Suit"), FieldKind::Text);
        assert_eq!(card.field_kind("Missing"), FieldKind::Undefined);
        assert_eq!(card.num_field("Power"), Some(3.0));
    }

    #[test]
    fn test_tags() {
        let mut card = hero();
        assert!(card.has_tag("Unit"));
        card.add_tag("Elite");
        card.add_tag("Elite");
        assert_eq!(card.tags.iter().filter(|t| *t == "Elite").count(), 1);
        card.remove_tag("Unit");
        assert!(!card.has_tag("Unit"));
    }

    #[test]
    fn test_set_field_type_checked() {
        let mut card = hero();
        assert!(card.set_field("Power", "7"));
        assert_eq!(card.num_field("Power"), Some(7.0));
        assert!(!card.set_field("Power", "lots"));
        assert!(!card.set_field("Missing", "1"));
    }
}
