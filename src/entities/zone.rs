//! Zone entities: ordered card containers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ids::{CardId, ZoneId};

/// Where a card lands when it enters a zone.
///
/// Zone content is ordered bottom-to-top: the top of the zone is the
/// end of the list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePlacement {
    #[default]
    Top,
    Bottom,
    /// Insert at a grid slot (clamped to the zone's size).
    Slot(usize),
}

/// Persisted zone definition, loaded at match setup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneData {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A live zone in a match.
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub tags: SmallVec<[String; 4]>,
    content: Vec<CardId>,
}

impl Zone {
    /// Build a live zone from its persisted data.
    #[must_use]
    pub fn from_data(id: ZoneId, data: &ZoneData) -> Self {
        Self {
            id,
            name: data.name.clone(),
            tags: data.tags.iter().cloned().collect(),
            content: Vec::new(),
        }
    }

    /// Whether the zone carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the zone's id, name, or any tag matches `label`.
    #[must_use]
    pub fn answers_to(&self, label: &str) -> bool {
        self.id.as_str() == label || self.name == label || self.has_tag(label)
    }

    /// Cards in this zone, bottom to top.
    #[must_use]
    pub fn content(&self) -> &[CardId] {
        &self.content
    }

    /// Number of cards in this zone.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the zone is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Position of a card within this zone (0 = bottom).
    #[must_use]
    pub fn position_of(&self, card: &CardId) -> Option<usize> {
        self.content.iter().position(|c| c == card)
    }

    /// The top card, if any.
    #[must_use]
    pub fn top(&self) -> Option<&CardId> {
        self.content.last()
    }

    pub(crate) fn insert(&mut self, card: CardId, placement: ZonePlacement) {
        match placement {
            ZonePlacement::Top => self.content.push(card),
            ZonePlacement::Bottom => self.content.insert(0, card),
            ZonePlacement::Slot(i) => {
                let idx = i.min(self.content.len());
                self.content.insert(idx, card);
            }
        }
    }

    pub(crate) fn take(&mut self, card: &CardId) -> bool {
        match self.position_of(card) {
            Some(pos) => {
                self.content.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn content_mut(&mut self) -> &mut Vec<CardId> {
        &mut self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck() -> Zone {
        Zone::from_data(
            ZoneId::nth(0),
            &ZoneData {
                name: "Deck".into(),
                tags: vec!["Deck".into(), "Hidden".into()],
            },
        )
    }

    #[test]
    fn test_answers_to() {
        let zone = deck();
        assert!(zone.answers_to("z001"));
        assert!(zone.answers_to("Deck"));
        assert!(zone.answers_to("Hidden"));
        assert!(!zone.answers_to("Hand"));
    }

    #[test]
    fn test_placement() {
        let mut zone = deck();
        zone.insert(CardId::nth(0), ZonePlacement::Top);
        zone.insert(CardId::nth(1), ZonePlacement::Top);
        zone.insert(CardId::nth(2), ZonePlacement::Bottom);
        assert_eq!(zone.top(), Some(&CardId::nth(1)));
        assert_eq!(zone.position_of(&CardId::nth(2)), Some(0));
        zone.insert(CardId::nth(3), ZonePlacement::Slot(1));
        assert_eq!(zone.position_of(&CardId::nth(3)), Some(1));
    }

    #[test]
    fn test_take() {
        let mut zone = deck();
        zone.insert(CardId::nth(0), ZonePlacement::Top);
        assert!(zone.take(&CardId::nth(0)));
        assert!(!zone.take(&CardId::nth(0)));
        assert!(zone.is_empty());
    }
}
