//! The entity registry: ordered lists of cards, zones, and rules.
//!
//! Selectors hold no entity references of their own; they scan these
//! lists on every evaluation, so external additions, removals, and
//! reorders are visible on the next access.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::core::ids::{CardId, RuleId, ZoneId};
use crate::core::rng::MatchRng;
use crate::engine::Rule;

use super::card::{Card, CardData};
use super::zone::{Zone, ZoneData, ZonePlacement};

/// Registry of all match entities, queried by selectors by reference.
#[derive(Debug, Default)]
pub struct Game {
    cards: Vec<Card>,
    zones: Vec<Zone>,
    rules: Vec<Rule>,
    card_index: FxHashMap<String, usize>,
    zone_index: FxHashMap<String, usize>,
    rule_index: FxHashMap<String, usize>,
}

impl Game {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Cards ===

    /// Register a card, assigning the next stable id.
    pub fn add_card(&mut self, data: &CardData) -> CardId {
        let id = CardId::nth(self.cards.len());
        self.card_index
            .insert(id.as_str().to_string(), self.cards.len());
        self.cards.push(Card::from_data(id.clone(), data));
        id
    }

    /// All cards in registration order.
    #[must_use]
    pub fn all_cards(&self) -> &[Card] {
        &self.cards
    }

    /// Look up a card by id.
    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(*self.card_index.get(id.as_str())?)
    }

    /// Look up a card mutably by id.
    pub fn card_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        let idx = *self.card_index.get(id.as_str())?;
        self.cards.get_mut(idx)
    }

    // === Zones ===

    /// Register a zone, assigning the next stable id.
    pub fn add_zone(&mut self, data: &ZoneData) -> ZoneId {
        let id = ZoneId::nth(self.zones.len());
        self.zone_index
            .insert(id.as_str().to_string(), self.zones.len());
        self.zones.push(Zone::from_data(id.clone(), data));
        id
    }

    /// All zones in registration order.
    #[must_use]
    pub fn all_zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Look up a zone by id.
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(*self.zone_index.get(id.as_str())?)
    }

    /// Look up a zone mutably by id.
    pub fn zone_mut(&mut self, id: &ZoneId) -> Option<&mut Zone> {
        let idx = *self.zone_index.get(id.as_str())?;
        self.zones.get_mut(idx)
    }

    /// First zone whose id, name, or tag matches `label`.
    #[must_use]
    pub fn find_zone(&self, label: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.answers_to(label))
    }

    // === Rules ===

    /// Register a rule, assigning the next stable id.
    pub fn add_rule(&mut self, mut rule: Rule) -> RuleId {
        let id = RuleId::nth(self.rules.len());
        rule.id = id.clone();
        self.rule_index
            .insert(id.as_str().to_string(), self.rules.len());
        self.rules.push(rule);
        id
    }

    /// All rules in registration order.
    #[must_use]
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id.
    #[must_use]
    pub fn rule(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(*self.rule_index.get(id.as_str())?)
    }

    // === Card movement ===

    /// Position of a card within its current zone (0 = bottom).
    #[must_use]
    pub fn position_in_zone(&self, card: &CardId) -> Option<usize> {
        let zone_id = self.card(card)?.zone.clone()?;
        self.zone(&zone_id)?.position_of(card)
    }

    /// Move a card into a zone.
    ///
    /// Returns false when either entity is unknown; the state is then
    /// unchanged.
    pub fn move_card(&mut self, card: &CardId, dest: &ZoneId, placement: ZonePlacement) -> bool {
        if self.card(card).is_none() || self.zone(dest).is_none() {
            warn!(card = %card, zone = %dest, "move references unknown entity");
            return false;
        }
        let old_zone = self.card(card).and_then(|c| c.zone.clone());
        if let Some(old) = old_zone {
            if let Some(zone) = self.zone_mut(&old) {
                zone.take(card);
            }
        }
        if let Some(zone) = self.zone_mut(dest) {
            zone.insert(card.clone(), placement);
        }
        if let Some(c) = self.card_mut(card) {
            c.zone = Some(dest.clone());
        }
        true
    }

    /// Shuffle a zone's content in place.
    pub fn shuffle_zone(&mut self, zone: &ZoneId, rng: &mut MatchRng) -> bool {
        match self.zone_mut(zone) {
            Some(zone) => {
                rng.shuffle(zone.content_mut());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Game {
        let mut game = Game::new();
        game.add_zone(&ZoneData {
            name: "Deck".into(),
            tags: vec!["Deck".into()],
        });
        game.add_zone(&ZoneData {
            name: "Hand".into(),
            tags: vec!["Hand".into()],
        });
        for i in 0..3 {
            let id = game.add_card(&CardData {
                name: format!("Card{i}"),
                ..CardData::default()
            });
            game.move_card(&id, &ZoneId::nth(0), ZonePlacement::Top);
        }
        game
    }

    #[test]
    fn test_ids_and_lookup() {
        let game = fixture();
        assert_eq!(game.all_cards().len(), 3);
        assert_eq!(game.card(&CardId::from("c0002")).unwrap().name, "Card1");
        assert!(game.card(&CardId::from("c9999")).is_none());
        assert!(game.find_zone("Hand").is_some());
    }

    #[test]
    fn test_move_between_zones() {
        let mut game = fixture();
        let top = CardId::from("c0003");
        assert_eq!(game.position_in_zone(&top), Some(2));

        let hand = ZoneId::from("z002");
        assert!(game.move_card(&top, &hand, ZonePlacement::Top));
        assert_eq!(game.card(&top).unwrap().zone, Some(hand.clone()));
        assert_eq!(game.zone(&hand).unwrap().len(), 1);
        assert_eq!(game.zone(&ZoneId::from("z001")).unwrap().len(), 2);
    }

    #[test]
    fn test_move_unknown_is_noop() {
        let mut game = fixture();
        assert!(!game.move_card(
            &CardId::from("c9999"),
            &ZoneId::from("z001"),
            ZonePlacement::Top
        ));
        assert_eq!(game.zone(&ZoneId::from("z001")).unwrap().len(), 3);
    }

    #[test]
    fn test_shuffle_deterministic() {
        let mut a = fixture();
        let mut b = fixture();
        let mut rng_a = MatchRng::new(3);
        let mut rng_b = MatchRng::new(3);
        assert!(a.shuffle_zone(&ZoneId::from("z001"), &mut rng_a));
        assert!(b.shuffle_zone(&ZoneId::from("z001"), &mut rng_b));
        assert_eq!(
            a.zone(&ZoneId::from("z001")).unwrap().content(),
            b.zone(&ZoneId::from("z001")).unwrap().content()
        );
    }
}
