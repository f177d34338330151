//! Entity selection.
//!
//! A selector clause (`c(z:Deck,x:1)`, `allzones`, `r(t:Setup)`) is a
//! kind plus an ANDed list of filter parameters and an optional
//! quantity cap. Selectors hold no entity references: every `select()`
//! scans the registry afresh, so external additions, removals, and
//! reorders are visible on the next call.
//!
//! Card scans re-sort the pool by each card's live position within its
//! zone before filtering, so `x`/`b` caps mean "N nearest the
//! top/bottom of current zone order".

use tracing::warn;

use crate::clause::{split_args, split_top_level, ClauseError, CompareOp};
use crate::condition::{ConditionNode, StringTree};
use crate::core::{Candidate, CardId, EvalContext, RuleId, Value, ZoneId};
use crate::entities::{Card, Zone};
use crate::getter::Getter;

/// What kind of entity a selector yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorKind {
    Card,
    Zone,
    Rule,
}

/// Which end of the sorted pool a quantity cap takes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapFrom {
    Top,
    Bottom,
}

/// Quantity cap, evaluated at selection time.
#[derive(Clone, Debug)]
pub struct Quantity {
    cap: Box<Getter>,
    from: CapFrom,
}

/// One ANDed filter predicate.
#[derive(Clone, Debug)]
enum SelectionParameter {
    /// Bare fragment: matches id, name, or any tag.
    Label(String),
    /// `i:` id equality; the value may be a variable holding an id.
    Id(String),
    /// `t:` tag expression over the entity's tags.
    Tags(StringTree),
    /// `z:` (cards only) membership test over the containing zone's
    /// id, name, and tags.
    InZone(StringTree),
    /// `f:` condition evaluated with the candidate injected.
    Field(ConditionNode),
    /// `n:` index condition against the candidate's scan index.
    Index { op: CompareOp, value: Getter },
}

/// Predicate-based filter over a pool of entities.
#[derive(Clone, Debug)]
pub struct Selector {
    pub kind: SelectorKind,
    parameters: Vec<SelectionParameter>,
    quantity: Option<Quantity>,
}

impl Selector {
    /// Parse a full selector clause: `c(...)`, `z(...)`, `r(...)`, or
    /// a bare `allcards`/`allzones`/`allrules`.
    pub fn parse(text: &str) -> Result<Self, ClauseError> {
        let text = text.trim();
        match text {
            "allcards" => return Ok(Self::unfiltered(SelectorKind::Card)),
            "allzones" => return Ok(Self::unfiltered(SelectorKind::Zone)),
            "allrules" => return Ok(Self::unfiltered(SelectorKind::Rule)),
            _ => {}
        }
        for (prefix, kind) in [
            ("c(", SelectorKind::Card),
            ("z(", SelectorKind::Zone),
            ("r(", SelectorKind::Rule),
        ] {
            if let Some(rest) = text.strip_prefix(prefix) {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| ClauseError::UnbalancedParens(text.to_string()))?;
                return Self::from_args(kind, inner);
            }
        }
        Err(ClauseError::UnknownSelector(text.to_string()))
    }

    /// Parse selector text whose kind is implied by the position it
    /// appears in, accepting both full clauses and bare filter
    /// fragments (`z:Hand` as a zone selector, `i:c0001` as a card
    /// selector).
    pub fn parse_as(kind: SelectorKind, text: &str) -> Result<Self, ClauseError> {
        let text = text.trim();
        if text.starts_with("c(")
            || text.starts_with("z(")
            || text.starts_with("r(")
            || text.starts_with("all")
        {
            return Self::parse(text);
        }
        // `z:Hand` in zone position names the zone itself, not a card's
        // containing zone.
        if kind == SelectorKind::Zone {
            if let Some(label) = text.strip_prefix("z:") {
                return Self::from_args(kind, label);
            }
        }
        Self::from_args(kind, text)
    }

    /// Build a selector of `kind` from its comma-separated filter
    /// fragments (the text between the parentheses).
    pub fn from_args(kind: SelectorKind, args: &str) -> Result<Self, ClauseError> {
        let mut selector = Self::unfiltered(kind);
        for fragment in split_args(args)? {
            selector.add_parameter(fragment)?;
        }
        Ok(selector)
    }

    fn unfiltered(kind: SelectorKind) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
            quantity: None,
        }
    }

    fn add_parameter(&mut self, fragment: &str) -> Result<(), ClauseError> {
        let fragment = fragment.trim();
        let split = split_top_level(fragment, ':')?;
        let (sigil, body) = match split.as_slice() {
            [sigil, rest @ ..] if sigil.len() == 1 && !rest.is_empty() => {
                // The sigil may carry whitespace around it, so the body
                // is everything past the first colon, not a fixed slice.
                let body = fragment.split_once(':').map_or("", |(_, b)| b).trim();
                (sigil.chars().next().unwrap_or(' '), body)
            }
            _ => {
                self.parameters
                    .push(SelectionParameter::Label(fragment.to_string()));
                return Ok(());
            }
        };
        match sigil {
            'i' => self.parameters.push(SelectionParameter::Id(body.to_string())),
            't' => self
                .parameters
                .push(SelectionParameter::Tags(StringTree::parse(body)?)),
            'z' if self.kind == SelectorKind::Card => {
                // Zone membership narrows the pool most, so it runs
                // before the other predicates.
                self.parameters
                    .insert(0, SelectionParameter::InZone(StringTree::parse(body)?));
            }
            'f' => self
                .parameters
                .push(SelectionParameter::Field(ConditionNode::parse(body)?)),
            'n' => self.parameters.push(parse_index(body)?),
            'x' => {
                self.quantity = Some(Quantity {
                    cap: Box::new(Getter::parse(body)?),
                    from: CapFrom::Top,
                });
            }
            'b' => {
                self.quantity = Some(Quantity {
                    cap: Box::new(Getter::parse(body)?),
                    from: CapFrom::Bottom,
                });
            }
            other => {
                return Err(ClauseError::UnknownSigil {
                    sigil: other,
                    clause: fragment.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Selected entity ids as a set value of the selector's kind.
    pub fn select(&self, ctx: &mut EvalContext) -> Value {
        match self.kind {
            SelectorKind::Card => Value::CardSet(self.cards(ctx)),
            SelectorKind::Zone => Value::ZoneSet(self.zones(ctx)),
            SelectorKind::Rule => Value::RuleSet(self.rules(ctx)),
        }
    }

    /// How many entities the selector matches.
    pub fn count(&self, ctx: &mut EvalContext) -> usize {
        match self.kind {
            SelectorKind::Card => self.cards(ctx).len(),
            SelectorKind::Zone => self.zones(ctx).len(),
            SelectorKind::Rule => self.rules(ctx).len(),
        }
    }

    /// Matching cards, nearest the cap end first.
    pub fn cards(&self, ctx: &mut EvalContext) -> Vec<CardId> {
        if self.kind != SelectorKind::Card {
            warn!("card selection requested from a non-card selector");
            return Vec::new();
        }
        let game = ctx.game;
        if self.parameters.is_empty() && self.quantity.is_none() {
            return game.all_cards().iter().map(|c| c.id.clone()).collect();
        }
        let Some(cap) = self.resolve_cap(ctx) else {
            return Vec::new();
        };
        let from = self.cap_end();

        // Zone contents change between calls, so the position sort
        // happens on every scan.
        let mut pool: Vec<&Card> = game.all_cards().iter().collect();
        pool.sort_by_key(|card| {
            let pos = game.position_in_zone(&card.id);
            match from {
                CapFrom::Top => std::cmp::Reverse(pos.map_or(-1, |p| p as i64)),
                CapFrom::Bottom => std::cmp::Reverse(-pos.map_or(i64::MAX, |p| p as i64)),
            }
        });

        let mut selected = Vec::new();
        for card in pool {
            if selected.len() >= cap {
                break;
            }
            let index = game.position_in_zone(&card.id).unwrap_or(0);
            let candidate = Candidate::Card {
                id: card.id.clone(),
                index,
            };
            let ok = self
                .parameters
                .iter()
                .all(|p| p.matches_card(card, &candidate, ctx));
            if ok {
                selected.push(card.id.clone());
            }
        }
        selected
    }

    /// Matching zones in registry order.
    pub fn zones(&self, ctx: &mut EvalContext) -> Vec<ZoneId> {
        if self.kind != SelectorKind::Zone {
            warn!("zone selection requested from a non-zone selector");
            return Vec::new();
        }
        let game = ctx.game;
        if self.parameters.is_empty() && self.quantity.is_none() {
            return game.all_zones().iter().map(|z| z.id.clone()).collect();
        }
        let Some(cap) = self.resolve_cap(ctx) else {
            return Vec::new();
        };
        let mut selected = Vec::new();
        for (index, zone) in ordered(game.all_zones().len(), self.cap_end())
            .map(|i| (i, &game.all_zones()[i]))
        {
            if selected.len() >= cap {
                break;
            }
            let candidate = Candidate::Zone {
                id: zone.id.clone(),
                index,
            };
            let ok = self
                .parameters
                .iter()
                .all(|p| p.matches_zone(zone, &candidate, ctx));
            if ok {
                selected.push(zone.id.clone());
            }
        }
        selected
    }

    /// Matching rules in registration order.
    pub fn rules(&self, ctx: &mut EvalContext) -> Vec<RuleId> {
        if self.kind != SelectorKind::Rule {
            warn!("rule selection requested from a non-rule selector");
            return Vec::new();
        }
        let game = ctx.game;
        if self.parameters.is_empty() && self.quantity.is_none() {
            return game.all_rules().iter().map(|r| r.id.clone()).collect();
        }
        let Some(cap) = self.resolve_cap(ctx) else {
            return Vec::new();
        };
        let mut selected = Vec::new();
        for (index, rule) in ordered(game.all_rules().len(), self.cap_end())
            .map(|i| (i, &game.all_rules()[i]))
        {
            if selected.len() >= cap {
                break;
            }
            let candidate = Candidate::Rule {
                id: rule.id.clone(),
                index,
            };
            let ok = self
                .parameters
                .iter()
                .all(|p| p.matches_rule(rule, &candidate, ctx));
            if ok {
                selected.push(rule.id.clone());
            }
        }
        selected
    }

    /// Cap as a scan limit; `None` means the selection is void.
    fn resolve_cap(&self, ctx: &mut EvalContext) -> Option<usize> {
        match &self.quantity {
            None => Some(usize::MAX),
            Some(q) => match q.cap.get(ctx).as_number() {
                Some(n) if n >= 1.0 => Some(n.floor() as usize),
                Some(_) => None,
                None => {
                    warn!("non-numeric quantity cap, selecting nothing");
                    None
                }
            },
        }
    }

    fn cap_end(&self) -> CapFrom {
        self.quantity.as_ref().map_or(CapFrom::Top, |q| q.from)
    }
}

fn ordered(len: usize, from: CapFrom) -> Box<dyn Iterator<Item = usize>> {
    match from {
        CapFrom::Top => Box::new(0..len),
        CapFrom::Bottom => Box::new((0..len).rev()),
    }
}

/// `i:` values may name a variable bound to an id.
fn resolve_id(value: &str, ctx: &EvalContext) -> String {
    match ctx.vars.get(value) {
        Some(bound) => bound.to_string(),
        None => value.to_string(),
    }
}

fn index_matches(candidate: &Candidate, op: CompareOp, value: &Getter, ctx: &mut EvalContext) -> bool {
    let index = candidate.index() as f64;
    match value.get(ctx).as_number() {
        Some(target) => op.compare(&index, &target),
        None => false,
    }
}

fn parse_index(body: &str) -> Result<SelectionParameter, ClauseError> {
    let body = body.trim();
    for (symbol, op) in [
        (">=", CompareOp::GreaterOrEqual),
        ("<=", CompareOp::LessOrEqual),
        ("!=", CompareOp::NotEqual),
        (">", CompareOp::Greater),
        ("<", CompareOp::Less),
        ("=", CompareOp::Equal),
    ] {
        if let Some(rest) = body.strip_prefix(symbol) {
            return Ok(SelectionParameter::Index {
                op,
                value: Getter::parse(rest)?,
            });
        }
    }
    Ok(SelectionParameter::Index {
        op: CompareOp::Equal,
        value: Getter::parse(body)?,
    })
}

impl SelectionParameter {
    fn matches_card(&self, card: &Card, candidate: &Candidate, ctx: &mut EvalContext) -> bool {
        match self {
            SelectionParameter::Label(label) => {
                card.id.as_str() == label || card.name == *label || card.has_tag(label)
            }
            SelectionParameter::Id(value) => card.id.as_str() == resolve_id(value, ctx),
            SelectionParameter::Tags(tree) => tree.matches(&|tag| card.has_tag(tag)),
            SelectionParameter::InZone(tree) => match &card.zone {
                Some(zone_id) => match ctx.game.zone(zone_id) {
                    Some(zone) => tree.matches(&|label| zone.answers_to(label)),
                    None => false,
                },
                None => false,
            },
            SelectionParameter::Field(condition) => {
                ctx.with_candidate(candidate.clone(), |ctx| condition.evaluate(ctx))
            }
            SelectionParameter::Index { op, value } => index_matches(candidate, *op, value, ctx),
        }
    }

    fn matches_rule(
        &self,
        rule: &crate::engine::Rule,
        candidate: &Candidate,
        ctx: &mut EvalContext,
    ) -> bool {
        match self {
            SelectionParameter::Label(label) => {
                rule.id.as_str() == label || rule.name == *label || rule.has_tag(label)
            }
            SelectionParameter::Id(value) => rule.id.as_str() == resolve_id(value, ctx),
            SelectionParameter::Tags(tree) => tree.matches(&|tag| rule.has_tag(tag)),
            SelectionParameter::Field(condition) => {
                ctx.with_candidate(candidate.clone(), |ctx| condition.evaluate(ctx))
            }
            SelectionParameter::Index { op, value } => index_matches(candidate, *op, value, ctx),
            SelectionParameter::InZone(_) => false,
        }
    }

    fn matches_zone(&self, zone: &Zone, candidate: &Candidate, ctx: &mut EvalContext) -> bool {
        match self {
            SelectionParameter::Label(label) => zone.answers_to(label),
            SelectionParameter::Id(value) => zone.id.as_str() == resolve_id(value, ctx),
            SelectionParameter::Tags(tree) => tree.matches(&|tag| zone.tags.iter().any(|t| t == tag)),
            SelectionParameter::Field(condition) => {
                ctx.with_candidate(candidate.clone(), |ctx| condition.evaluate(ctx))
            }
            SelectionParameter::Index { op, value } => index_matches(candidate, *op, value, ctx),
            SelectionParameter::InZone(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MatchRng, VariableStore};
    use crate::entities::{CardData, FieldData, Game, ZoneData, ZonePlacement};

    fn fixture() -> (Game, VariableStore, MatchRng) {
        let mut game = Game::new();
        let deck = game.add_zone(&ZoneData {
            name: "Deck".into(),
            tags: vec!["Deck".into()],
        });
        let hand = game.add_zone(&ZoneData {
            name: "Hand".into(),
            tags: vec!["Hand".into()],
        });
        for i in 0..4 {
            let id = game.add_card(&CardData {
                name: format!("Card{i}"),
                tags: if i % 2 == 0 {
                    vec!["Even".into()]
                } else {
                    vec!["Odd".into()]
                },
                fields: vec![FieldData {
                    name: "Rank".into(),
                    value: format!("{i}"),
                    kind: None,
                }],
                zone: None,
            });
            let dest = if i == 3 { &hand } else { &deck };
            game.move_card(&id, dest, ZonePlacement::Top);
        }
        (game, VariableStore::new(), MatchRng::new(9))
    }

    fn card_ids(text: &str) -> Vec<String> {
        let (game, vars, mut rng) = fixture();
        let mut ctx = EvalContext::new(&game, &vars, &mut rng);
        Selector::parse(text)
            .unwrap()
            .cards(&mut ctx)
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_unfiltered_returns_pool_order() {
        assert_eq!(card_ids("allcards"), ["c0001", "c0002", "c0003", "c0004"]);
        assert_eq!(card_ids("c()"), ["c0001", "c0002", "c0003", "c0004"]);
    }

    #[test]
    fn test_zone_filter() {
        let mut deck = card_ids("c(z:Deck)");
        deck.sort();
        assert_eq!(deck, ["c0001", "c0002", "c0003"]);
        assert_eq!(card_ids("c(z:Hand)"), ["c0004"]);
    }

    #[test]
    fn test_quantity_cap_takes_nearest_top() {
        // c0003 sits on top of the deck, c0001 at the bottom.
        assert_eq!(card_ids("c(z:Deck,x:1)"), ["c0003"]);
        assert_eq!(card_ids("c(z:Deck,x:2)"), ["c0003", "c0002"]);
        assert_eq!(card_ids("c(z:Deck,b:1)"), ["c0001"]);
        // Cap larger than the pool returns every match.
        assert_eq!(card_ids("c(z:Deck,x:9)").len(), 3);
        // A zero cap selects nothing.
        assert!(card_ids("c(z:Deck,x:0)").is_empty());
    }

    #[test]
    fn test_tag_and_field_filters() {
        let mut even = card_ids("c(t:Even)");
        even.sort();
        assert_eq!(even, ["c0001", "c0003"]);
        assert_eq!(card_ids("c(f:Rank>=2)").len(), 2);
        assert_eq!(card_ids("c(t:Even&!Odd,f:Rank<2)"), ["c0001"]);
    }

    #[test]
    fn test_id_filter_resolves_variables() {
        let (game, mut vars, mut rng) = fixture();
        vars.set("target", "c0002");
        let mut ctx = EvalContext::new(&game, &vars, &mut rng);
        let selector = Selector::parse("c(i:target)").unwrap();
        let ids = selector.cards(&mut ctx);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), "c0002");
    }

    #[test]
    fn test_index_condition() {
        // n: compares against the card's position in its zone.
        let top = card_ids("c(z:Deck,n:2)");
        assert_eq!(top, ["c0003"]);
        assert_eq!(card_ids("c(z:Deck,n:>0)").len(), 2);
    }

    #[test]
    fn test_zone_selector_shorthand() {
        let (game, vars, mut rng) = fixture();
        let mut ctx = EvalContext::new(&game, &vars, &mut rng);
        let sel = Selector::parse_as(SelectorKind::Zone, "z:Hand").unwrap();
        let zones = sel.zones(&mut ctx);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].as_str(), "z002");

        let all = Selector::parse_as(SelectorKind::Zone, "allzones").unwrap();
        assert_eq!(all.zones(&mut ctx).len(), 2);
    }

    #[test]
    fn test_fragment_whitespace_tolerated() {
        // Spaces around a sigil's colon must not eat into the body.
        assert_eq!(card_ids("c( z:Deck , x : 1 )"), ["c0003"]);
        assert_eq!(card_ids("c(t : Even, b : 1)"), ["c0001"]);
    }

    #[test]
    fn test_unknown_sigil_is_error() {
        assert!(matches!(
            Selector::parse("c(q:what)"),
            Err(ClauseError::UnknownSigil { sigil: 'q', .. })
        ));
        assert!(Selector::parse("w(z:Deck)").is_err());
    }
}
