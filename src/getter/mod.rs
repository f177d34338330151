//! Deferred value resolution.
//!
//! A getter is parsed once from clause text and re-evaluated on demand
//! against live state. `get()` never mutates the tree; the only state
//! it touches is the RNG stream behind `rn()`.
//!
//! Parse dispatch tries, in order: numeric literal, arithmetic
//! expression, selection counts (`nc`/`nz`), entity selections
//! (`c`/`z`/`r`/`allX`), field lookup (`cf`), zone index (`ic`),
//! random number (`rn`), and finally a bare name. Names resolve at
//! evaluation time: a field of the candidate entity if a selector is
//! mid-filter, else a defined match variable, else the literal text.

mod expr;

pub use expr::{ArithOp, Expr};

use tracing::warn;

use crate::clause::{split_args, strip_parens, ClauseError};
use crate::core::{Candidate, EvalContext, Value};
use crate::selector::{Selector, SelectorKind};

/// Relative-update operator carried by a getter's leading character.
///
/// `+5` means "add 5 to the current value". The getter itself ignores
/// it; the consuming command applies it against the current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeOp {
    Add,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl RelativeOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(RelativeOp::Add),
            '*' => Some(RelativeOp::Multiply),
            '/' => Some(RelativeOp::Divide),
            '%' => Some(RelativeOp::Modulo),
            '^' => Some(RelativeOp::Power),
            _ => None,
        }
    }

    /// Apply this operator to the current value and the operand.
    #[must_use]
    pub fn apply(self, current: f64, operand: f64) -> f64 {
        match self {
            RelativeOp::Add => current + operand,
            RelativeOp::Multiply => current * operand,
            RelativeOp::Divide => current / operand,
            RelativeOp::Modulo => current % operand,
            RelativeOp::Power => current.powf(operand),
        }
    }
}

/// The parsed form of a getter clause.
#[derive(Clone, Debug)]
pub enum GetterKind {
    /// Numeric literal.
    Number(f64),
    /// Infix arithmetic over sub-getters.
    Expression(Expr),
    /// `nc(...)` / `nz(...)`: how many entities the selector matches.
    SelectionCount(Selector),
    /// `c(...)`, `allcards`, `z(...)`, `allzones`, `r(...)`, `allrules`.
    Selection(Selector),
    /// `cf(field,selector)`: a field of the first selected card.
    Field { field: String, selector: Selector },
    /// `ic(selector)`: position of the first selected card in its zone.
    ZoneIndex(Selector),
    /// `rn(lo,hi)`: random draw, integer unless a bound has a `.`.
    Random {
        lo: Box<Getter>,
        hi: Box<Getter>,
        integer: bool,
    },
    /// Bare name, resolved at evaluation time.
    Name(String),
    /// Anything else: a string literal.
    Text(String),
}

/// A deferred value, parsed once and evaluated on demand.
#[derive(Clone, Debug)]
pub struct Getter {
    /// Relative-update marker consumed by the owning command.
    pub relative: Option<RelativeOp>,
    pub kind: GetterKind,
}

impl Getter {
    /// Parse a getter clause.
    pub fn parse(text: &str) -> Result<Self, ClauseError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self {
                relative: None,
                kind: GetterKind::Text(String::new()),
            });
        }

        let mut relative = None;
        let mut body = text;
        if let Some(first) = text.chars().next() {
            if text.len() > 1 {
                if let Some(op) = RelativeOp::from_char(first) {
                    relative = Some(op);
                    body = text[1..].trim_start();
                }
            }
        }

        Ok(Self {
            relative,
            kind: Self::parse_kind(body)?,
        })
    }

    fn parse_kind(text: &str) -> Result<GetterKind, ClauseError> {
        let stripped = strip_parens(text);
        if stripped != text {
            return Self::parse_kind(stripped);
        }

        if let Ok(n) = text.parse::<f64>() {
            return Ok(GetterKind::Number(n));
        }

        if expr::has_top_level_operator(text) {
            return Ok(GetterKind::Expression(Expr::parse(text)?));
        }

        if let Some(inner) = call_body(text, "nc") {
            return Ok(GetterKind::SelectionCount(Selector::from_args(
                SelectorKind::Card,
                inner,
            )?));
        }
        if let Some(inner) = call_body(text, "nz") {
            return Ok(GetterKind::SelectionCount(Selector::from_args(
                SelectorKind::Zone,
                inner,
            )?));
        }

        if text == "allcards" || call_body(text, "c").is_some() {
            return Ok(GetterKind::Selection(Selector::parse(text)?));
        }
        if text == "allzones" || call_body(text, "z").is_some() {
            return Ok(GetterKind::Selection(Selector::parse(text)?));
        }
        if text == "allrules" || call_body(text, "r").is_some() {
            return Ok(GetterKind::Selection(Selector::parse(text)?));
        }

        if let Some(inner) = call_body(text, "cf") {
            let args = split_args(inner)?;
            if args.len() != 2 {
                return Err(ClauseError::BadArity {
                    verb: "cf".into(),
                    expected: "2",
                    found: args.len(),
                });
            }
            return Ok(GetterKind::Field {
                field: args[0].to_string(),
                selector: Selector::parse_as(SelectorKind::Card, args[1])?,
            });
        }

        if let Some(inner) = call_body(text, "ic") {
            return Ok(GetterKind::ZoneIndex(Selector::parse_as(
                SelectorKind::Card,
                inner,
            )?));
        }

        if let Some(inner) = call_body(text, "rn") {
            let args = split_args(inner)?;
            if args.len() != 2 {
                return Err(ClauseError::BadArity {
                    verb: "rn".into(),
                    expected: "2",
                    found: args.len(),
                });
            }
            let integer = !args[0].contains('.') && !args[1].contains('.');
            return Ok(GetterKind::Random {
                lo: Box::new(Getter::parse(args[0])?),
                hi: Box::new(Getter::parse(args[1])?),
                integer,
            });
        }

        if is_name(text) {
            return Ok(GetterKind::Name(text.to_string()));
        }
        Ok(GetterKind::Text(text.to_string()))
    }

    /// Evaluate against live state.
    pub fn get(&self, ctx: &mut EvalContext) -> Value {
        match &self.kind {
            GetterKind::Number(n) => Value::Number(*n),
            GetterKind::Expression(expr) => match expr.eval(ctx) {
                Some(n) => Value::Number(n),
                None => Value::None,
            },
            GetterKind::SelectionCount(selector) => {
                Value::Number(selector.count(ctx) as f64)
            }
            GetterKind::Selection(selector) => selector.select(ctx),
            GetterKind::Field { field, selector } => {
                let cards = selector.cards(ctx);
                match cards.first().and_then(|id| ctx.game.card(id)) {
                    Some(card) => match card.field(field) {
                        Some(value) => field_to_value(value),
                        None => Value::None,
                    },
                    None => Value::None,
                }
            }
            GetterKind::ZoneIndex(selector) => {
                let cards = selector.cards(ctx);
                match cards.first().and_then(|id| ctx.game.position_in_zone(id)) {
                    Some(pos) => Value::Number(pos as f64),
                    None => Value::None,
                }
            }
            GetterKind::Random { lo, hi, integer } => {
                let (lo, hi) = (lo.get(ctx).as_number(), hi.get(ctx).as_number());
                match (lo, hi) {
                    (Some(lo), Some(hi)) => {
                        if *integer {
                            Value::Number(ctx.rng.int_range(lo as i64, hi as i64) as f64)
                        } else {
                            Value::Number(ctx.rng.float_range(lo, hi))
                        }
                    }
                    _ => {
                        warn!("non-numeric bound in rn()");
                        Value::None
                    }
                }
            }
            GetterKind::Name(name) => self.resolve_name(name, ctx),
            GetterKind::Text(s) => Value::Text(s.clone()),
        }
    }

    fn resolve_name(&self, name: &str, ctx: &mut EvalContext) -> Value {
        if let Some(Candidate::Card { id, .. }) = &ctx.candidate {
            if let Some(card) = ctx.game.card(id) {
                if let Some(value) = card.field(name) {
                    return field_to_value(value);
                }
            }
        }
        if let Some(raw) = ctx.vars.get(name) {
            return Value::Text(raw.to_string());
        }
        Value::Text(name.to_string())
    }

    /// Whether this getter carries a relative-update marker.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.relative.is_some()
    }
}

fn field_to_value(value: &crate::entities::FieldValue) -> Value {
    match value.as_number() {
        Some(n) => Value::Number(n),
        None => Value::Text(value.as_text()),
    }
}

/// If `text` is `prefix(...)` with the closing paren at the end,
/// return the argument body.
fn call_body<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('(')?;
    let body = rest.strip_suffix(')')?;
    // The parens we stripped must have been a matching pair.
    if crate::clause::balanced(body) {
        Some(body)
    } else {
        None
    }
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
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
        for i in 0..3 {
            let id = game.add_card(&CardData {
                name: format!("Card{i}"),
                tags: vec!["Unit".into()],
                fields: vec![FieldData {
                    name: "Power".into(),
                    value: format!("{}", i + 1),
                    kind: None,
                }],
                zone: None,
            });
            game.move_card(&id, &deck, ZonePlacement::Top);
        }
        let mut vars = VariableStore::new();
        vars.set("score", "10");
        (game, vars, MatchRng::new(5))
    }

    fn get(text: &str) -> Value {
        let (game, vars, mut rng) = fixture();
        let mut ctx = EvalContext::new(&game, &vars, &mut rng);
        Getter::parse(text).unwrap().get(&mut ctx)
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(get("42"), Value::Number(42.0));
        assert_eq!(get("-1.5"), Value::Number(-1.5));
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(get("2+3*4"), Value::Number(14.0));
        assert_eq!(get("(2+3)*4"), Value::Number(20.0));
    }

    #[test]
    fn test_selection_count() {
        assert_eq!(get("nc(z:Deck)"), Value::Number(3.0));
        assert_eq!(get("nz(Deck)"), Value::Number(1.0));
        assert_eq!(get("nc(z:Deck)+1"), Value::Number(4.0));
    }

    #[test]
    fn test_selection() {
        match get("allcards") {
            Value::CardSet(ids) => assert_eq!(ids.len(), 3),
            other => panic!("expected card set, got {other:?}"),
        }
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(get("cf(Power,c(i:c0002))"), Value::Number(2.0));
        assert_eq!(get("cf(Missing,c(i:c0002))"), Value::None);
    }

    #[test]
    fn test_zone_index() {
        // c0003 was placed last, so it sits on top (index 2).
        assert_eq!(get("ic(i:c0003)"), Value::Number(2.0));
    }

    #[test]
    fn test_random_integer_bounds() {
        for _ in 0..20 {
            match get("rn(1,3)") {
                Value::Number(n) => {
                    assert_eq!(n.fract(), 0.0);
                    assert!((1.0..=3.0).contains(&n));
                }
                other => panic!("expected number, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_random_float_when_decimal_present() {
        match get("rn(0.0,1.0)") {
            Value::Number(n) => assert!((0.0..1.0).contains(&n)),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_variable_resolution() {
        assert_eq!(get("score"), Value::Text("10".into()));
        assert_eq!(get("score").as_number(), Some(10.0));
        // Undefined name falls back to a literal.
        assert_eq!(get("Draw"), Value::Text("Draw".into()));
    }

    #[test]
    fn test_relative_marker() {
        let getter = Getter::parse("+5").unwrap();
        assert_eq!(getter.relative, Some(RelativeOp::Add));
        let (game, vars, mut rng) = fixture();
        let mut ctx = EvalContext::new(&game, &vars, &mut rng);
        assert_eq!(getter.get(&mut ctx), Value::Number(5.0));

        let plain = Getter::parse("2+3").unwrap();
        assert!(!plain.is_relative());
    }

    #[test]
    fn test_relative_apply() {
        assert_eq!(RelativeOp::Add.apply(10.0, 5.0), 15.0);
        assert_eq!(RelativeOp::Multiply.apply(4.0, 3.0), 12.0);
        assert_eq!(RelativeOp::Power.apply(2.0, 3.0), 8.0);
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(get("hello world"), Value::Text("hello world".into()));
    }
}
