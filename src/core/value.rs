//! The dynamically-typed value a getter produces.
//!
//! Field and variable storage transports values as strings; the engine
//! keeps the historical "numeric if parseable" inference so existing
//! rule data keeps meaning the same thing.

use crate::clause::CompareOp;
use crate::core::ids::{CardId, RuleId, ZoneId};

/// Result of evaluating a getter against live state.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    CardSet(Vec<CardId>),
    ZoneSet(Vec<ZoneId>),
    RuleSet(Vec<RuleId>),
    /// Produced by failed lookups and type mismatches; compares false
    /// against everything except another `None` under `=`.
    None,
}

/// Render a number the way variables store it: integral values drop
/// the fraction, so `15.0` encodes as `"15"`.
#[must_use]
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

impl Value {
    /// Numeric view, coercing parseable text.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Canonical string encoding, as stored in variables and fields.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Value::Number(v) => format_number(*v),
            Value::Text(s) => s.clone(),
            Value::CardSet(ids) => ids
                .iter()
                .map(CardId::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Value::ZoneSet(ids) => ids
                .iter()
                .map(ZoneId::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Value::RuleSet(ids) => ids
                .iter()
                .map(RuleId::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Value::None => String::new(),
        }
    }

    /// Whether this value is an entity selection.
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(
            self,
            Value::CardSet(_) | Value::ZoneSet(_) | Value::RuleSet(_)
        )
    }

    fn set_ids(&self) -> Option<Vec<&str>> {
        match self {
            Value::CardSet(ids) => Some(ids.iter().map(CardId::as_str).collect()),
            Value::ZoneSet(ids) => Some(ids.iter().map(ZoneId::as_str).collect()),
            Value::RuleSet(ids) => Some(ids.iter().map(RuleId::as_str).collect()),
            _ => None,
        }
    }

    /// Compare two values under a clause comparison operator.
    ///
    /// Returns `None` on a type mismatch (e.g. ordering a selection),
    /// which callers log and treat as false.
    ///
    /// Equality over selections is containment: a lone id is contained
    /// in a set, and a set equals another when it is a subset of it. An
    /// empty left side never matches.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> Option<bool> {
        // Numeric comparison wins whenever both sides coerce.
        if let (Some(l), Some(r)) = (self.as_number(), other.as_number()) {
            return Some(op.compare(&l, &r));
        }

        if self.is_set() || other.is_set() {
            let contained = match op {
                CompareOp::Equal | CompareOp::NotEqual => self.containment(other)?,
                _ => return None,
            };
            return Some(if op == CompareOp::NotEqual {
                !contained
            } else {
                contained
            });
        }

        match op {
            CompareOp::Equal => Some(self.as_text() == other.as_text()),
            CompareOp::NotEqual => Some(self.as_text() != other.as_text()),
            // Ordering non-numeric operands is a type mismatch.
            _ => None,
        }
    }

    fn containment(&self, other: &Value) -> Option<bool> {
        match (self.set_ids(), other.set_ids()) {
            (Some(left), Some(right)) => {
                if left.is_empty() {
                    return Some(false);
                }
                Some(left.iter().all(|id| right.contains(id)))
            }
            (Some(left), Option::None) => {
                let id = other.as_text();
                if left.is_empty() || id.is_empty() {
                    return Some(false);
                }
                // A lone id acts as a one-element set on the right.
                Some(left.iter().all(|l| *l == id))
            }
            (Option::None, Some(set)) => {
                let id = self.as_text();
                if id.is_empty() {
                    return Some(false);
                }
                Some(set.contains(&id.as_str()))
            }
            (Option::None, Option::None) => Option::None,
        }
    }
}
