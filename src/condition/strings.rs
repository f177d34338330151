//! String-only condition trees.
//!
//! The string variant of the condition tree carries no getters: each
//! leaf is a bare label matched against a caller-supplied set. Tag
//! expressions inside selectors (`t:Hero&!Exhausted`) and zone
//! membership filters both evaluate through this type.

use crate::clause::{find_logical, is_wrapped, ClauseError};

/// AND/OR/NOT tree over bare string labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTree {
    not: bool,
    sub: Option<Box<StringTree>>,
    and: Option<Box<StringTree>>,
    or: Option<Box<StringTree>>,
    leaf: Option<String>,
}

impl StringTree {
    /// Parse a tag expression.
    pub fn parse(text: &str) -> Result<Self, ClauseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClauseError::Empty);
        }
        match find_logical(text) {
            Some((idx, connector)) => {
                let mut node = Self::parse_unit(&text[..idx])?;
                let rest = Self::parse(&text[idx + 1..])?;
                match connector {
                    '&' => node.and = Some(Box::new(rest)),
                    _ => node.or = Some(Box::new(rest)),
                }
                Ok(node)
            }
            None => Self::parse_unit(text),
        }
    }

    fn parse_unit(text: &str) -> Result<Self, ClauseError> {
        let mut text = text.trim();
        let mut not = false;
        while let Some(rest) = text.strip_prefix('!') {
            not = !not;
            text = rest.trim_start();
        }
        if text.is_empty() {
            return Err(ClauseError::Empty);
        }
        if is_wrapped(text) {
            let inner = Self::parse(&text[1..text.len() - 1])?;
            return Ok(Self {
                not,
                sub: Some(Box::new(inner)),
                ..Self::default()
            });
        }
        Ok(Self {
            not,
            leaf: Some(text.to_string()),
            ..Self::default()
        })
    }

    /// Evaluate against a membership predicate.
    ///
    /// Own truth comes from the subgroup or the leaf, negation applies,
    /// then the chain continues: `and` only while true, `or` only while
    /// false.
    pub fn matches(&self, contains: &dyn Fn(&str) -> bool) -> bool {
        let mut value = match (&self.sub, &self.leaf) {
            (Some(sub), _) => sub.matches(contains),
            (None, Some(leaf)) => contains(leaf),
            (None, None) => false,
        };
        if self.not {
            value = !value;
        }
        if let Some(and) = &self.and {
            if value {
                value = and.matches(contains);
            }
        }
        if let Some(or) = &self.or {
            if !value {
                value = or.matches(contains);
            }
        }
        value
    }
}
