//! AND/OR/NOT condition trees.
//!
//! A condition clause like `nc(z:Hand)<7&(phase=Draw|turnNumber=1)`
//! parses into a chain of nodes. Each node owns either a subgroup or a
//! leaf comparison between two getters; `&`/`|` link continuation
//! nodes. Evaluation short-circuits along the chain: an `and` link is
//! followed only while the running value is true, an `or` link only
//! while it is false.

mod strings;

pub use strings::StringTree;

use tracing::warn;

use crate::clause::{find_comparison, find_logical, is_wrapped, ClauseError, CompareOp};
use crate::core::EvalContext;
use crate::getter::Getter;

/// Leaf comparison between two deferred values.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub left: Getter,
    pub op: CompareOp,
    pub right: Getter,
}

impl Comparison {
    fn parse(text: &str) -> Result<Self, ClauseError> {
        let (start, op, len) = find_comparison(text)
            .ok_or_else(|| ClauseError::MissingComparison(text.to_string()))?;
        Ok(Self {
            left: Getter::parse(&text[..start])?,
            op,
            right: Getter::parse(&text[start + len..])?,
        })
    }

    fn evaluate(&self, ctx: &mut EvalContext) -> bool {
        let left = self.left.get(ctx);
        let right = self.right.get(ctx);
        match left.compare(self.op, &right) {
            Some(result) => result,
            None => {
                warn!(
                    op = self.op.symbol(),
                    ?left,
                    ?right,
                    "incomparable operands, treating as false"
                );
                false
            }
        }
    }
}

/// One node in a condition chain.
#[derive(Clone, Debug, Default)]
pub struct ConditionNode {
    not: bool,
    sub: Option<Box<ConditionNode>>,
    and: Option<Box<ConditionNode>>,
    or: Option<Box<ConditionNode>>,
    leaf: Option<Comparison>,
}

impl ConditionNode {
    /// Parse a condition clause.
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
            // `!=` belongs to the comparison, not to negation.
            if rest.starts_with('=') {
                break;
            }
            not = !not;
            text = rest.trim_start();
        }
        if text.is_empty() {
            return Err(ClauseError::Empty);
        }
        // A group only opens where a leaf would start; `c(f:Suit=Red)`
        // has its paren mid-leaf and stays a comparison.
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
            leaf: Some(Comparison::parse(text)?),
            ..Self::default()
        })
    }

    /// Evaluate against live state.
    pub fn evaluate(&self, ctx: &mut EvalContext) -> bool {
        let mut value = match (&self.sub, &self.leaf) {
            (Some(sub), _) => sub.evaluate(ctx),
            (None, Some(leaf)) => leaf.evaluate(ctx),
            (None, None) => false,
        };
        if self.not {
            value = !value;
        }
        if let Some(and) = &self.and {
            if value {
                value = and.evaluate(ctx);
            }
        }
        if let Some(or) = &self.or {
            if !value {
                value = or.evaluate(ctx);
            }
        }
        value
    }
}
