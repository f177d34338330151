//! Errors produced while parsing clause text.
//!
//! Every variant is recoverable: the registration or enqueue site logs
//! the error and the offending rule, selector, or command becomes a
//! no-op. Nothing here is ever fatal to a running match.

use thiserror::Error;

/// Error parsing a clause fragment.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClauseError {
    /// Parentheses don't balance anywhere in the clause.
    #[error("unbalanced parentheses in `{0}`")]
    UnbalancedParens(String),

    /// The clause (or a required fragment of it) is empty.
    #[error("empty clause")]
    Empty,

    /// A command statement names a verb the engine doesn't know.
    #[error("unknown command verb `{0}`")]
    UnknownVerb(String),

    /// A selector clause doesn't start with a known kind.
    #[error("unknown selector `{0}`")]
    UnknownSelector(String),

    /// A selector filter fragment has an unrecognized sigil.
    #[error("unknown filter sigil `{sigil}` in `{clause}`")]
    UnknownSigil { sigil: char, clause: String },

    /// A command has the wrong number of arguments.
    #[error("`{verb}` expects {expected} arguments, found {found}")]
    BadArity {
        verb: String,
        expected: &'static str,
        found: usize,
    },

    /// A condition leaf has no comparison operator.
    #[error("no comparison operator in `{0}`")]
    MissingComparison(String),

    /// An arithmetic expression could not be parsed.
    #[error("malformed expression `{0}`")]
    BadExpression(String),

    /// A rule names a trigger label the engine doesn't define.
    #[error("unknown trigger label `{0}`")]
    UnknownTrigger(String),
}
