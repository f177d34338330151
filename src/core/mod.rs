//! Core types: entity ids, values, variables, RNG, evaluation context.
//!
//! These are the building blocks every other module shares. Nothing
//! here parses clause text or owns the match loop.

pub mod context;
pub mod ids;
pub mod rng;
pub mod value;
pub mod variables;

pub use context::{Candidate, EvalContext};
pub use ids::{CardId, RuleId, ZoneId};
pub use rng::MatchRng;
pub use value::{format_number, Value};
pub use variables::{is_reserved, VariableStore, RESERVED_NAMES};
