//! # cardscript
//!
//! A declarative, clause-driven rules engine for turn-based card
//! games. Game behavior is authored as data: rules bind trigger labels
//! to condition clauses and command lists, all written in a compact
//! textual DSL that parses once at setup and executes against live
//! match state.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded zones, phases, or card types.
//!    A `MatchSetup` defines all of them per match.
//!
//! 2. **Rules As Data**: Triggers, conditions, and commands are
//!    serialized text; the same rule set parses identically across
//!    runs, so authored content doubles as save data.
//!
//! 3. **Explicit Context**: Clause evaluation reads state only through
//!    an [`EvalContext`] threaded into every call. Multiple matches
//!    coexist; unit tests evaluate clauses in isolation.
//!
//! 4. **Cooperative Stepping**: `Match::tick()` performs one command,
//!    one target, or one transition. External callers own the pacing.
//!
//! ## Modules
//!
//! - `clause`: depth-aware tokenizer for the DSL and its error type
//! - `core`: ids, values, variables, RNG, evaluation context
//! - `entities`: cards, zones, typed fields, the entity registry
//! - `getter`: deferred value resolution, including arithmetic
//! - `selector`: predicate-based entity filtering
//! - `condition`: AND/OR/NOT condition trees
//! - `command`: the fourteen imperative operations, as pure data
//! - `engine`: the match itself: turn/phase loop and trigger dispatch

pub mod clause;
pub mod command;
pub mod condition;
pub mod core;
pub mod engine;
pub mod entities;
pub mod getter;
pub mod selector;

// Re-export commonly used types
pub use crate::clause::ClauseError;
pub use crate::command::{Command, CommandKind, MoveOptions};
pub use crate::condition::{ConditionNode, StringTree};
pub use crate::core::{
    format_number, is_reserved, CardId, EvalContext, MatchRng, RuleId, Value, VariableStore,
    ZoneId,
};
pub use crate::engine::{
    Match, MatchSetup, MatchState, Rule, RuleData, TickStatus, TriggerLabel,
};
pub use crate::entities::{
    Card, CardData, FieldData, FieldKind, FieldValue, Game, RevealState, Zone, ZoneData,
    ZonePlacement,
};
pub use crate::getter::{Expr, Getter, GetterKind, RelativeOp};
pub use crate::selector::{Selector, SelectorKind};
