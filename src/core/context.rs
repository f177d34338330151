//! Evaluation context threaded through getters, selectors, and
//! conditions.
//!
//! Evaluation never reaches for globals: everything a clause can
//! observe (entities, variables, the RNG stream) arrives through this
//! one context, so multiple matches can coexist and unit tests can
//! evaluate clauses in isolation.

use crate::core::ids::{CardId, RuleId, ZoneId};
use crate::core::rng::MatchRng;
use crate::core::variables::VariableStore;
use crate::entities::Game;

/// The entity currently under test by a selector's `f:`/`n:` filter.
///
/// Carries the scan index so index conditions can compare against it:
/// for cards this is the position within the card's current zone, for
/// zones and rules the registry position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    Card { id: CardId, index: usize },
    Zone { id: ZoneId, index: usize },
    Rule { id: RuleId, index: usize },
}

impl Candidate {
    /// The scan index of the candidate.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Candidate::Card { index, .. }
            | Candidate::Zone { index, .. }
            | Candidate::Rule { index, .. } => *index,
        }
    }
}

/// Borrowed view of match state for clause evaluation.
pub struct EvalContext<'a> {
    /// Entity registry (cards, zones, rules).
    pub game: &'a Game,
    /// Match variables.
    pub vars: &'a VariableStore,
    /// Seeded RNG stream, consumed by `rn()` getters.
    pub rng: &'a mut MatchRng,
    /// Entity injected while evaluating a selector filter.
    pub candidate: Option<Candidate>,
}

impl<'a> EvalContext<'a> {
    /// Create a context with no candidate injected.
    pub fn new(game: &'a Game, vars: &'a VariableStore, rng: &'a mut MatchRng) -> Self {
        Self {
            game,
            vars,
            rng,
            candidate: None,
        }
    }

    /// Run `f` with a candidate injected, restoring the previous one
    /// afterwards.
    pub fn with_candidate<R>(
        &mut self,
        candidate: Candidate,
        f: impl FnOnce(&mut EvalContext<'a>) -> R,
    ) -> R {
        let prev = self.candidate.replace(candidate);
        let result = f(self);
        self.candidate = prev;
        result
    }
}
