//! Imperative operations parsed from command clauses.
//!
//! Commands are pure data: a tagged kind holding pre-parsed selectors
//! and getters. The match engine owns execution, binding each kind to
//! registry access only once a match exists, so rule data can be
//! parsed long before any match is running.
//!
//! Grammar: semicolon-separated `Verb(arg1,...)` statements; verbs
//! that take no arguments may omit the parentheses.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::clause::{split_args, split_call, split_statements, ClauseError};
use crate::getter::Getter;
use crate::selector::{Selector, SelectorKind};

/// Placement and reveal metadata for a zone move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Insert at the bottom instead of the top.
    pub to_bottom: bool,
    /// Flip face-up (`true`) or face-down (`false`) on arrival.
    pub reveal: Option<bool>,
    /// Preserve the cards' relative order when moving several at once.
    pub keep_order: bool,
    /// Grid slot to insert at (`g:N`).
    pub slot: Option<usize>,
}

impl MoveOptions {
    fn parse(args: &[&str]) -> Result<Self, ClauseError> {
        let mut options = Self::default();
        for arg in args {
            let arg = arg.trim();
            match arg {
                "b" | "bottom" => options.to_bottom = true,
                "faceup" => options.reveal = Some(true),
                "facedown" => options.reveal = Some(false),
                "keeporder" => options.keep_order = true,
                _ => match arg.strip_prefix("g:").and_then(|n| n.parse().ok()) {
                    Some(slot) => options.slot = Some(slot),
                    None => {
                        return Err(ClauseError::BadArity {
                            verb: "MoveCardToZone".into(),
                            expected: "b|bottom, faceup, facedown, keeporder, g:N",
                            found: args.len(),
                        })
                    }
                },
            }
        }
        Ok(options)
    }
}

/// The fourteen operation kinds.
#[derive(Clone, Debug)]
pub enum CommandKind {
    EndCurrentPhase,
    EndTheMatch,
    EndSubphaseLoop,
    UseAction {
        name: Getter,
    },
    SendMessage {
        message: Getter,
    },
    StartSubphaseLoop {
        phases: Vec<String>,
    },
    UseCard {
        cards: Selector,
    },
    UseZone {
        zones: Selector,
    },
    Shuffle {
        zones: Selector,
    },
    SetCardFieldValue {
        cards: Selector,
        field: String,
        value: Getter,
        min: Option<Getter>,
        max: Option<Getter>,
    },
    SetVariable {
        name: String,
        value: Getter,
        min: Option<Getter>,
        max: Option<Getter>,
    },
    MoveCardToZone {
        cards: Selector,
        zone: Selector,
        options: MoveOptions,
    },
    AddTagToCard {
        cards: Selector,
        tag: String,
    },
    RemoveTagFromCard {
        cards: Selector,
        tag: String,
    },
}

/// A parsed command statement.
#[derive(Clone, Debug)]
pub struct Command {
    pub kind: CommandKind,
    source: String,
}

impl Command {
    /// Parse a single `Verb(args)` statement.
    pub fn parse(text: &str) -> Result<Self, ClauseError> {
        let text = text.trim();
        let (verb, args_text) = split_call(text)?;
        let args = split_args(args_text)?;
        let kind = match verb {
            "EndCurrentPhase" => require(verb, &args, 0, 0, |_| Ok(CommandKind::EndCurrentPhase))?,
            "EndTheMatch" => require(verb, &args, 0, 0, |_| Ok(CommandKind::EndTheMatch))?,
            "EndSubphaseLoop" => require(verb, &args, 0, 0, |_| Ok(CommandKind::EndSubphaseLoop))?,
            "UseAction" => require(verb, &args, 1, 1, |a| {
                Ok(CommandKind::UseAction {
                    name: Getter::parse(a[0])?,
                })
            })?,
            "SendMessage" => require(verb, &args, 1, 1, |a| {
                Ok(CommandKind::SendMessage {
                    message: Getter::parse(a[0])?,
                })
            })?,
            "StartSubphaseLoop" => require(verb, &args, 1, usize::MAX, |a| {
                Ok(CommandKind::StartSubphaseLoop {
                    phases: a.iter().map(|p| p.trim().to_string()).collect(),
                })
            })?,
            "UseCard" => require(verb, &args, 1, 1, |a| {
                Ok(CommandKind::UseCard {
                    cards: Selector::parse_as(SelectorKind::Card, a[0])?,
                })
            })?,
            "UseZone" => require(verb, &args, 1, 1, |a| {
                Ok(CommandKind::UseZone {
                    zones: Selector::parse_as(SelectorKind::Zone, a[0])?,
                })
            })?,
            "Shuffle" => require(verb, &args, 1, 1, |a| {
                Ok(CommandKind::Shuffle {
                    zones: Selector::parse_as(SelectorKind::Zone, a[0])?,
                })
            })?,
            "SetCardFieldValue" => require(verb, &args, 3, 5, |a| {
                Ok(CommandKind::SetCardFieldValue {
                    cards: Selector::parse_as(SelectorKind::Card, a[0])?,
                    field: a[1].trim().to_string(),
                    value: Getter::parse(a[2])?,
                    min: a.get(3).map(|t| Getter::parse(t)).transpose()?,
                    max: a.get(4).map(|t| Getter::parse(t)).transpose()?,
                })
            })?,
            "SetVariable" => require(verb, &args, 2, 4, |a| {
                Ok(CommandKind::SetVariable {
                    name: a[0].trim().to_string(),
                    value: Getter::parse(a[1])?,
                    min: a.get(2).map(|t| Getter::parse(t)).transpose()?,
                    max: a.get(3).map(|t| Getter::parse(t)).transpose()?,
                })
            })?,
            "MoveCardToZone" => require(verb, &args, 2, usize::MAX, |a| {
                Ok(CommandKind::MoveCardToZone {
                    cards: Selector::parse_as(SelectorKind::Card, a[0])?,
                    zone: Selector::parse_as(SelectorKind::Zone, a[1])?,
                    options: MoveOptions::parse(&a[2..])?,
                })
            })?,
            "AddTagToCard" => require(verb, &args, 2, 2, |a| {
                Ok(CommandKind::AddTagToCard {
                    cards: Selector::parse_as(SelectorKind::Card, a[0])?,
                    tag: a[1].trim().to_string(),
                })
            })?,
            "RemoveTagFromCard" => require(verb, &args, 2, 2, |a| {
                Ok(CommandKind::RemoveTagFromCard {
                    cards: Selector::parse_as(SelectorKind::Card, a[0])?,
                    tag: a[1].trim().to_string(),
                })
            })?,
            other => return Err(ClauseError::UnknownVerb(other.to_string())),
        };
        Ok(Self {
            kind,
            source: normalize(text),
        })
    }

    /// Parse a semicolon-separated command list.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ClauseError> {
        split_statements(text)?
            .into_iter()
            .map(Self::parse)
            .collect()
    }

    /// The clause verb this command was parsed from.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match &self.kind {
            CommandKind::EndCurrentPhase => "EndCurrentPhase",
            CommandKind::EndTheMatch => "EndTheMatch",
            CommandKind::EndSubphaseLoop => "EndSubphaseLoop",
            CommandKind::UseAction { .. } => "UseAction",
            CommandKind::SendMessage { .. } => "SendMessage",
            CommandKind::StartSubphaseLoop { .. } => "StartSubphaseLoop",
            CommandKind::UseCard { .. } => "UseCard",
            CommandKind::UseZone { .. } => "UseZone",
            CommandKind::Shuffle { .. } => "Shuffle",
            CommandKind::SetCardFieldValue { .. } => "SetCardFieldValue",
            CommandKind::SetVariable { .. } => "SetVariable",
            CommandKind::MoveCardToZone { .. } => "MoveCardToZone",
            CommandKind::AddTagToCard { .. } => "AddTagToCard",
            CommandKind::RemoveTagFromCard { .. } => "RemoveTagFromCard",
        }
    }

    /// Hash of the operation kind and its whitespace-normalized source
    /// clause. Two commands hashing equal would perform the identical
    /// operation; the pending queue drops the later one.
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.verb().hash(&mut hasher);
        self.source.hash(&mut hasher);
        hasher.finish()
    }
}

fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn require<F>(
    verb: &str,
    args: &[&str],
    min: usize,
    max: usize,
    build: F,
) -> Result<CommandKind, ClauseError>
where
    F: FnOnce(&[&str]) -> Result<CommandKind, ClauseError>,
{
    if args.len() < min || args.len() > max {
        let expected: &'static str = match (min, max) {
            (0, 0) => "0",
            (1, 1) => "1",
            (2, 2) => "2",
            (2, 4) => "2 to 4",
            (3, 5) => "3 to 5",
            _ => "at least the required arguments",
        };
        return Err(ClauseError::BadArity {
            verb: verb.to_string(),
            expected,
            found: args.len(),
        });
    }
    build(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_verbs() {
        for text in ["EndCurrentPhase", "EndTheMatch()", "EndSubphaseLoop"] {
            let cmd = Command::parse(text).unwrap();
            assert_eq!(cmd.verb(), text.trim_end_matches("()"));
        }
    }

    #[test]
    fn test_move_with_options() {
        let cmd =
            Command::parse("MoveCardToZone(c(z:Deck,x:1),z:Hand,bottom,faceup,keeporder)").unwrap();
        match cmd.kind {
            CommandKind::MoveCardToZone { options, .. } => {
                assert!(options.to_bottom);
                assert_eq!(options.reveal, Some(true));
                assert!(options.keep_order);
                assert_eq!(options.slot, None);
            }
            other => panic!("wrong kind: {other:?}"),
        }

        let grid = Command::parse("MoveCardToZone(c(x:1),z:Board,g:3)").unwrap();
        match grid.kind {
            CommandKind::MoveCardToZone { options, .. } => assert_eq!(options.slot, Some(3)),
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_set_variable_with_clamp() {
        let cmd = Command::parse("SetVariable(score,+5,0,99)").unwrap();
        match cmd.kind {
            CommandKind::SetVariable {
                name, value, min, max, ..
            } => {
                assert_eq!(name, "score");
                assert!(value.is_relative());
                assert!(min.is_some() && max.is_some());
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_command_list() {
        let list = Command::parse_list(
            "Shuffle(z:Deck);MoveCardToZone(c(z:Deck,x:5),z:Hand);EndCurrentPhase",
        )
        .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].verb(), "Shuffle");
        assert_eq!(list[2].verb(), "EndCurrentPhase");
    }

    #[test]
    fn test_structural_hash_ignores_whitespace() {
        let a = Command::parse("MoveCardToZone(c(z:Deck,x:1),z:Hand)").unwrap();
        let b = Command::parse("MoveCardToZone( c(z:Deck, x:1), z:Hand )").unwrap();
        let c = Command::parse("MoveCardToZone(c(z:Deck,x:2),z:Hand)").unwrap();
        assert_eq!(a.structural_hash(), b.structural_hash());
        assert_ne!(a.structural_hash(), c.structural_hash());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("Teleport(c0001)"),
            Err(ClauseError::UnknownVerb(_))
        ));
        assert!(matches!(
            Command::parse("UseAction()"),
            Err(ClauseError::BadArity { .. })
        ));
        assert!(Command::parse("MoveCardToZone(c(x:1))").is_err());
        assert!(Command::parse("MoveCardToZone(c(x:1),z:Hand,sideways)").is_err());
    }
}
