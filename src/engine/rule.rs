//! Rules: the unit of authored behavior.
//!
//! A rule binds a trigger label to a condition gate and two command
//! lists. All clause text is parsed exactly once, when the rule is
//! built from its serialized data; a rule that fails to parse is
//! logged and dropped at setup, never mid-match.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::clause::ClauseError;
use crate::command::Command;
use crate::condition::ConditionNode;
use crate::core::RuleId;

use super::trigger::TriggerLabel;

/// Serialized form of a rule, as authored.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RuleData {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Id or name of whatever the rule belongs to (a card, the match
    /// itself); informational only.
    #[serde(default)]
    pub origin: String,
    pub trigger: String,
    /// Condition clause; empty means the rule always fires.
    #[serde(default)]
    pub condition: String,
    /// Command list run when the condition holds.
    #[serde(default)]
    pub commands: String,
    /// Command list run instead when the condition fails.
    #[serde(default)]
    pub else_commands: String,
}

/// A parsed rule, immutable for the duration of a match.
#[derive(Clone, Debug)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub tags: SmallVec<[String; 4]>,
    pub origin: String,
    pub trigger: TriggerLabel,
    pub condition: Option<ConditionNode>,
    pub commands: Vec<Command>,
    pub else_commands: Vec<Command>,
}

impl Rule {
    /// Parse a rule from its authored data.
    ///
    /// The id is a placeholder until the registry assigns one.
    pub fn from_data(data: &RuleData) -> Result<Self, ClauseError> {
        let condition = match data.condition.trim() {
            "" => None,
            text => Some(ConditionNode::parse(text)?),
        };
        Ok(Self {
            id: RuleId::from(""),
            name: data.name.clone(),
            tags: data.tags.iter().cloned().collect(),
            origin: data.origin.clone(),
            trigger: data.trigger.parse()?,
            condition,
            commands: Command::parse_list(&data.commands)?,
            else_commands: Command::parse_list(&data.else_commands)?,
        })
    }

    /// Whether the rule carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data() {
        let rule = Rule::from_data(&RuleData {
            name: "Draw a card".into(),
            tags: vec!["Draw".into()],
            trigger: "OnPhaseStarted".into(),
            condition: "phase=Draw".into(),
            commands: "MoveCardToZone(c(z:Deck,x:1),z:Hand)".into(),
            ..RuleData::default()
        })
        .unwrap();
        assert_eq!(rule.trigger, TriggerLabel::OnPhaseStarted);
        assert!(rule.condition.is_some());
        assert_eq!(rule.commands.len(), 1);
        assert!(rule.else_commands.is_empty());
        assert!(rule.has_tag("Draw"));
    }

    #[test]
    fn test_empty_condition_always_fires() {
        let rule = Rule::from_data(&RuleData {
            name: "Announce".into(),
            trigger: "OnTurnStarted".into(),
            commands: "SendMessage(NewTurn)".into(),
            ..RuleData::default()
        })
        .unwrap();
        assert!(rule.condition.is_none());
    }

    #[test]
    fn test_bad_clause_is_error() {
        let bad_trigger = Rule::from_data(&RuleData {
            name: "x".into(),
            trigger: "OnSomething".into(),
            ..RuleData::default()
        });
        assert!(bad_trigger.is_err());

        let bad_command = Rule::from_data(&RuleData {
            name: "x".into(),
            trigger: "OnTurnStarted".into(),
            commands: "Explode()".into(),
            ..RuleData::default()
        });
        assert!(bad_command.is_err());
    }
}
