//! Trigger labels rules can register for.

use std::fmt;
use std::str::FromStr;

use crate::clause::ClauseError;

/// Every event the match engine can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerLabel {
    OnMatchSetup,
    OnMatchStarted,
    OnMatchEnded,
    OnTurnStarted,
    OnTurnEnded,
    OnPhaseStarted,
    OnPhaseEnded,
    OnCardUsed,
    OnZoneUsed,
    OnCardEnteredZone,
    OnCardLeftZone,
    OnMessageSent,
    OnActionUsed,
    OnVariableChanged,
    /// Meta-trigger raised after any rule's commands complete.
    OnRuleActivated,
}

impl TriggerLabel {
    /// Label as it appears in rule data.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerLabel::OnMatchSetup => "OnMatchSetup",
            TriggerLabel::OnMatchStarted => "OnMatchStarted",
            TriggerLabel::OnMatchEnded => "OnMatchEnded",
            TriggerLabel::OnTurnStarted => "OnTurnStarted",
            TriggerLabel::OnTurnEnded => "OnTurnEnded",
            TriggerLabel::OnPhaseStarted => "OnPhaseStarted",
            TriggerLabel::OnPhaseEnded => "OnPhaseEnded",
            TriggerLabel::OnCardUsed => "OnCardUsed",
            TriggerLabel::OnZoneUsed => "OnZoneUsed",
            TriggerLabel::OnCardEnteredZone => "OnCardEnteredZone",
            TriggerLabel::OnCardLeftZone => "OnCardLeftZone",
            TriggerLabel::OnMessageSent => "OnMessageSent",
            TriggerLabel::OnActionUsed => "OnActionUsed",
            TriggerLabel::OnVariableChanged => "OnVariableChanged",
            TriggerLabel::OnRuleActivated => "OnRuleActivated",
        }
    }
}

impl fmt::Display for TriggerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerLabel {
    type Err = ClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = match s.trim() {
            "OnMatchSetup" => TriggerLabel::OnMatchSetup,
            "OnMatchStarted" => TriggerLabel::OnMatchStarted,
            "OnMatchEnded" => TriggerLabel::OnMatchEnded,
            "OnTurnStarted" => TriggerLabel::OnTurnStarted,
            "OnTurnEnded" => TriggerLabel::OnTurnEnded,
            "OnPhaseStarted" => TriggerLabel::OnPhaseStarted,
            "OnPhaseEnded" => TriggerLabel::OnPhaseEnded,
            "OnCardUsed" => TriggerLabel::OnCardUsed,
            "OnZoneUsed" => TriggerLabel::OnZoneUsed,
            "OnCardEnteredZone" => TriggerLabel::OnCardEnteredZone,
            "OnCardLeftZone" => TriggerLabel::OnCardLeftZone,
            "OnMessageSent" => TriggerLabel::OnMessageSent,
            "OnActionUsed" => TriggerLabel::OnActionUsed,
            "OnVariableChanged" => TriggerLabel::OnVariableChanged,
            "OnRuleActivated" => TriggerLabel::OnRuleActivated,
            other => return Err(ClauseError::UnknownTrigger(other.to_string())),
        };
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for label in [
            TriggerLabel::OnMatchSetup,
            TriggerLabel::OnPhaseStarted,
            TriggerLabel::OnCardEnteredZone,
            TriggerLabel::OnRuleActivated,
        ] {
            assert_eq!(label.as_str().parse::<TriggerLabel>(), Ok(label));
        }
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            "OnFullMoon".parse::<TriggerLabel>(),
            Err(ClauseError::UnknownTrigger(_))
        ));
    }
}
