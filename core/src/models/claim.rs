//! Claim lifecycle
//!
//! A claim starts `Pending` and ends either `Completed` or `Cancelled`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::error::StoreError;
use super::table::StatusRule;

/// Status of a food claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Claim submitted, food not yet handed over
    Pending,

    /// Food handed over to the receiver
    Completed,

    /// Claim withdrawn
    Cancelled,
}

impl ClaimStatus {
    /// All statuses
    pub const ALL: [ClaimStatus; 3] = [
        ClaimStatus::Pending,
        ClaimStatus::Completed,
        ClaimStatus::Cancelled,
    ];

    /// Stored text of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Completed => "Completed",
            ClaimStatus::Cancelled => "Cancelled",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Completed | ClaimStatus::Cancelled)
    }

    /// Whether a claim in this status may move to `next`
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Pending, ClaimStatus::Completed) | (ClaimStatus::Pending, ClaimStatus::Cancelled)
        )
    }

    /// Status rule for the claims table's `Status` column
    pub fn status_rule(column: &str) -> StatusRule {
        let mut transitions = Vec::new();
        for from in ClaimStatus::ALL {
            for to in ClaimStatus::ALL {
                if from.can_transition_to(to) {
                    transitions.push((from.to_string(), to.to_string()));
                }
            }
        }
        StatusRule {
            column: column.to_string(),
            initial: ClaimStatus::Pending.to_string(),
            transitions,
        }
    }
}

impl Display for ClaimStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(ClaimStatus::Pending),
            "Completed" => Ok(ClaimStatus::Completed),
            // Older exports spell it with one "l"
            "Cancelled" | "Canceled" => Ok(ClaimStatus::Cancelled),
            other => Err(StoreError::Validation(format!("unknown claim status {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Completed));
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Cancelled));
        assert!(!ClaimStatus::Completed.can_transition_to(ClaimStatus::Cancelled));
        assert!(!ClaimStatus::Cancelled.can_transition_to(ClaimStatus::Pending));
        assert!(!ClaimStatus::Pending.can_transition_to(ClaimStatus::Pending));

        assert!(!ClaimStatus::Pending.is_terminal());
        assert!(ClaimStatus::Completed.is_terminal());
        assert!(ClaimStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_rule_matches_transitions() {
        let rule = ClaimStatus::status_rule("Status");

        assert_eq!(rule.initial, "Pending");
        assert_eq!(rule.transitions.len(), 2);
        assert!(rule.allows("Pending", "Cancelled"));
        assert!(!rule.allows("Completed", "Cancelled"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Completed".parse::<ClaimStatus>().unwrap(), ClaimStatus::Completed);
        assert_eq!("Canceled".parse::<ClaimStatus>().unwrap(), ClaimStatus::Cancelled);
        assert!("Done".parse::<ClaimStatus>().is_err());
    }
}
