//! Convergence policy: decides whether the loop stops after an assessment.
//!
//! The rules are strict and evaluated in order:
//! 1. Score at or above target -> STOP_TARGET_ACHIEVED
//! 2. Else the last allowed iteration was just used -> STOP_BUDGET_EXHAUSTED
//! 3. Else -> CONTINUE
//!
//! A degraded assessment carries score 0 and goes through the same rules.

use serde::{Deserialize, Serialize};

use crate::types::Outcome;

/// What the loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Continue,
    StopTargetAchieved,
    StopBudgetExhausted,
}

impl Decision {
    /// The session outcome a stop decision maps to.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Decision::Continue => None,
            Decision::StopTargetAchieved => Some(Outcome::TargetAchieved),
            Decision::StopBudgetExhausted => Some(Outcome::BudgetExhausted),
        }
    }
}

/// Decide after the assessment of iteration `iteration_index` (0-based).
pub fn decide(
    current_score: u8,
    iteration_index: u32,
    max_iterations: u32,
    target_score: u8,
) -> Decision {
    if current_score >= target_score {
        return Decision::StopTargetAchieved;
    }

    // `>=` also covers a zero budget without underflowing.
    if iteration_index.saturating_add(1) >= max_iterations {
        return Decision::StopBudgetExhausted;
    }

    Decision::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_reached_stops() {
        assert_eq!(decide(85, 0, 5, 80), Decision::StopTargetAchieved);
        assert_eq!(decide(80, 2, 5, 80), Decision::StopTargetAchieved);
    }

    #[test]
    fn test_target_wins_on_last_iteration() {
        assert_eq!(decide(90, 2, 3, 80), Decision::StopTargetAchieved);
    }

    #[test]
    fn test_last_iteration_exhausts_budget() {
        assert_eq!(decide(60, 2, 3, 80), Decision::StopBudgetExhausted);
        assert_eq!(decide(0, 0, 1, 80), Decision::StopBudgetExhausted);
    }

    #[test]
    fn test_continue_below_target_with_budget() {
        assert_eq!(decide(40, 0, 3, 80), Decision::Continue);
        assert_eq!(decide(0, 0, 2, 80), Decision::Continue);
    }

    #[test]
    fn test_decision_outcome_mapping() {
        assert_eq!(Decision::Continue.outcome(), None);
        assert_eq!(
            Decision::StopBudgetExhausted.outcome(),
            Some(Outcome::BudgetExhausted)
        );
    }
}
