//! Session state: the ordered history of one hardening run.
//!
//! A run is modeled as two types. `ActiveSession` accepts iteration records
//! and can only be concluded once; `Session` is the concluded, read-only
//! value and always carries its outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::Artifact;
use crate::types::{AuditResult, Outcome, StrategyKind};

/// One assess(-and-correct) cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 0-based, contiguous within a session
    pub index: u32,

    /// The artifact that was assessed
    #[serde(skip)]
    pub artifact: Option<Artifact>,

    pub artifact_version: u32,

    pub audit: AuditResult,

    /// Strategy that produced the assessed artifact; `None` for the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,

    pub recorded_at: DateTime<Utc>,
}

impl IterationRecord {
    pub fn new(
        index: u32,
        artifact: Artifact,
        audit: AuditResult,
        strategy: Option<StrategyKind>,
    ) -> Self {
        Self {
            index,
            artifact_version: artifact.version(),
            artifact: Some(artifact),
            audit,
            strategy,
            recorded_at: Utc::now(),
        }
    }

    pub fn score(&self) -> u8 {
        self.audit.score
    }
}

/// Errors raised when a record would break the history's shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("iteration budget of {max} already used")]
    BudgetExceeded { max: u32 },

    #[error("expected iteration index {expected}, got {actual}")]
    IndexMismatch { expected: u32, actual: u32 },
}

/// A session that is still accepting records.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    target_score: u8,
    max_iterations: u32,
    history: Vec<IterationRecord>,
    started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(target_score: u8, max_iterations: u32) -> Self {
        Self {
            target_score,
            max_iterations,
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn target_score(&self) -> u8 {
        self.target_score
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Index the next record must carry.
    pub fn next_index(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn last_record(&self) -> Option<&IterationRecord> {
        self.history.last()
    }

    /// Append a record. Indices must be contiguous and stay within budget.
    pub fn record(mut self, record: IterationRecord) -> Result<Self, SessionError> {
        let expected = self.next_index();
        if expected >= self.max_iterations {
            return Err(SessionError::BudgetExceeded {
                max: self.max_iterations,
            });
        }
        if record.index != expected {
            return Err(SessionError::IndexMismatch {
                expected,
                actual: record.index,
            });
        }

        self.history.push(record);
        Ok(self)
    }

    /// Close the session with its terminal outcome.
    pub fn conclude(self, outcome: Outcome) -> Session {
        Session {
            target_score: self.target_score,
            max_iterations: self.max_iterations,
            history: self.history,
            outcome,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// A concluded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub target_score: u8,
    pub max_iterations: u32,
    pub history: Vec<IterationRecord>,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Session {
    pub fn iterations_used(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn first_record(&self) -> Option<&IterationRecord> {
        self.history.first()
    }

    pub fn last_record(&self) -> Option<&IterationRecord> {
        self.history.last()
    }

    /// Highest-scoring record; the earliest wins ties.
    pub fn best_record(&self) -> Option<&IterationRecord> {
        self.history.iter().fold(None, |best: Option<&IterationRecord>, r| match best {
            Some(b) if b.score() >= r.score() => Some(b),
            _ => Some(r),
        })
    }

    /// Score of the last assessment, 0 for an empty history.
    pub fn final_score(&self) -> u8 {
        self.last_record().map(|r| r.score()).unwrap_or(0)
    }
}
