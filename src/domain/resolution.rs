use crate::domain::customer::Customer;
use serde::Serialize;
use uuid::Uuid;

/// One scored candidate from fuzzy name matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMatch {
    pub customer: Uuid,
    pub name: String,
    pub score: f64,
}

/// Result of resolving a spoken name against an owner's customers.
///
/// Transient: produced per request and consumed immediately by the
/// orchestrator, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// Exactly one sufficiently-strong match (or a clear leader).
    Matched { customer: Uuid, score: f64 },
    /// No match reached the threshold; a fresh row was synthesized at
    /// balance zero. It becomes durable only inside the same atomic unit
    /// as the first transaction write.
    Created { customer: Customer },
    /// Two or more matches too close to call; candidates ordered by
    /// descending score. The caller must ask for clarification and must
    /// not write.
    Ambiguous { candidates: Vec<CandidateMatch> },
}

/// Target of a transaction write, derived from a `ResolutionOutcome`.
#[derive(Debug, Clone)]
pub enum CustomerRef {
    Existing(Uuid),
    New(Customer),
}
