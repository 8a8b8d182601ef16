use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry. The amount itself is always positive; the
/// kind decides the sign applied to the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Goods taken on credit; raises what the customer owes.
    #[serde(alias = "credit")]
    Credit,
    /// Money repaid; lowers what the customer owes.
    #[serde(alias = "payment")]
    Payment,
}

/// A positive monetary amount.
///
/// Range policy (floor/ceiling) is enforced at the ingest gate; this type
/// only guarantees positivity so a zero or negative amount cannot reach the
/// ledger by construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::UnprocessableAmount(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Trust score attached by the upstream entity extractor, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, LedgerError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LedgerError::bad_request(
                "confidence",
                format!("must be within [0, 1], got {value}"),
            ))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// An immutable ledger entry. There is no update or delete; corrections are
/// new transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer: Uuid,
    /// Denormalized for owner-isolation checks without a customer lookup.
    pub owner: Uuid,
    pub amount: Amount,
    pub kind: TransactionKind,
    /// Raw transcript the extraction ran over, kept for audit.
    pub transcript: String,
    /// Opaque reference into the audio evidence store, when available.
    pub audio_ref: Option<String>,
    pub confidence: Confidence,
    /// False when the extraction confidence fell below the verification
    /// threshold; such entries await manual review.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        owner: Uuid,
        customer: Uuid,
        amount: Amount,
        kind: TransactionKind,
        transcript: String,
        audio_ref: Option<String>,
        confidence: Confidence,
        verify_threshold: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer,
            owner,
            amount,
            kind,
            transcript,
            audio_ref,
            confidence,
            verified: confidence.value() >= verify_threshold,
            created_at: Utc::now(),
        }
    }

    /// Signed effect of this transaction on the customer balance.
    pub fn delta(&self) -> Decimal {
        match self.kind {
            TransactionKind::Credit => self.amount.value(),
            TransactionKind::Payment => -self.amount.value(),
        }
    }
}
