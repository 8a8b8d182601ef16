use crate::config::EngineConfig;
use crate::domain::owner::Owner;
use crate::domain::ports::OwnerStoreRef;
use crate::domain::transaction::{Amount, Confidence, TransactionKind};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Inbound tuple from the entity-extraction collaborator, exactly as
/// received. How it was produced (regex, keyword or LLM tiering) is not the
/// engine's concern.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerRequest {
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    #[serde(rename = "customer")]
    pub customer_name: String,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub audio_ref: Option<String>,
    /// Raw audio evidence when the caller hands over the blob instead of a
    /// reference. Never part of the serialized request.
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
    pub confidence: Option<f64>,
}

/// A request that passed every admission check. Only this type reaches the
/// resolver and the ledger.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub owner: Owner,
    pub customer_name: String,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub transcript: String,
    pub audio_ref: Option<String>,
    pub audio: Option<Vec<u8>>,
    pub confidence: Confidence,
}

/// Validates and authorizes inbound requests before they reach the engine.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// owner recognized, required fields present, amount within range,
/// confidence within [0, 1]. Out-of-range confidence is rejected rather
/// than clamped; clamping would erase audit meaning.
pub struct IngestGate {
    owners: OwnerStoreRef,
    amount_floor: Decimal,
    amount_ceiling: Decimal,
}

impl IngestGate {
    pub fn new(owners: OwnerStoreRef, config: &EngineConfig) -> Self {
        Self {
            owners,
            amount_floor: config.amount_floor,
            amount_ceiling: config.amount_ceiling,
        }
    }

    pub async fn admit(&self, request: LedgerRequest) -> Result<ValidatedRequest> {
        let owner = self
            .owners
            .get(request.owner_id)
            .await?
            .ok_or(LedgerError::Unauthorized)?;

        let customer_name = request.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(LedgerError::bad_request("customer", "name is empty"));
        }
        let kind = request
            .kind
            .ok_or_else(|| LedgerError::bad_request("kind", "missing transaction kind"))?;
        let raw_amount = request
            .amount
            .ok_or_else(|| LedgerError::bad_request("amount", "missing amount"))?;

        if raw_amount < self.amount_floor || raw_amount > self.amount_ceiling {
            return Err(LedgerError::UnprocessableAmount(format!(
                "amount {raw_amount} outside [{}, {}]",
                self.amount_floor, self.amount_ceiling
            )));
        }
        let amount = Amount::new(raw_amount)?;

        // Absent confidence means the row was entered directly rather than
        // scored by the extractor; treat it as fully trusted.
        let confidence = Confidence::new(request.confidence.unwrap_or(1.0))?;

        debug!(owner = %owner.id, customer = %customer_name, "request admitted");
        Ok(ValidatedRequest {
            owner,
            customer_name,
            amount,
            kind,
            transcript: request.transcript,
            audio_ref: request.audio_ref,
            audio: request.audio,
            confidence,
        })
    }
}
