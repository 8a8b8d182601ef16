use crate::application::gate::{IngestGate, LedgerRequest, ValidatedRequest};
use crate::application::ledger::LedgerService;
use crate::application::messages;
use crate::application::notifier::{NotificationDispatcher, NotifyOutcome};
use crate::application::resolver::IdentityResolver;
use crate::config::EngineConfig;
use crate::domain::customer::Customer;
use crate::domain::owner::{Language, Owner};
use crate::domain::ports::{EvidenceStoreRef, LedgerStoreRef, NotificationChannelRef, OwnerStoreRef};
use crate::domain::resolution::{CustomerRef, ResolutionOutcome};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Structured error carried on a rejected response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Wire response of one request cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl LedgerResponse {
    fn ok(message: String, confirmation: String, balance: Decimal) -> Self {
        Self {
            success: true,
            message: Some(message),
            confirmation_text: Some(confirmation),
            updated_balance: Some(balance),
            error: None,
        }
    }

    fn rejected(language: Language, error: &LedgerError) -> Self {
        let details = match error {
            LedgerError::Ambiguous { candidates } => {
                Some(serde_json::json!({ "candidates": candidates }))
            }
            LedgerError::BadRequest { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        };
        Self {
            success: false,
            message: None,
            confirmation_text: None,
            updated_balance: None,
            error: Some(ErrorBody {
                code: error.code().to_string(),
                message: messages::rejection(language, error),
                details,
            }),
        }
    }
}

/// Composes the full request cycle: gate, resolver, ledger, confirmation,
/// fire-and-forget notification.
///
/// Data flows one way per request; the notification branches off after
/// commit and never blocks or undoes it.
pub struct LedgerEngine {
    gate: IngestGate,
    resolver: IdentityResolver,
    ledger: LedgerService,
    notifier: Arc<NotificationDispatcher>,
    evidence: EvidenceStoreRef,
    notify_grace: Duration,
}

impl LedgerEngine {
    pub fn new(
        config: &EngineConfig,
        owners: OwnerStoreRef,
        store: LedgerStoreRef,
        channel: NotificationChannelRef,
        evidence: EvidenceStoreRef,
    ) -> Self {
        Self {
            gate: IngestGate::new(owners, config),
            resolver: IdentityResolver::new(Arc::clone(&store), config),
            ledger: LedgerService::new(store, config),
            notifier: Arc::new(NotificationDispatcher::new(channel, config)),
            evidence,
            notify_grace: config.notify_grace,
        }
    }

    /// Runs one request through the engine. Never returns an error: every
    /// failure becomes a structured rejection response.
    #[instrument(skip_all, fields(owner = %request.owner_id))]
    pub async fn submit(&self, request: LedgerRequest) -> LedgerResponse {
        let validated = match self.gate.admit(request).await {
            Ok(validated) => validated,
            Err(err) => {
                warn!(code = err.code(), error = %err, "request rejected at the gate");
                return LedgerResponse::rejected(Language::default(), &err);
            }
        };
        let language = validated.owner.language;
        match self.handle(validated).await {
            Ok(response) => response,
            Err(err) => {
                warn!(code = err.code(), error = %err, "request rejected");
                LedgerResponse::rejected(language, &err)
            }
        }
    }

    async fn handle(&self, request: ValidatedRequest) -> Result<LedgerResponse> {
        let owner = request.owner.clone();
        let customer_ref = match self
            .resolver
            .resolve(&request.customer_name, owner.id)
            .await?
        {
            ResolutionOutcome::Matched { customer, score } => {
                debug!(%customer, score, "matched existing customer");
                CustomerRef::Existing(customer)
            }
            ResolutionOutcome::Created { customer } => {
                info!(name = %customer.name, "no match, creating customer");
                CustomerRef::New(customer)
            }
            ResolutionOutcome::Ambiguous { candidates } => {
                return Err(LedgerError::Ambiguous { candidates });
            }
        };

        let audio_ref = self.persist_evidence(&request).await;
        let (tx, customer) = self
            .ledger
            .create_transaction(
                owner.id,
                customer_ref,
                request.amount,
                request.kind,
                request.transcript,
                audio_ref,
                request.confidence,
            )
            .await?;

        let confirmation = messages::confirmation(
            owner.language,
            tx.kind,
            &customer.name,
            tx.amount,
            customer.balance,
        );
        let balance = customer.balance.value();
        if tx.kind == TransactionKind::Payment {
            self.dispatch_notification(customer, owner.clone(), tx).await;
        }

        Ok(LedgerResponse::ok(
            messages::recorded(owner.language),
            confirmation,
            balance,
        ))
    }

    /// Persists raw audio evidence when the request carried a blob. A
    /// failing evidence store degrades to a missing reference; it never
    /// aborts the transaction.
    async fn persist_evidence(&self, request: &ValidatedRequest) -> Option<String> {
        if let Some(reference) = &request.audio_ref {
            return Some(reference.clone());
        }
        let bytes = request.audio.clone()?;
        let reference = format!("audio/{}.wav", Uuid::new_v4());
        match self.evidence.put(&reference, bytes).await {
            Ok(()) => Some(reference),
            Err(err) => {
                warn!(error = %err, evidence_missing = true, "audio evidence store failed, proceeding without evidence");
                None
            }
        }
    }

    /// Spawns the notification attempt and waits at most the grace period
    /// before detaching; the task keeps running and logs its own outcome.
    async fn dispatch_notification(&self, customer: Customer, owner: Owner, tx: Transaction) {
        let notifier = Arc::clone(&self.notifier);
        let balance = customer.balance;
        let mut handle = tokio::spawn(async move {
            let outcome = notifier.notify_payment(&customer, &owner, &tx, balance).await;
            match outcome {
                NotifyOutcome::Sent => info!(tx = %tx.id, "payment notification sent"),
                NotifyOutcome::Skipped => debug!(tx = %tx.id, "payment notification skipped"),
                NotifyOutcome::Failed => {
                    // Recorded against the transaction id for later
                    // inspection; the ledger write already stands.
                    warn!(tx = %tx.id, "payment notification failed")
                }
            }
        });
        if timeout(self.notify_grace, &mut handle).await.is_err() {
            debug!("notification still in flight, detaching");
        }
    }
}
