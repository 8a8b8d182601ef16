use crate::config::EngineConfig;
use crate::domain::customer::{Balance, Customer};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::resolution::CustomerRef;
use crate::domain::transaction::{Amount, Confidence, Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::info;
use uuid::Uuid;

/// Writes transactions and keeps balances correct under concurrency.
///
/// Every balance read-modify-write runs under a per-customer exclusive
/// lock, so two concurrent transactions on the same customer cannot both
/// observe the pre-update balance. Locks on different customers are
/// independent. A brand-new name additionally serializes on a lock keyed by
/// the normalized name, and the store is re-checked under that lock, so two
/// concurrent first transactions cannot create the customer twice. Lock
/// order is always name before id; the id-only path never takes a name
/// lock, so the ordering cannot cycle.
pub struct LedgerService {
    store: LedgerStoreRef,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    verify_threshold: f64,
    storage_timeout: Duration,
}

impl LedgerService {
    pub fn new(store: LedgerStoreRef, config: &EngineConfig) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            verify_threshold: config.verify_threshold,
            storage_timeout: config.storage_timeout,
        }
    }

    /// Persists one transaction and its balance update as a single unit.
    ///
    /// If anything fails, nothing from the unit is observable: no partial
    /// customer, no partial transaction, no partial balance change. An
    /// unresponsive store surfaces as `Persistence` after the configured
    /// timeout instead of hanging the request.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_transaction(
        &self,
        owner_id: Uuid,
        customer_ref: CustomerRef,
        amount: Amount,
        kind: TransactionKind,
        transcript: String,
        audio_ref: Option<String>,
        confidence: Confidence,
    ) -> Result<(Transaction, Customer)> {
        match customer_ref {
            CustomerRef::Existing(id) => {
                let lock = self.lock_for(id.to_string()).await;
                let _guard = lock.lock().await;
                let customer = self
                    .bounded(self.store.customer(owner_id, id))
                    .await?
                    .ok_or_else(|| {
                        // A resolved id that vanished is a consistency
                        // fault, not a user error.
                        LedgerError::NotFound(format!("customer {id} no longer exists"))
                    })?;
                self.apply_and_commit(owner_id, customer, amount, kind, transcript, audio_ref, confidence)
                    .await
            }
            CustomerRef::New(row) => {
                let name_lock = self
                    .lock_for(format!("{owner_id}:{}", row.normalized_name()))
                    .await;
                let _name_guard = name_lock.lock().await;
                // Another request may have created the same name between
                // resolution and this lock; reuse its row if so.
                match self
                    .bounded(self.store.find_by_name(owner_id, &row.normalized_name()))
                    .await?
                {
                    Some(existing) => {
                        let lock = self.lock_for(existing.id.to_string()).await;
                        let _guard = lock.lock().await;
                        // Reload: the balance may have moved before the id
                        // lock was ours.
                        let customer = self
                            .bounded(self.store.customer(owner_id, existing.id))
                            .await?
                            .unwrap_or(existing);
                        self.apply_and_commit(
                            owner_id, customer, amount, kind, transcript, audio_ref, confidence,
                        )
                        .await
                    }
                    None => {
                        self.apply_and_commit(
                            owner_id, row, amount, kind, transcript, audio_ref, confidence,
                        )
                        .await
                    }
                }
            }
        }
    }

    /// Folds the committed transaction log into a balance. The log is the
    /// source of truth; the denormalized balance must always equal this.
    pub async fn recompute_balance(&self, owner_id: Uuid, customer_id: Uuid) -> Result<Balance> {
        let transactions = self.store.transactions_of(owner_id, customer_id).await?;
        Ok(Balance::new(
            transactions.iter().map(Transaction::delta).sum(),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_and_commit(
        &self,
        owner_id: Uuid,
        mut customer: Customer,
        amount: Amount,
        kind: TransactionKind,
        transcript: String,
        audio_ref: Option<String>,
        confidence: Confidence,
    ) -> Result<(Transaction, Customer)> {
        customer.apply(kind, amount);
        let tx = Transaction::record(
            owner_id,
            customer.id,
            amount,
            kind,
            transcript,
            audio_ref,
            confidence,
            self.verify_threshold,
        );
        self.bounded(self.store.commit(customer.clone(), tx.clone()))
            .await?;

        info!(
            tx = %tx.id,
            customer = %customer.id,
            kind = ?kind,
            amount = %amount.value(),
            balance = %customer.balance.value(),
            verified = tx.verified,
            "transaction committed"
        );
        Ok((tx, customer))
    }

    async fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        timeout(self.storage_timeout, op)
            .await
            .map_err(|_| LedgerError::Persistence("storage operation timed out".into()))?
    }
}
