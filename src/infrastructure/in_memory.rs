use crate::domain::customer::Customer;
use crate::domain::owner::Owner;
use crate::domain::ports::{EvidenceStore, LedgerStore, NotificationChannel, OwnerStore};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory owner store.
#[derive(Default, Clone)]
pub struct InMemoryOwnerStore {
    owners: Arc<RwLock<HashMap<Uuid, Owner>>>,
}

impl InMemoryOwnerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnerStore for InMemoryOwnerStore {
    async fn store(&self, owner: Owner) -> Result<()> {
        let mut owners = self.owners.write().await;
        owners.insert(owner.id, owner);
        Ok(())
    }

    async fn get(&self, owner_id: Uuid) -> Result<Option<Owner>> {
        let owners = self.owners.read().await;
        Ok(owners.get(&owner_id).cloned())
    }
}

#[derive(Default)]
struct LedgerTables {
    customers: HashMap<Uuid, Customer>,
    transactions: HashMap<Uuid, Transaction>,
}

/// Thread-safe in-memory ledger store.
///
/// Both record families live behind one `RwLock`, so `commit` is a single
/// critical section and the customer upsert plus transaction insert are
/// observable together or not at all.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<LedgerTables>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a customer row directly, bypassing the atomic unit. Test and
    /// fixture use only.
    pub async fn insert_customer(&self, customer: Customer) {
        let mut tables = self.tables.write().await;
        tables.customers.insert(customer.id, customer);
    }

    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn customer(&self, owner_id: Uuid, customer_id: Uuid) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .get(&customer_id)
            .filter(|c| c.owner == owner_id)
            .cloned())
    }

    async fn customers_of(&self, owner_id: Uuid) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .filter(|c| c.owner == owner_id)
            .cloned()
            .collect())
    }

    async fn find_by_name(&self, owner_id: Uuid, normalized: &str) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.owner == owner_id && c.normalized_name() == normalized)
            .cloned())
    }

    async fn transactions_of(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| t.owner == owner_id && t.customer == customer_id)
            .cloned()
            .collect();
        transactions.sort_by_key(|t| t.created_at);
        Ok(transactions)
    }

    async fn all_customers(&self) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().cloned().collect())
    }

    async fn commit(&self, customer: Customer, tx: Transaction) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.customers.insert(customer.id, customer);
        tables.transactions.insert(tx.id, tx);
        Ok(())
    }
}

/// Notification channel that records every delivery, with switchable
/// failure injection for outage tests.
#[derive(Default)]
pub struct RecordingChannel {
    sent: RwLock<Vec<(String, String)>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delivery attempts that reached the channel, including failures.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, contact: &str, body: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Notification("channel unavailable".into()));
        }
        let mut sent = self.sent.write().await;
        sent.push((contact.to_string(), body.to_string()));
        Ok(())
    }
}

/// Channel that only logs the message. Stands in for an SMS gateway in the
/// batch CLI, where there is nothing to deliver to.
#[derive(Default, Clone)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, contact: &str, body: &str) -> Result<()> {
        info!(contact, body, "notification");
        Ok(())
    }
}

/// In-memory audio evidence store with switchable failure injection.
#[derive(Default)]
pub struct InMemoryEvidenceStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn contains(&self, reference: &str) -> bool {
        self.blobs.read().await.contains_key(reference)
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn put(&self, reference: &str, bytes: Vec<u8>) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence("evidence store unavailable".into()));
        }
        let mut blobs = self.blobs.write().await;
        blobs.insert(reference.to_string(), bytes);
        Ok(())
    }
}
