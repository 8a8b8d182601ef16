use crate::domain::customer::Customer;
use crate::domain::owner::Owner;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Read/write access to owner rows. Registration is an external concern;
/// the engine only authorizes against stored rows and reads the language
/// preference.
#[async_trait]
pub trait OwnerStore: Send + Sync {
    async fn store(&self, owner: Owner) -> Result<()>;
    async fn get(&self, owner_id: Uuid) -> Result<Option<Owner>>;
}

/// Storage for the two owner-scoped record families, customers and
/// transactions.
///
/// `commit` is the transactional boundary: the customer upsert and the
/// transaction insert become observable together or not at all.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn customer(&self, owner_id: Uuid, customer_id: Uuid) -> Result<Option<Customer>>;
    async fn customers_of(&self, owner_id: Uuid) -> Result<Vec<Customer>>;
    /// Exact lookup by normalized name, used to close the creation race
    /// inside the atomic unit.
    async fn find_by_name(&self, owner_id: Uuid, normalized: &str) -> Result<Option<Customer>>;
    async fn transactions_of(&self, owner_id: Uuid, customer_id: Uuid)
    -> Result<Vec<Transaction>>;
    async fn all_customers(&self) -> Result<Vec<Customer>>;
    async fn commit(&self, customer: Customer, tx: Transaction) -> Result<()>;
}

/// Delivery of a rendered text message to a contact handle. One attempt per
/// call; retry policy lives in the dispatcher's circuit breaker.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, contact: &str, body: &str) -> Result<()>;
}

/// Persistence for raw audio evidence blobs, addressed by an opaque
/// generated reference.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn put(&self, reference: &str, bytes: Vec<u8>) -> Result<()>;
}

pub type OwnerStoreRef = Arc<dyn OwnerStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type NotificationChannelRef = Arc<dyn NotificationChannel>;
pub type EvidenceStoreRef = Arc<dyn EvidenceStore>;
