use crate::domain::customer::Customer;
use crate::domain::owner::Owner;
use crate::domain::ports::{LedgerStore, OwnerStore};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column family for owner rows.
pub const CF_OWNERS: &str = "owners";
/// Column family for customer rows.
pub const CF_CUSTOMERS: &str = "customers";
/// Column family for the append-only transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";

/// Persistent store backed by RocksDB, one column family per record
/// family.
///
/// The atomic unit maps onto a `WriteBatch`: the customer upsert and the
/// transaction insert land in one write, so a crash can never leave a
/// balance change without its transaction or vice versa. `Clone` shares
/// the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates the database at `path`, ensuring all column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![
            ColumnFamilyDescriptor::new(CF_OWNERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CUSTOMERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| LedgerError::Persistence(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Persistence(format!("column family {name} not found")))
    }

    fn get_value<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        let bytes = self
            .db
            .get_cf(cf, key)
            .map_err(|e| LedgerError::Persistence(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_value<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        self.db
            .put_cf(cf, key, encode(value)?)
            .map_err(|e| LedgerError::Persistence(e.to_string()))
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| LedgerError::Persistence(e.to_string()))?;
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Persistence(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Persistence(e.to_string()))
}

#[async_trait]
impl OwnerStore for RocksDbStore {
    async fn store(&self, owner: Owner) -> Result<()> {
        self.put_value(CF_OWNERS, owner.id.as_bytes(), &owner)
    }

    async fn get(&self, owner_id: Uuid) -> Result<Option<Owner>> {
        self.get_value(CF_OWNERS, owner_id.as_bytes())
    }
}

#[async_trait]
impl LedgerStore for RocksDbStore {
    async fn customer(&self, owner_id: Uuid, customer_id: Uuid) -> Result<Option<Customer>> {
        let customer: Option<Customer> = self.get_value(CF_CUSTOMERS, customer_id.as_bytes())?;
        Ok(customer.filter(|c| c.owner == owner_id))
    }

    async fn customers_of(&self, owner_id: Uuid) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> = self.scan(CF_CUSTOMERS)?;
        customers.retain(|c| c.owner == owner_id);
        Ok(customers)
    }

    async fn find_by_name(&self, owner_id: Uuid, normalized: &str) -> Result<Option<Customer>> {
        let customers: Vec<Customer> = self.scan(CF_CUSTOMERS)?;
        Ok(customers
            .into_iter()
            .find(|c| c.owner == owner_id && c.normalized_name() == normalized))
    }

    async fn transactions_of(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self.scan(CF_TRANSACTIONS)?;
        transactions.retain(|t| t.owner == owner_id && t.customer == customer_id);
        transactions.sort_by_key(|t| t.created_at);
        Ok(transactions)
    }

    async fn all_customers(&self) -> Result<Vec<Customer>> {
        self.scan(CF_CUSTOMERS)
    }

    async fn commit(&self, customer: Customer, tx: Transaction) -> Result<()> {
        let customers = self.cf(CF_CUSTOMERS)?;
        let transactions = self.cf(CF_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(customers, customer.id.as_bytes(), encode(&customer)?);
        batch.put_cf(transactions, tx.id.as_bytes(), encode(&tx)?);
        self.db
            .write(batch)
            .map_err(|e| LedgerError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::Balance;
    use crate::domain::owner::Language;
    use crate::domain::transaction::{Amount, Confidence, TransactionKind};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert!(store.cf(CF_OWNERS).is_ok());
        assert!(store.cf(CF_CUSTOMERS).is_ok());
        assert!(store.cf(CF_TRANSACTIONS).is_ok());
    }

    #[tokio::test]
    async fn test_owner_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        let owner = Owner::new("Meena", "+911234500001", Language::Hi);
        OwnerStore::store(&store, owner.clone()).await.unwrap();

        let retrieved = OwnerStore::get(&store, owner.id).await.unwrap().unwrap();
        assert_eq!(retrieved, owner);
    }

    #[tokio::test]
    async fn test_commit_persists_both_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        let owner = Uuid::new_v4();
        let mut customer = Customer::new(owner, "Ramesh");
        customer.balance = Balance::new(dec!(120.00));
        let tx = Transaction::record(
            owner,
            customer.id,
            Amount::new(dec!(120.00)).unwrap(),
            TransactionKind::Credit,
            "ramesh ko 120 udhaar".into(),
            None,
            Confidence::new(0.9).unwrap(),
            0.7,
        );

        store.commit(customer.clone(), tx.clone()).await.unwrap();

        let stored = store.customer(owner, customer.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(120.00)));
        let log = store.transactions_of(owner, customer.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, tx.id);
        // Cross-owner reads still come back empty.
        assert!(
            store
                .customer(Uuid::new_v4(), customer.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
