#![allow(dead_code)]

use khata_engine::application::gate::LedgerRequest;
use khata_engine::application::orchestrator::LedgerEngine;
use khata_engine::config::EngineConfig;
use khata_engine::domain::owner::{Language, Owner};
use khata_engine::domain::ports::{LedgerStore, LedgerStoreRef, OwnerStore};
use khata_engine::domain::transaction::TransactionKind;
use khata_engine::infrastructure::in_memory::{
    InMemoryEvidenceStore, InMemoryLedgerStore, InMemoryOwnerStore, RecordingChannel,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub struct Harness {
    pub engine: Arc<LedgerEngine>,
    pub owner: Owner,
    pub store: Arc<InMemoryLedgerStore>,
    pub channel: Arc<RecordingChannel>,
    pub evidence: Arc<InMemoryEvidenceStore>,
}

pub async fn harness() -> Harness {
    harness_with(EngineConfig::default()).await
}

pub async fn harness_with(config: EngineConfig) -> Harness {
    let owners = Arc::new(InMemoryOwnerStore::new());
    let store = Arc::new(InMemoryLedgerStore::new());
    let channel = Arc::new(RecordingChannel::new());
    let evidence = Arc::new(InMemoryEvidenceStore::new());

    let owner = Owner::new("Meena", "+911234500001", Language::En);
    owners.store(owner.clone()).await.unwrap();

    let engine = Arc::new(LedgerEngine::new(
        &config,
        owners,
        Arc::clone(&store) as LedgerStoreRef,
        Arc::clone(&channel) as _,
        Arc::clone(&evidence) as _,
    ));
    Harness {
        engine,
        owner,
        store,
        channel,
        evidence,
    }
}

pub fn request(
    owner: Uuid,
    name: &str,
    amount: Decimal,
    kind: TransactionKind,
) -> LedgerRequest {
    LedgerRequest {
        owner_id: owner,
        customer_name: name.into(),
        amount: Some(amount),
        kind: Some(kind),
        transcript: format!("{name} {amount}"),
        audio_ref: None,
        audio: None,
        confidence: Some(0.95),
    }
}

/// Asserts the core ledger invariant: every customer's denormalized
/// balance equals the fold of their committed transaction log.
pub async fn assert_balances_match_log(store: &InMemoryLedgerStore, owner: Uuid) {
    for customer in store.customers_of(owner).await.unwrap() {
        let log = store.transactions_of(owner, customer.id).await.unwrap();
        let derived: Decimal = log.iter().map(|t| t.delta()).sum();
        assert_eq!(
            customer.balance.value(),
            derived,
            "balance of {} diverged from its transaction log",
            customer.name
        );
    }
}
