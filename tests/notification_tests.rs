mod common;

use common::{assert_balances_match_log, harness, request};
use khata_engine::domain::customer::Customer;
use khata_engine::domain::ports::LedgerStore;
use khata_engine::domain::transaction::TransactionKind;
use rust_decimal_macros::dec;
use std::time::Duration;

async fn seed_customer_with_contact(h: &common::Harness, name: &str, contact: &str) {
    let mut customer = Customer::new(h.owner.id, name);
    customer.contact = Some(contact.into());
    h.store.insert_customer(customer).await;
}

#[tokio::test]
async fn test_payment_triggers_notification_after_commit() {
    let h = harness().await;
    seed_customer_with_contact(&h, "Ramesh", "+919000000001").await;

    let response = h
        .engine
        .submit(request(
            h.owner.id,
            "Ramesh",
            dec!(50.00),
            TransactionKind::Payment,
        ))
        .await;
    assert!(response.success);

    // The dispatch task is fire-and-forget; give it a beat to land.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let sent = h.channel.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+919000000001");
    assert!(sent[0].1.contains("50.00"));
}

#[tokio::test]
async fn test_credit_sends_nothing() {
    let h = harness().await;
    seed_customer_with_contact(&h, "Ramesh", "+919000000001").await;

    let response = h
        .engine
        .submit(request(
            h.owner.id,
            "Ramesh",
            dec!(200.00),
            TransactionKind::Credit,
        ))
        .await;
    assert!(response.success);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.channel.sent().await.is_empty());
}

#[tokio::test]
async fn test_channel_outage_never_touches_the_committed_ledger() {
    let h = harness().await;
    seed_customer_with_contact(&h, "Ramesh", "+919000000001").await;
    h.channel.set_failing(true);

    let response = h
        .engine
        .submit(request(
            h.owner.id,
            "Ramesh",
            dec!(50.00),
            TransactionKind::Payment,
        ))
        .await;

    // The ledger write is durable before dispatch runs; the caller sees
    // success regardless of the outage.
    assert!(response.success);
    assert_eq!(response.updated_balance, Some(dec!(-50.00)));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let customer = h
        .store
        .find_by_name(h.owner.id, "ramesh")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.balance.value(), dec!(-50.00));
    let log = h
        .store
        .transactions_of(h.owner.id, customer.id)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, TransactionKind::Payment);
    assert_eq!(log[0].amount.value(), dec!(50.00));
    assert_balances_match_log(&h.store, h.owner.id).await;
}

#[tokio::test]
async fn test_customer_without_contact_is_skipped_quietly() {
    let h = harness().await;

    // Engine-created customers have no contact handle yet.
    let response = h
        .engine
        .submit(request(
            h.owner.id,
            "Naveen",
            dec!(20.00),
            TransactionKind::Payment,
        ))
        .await;
    assert!(response.success);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.channel.attempts(), 0);
}

#[tokio::test]
async fn test_sustained_outage_trips_breaker_and_stops_attempts() {
    let h = harness().await;
    seed_customer_with_contact(&h, "Ramesh", "+919000000001").await;
    h.channel.set_failing(true);

    for _ in 0..5 {
        let response = h
            .engine
            .submit(request(
                h.owner.id,
                "Ramesh",
                dec!(10.00),
                TransactionKind::Payment,
            ))
            .await;
        assert!(response.success);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Breaker opened after three consecutive failures; the last two
    // payments short-circuited without reaching the channel.
    assert_eq!(h.channel.attempts(), 3);
    assert_balances_match_log(&h.store, h.owner.id).await;
}
