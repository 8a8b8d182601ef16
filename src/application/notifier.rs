use crate::application::messages;
use crate::config::EngineConfig;
use crate::domain::customer::{Balance, Customer};
use crate::domain::owner::Owner;
use crate::domain::ports::NotificationChannelRef;
use crate::domain::transaction::{Transaction, TransactionKind};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

/// Result of one notification attempt. Never an error: delivery problems
/// must not propagate into the transaction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No delivery attempted: missing contact handle, wrong kind, or the
    /// circuit breaker is open.
    Skipped,
    Failed,
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Best-effort delivery of payment notices, isolated from the ledger.
///
/// Runs strictly after commit and outside every ledger lock; whatever
/// happens here, the transaction stands. Sustained channel outages trip a
/// shared circuit breaker so each request stops paying the delivery timeout
/// until the cooldown passes or one send succeeds.
pub struct NotificationDispatcher {
    channel: NotificationChannelRef,
    breaker: Mutex<BreakerState>,
    trip_after: u32,
    cooldown: Duration,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channel: NotificationChannelRef, config: &EngineConfig) -> Self {
        Self {
            channel,
            breaker: Mutex::new(BreakerState::default()),
            trip_after: config.breaker_trip,
            cooldown: config.breaker_cooldown,
            send_timeout: config.notify_timeout,
        }
    }

    /// Notifies the customer of a committed PAYMENT transaction.
    pub async fn notify_payment(
        &self,
        customer: &Customer,
        owner: &Owner,
        tx: &Transaction,
        balance: Balance,
    ) -> NotifyOutcome {
        if tx.kind != TransactionKind::Payment {
            return NotifyOutcome::Skipped;
        }
        let Some(contact) = customer.contact.as_deref() else {
            debug!(customer = %customer.id, "no contact handle, skipping notification");
            return NotifyOutcome::Skipped;
        };
        if self.breaker_open().await {
            warn!(tx = %tx.id, "notification channel breaker open, skipping attempt");
            return NotifyOutcome::Skipped;
        }

        let language = customer.language.unwrap_or(owner.language);
        let body = messages::payment_notice(language, tx.amount, balance);

        match timeout(self.send_timeout, self.channel.send(contact, &body)).await {
            Ok(Ok(())) => {
                self.record_success().await;
                NotifyOutcome::Sent
            }
            Ok(Err(err)) => {
                warn!(tx = %tx.id, error = %err, "notification delivery failed");
                self.record_failure().await;
                NotifyOutcome::Failed
            }
            Err(_) => {
                warn!(tx = %tx.id, "notification delivery timed out");
                self.record_failure().await;
                NotifyOutcome::Failed
            }
        }
    }

    async fn breaker_open(&self) -> bool {
        let mut state = self.breaker.lock().await;
        match state.open_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                // Cooldown elapsed; half-open, allow the next attempt.
                state.open_until = None;
                state.consecutive_failures = 0;
                false
            }
            None => false,
        }
    }

    async fn record_success(&self) {
        let mut state = self.breaker.lock().await;
        state.consecutive_failures = 0;
        state.open_until = None;
    }

    async fn record_failure(&self) {
        let mut state = self.breaker.lock().await;
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.trip_after {
            state.open_until = Some(Instant::now() + self.cooldown);
            warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "notification circuit breaker opened"
            );
        }
    }
}
