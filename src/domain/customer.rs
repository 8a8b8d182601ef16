use crate::domain::owner::Language;
use crate::domain::transaction::{Amount, TransactionKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

/// A customer's running balance.
///
/// Wrapper around `rust_decimal::Decimal` so financial arithmetic never
/// touches floating point. Positive means the customer owes the owner;
/// negative means the owner owes the customer (overpayment is legal).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.value())
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// Canonical form of a spoken customer name: lowercased, trimmed, inner
/// whitespace collapsed. Used for matching and for the creation-race check.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A person with a running balance against one owner.
///
/// Created only through identity resolution when no existing customer
/// matches well enough; never deleted, only balance-mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub owner: Uuid,
    /// Display name as last resolved or typed.
    pub name: String,
    pub contact: Option<String>,
    pub language: Option<Language>,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Synthesizes a fresh customer row at balance zero. The row is not
    /// durable until committed together with its first transaction.
    pub fn new(owner: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            contact: None,
            language: None,
            balance: Balance::ZERO,
            created_at: Utc::now(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Applies one transaction to the running balance. CREDIT raises it,
    /// PAYMENT lowers it; no clamping, the balance may go negative.
    pub fn apply(&mut self, kind: TransactionKind, amount: Amount) {
        match kind {
            TransactionKind::Credit => self.balance += amount.into(),
            TransactionKind::Payment => self.balance -= amount.into(),
        }
    }
}
