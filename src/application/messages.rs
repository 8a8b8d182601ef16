//! Localized user-visible text.
//!
//! Everything a shopkeeper or customer reads goes through here, rendered in
//! the stored language preference. Amounts always print with two decimal
//! places.

use crate::domain::customer::Balance;
use crate::domain::owner::Language;
use crate::domain::transaction::{Amount, TransactionKind};
use crate::error::LedgerError;

fn money(value: rust_decimal::Decimal) -> String {
    format!("{:.2}", value)
}

/// Confirmation read back to the owner after a committed transaction.
pub fn confirmation(
    language: Language,
    kind: TransactionKind,
    name: &str,
    amount: Amount,
    balance: Balance,
) -> String {
    let amount = money(amount.value());
    let balance = money(balance.value());
    match (language, kind) {
        (Language::En, TransactionKind::Credit) => {
            format!("Added credit of {amount} for {name}. New balance: {balance}.")
        }
        (Language::En, TransactionKind::Payment) => {
            format!("Recorded payment of {amount} from {name}. New balance: {balance}.")
        }
        (Language::Hi, TransactionKind::Credit) => {
            format!("{name} ke khate mein {amount} ka udhaar juda. Naya balance: {balance}.")
        }
        (Language::Hi, TransactionKind::Payment) => {
            format!("{name} se {amount} ka bhugtaan darj hua. Naya balance: {balance}.")
        }
    }
}

/// Text message sent to the customer after a committed PAYMENT.
pub fn payment_notice(language: Language, amount: Amount, balance: Balance) -> String {
    let amount = money(amount.value());
    let balance = money(balance.value());
    match language {
        Language::En => format!("You paid {amount}. Your balance is now {balance}."),
        Language::Hi => format!("Aapne {amount} ka bhugtaan kiya. Aapka balance ab {balance} hai."),
    }
}

/// Short status line on a successful response.
pub fn recorded(language: Language) -> String {
    match language {
        Language::En => "transaction recorded".into(),
        Language::Hi => "len-den darj hua".into(),
    }
}

/// User-visible failure text for a rejected request.
pub fn rejection(language: Language, error: &LedgerError) -> String {
    match (language, error) {
        (Language::En, LedgerError::Unauthorized) => "This account is not registered.".into(),
        (Language::Hi, LedgerError::Unauthorized) => "Yeh account panjikrit nahi hai.".into(),
        (Language::En, LedgerError::Ambiguous { .. }) => {
            "More than one customer has a similar name. Please say which one you mean.".into()
        }
        (Language::Hi, LedgerError::Ambiguous { .. }) => {
            "Is naam ke ek se zyada grahak hain. Kripya bataiye kaun sa.".into()
        }
        (Language::En, LedgerError::UnprocessableAmount(_)) => {
            "That amount cannot be processed.".into()
        }
        (Language::Hi, LedgerError::UnprocessableAmount(_)) => {
            "Yeh rakam darj nahi ho sakti.".into()
        }
        (Language::En, LedgerError::Persistence(_)) => {
            "Could not save right now, please try again.".into()
        }
        (Language::Hi, LedgerError::Persistence(_)) => {
            "Abhi save nahi ho paya, kripya dobara koshish karein.".into()
        }
        (Language::En, LedgerError::NotFound(_)) => "No such customer record.".into(),
        (Language::Hi, LedgerError::NotFound(_)) => "Aisa koi grahak record nahi mila.".into(),
        (Language::En, _) => "The request could not be understood.".into(),
        (Language::Hi, _) => "Anurodh samajh nahi aaya.".into(),
    }
}
