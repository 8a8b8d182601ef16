//! Core engine for a voice-driven customer ledger.
//!
//! Spoken transactions are transcribed and interpreted upstream; this crate
//! takes the resulting `(owner, name, amount, kind, confidence)` tuple and
//! turns it into a durable, balance-correct ledger entry. The interesting
//! parts live in the application layer: fuzzy customer resolution, the
//! atomic transaction-plus-balance commit, and failure-isolated payment
//! notifications.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
