//! Transport adapters for the batch CLI.

pub mod csv;
