//! Domain records and ports.
//!
//! Everything here is owner-scoped: a `Customer` and its `Transaction`s are
//! visible only through the owning shopkeeper's id.

pub mod customer;
pub mod owner;
pub mod ports;
pub mod resolution;
pub mod transaction;
