//! # rill-core
//! Ledger types and traits consumed by the Rill history index.

pub mod error;
pub mod ledger;
pub mod traits;
pub mod types;
