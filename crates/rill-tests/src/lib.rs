//! Integration test suite for the Rill history index.
//!
//! Tests replay whole chains through [`rill_history_lib::HistoryDb`] on both
//! storage backends and check cross-index consistency, including under
//! corrupt or adversarial ledgers.

pub mod helpers;
