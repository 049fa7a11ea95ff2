//! Trait interfaces for the Rill protocol.
//!
//! - [`Ledger`]: ordered, read-only access to the block chain (the history
//!   index consumes it; [`MemoryLedger`](crate::ledger::MemoryLedger) implements it)

use crate::error::RillError;
use crate::types::Block;

/// Read-only view of the ledger as a gapless sequence of blocks.
///
/// Block `0` is genesis and every block up to [`head_seq`](Self::head_seq)
/// must be retrievable with [`block_at_depth`](Self::block_at_depth).
pub trait Ledger: Send + Sync {
    /// Seq of the newest block. `None` if the ledger has no blocks.
    fn head_seq(&self) -> Result<Option<u64>, RillError>;

    /// Block at the given seq. `None` if past the head.
    fn block_at_depth(&self, seq: u64) -> Result<Option<Block>, RillError>;
}
