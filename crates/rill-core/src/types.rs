//! Core ledger types: transactions, blocks, outputs.
//!
//! All monetary values are in rills (1 RILL = 10^8 rills).
//! All numeric fields use u64 per protocol convention.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// A 32-byte hash value.
///
/// Used for transaction IDs (BLAKE3), output IDs (BLAKE3), block header
/// hashes (SHA-256), and pubkey hashes.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes). Used as the genesis `prev_hash`.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Hash256 {
    type Err = LedgerError;

    /// Parse a 64-character hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| LedgerError::InvalidHash(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| LedgerError::InvalidHash(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(bytes))
    }
}

/// A transaction output as declared by the sender.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOutput {
    /// Value in rills.
    pub value: u64,
    /// Hash of the recipient's public key. This is the owning address.
    pub pubkey_hash: Hash256,
}

/// A transaction consuming earlier outputs and creating new ones.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// Protocol version.
    pub version: u64,
    /// Identifiers of the outputs consumed, see [`UxOut::hash`].
    pub inputs: Vec<Hash256>,
    /// New outputs created by this transaction.
    pub outputs: Vec<TxOutput>,
    /// Block seq or timestamp before which this tx is invalid.
    pub lock_time: u64,
}

impl Transaction {
    /// Compute the transaction ID (BLAKE3 hash of the canonical encoding).
    ///
    /// Uses bincode with standard config for deterministic serialization.
    pub fn txid(&self) -> Result<Hash256, LedgerError> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(Hash256(blake3::hash(&encoded).into()))
    }
}

/// Block header. `seq` is the block's position in the ledger, genesis is 0.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct BlockHeader {
    /// Protocol version.
    pub version: u64,
    /// Sequence number of this block.
    pub seq: u64,
    /// Hash of the previous block header.
    pub prev_hash: Hash256,
    /// Commitment to the block's transaction IDs, see [`Block::body_hash`].
    pub body_hash: Hash256,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

impl BlockHeader {
    /// Header size in bytes when serialized for hashing (3 u64 fields + 2 * 32-byte hashes).
    const HASH_SIZE: usize = 3 * 8 + 2 * 32;

    /// Compute the block header hash (double SHA-256).
    ///
    /// Fixed byte layout: version || seq || prev_hash || body_hash || timestamp,
    /// all little-endian.
    pub fn hash(&self) -> Hash256 {
        let mut data = Vec::with_capacity(Self::HASH_SIZE);
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&self.seq.to_le_bytes());
        data.extend_from_slice(self.prev_hash.as_bytes());
        data.extend_from_slice(self.body_hash.as_bytes());
        data.extend_from_slice(&self.timestamp.to_le_bytes());
        let first = Sha256::digest(&data);
        Hash256(Sha256::digest(first).into())
    }
}

/// A complete block: header plus transactions.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Transactions in ledger order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Sequence number of this block.
    pub fn seq(&self) -> u64 {
        self.header.seq
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header.seq == 0
    }

    /// BLAKE3 over the concatenated transaction IDs, in order.
    pub fn body_hash(transactions: &[Transaction]) -> Result<Hash256, LedgerError> {
        let mut hasher = blake3::Hasher::new();
        for tx in transactions {
            hasher.update(tx.txid()?.as_bytes());
        }
        Ok(Hash256(hasher.finalize().into()))
    }
}

/// Where and when an output was created.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct UxHead {
    /// Timestamp of the creating block.
    pub time: u64,
    /// Seq of the creating block.
    pub block_seq: u64,
}

/// The content of an output. Its hash is the output ID.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct UxBody {
    /// Transaction that created this output.
    pub src_txid: Hash256,
    /// Position within the creating transaction's outputs.
    pub index: u64,
    /// Owning address.
    pub pubkey_hash: Hash256,
    /// Value in rills.
    pub value: u64,
}

impl UxBody {
    const HASH_SIZE: usize = 2 * 32 + 2 * 8;

    /// BLAKE3 over src_txid || index || pubkey_hash || value, little-endian.
    pub fn hash(&self) -> Hash256 {
        let mut data = Vec::with_capacity(Self::HASH_SIZE);
        data.extend_from_slice(self.src_txid.as_bytes());
        data.extend_from_slice(&self.index.to_le_bytes());
        data.extend_from_slice(self.pubkey_hash.as_bytes());
        data.extend_from_slice(&self.value.to_le_bytes());
        Hash256(blake3::hash(&data).into())
    }
}

/// An output created by a transaction, as placed in a block.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct UxOut {
    pub head: UxHead,
    pub body: UxBody,
}

impl UxOut {
    /// Content-addressed output ID. Depends only on the body.
    pub fn hash(&self) -> Hash256 {
        self.body.hash()
    }

    /// Owning address.
    pub fn pubkey_hash(&self) -> &Hash256 {
        &self.body.pubkey_hash
    }
}
