/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for headers, blocks, receipts, and logs, and their associated methods.

use borsh::{BorshDeserialize, BorshSerialize};
pub use sha2::Sha256 as CryptoHasher;
use sha2::Digest;

use crate::types::data_types::{BlockNumber, ChainId, CryptoHash, Difficulty};

/// A block header. Immutable once accepted; identified by its [hash](Header::hash).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Header {
    pub number: BlockNumber,
    pub parent_hash: CryptoHash,
    pub state_root: CryptoHash,
    pub receipts_root: CryptoHash,
    pub difficulty: Difficulty,
    pub timestamp: u64,
    pub extra: Vec<u8>,
}

impl Header {
    /// Compute the hash identifying this header (and the block built on it): the SHA-256 hash of
    /// the header's borsh encoding.
    pub fn hash(&self) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(&self.try_to_vec().unwrap());
        CryptoHash::new(hasher.finalize().into())
    }
}

/// A transaction carried in a block body.
///
/// chainstore does not interpret transaction payloads; execution belongs to the
/// [`StateExecutor`](crate::engine::StateExecutor) collaborator. The `chain_id` is kept as a
/// structured field so that executors can reject transactions destined for other chains.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub chain_id: ChainId,
    pub nonce: u64,
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Compute the SHA-256 hash of this transaction's borsh encoding.
    pub fn hash(&self) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(&self.try_to_vec().unwrap());
        CryptoHash::new(hasher.finalize().into())
    }
}

/// The body of a block: its transactions and ommer (uncle) headers.
#[derive(Clone, Debug, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize)]
pub struct Body {
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<Header>,
}

/// A header plus a body. Immutable once accepted.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Block {
    pub header: Header,
    pub body: Body,
}

impl Block {
    /// Get the hash identifying this block, which is the hash of its header.
    pub fn hash(&self) -> CryptoHash {
        self.header.hash()
    }

    /// Get the number of this block.
    pub fn number(&self) -> BlockNumber {
        self.header.number
    }
}

/// The receipt produced by executing one transaction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Receipt {
    pub success: bool,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

/// An event log emitted during the execution of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Log {
    pub topics: Vec<CryptoHash>,
    pub data: Vec<u8>,
}

/// A [`Log`] annotated with its position in the chain.
///
/// Emitted through the [logs added / logs removed events](crate::events). Within one event's
/// batch, located logs are ordered by ascending `(block_number, tx_index)`; `removed` is `true`
/// iff the log belonged to a block that a reorg displaced from the canonical chain.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct LocatedLog {
    pub block_number: BlockNumber,
    pub block_hash: CryptoHash,
    pub tx_index: u32,
    pub log: Log,
    pub removed: bool,
}

/// Compute the commitment over a block's receipt set that is stored in
/// [`Header::receipts_root`]: the SHA-256 hash of the receipt list's borsh encoding.
pub fn receipts_root(receipts: &[Receipt]) -> CryptoHash {
    let mut hasher = CryptoHasher::new();
    hasher.update(&receipts.to_vec().try_to_vec().unwrap());
    CryptoHash::new(hasher.finalize().into())
}
