/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Error taxonomy of chain mutation operations.
//!
//! # Propagation policy
//!
//! Structural and consensus failures stop batch processing at the first bad item and report its
//! index through [`InsertError`]; everything strictly before that index is already durably
//! committed, so the index doubles as the resume point. Storage-layer failures are never
//! silently retried — they propagate, and the caller decides whether to retry the batch.

use std::fmt::Display;

use crate::engine::{EngineError, ExecutionError};
use crate::store::pluggables::{AncientError, KVGetError};
use crate::store::write_batch::KVSetError;
use crate::types::data_types::{BlockNumber, CryptoHash};

/// Why a chain mutation was rejected.
#[derive(Debug)]
pub enum ChainError {
    /// The item is already present. Idempotent: batch operations skip it and move on, so this
    /// variant never surfaces through [`InsertError`].
    KnownBlock,

    /// The item's parent is known neither to the store nor to the batch being inserted.
    UnknownAncestor,

    /// The batch is not a hash-linked sequence: the item at the reported number does not link to
    /// its predecessor.
    BrokenChain { number: BlockNumber },

    /// The consensus engine rejected the item's header.
    Consensus { source: EngineError },

    /// The state executor rejected the item, or its output did not match the commitments in the
    /// item's header.
    Execution { source: ExecutionError },

    /// The operation needs the state of an ancestor whose root fell out of the retention window,
    /// and no deeper ancestor with resolvable state exists to re-execute from.
    PrunedAncestor { block: CryptoHash },

    /// A receipt-chain item is not part of the current canonical header chain.
    SideChainReceipts { block: CryptoHash },

    /// The ancient store rejected an operation. For appends, the store has been rolled back to
    /// its pre-call item count.
    Ancient { source: AncientError },

    /// The chain store has been stopped; no further mutation is accepted.
    Stopped,

    /// The backing stores have never been [initialized](crate::chain_store::ChainStore::initialize)
    /// with a genesis block.
    Uninitialized,

    /// The number of receipt sets passed to a receipt-chain insertion does not equal the number
    /// of blocks.
    MismatchedReceipts { blocks: usize, receipts: usize },

    /// A value that must exist for the operation to make sense was not found.
    BlockExpectedButNotFound { block: CryptoHash },

    /// No canonical mapping exists at a number where one is required.
    CanonicalHashExpectedButNotFound { number: BlockNumber },

    /// The live store returned an undecodable value.
    KVGetError(KVGetError),

    /// A value destined for the live store could not be encoded.
    KVSetError(KVSetError),
}

impl Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::KnownBlock => write!(f, "block already known"),
            ChainError::UnknownAncestor => write!(f, "unknown ancestor"),
            ChainError::BrokenChain { number } => {
                write!(f, "broken chain at number {}", number)
            }
            ChainError::Consensus { source } => write!(f, "consensus violation: {}", source),
            ChainError::Execution { source } => write!(f, "execution failure: {}", source),
            ChainError::PrunedAncestor { block } => {
                write!(f, "state of ancestor of block {} is pruned", block)
            }
            ChainError::SideChainReceipts { block } => {
                write!(f, "receipt-chain block {} is not canonical", block)
            }
            ChainError::Ancient { source } => write!(f, "ancient store failure: {}", source),
            ChainError::Stopped => write!(f, "chain store is stopped"),
            ChainError::Uninitialized => write!(f, "chain store has not been initialized"),
            ChainError::MismatchedReceipts { blocks, receipts } => write!(
                f,
                "receipt-chain insertion got {} blocks but {} receipt sets",
                blocks, receipts
            ),
            ChainError::BlockExpectedButNotFound { block } => {
                write!(f, "block {} expected but not found", block)
            }
            ChainError::CanonicalHashExpectedButNotFound { number } => {
                write!(f, "canonical hash at number {} expected but not found", number)
            }
            ChainError::KVGetError(source) => write!(f, "{}", source),
            ChainError::KVSetError(source) => write!(f, "{}", source),
        }
    }
}

impl From<KVGetError> for ChainError {
    fn from(err: KVGetError) -> Self {
        ChainError::KVGetError(err)
    }
}

impl From<KVSetError> for ChainError {
    fn from(err: KVSetError) -> Self {
        ChainError::KVSetError(err)
    }
}

impl From<AncientError> for ChainError {
    fn from(err: AncientError) -> Self {
        ChainError::Ancient { source: err }
    }
}

impl From<EngineError> for ChainError {
    fn from(err: EngineError) -> Self {
        ChainError::Consensus { source: err }
    }
}

impl From<ExecutionError> for ChainError {
    fn from(err: ExecutionError) -> Self {
        ChainError::Execution { source: err }
    }
}

/// A batch insertion failed at `index`.
///
/// Items strictly before `index` are durably committed; resubmitting the batch from `index`
/// resumes exactly where the failed call stopped.
#[derive(Debug)]
pub struct InsertError {
    pub index: usize,
    pub source: ChainError,
}

impl InsertError {
    pub(crate) fn new(index: usize, source: ChainError) -> Self {
        InsertError { index, source }
    }
}

impl Display for InsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "insertion failed at index {}: {}", self.index, self.source)
    }
}
