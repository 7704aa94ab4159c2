/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Traits that external collaborators implement to plug consensus verification and state
//! transition into the chain store.
//!
//! chainstore decides *where* blocks go; it does not decide whether their headers satisfy the
//! consensus rules, nor what executing their transactions does to the state. Those two concerns
//! are reached exclusively through the [`ConsensusEngine`] and [`StateExecutor`] traits defined
//! here.
//!
//! Besides implementing the functions specified in the traits, implementors are additionally
//! expected to be *deterministic*: every function should evaluate to the same value every time
//! it is called with the same arguments.

use std::fmt::Display;

use crate::types::{
    block::{Block, Header, Receipt},
    data_types::CryptoHash,
};

/// Consensus-rule verification of headers, e.g. difficulty, signer, or PoS validity rules.
pub trait ConsensusEngine: Send + 'static {
    /// Check that `header` is a valid successor of `parent` under the consensus rules.
    fn verify_header(&self, header: &Header, parent: &Header) -> Result<(), EngineError>;

    /// Check a contiguous batch of headers, the first of which extends `first_parent`, returning
    /// one result per header.
    ///
    /// The default implementation verifies each header against its predecessor in the batch. An
    /// engine that can share work across a batch (e.g. seal verification in worker threads) may
    /// override this.
    fn verify_headers(
        &self,
        headers: &[Header],
        first_parent: &Header,
    ) -> Vec<Result<(), EngineError>> {
        let mut results = Vec::with_capacity(headers.len());
        let mut parent = first_parent;
        for header in headers {
            results.push(self.verify_header(header, parent));
            parent = header;
        }
        results
    }
}

/// Why a consensus engine rejected a header.
#[derive(Clone, Debug)]
pub enum EngineError {
    /// The header's number is not its parent's number plus one.
    InvalidNumber,

    /// The header's timestamp is not strictly later than its parent's.
    InvalidTimestamp,

    /// The header's difficulty does not match what the consensus rules prescribe for its
    /// parent and timestamp.
    InvalidDifficulty,

    /// The header's seal (signature, nonce, proof) is invalid.
    InvalidSeal,

    /// Any other consensus-rule violation.
    Other { reason: String },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidNumber => write!(f, "invalid block number"),
            EngineError::InvalidTimestamp => write!(f, "invalid timestamp"),
            EngineError::InvalidDifficulty => write!(f, "invalid difficulty"),
            EngineError::InvalidSeal => write!(f, "invalid seal"),
            EngineError::Other { reason } => write!(f, "{}", reason),
        }
    }
}

/// A state-trie node produced by executing a block: an opaque blob identified by its content
/// hash.
///
/// The executor must always materialize the node whose hash equals the post-state root, so that
/// the presence of a root-keyed node is equivalent to the state being resolvable.
#[derive(Clone, PartialEq, Eq)]
pub struct TrieNode {
    pub hash: CryptoHash,
    pub blob: Vec<u8>,
}

/// Everything executing one block produces: the post-state root, the trie nodes that state
/// commit created, and the receipts.
pub struct ExecutionOutput {
    pub state_root: CryptoHash,
    pub nodes: Vec<TrieNode>,
    pub receipts: Vec<Receipt>,
}

/// The state-transition function: takes a parent state and a block, produces a post-state plus
/// receipts.
pub trait StateExecutor: Send + 'static {
    /// Execute `block` on top of the state identified by `parent_state_root`.
    ///
    /// The caller guarantees that `parent_state_root` is resolvable at the time of the call. The
    /// returned [`ExecutionOutput::state_root`] and the commitment over
    /// [`ExecutionOutput::receipts`] are checked against the block header before anything is
    /// persisted.
    fn execute(
        &self,
        parent_state_root: CryptoHash,
        block: &Block,
    ) -> Result<ExecutionOutput, ExecutionError>;
}

/// Why executing a block failed. Transaction-level validation errors are surfaced verbatim.
#[derive(Debug)]
pub enum ExecutionError {
    /// A transaction carries a chain id that does not match the chain being executed.
    InvalidChainId { tx: CryptoHash },

    /// A transaction's signature is invalid.
    InvalidSignature { tx: CryptoHash },

    /// The post-state root produced by execution does not match the header's commitment.
    StateRootMismatch {
        expected: CryptoHash,
        got: CryptoHash,
    },

    /// The receipts produced by execution do not match the header's commitment.
    ReceiptsRootMismatch {
        expected: CryptoHash,
        got: CryptoHash,
    },

    /// Any other execution failure.
    Other { reason: String },
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::InvalidChainId { tx } => {
                write!(f, "transaction {} has an invalid chain id", tx)
            }
            ExecutionError::InvalidSignature { tx } => {
                write!(f, "transaction {} has an invalid signature", tx)
            }
            ExecutionError::StateRootMismatch { expected, got } => {
                write!(f, "state root mismatch: expected {}, got {}", expected, got)
            }
            ExecutionError::ReceiptsRootMismatch { expected, got } => {
                write!(
                    f,
                    "receipts root mismatch: expected {}, got {}",
                    expected, got
                )
            }
            ExecutionError::Other { reason } => write!(f, "{}", reason),
        }
    }
}
