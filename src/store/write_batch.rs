/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Typed write batch that puts each chain variable at its place in the live store.

use borsh::BorshSerialize;

use crate::types::{
    block::{Body, Header, Receipt},
    data_types::{BlockNumber, CryptoHash, TotalDifficulty},
};

use super::pluggables::{Key, WriteBatch};
use super::variables::{self, concat};

/// A set of insertions and deletions into the live store that is applied atomically by
/// [`KVStore::write`](super::pluggables::KVStore::write).
pub struct ChainWriteBatch<W: WriteBatch>(pub(crate) W);

impl<W: WriteBatch> ChainWriteBatch<W> {
    pub(crate) fn new() -> ChainWriteBatch<W> {
        ChainWriteBatch(W::new())
    }

    /* ↓↓↓ Header ↓↓↓ */

    pub fn set_header(&mut self, header: &Header) -> Result<(), KVSetError> {
        let hash = header.hash();
        Ok(self.0.set(
            &concat(&variables::HEADERS, &hash.bytes()),
            &header
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::Header { block: hash },
                    source: err,
                })?,
        ))
    }

    pub fn delete_header(&mut self, block: &CryptoHash) {
        self.0.delete(&concat(&variables::HEADERS, &block.bytes()));
    }

    /* ↓↓↓ Body ↓↓↓ */

    pub fn set_body(&mut self, block: &CryptoHash, body: &Body) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &concat(&variables::BODIES, &block.bytes()),
            &body
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::Body { block: *block },
                    source: err,
                })?,
        ))
    }

    pub fn delete_body(&mut self, block: &CryptoHash) {
        self.0.delete(&concat(&variables::BODIES, &block.bytes()));
    }

    /* ↓↓↓ Receipts ↓↓↓ */

    pub fn set_receipts(
        &mut self,
        block: &CryptoHash,
        receipts: &[Receipt],
    ) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &concat(&variables::RECEIPTS, &block.bytes()),
            &receipts
                .to_vec()
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::Receipts { block: *block },
                    source: err,
                })?,
        ))
    }

    pub fn delete_receipts(&mut self, block: &CryptoHash) {
        self.0.delete(&concat(&variables::RECEIPTS, &block.bytes()));
    }

    /* ↓↓↓ Total Difficulty ↓↓↓ */

    pub fn set_total_difficulty(
        &mut self,
        block: &CryptoHash,
        total_difficulty: TotalDifficulty,
    ) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &concat(&variables::TOTAL_DIFFICULTIES, &block.bytes()),
            &total_difficulty
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::TotalDifficulty { block: *block },
                    source: err,
                })?,
        ))
    }

    pub fn delete_total_difficulty(&mut self, block: &CryptoHash) {
        self.0
            .delete(&concat(&variables::TOTAL_DIFFICULTIES, &block.bytes()));
    }

    /* ↓↓↓ Hash to Number ↓↓↓ */

    pub fn set_hash_to_number(
        &mut self,
        block: &CryptoHash,
        number: BlockNumber,
    ) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &concat(&variables::HASH_TO_NUMBER, &block.bytes()),
            &number
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::HashToNumber { block: *block },
                    source: err,
                })?,
        ))
    }

    pub fn delete_hash_to_number(&mut self, block: &CryptoHash) {
        self.0
            .delete(&concat(&variables::HASH_TO_NUMBER, &block.bytes()));
    }

    /* ↓↓↓ Canonical Hashes ↓↓↓ */

    pub fn set_canonical_hash(
        &mut self,
        number: BlockNumber,
        block: &CryptoHash,
    ) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &concat(&variables::CANONICAL_HASHES, &number.to_le_bytes()),
            &block
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::CanonicalHash { number },
                    source: err,
                })?,
        ))
    }

    pub fn delete_canonical_hash(&mut self, number: BlockNumber) {
        self.0
            .delete(&concat(&variables::CANONICAL_HASHES, &number.to_le_bytes()));
    }

    /* ↓↓↓ State Nodes ↓↓↓ */

    pub fn set_state_node(&mut self, node: &CryptoHash, blob: &[u8]) {
        self.0
            .set(&concat(&variables::STATE_NODES, &node.bytes()), blob);
    }

    pub fn delete_state_node(&mut self, node: &CryptoHash) {
        self.0
            .delete(&concat(&variables::STATE_NODES, &node.bytes()));
    }

    /* ↓↓↓ Head Header ↓↓↓ */

    pub fn set_head_header(&mut self, block: &CryptoHash) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &variables::HEAD_HEADER,
            &block
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::HeadHeader,
                    source: err,
                })?,
        ))
    }

    /* ↓↓↓ Head Snap Block ↓↓↓ */

    pub fn set_head_snap_block(&mut self, block: &CryptoHash) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &variables::HEAD_SNAP_BLOCK,
            &block
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::HeadSnapBlock,
                    source: err,
                })?,
        ))
    }

    /* ↓↓↓ Head Block ↓↓↓ */

    pub fn set_head_block(&mut self, block: &CryptoHash) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &variables::HEAD_BLOCK,
            &block
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::HeadBlock,
                    source: err,
                })?,
        ))
    }

    /* ↓↓↓ Pivot Number ↓↓↓ */

    pub fn set_pivot_number(&mut self, number: BlockNumber) -> Result<(), KVSetError> {
        Ok(self.0.set(
            &variables::PIVOT_NUMBER,
            &number
                .try_to_vec()
                .map_err(|err| KVSetError::SerializeValueError {
                    key: Key::PivotNumber,
                    source: err,
                })?,
        ))
    }

    pub fn delete_pivot_number(&mut self) {
        self.0.delete(&variables::PIVOT_NUMBER);
    }
}

#[derive(Debug)]
pub enum KVSetError {
    SerializeValueError { key: Key, source: std::io::Error },
}

impl std::fmt::Display for KVSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KVSetError::SerializeValueError { key, source } => {
                write!(f, "failed to serialize value for {}: {}", key, source)
            }
        }
    }
}
