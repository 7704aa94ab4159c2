/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Traits for pluggable two-tier chain persistence.

use std::fmt::Display;

use borsh::BorshDeserialize;

use crate::types::{
    block::{Block, Body, Header, Receipt},
    data_types::{BlockNumber, CryptoHash, TotalDifficulty},
};

use super::variables::{self, concat};

/// The live tier: a mutable key-value store with atomic batched writes.
///
/// Implementations are `Clone` so that the same backing store can be shared between the
/// [`ChainStore`](crate::chain_store::ChainStore) mutation handle and read-only cameras; clones
/// must observe each other's writes.
pub trait KVStore: KVGet + Clone + Send + 'static {
    type WriteBatch: WriteBatch;
    type Snapshot<'a>: 'a + KVGet;

    fn write(&mut self, wb: Self::WriteBatch);
    fn clear(&mut self);
    fn snapshot<'b>(&'b self) -> Self::Snapshot<'_>;
}

pub trait KVGet {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /* ↓↓↓ Header ↓↓↓ */

    fn header(&self, block: &CryptoHash) -> Result<Option<Header>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::HEADERS, &block.bytes())) {
            Ok(Some(Header::deserialize(&mut &*bytes).map_err(|err| {
                KVGetError::DeserializeValueError {
                    key: Key::Header { block: *block },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Body ↓↓↓ */

    fn body(&self, block: &CryptoHash) -> Result<Option<Body>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::BODIES, &block.bytes())) {
            Ok(Some(Body::deserialize(&mut &*bytes).map_err(|err| {
                KVGetError::DeserializeValueError {
                    key: Key::Body { block: *block },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Block ↓↓↓ */

    fn block(&self, block: &CryptoHash) -> Result<Option<Block>, KVGetError> {
        // Safety: if a body is present then its header is present too; the converse does not
        // hold for header-only imports.
        let header = self.header(block)?;
        if header.is_none() {
            return Ok(None);
        }
        let body = self.body(block)?;
        if body.is_none() {
            return Ok(None);
        }

        Ok(Some(Block {
            header: header.unwrap(),
            body: body.unwrap(),
        }))
    }

    /* ↓↓↓ Receipts ↓↓↓ */

    fn receipts(&self, block: &CryptoHash) -> Result<Option<Vec<Receipt>>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::RECEIPTS, &block.bytes())) {
            Ok(Some(Vec::<Receipt>::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::Receipts { block: *block },
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Total Difficulty ↓↓↓ */

    fn total_difficulty(&self, block: &CryptoHash) -> Result<Option<TotalDifficulty>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::TOTAL_DIFFICULTIES, &block.bytes())) {
            Ok(Some(TotalDifficulty::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::TotalDifficulty { block: *block },
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Hash to Number ↓↓↓ */

    fn hash_to_number(&self, block: &CryptoHash) -> Result<Option<BlockNumber>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::HASH_TO_NUMBER, &block.bytes())) {
            Ok(Some(BlockNumber::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::HashToNumber { block: *block },
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Canonical Hashes ↓↓↓ */

    fn canonical_hash(&self, number: BlockNumber) -> Result<Option<CryptoHash>, KVGetError> {
        if let Some(bytes) = self.get(&concat(&variables::CANONICAL_HASHES, &number.to_le_bytes()))
        {
            Ok(Some(CryptoHash::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::CanonicalHash { number },
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ State Nodes ↓↓↓ */

    fn state_node(&self, node: &CryptoHash) -> Option<Vec<u8>> {
        self.get(&concat(&variables::STATE_NODES, &node.bytes()))
    }

    /* ↓↓↓ Head Header ↓↓↓ */

    fn head_header(&self) -> Result<Option<CryptoHash>, KVGetError> {
        if let Some(bytes) = self.get(&variables::HEAD_HEADER) {
            Ok(Some(CryptoHash::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::HeadHeader,
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Head Snap Block ↓↓↓ */

    fn head_snap_block(&self) -> Result<Option<CryptoHash>, KVGetError> {
        if let Some(bytes) = self.get(&variables::HEAD_SNAP_BLOCK) {
            Ok(Some(CryptoHash::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::HeadSnapBlock,
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Head Block ↓↓↓ */

    fn head_block(&self) -> Result<Option<CryptoHash>, KVGetError> {
        if let Some(bytes) = self.get(&variables::HEAD_BLOCK) {
            Ok(Some(CryptoHash::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::HeadBlock,
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }

    /* ↓↓↓ Pivot Number ↓↓↓ */

    fn pivot_number(&self) -> Result<Option<BlockNumber>, KVGetError> {
        if let Some(bytes) = self.get(&variables::PIVOT_NUMBER) {
            Ok(Some(BlockNumber::deserialize(&mut &*bytes).map_err(
                |err| KVGetError::DeserializeValueError {
                    key: Key::PivotNumber,
                    source: err,
                },
            )?))
        } else {
            Ok(None)
        }
    }
}

/// Error when trying to read a value corresponding to a given key from the live
/// [key-value store][KVStore]: the value cannot be deserialized into its expected type.
#[derive(Debug)]
pub enum KVGetError {
    DeserializeValueError { key: Key, source: std::io::Error },
}

impl Display for KVGetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KVGetError::DeserializeValueError { key, source } => {
                write!(f, "failed to deserialize value at {}: {}", key, source)
            }
        }
    }
}

#[derive(Debug)]
pub enum Key {
    Header { block: CryptoHash },
    Body { block: CryptoHash },
    Receipts { block: CryptoHash },
    TotalDifficulty { block: CryptoHash },
    HashToNumber { block: CryptoHash },
    CanonicalHash { number: BlockNumber },
    StateNode { node: CryptoHash },
    HeadHeader,
    HeadSnapBlock,
    HeadBlock,
    PivotNumber,
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            &Key::Header { block } => write!(f, "Header for block {}", block),
            &Key::Body { block } => write!(f, "Body for block {}", block),
            &Key::Receipts { block } => write!(f, "Receipts for block {}", block),
            &Key::TotalDifficulty { block } => write!(f, "Total Difficulty for block {}", block),
            &Key::HashToNumber { block } => write!(f, "Number for block {}", block),
            &Key::CanonicalHash { number } => write!(f, "Canonical hash at number {}", number),
            &Key::StateNode { node } => write!(f, "State node {}", node),
            &Key::HeadHeader => write!(f, "Head Header"),
            &Key::HeadSnapBlock => write!(f, "Head Snap Block"),
            &Key::HeadBlock => write!(f, "Head Block"),
            &Key::PivotNumber => write!(f, "Pivot Number"),
        }
    }
}

pub trait WriteBatch {
    fn new() -> Self;
    fn set(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
}

/// One of the four parallel sequential tables kept by an [`AncientStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AncientTable {
    Headers,
    Bodies,
    Receipts,
    TotalDifficulties,
}

impl Display for AncientTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AncientTable::Headers => write!(f, "headers"),
            AncientTable::Bodies => write!(f, "bodies"),
            AncientTable::Receipts => write!(f, "receipts"),
            AncientTable::TotalDifficulties => write!(f, "total difficulties"),
        }
    }
}

/// The ancient tier: an append-only, strictly sequential log of finalized
/// (header, body, receipts, total difficulty) tuples indexed by block number.
///
/// # Commit cursor
///
/// The store maintains a single durable cursor shared by all four tables: the number of
/// *committed* items. [`append`](Self::append) stages rows beyond the cursor;
/// [`commit`](Self::commit) durably advances the cursor past every staged row. Implementations
/// must guarantee that rows staged but not committed are never visible after reopening the store
/// — a crash mid-append must leave the store at its last committed cursor.
///
/// [`get`](Self::get) only observes committed rows. [`truncate_to`](Self::truncate_to) discards
/// both staged rows and committed rows at or beyond the requested item count; it is the only
/// operation that moves the cursor backwards.
///
/// Like [`KVStore`], implementations are `Clone` with shared backing state.
pub trait AncientStore: Clone + Send + 'static {
    /// Number of committed items. Item `n` holds the data of block number `n`, so this is also
    /// the boundary below which chain data lives exclusively in this store.
    fn items(&self) -> u64;

    /// Read the committed row of `table` at `number`. Returns `None` for numbers at or beyond
    /// the committed cursor.
    fn get(&self, table: AncientTable, number: BlockNumber) -> Option<Vec<u8>>;

    /// Stage one item at the tail. `number` must equal the committed cursor plus the count of
    /// already-staged rows, otherwise the append fails with
    /// [`AncientError::UnexpectedNumber`] and leaves the staged region unchanged.
    fn append(
        &mut self,
        number: BlockNumber,
        header: &[u8],
        body: &[u8],
        receipts: &[u8],
        total_difficulty: &[u8],
    ) -> Result<(), AncientError>;

    /// Durably advance the committed cursor past every staged row.
    fn commit(&mut self) -> Result<(), AncientError>;

    /// Discard every staged row and every committed row at or beyond `items`, and move the
    /// cursor to `items`. `items` greater than the current committed cursor is a
    /// [`AncientError::TruncateBeyondTail`] error.
    fn truncate_to(&mut self, items: u64) -> Result<(), AncientError>;

    /* ↓↓↓ Typed readers ↓↓↓ */

    fn ancient_header(&self, number: BlockNumber) -> Result<Option<Header>, AncientError> {
        match self.get(AncientTable::Headers, number) {
            Some(bytes) => Ok(Some(Header::deserialize(&mut &*bytes).map_err(|err| {
                AncientError::DeserializeRowError {
                    table: AncientTable::Headers,
                    number,
                    source: err,
                }
            })?)),
            None => Ok(None),
        }
    }

    fn ancient_body(&self, number: BlockNumber) -> Result<Option<Body>, AncientError> {
        match self.get(AncientTable::Bodies, number) {
            Some(bytes) => Ok(Some(Body::deserialize(&mut &*bytes).map_err(|err| {
                AncientError::DeserializeRowError {
                    table: AncientTable::Bodies,
                    number,
                    source: err,
                }
            })?)),
            None => Ok(None),
        }
    }

    fn ancient_receipts(&self, number: BlockNumber) -> Result<Option<Vec<Receipt>>, AncientError> {
        match self.get(AncientTable::Receipts, number) {
            Some(bytes) => Ok(Some(Vec::<Receipt>::deserialize(&mut &*bytes).map_err(
                |err| AncientError::DeserializeRowError {
                    table: AncientTable::Receipts,
                    number,
                    source: err,
                },
            )?)),
            None => Ok(None),
        }
    }

    fn ancient_total_difficulty(
        &self,
        number: BlockNumber,
    ) -> Result<Option<TotalDifficulty>, AncientError> {
        match self.get(AncientTable::TotalDifficulties, number) {
            Some(bytes) => Ok(Some(TotalDifficulty::deserialize(&mut &*bytes).map_err(
                |err| AncientError::DeserializeRowError {
                    table: AncientTable::TotalDifficulties,
                    number,
                    source: err,
                },
            )?)),
            None => Ok(None),
        }
    }
}

/// Error arising from an [`AncientStore`] operation.
#[derive(Debug)]
pub enum AncientError {
    UnexpectedNumber {
        expected: BlockNumber,
        got: BlockNumber,
    },
    TruncateBeyondTail {
        items: u64,
        requested: u64,
    },
    DeserializeRowError {
        table: AncientTable,
        number: BlockNumber,
        source: std::io::Error,
    },
    Io {
        source: std::io::Error,
    },
}

impl Display for AncientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AncientError::UnexpectedNumber { expected, got } => write!(
                f,
                "out-of-order ancient append: expected number {}, got {}",
                expected, got
            ),
            AncientError::TruncateBeyondTail { items, requested } => write!(
                f,
                "cannot truncate ancient store with {} items to {} items",
                items, requested
            ),
            AncientError::DeserializeRowError {
                table,
                number,
                source,
            } => write!(
                f,
                "failed to deserialize ancient {} row at number {}: {}",
                table, number, source
            ),
            AncientError::Io { source } => write!(f, "ancient store io error: {}", source),
        }
    }
}
