/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Header insertion, per-hash total-difficulty accounting, and the canonical number→hash index.
//!
//! `HeaderChain` is the authority for "does a number map to this hash". It owns header-level
//! insertion (including consensus verification through the
//! [`ConsensusEngine`](crate::engine::ConsensusEngine) collaborator) and header-level rewind;
//! the [insertion engine](crate::chain_store) builds block-level insertion and reorgs on top of
//! it.
//!
//! Reads issued through `HeaderChain` are two-tier: numbers below the ancient boundary resolve
//! against the ancient store's tables, everything else against the live store.

use crate::engine::ConsensusEngine;
use crate::error::{ChainError, InsertError};
use crate::store::pluggables::{AncientStore, KVGet, KVStore};
use crate::store::write_batch::ChainWriteBatch;
use crate::types::{
    block::Header,
    data_types::{BlockNumber, CryptoHash, TotalDifficulty},
};

/// Owner of the header space of the chain: headers, total difficulties, the hash→number index,
/// and the canonical number→hash index.
pub struct HeaderChain<K: KVStore, F: AncientStore> {
    kv: K,
    ancient: F,
}

impl<K: KVStore, F: AncientStore> HeaderChain<K, F> {
    pub(crate) fn new(kv: K, ancient: F) -> Self {
        HeaderChain { kv, ancient }
    }

    /// Insert a hash-linked, number-contiguous segment of headers.
    ///
    /// The segment's first header must link to a header that is already known; the rest must
    /// each link to their predecessor in the segment. Headers that are already known are
    /// skipped. Consensus verification failures abort at the offending index: everything
    /// strictly before it is durably inserted, so the index is the resume point.
    ///
    /// Fork choice is not performed here — inserting headers never changes what is canonical.
    /// Returns the number of headers processed.
    pub(crate) fn insert<E: ConsensusEngine>(
        &mut self,
        headers: &[Header],
        engine: &E,
    ) -> Result<usize, InsertError> {
        if headers.is_empty() {
            return Ok(0);
        }

        // The segment must be internally hash-linked before anything is written.
        for i in 1..headers.len() {
            if headers[i].parent_hash != headers[i - 1].hash()
                || headers[i].number != headers[i - 1].number + 1
            {
                return Err(InsertError::new(
                    i,
                    ChainError::BrokenChain {
                        number: headers[i].number,
                    },
                ));
            }
        }

        let parent = self
            .header(&headers[0].parent_hash)
            .map_err(|err| InsertError::new(0, err))?
            .ok_or(InsertError::new(0, ChainError::UnknownAncestor))?;
        let mut parent_td = self
            .total_difficulty(&headers[0].parent_hash)
            .map_err(|err| InsertError::new(0, err))?
            .ok_or(InsertError::new(0, ChainError::UnknownAncestor))?;

        let verifications = engine.verify_headers(headers, &parent);

        for (i, header) in headers.iter().enumerate() {
            let hash = header.hash();

            // Already-known headers are idempotently skipped; their total difficulty was
            // accounted when they were first accepted.
            if let Some(known_td) = self
                .total_difficulty(&hash)
                .map_err(|err| InsertError::new(i, err))?
            {
                parent_td = known_td;
                continue;
            }

            if let Err(err) = &verifications[i] {
                return Err(InsertError::new(
                    i,
                    ChainError::Consensus { source: err.clone() },
                ));
            }

            let td = parent_td + header.difficulty;

            let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
            wb.set_header(header)
                .map_err(|err| InsertError::new(i, err.into()))?;
            wb.set_hash_to_number(&hash, header.number)
                .map_err(|err| InsertError::new(i, err.into()))?;
            wb.set_total_difficulty(&hash, td)
                .map_err(|err| InsertError::new(i, err.into()))?;
            self.kv.write(wb.0);

            parent_td = td;
        }

        Ok(headers.len())
    }

    /// Delete canonical mappings above `number` and move the header head marker to the canonical
    /// header at `number`. Returns the hash of the new header head.
    ///
    /// The caller is responsible for rewinding data (bodies, receipts, ancient tail) and the
    /// other two head pointers.
    pub(crate) fn set_head(&mut self, number: BlockNumber) -> Result<CryptoHash, ChainError> {
        let old_head_number = match self.kv.head_header()? {
            Some(hash) => match self.kv.hash_to_number(&hash)? {
                Some(number) => number,
                None => number,
            },
            None => number,
        };

        let new_head = self
            .canonical_hash(number)?
            .ok_or(ChainError::CanonicalHashExpectedButNotFound { number })?;

        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        let mut n = old_head_number;
        while n > number {
            wb.delete_canonical_hash(n);
            n = n - 1;
        }
        wb.set_head_header(&new_head)?;
        self.kv.write(wb.0);

        Ok(new_head)
    }

    /* ↓↓↓ Two-tier reads ↓↓↓ */

    /// Get the header identified by `hash`, checking the live store first and falling back to
    /// the ancient tables for frozen numbers.
    pub fn header(&self, hash: &CryptoHash) -> Result<Option<Header>, ChainError> {
        if let Some(header) = self.kv.header(hash)? {
            return Ok(Some(header));
        }
        if let Some(number) = self.kv.hash_to_number(hash)? {
            if let Some(header) = self.ancient.ancient_header(number)? {
                // Only canonical data survives freezing; a stale hash→number entry for a
                // decanonicalized sibling must not alias the frozen row.
                if header.hash() == *hash {
                    return Ok(Some(header));
                }
            }
        }
        Ok(None)
    }

    /// Is the header identified by `hash` known?
    pub fn has_header(&self, hash: &CryptoHash) -> Result<bool, ChainError> {
        Ok(self.header(hash)?.is_some())
    }

    /// Get the cumulative fork-choice weight from genesis to the header identified by `hash`.
    /// Non-`None` for every header that was ever accepted.
    pub fn total_difficulty(
        &self,
        hash: &CryptoHash,
    ) -> Result<Option<TotalDifficulty>, ChainError> {
        if let Some(td) = self.kv.total_difficulty(hash)? {
            return Ok(Some(td));
        }
        if let Some(number) = self.kv.hash_to_number(hash)? {
            if let Some(header) = self.ancient.ancient_header(number)? {
                if header.hash() == *hash {
                    return Ok(self.ancient.ancient_total_difficulty(number)?);
                }
            }
        }
        Ok(None)
    }

    /// Get the hash that `number` canonically maps to, if any.
    pub fn canonical_hash(&self, number: BlockNumber) -> Result<Option<CryptoHash>, ChainError> {
        if number.int() < self.ancient.items() {
            // The frozen region is canonical by construction; derive the mapping from the
            // headers table instead of duplicating it.
            return Ok(self
                .ancient
                .ancient_header(number)?
                .map(|header| header.hash()));
        }
        Ok(self.kv.canonical_hash(number)?)
    }

    /// Get the number of the header identified by `hash`, if known.
    pub fn number(&self, hash: &CryptoHash) -> Result<Option<BlockNumber>, ChainError> {
        Ok(self.kv.hash_to_number(hash)?)
    }
}
