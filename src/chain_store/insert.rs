/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The insertion, fork-choice, and reorganization engine.
//!
//! Inserting a contiguous segment proceeds through a fixed sequence:
//! 1. Validate structural continuity: each item's parent hash must equal the previous accepted
//!    item's hash, except the first, which must link to known data.
//! 2. Per item: consensus verification through the engine, execution through the executor (when
//!    the parent state is resolvable), then a durable write. A per-item failure stops the batch
//!    and reports the index; earlier items stay committed.
//! 3. Fork choice: compare the candidate's total difficulty against the canonical head's under
//!    the [policy](super::fork_choice::ForkChoice) in force, or defer to an external
//!    [`set_canonical`](ChainStore::set_canonical) directive past the merge threshold.
//! 4. If the candidate wins and is not a simple extension, find the lowest common ancestor of
//!    the old and new chains and compute the `deleted` and `added` segments.
//! 5. Rewrite the canonical number→hash index and delete stale mappings beyond the new head, in
//!    one atomic batch together with the head markers.
//! 6. Emit ordered log events: one "removed" batch, then one "added" batch, each in ascending
//!    `(block number, tx index)` order.
//! 7. Advance the head pointers and the trie retention window.

use borsh::BorshSerialize;

use crate::engine::{ExecutionError, ExecutionOutput};
use crate::error::{ChainError, InsertError};
use crate::events::*;
use crate::store::pluggables::{AncientStore, KVGet, KVStore};
use crate::store::write_batch::ChainWriteBatch;
use crate::types::{
    block::{receipts_root, Block, Header, LocatedLog, Receipt},
    data_types::{BlockNumber, CryptoHash, TotalDifficulty},
};

use super::fork_choice::ForkChoice;
use super::heads::{HeadPointer, HeadPointers};
use super::{rewind_until, ChainStore};
use crate::engine::{ConsensusEngine, StateExecutor};

impl<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> ChainStore<K, F, E, X> {
    /// Insert a contiguous segment of headers, without bodies or state.
    ///
    /// Headers that win fork choice become canonical and advance the header head; the snap and
    /// full heads never move here. Returns the number of headers processed; on failure, the
    /// reported index is the resume point.
    pub fn insert_header_chain(&mut self, headers: &[Header]) -> Result<usize, InsertError> {
        self.check_active()
            .map_err(|err| InsertError::new(0, err))?;
        if headers.is_empty() {
            return Ok(0);
        }

        let count = self.header_chain.insert(headers, &self.engine)?;

        let tip = headers[headers.len() - 1].clone();
        let tip_hash = tip.hash();
        let last = headers.len() - 1;

        let tip_td = self
            .header_chain
            .total_difficulty(&tip_hash)
            .map_err(|err| InsertError::new(last, err))?
            .ok_or(InsertError::new(
                last,
                ChainError::BlockExpectedButNotFound { block: tip_hash },
            ))?;
        let head = self.heads.head_header();
        let head_td = self
            .header_chain
            .total_difficulty(&head.hash)
            .map_err(|err| InsertError::new(last, err))?
            .ok_or(InsertError::new(
                last,
                ChainError::BlockExpectedButNotFound { block: head.hash },
            ))?;

        let fork_choice = ForkChoice::resolve(&self.config, head_td);
        if fork_choice.prefers(tip_td, head_td) {
            self.canonicalize(tip, false)
                .map_err(|err| InsertError::new(last, err))?;
        }

        Ok(count)
    }

    /// Insert a contiguous segment of full blocks, executing each against its parent state and
    /// applying fork choice after each item.
    ///
    /// Returns the number of blocks processed. On failure, blocks strictly before the reported
    /// index are durably inserted; the index is the resume point.
    pub fn insert_chain(&mut self, blocks: &[Block]) -> Result<usize, InsertError> {
        self.check_active()
            .map_err(|err| InsertError::new(0, err))?;
        if blocks.is_empty() {
            return Ok(0);
        }

        // Step 1: the segment must be internally hash-linked before anything is written.
        for i in 1..blocks.len() {
            if blocks[i].header.parent_hash != blocks[i - 1].hash()
                || blocks[i].number() != blocks[i - 1].number() + 1
            {
                return Err(InsertError::new(
                    i,
                    ChainError::BrokenChain {
                        number: blocks[i].number(),
                    },
                ));
            }
        }

        for (i, block) in blocks.iter().enumerate() {
            self.insert_block(block)
                .map_err(|err| InsertError::new(i, err))?;
        }

        Ok(blocks.len())
    }

    /// Insert and (when the parent state is resolvable) execute `block` without letting it
    /// participate in fork choice: the canonical chain and the head pointers are left untouched.
    ///
    /// The stored block can later be promoted with [`set_canonical`](Self::set_canonical). Side
    /// chains whose parent state has been pruned are accepted too — their state stays deferred
    /// until promotion.
    pub fn insert_block_without_set_head(&mut self, block: &Block) -> Result<(), ChainError> {
        self.check_active()?;
        self.store_block(block)?;
        Ok(())
    }

    /// Make the stored block identified by `hash` the canonical head, bypassing difficulty
    /// comparison. This is the external fork-choice directive used past the merge threshold.
    ///
    /// If the block's state was deferred (pruned-ancestor side import), it is reconstructed here
    /// by re-executing forward from the nearest ancestor with resolvable state; if no usable
    /// ancestor state exists, the promotion fails with [`ChainError::PrunedAncestor`].
    pub fn set_canonical(&mut self, hash: &CryptoHash) -> Result<(), ChainError> {
        self.check_active()?;

        let header = self
            .header_by_hash(hash)?
            .ok_or(ChainError::BlockExpectedButNotFound { block: *hash })?;

        // Re-check under the mutation lock: the directive may have already been applied.
        if self.heads.head_block().hash == *hash {
            return Ok(());
        }

        self.ensure_state(&header)?;
        self.canonicalize(header, true)
    }

    /* ↓↓↓ Per-block insertion ↓↓↓ */

    /// Insert one block and apply fork choice (steps 2–7 for a single item).
    fn insert_block(&mut self, block: &Block) -> Result<(), ChainError> {
        let (td, known) = self.store_block(block)?;
        if known {
            return Ok(());
        }

        let head = self.heads.head_block();
        let head_td = self
            .total_difficulty(&head.hash)?
            .ok_or(ChainError::BlockExpectedButNotFound { block: head.hash })?;

        let fork_choice = ForkChoice::resolve(&self.config, head_td);
        if fork_choice.prefers(td, head_td) {
            // The winning chain may have been stored with deferred state (its branch point
            // predates the retention window); reconstruct before promoting.
            self.ensure_state(&block.header)?;
            self.canonicalize(block.header.clone(), true)?;
        }

        Ok(())
    }

    /// Verify, execute (when possible), and durably store one block, without touching the
    /// canonical index. Returns the block's total difficulty and whether it was already known
    /// (in which case nothing was written).
    fn store_block(&mut self, block: &Block) -> Result<(TotalDifficulty, bool), ChainError> {
        let hash = block.hash();
        let header = &block.header;

        // Known block: already stored with resolvable state. Idempotent skip.
        if self.has_block(&hash)? && self.has_state(&header.state_root) {
            let td = self
                .total_difficulty(&hash)?
                .ok_or(ChainError::BlockExpectedButNotFound { block: hash })?;
            return Ok((td, true));
        }

        let parent = self
            .header_by_hash(&header.parent_hash)?
            .ok_or(ChainError::UnknownAncestor)?;

        self.engine.verify_header(header, &parent)?;

        // Execute now if the parent state is resolvable; otherwise store without state and
        // defer execution to a potential later promotion.
        let executed = if self.has_state(&parent.state_root) {
            Some(self.execute_block(block, &parent)?)
        } else {
            None
        };

        let parent_td = self
            .total_difficulty(&header.parent_hash)?
            .ok_or(ChainError::UnknownAncestor)?;
        let td = parent_td + header.difficulty;

        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        wb.set_header(header)?;
        wb.set_hash_to_number(&hash, header.number)?;
        wb.set_total_difficulty(&hash, td)?;
        wb.set_body(&hash, &block.body)?;
        if let Some(output) = &executed {
            wb.set_receipts(&hash, &output.receipts)?;
        }
        self.kv.write(wb.0);

        if let Some(output) = executed {
            self.pin_root(output.state_root, output.nodes);
        }

        self.publish(Event::InsertBlock(InsertBlockEvent {
            timestamp: Self::now(),
            block: hash,
            number: header.number,
        }));

        Ok((td, false))
    }

    /// Run the executor and check its output against the header's commitments.
    fn execute_block(&self, block: &Block, parent: &Header) -> Result<ExecutionOutput, ChainError> {
        let output = self.executor.execute(parent.state_root, block)?;

        if output.state_root != block.header.state_root {
            return Err(ChainError::Execution {
                source: ExecutionError::StateRootMismatch {
                    expected: block.header.state_root,
                    got: output.state_root,
                },
            });
        }
        let got_receipts_root = receipts_root(&output.receipts);
        if got_receipts_root != block.header.receipts_root {
            return Err(ChainError::Execution {
                source: ExecutionError::ReceiptsRootMismatch {
                    expected: block.header.receipts_root,
                    got: got_receipts_root,
                },
            });
        }

        Ok(output)
    }

    /// Make `header.state_root` resolvable, re-executing forward from the nearest ancestor with
    /// resolvable state if it is not.
    fn ensure_state(&mut self, header: &Header) -> Result<(), ChainError> {
        if self.has_state(&header.state_root) {
            return Ok(());
        }

        // Walk back along parent links collecting the blocks whose state must be rebuilt. A
        // missing body means the segment cannot be re-executed at all.
        let mut pending: Vec<Block> = Vec::new();
        let mut cursor = header.clone();
        loop {
            let cursor_hash = cursor.hash();
            let block = self
                .block_by_hash(&cursor_hash)?
                .ok_or(ChainError::PrunedAncestor { block: cursor_hash })?;
            pending.push(block);

            let parent = self
                .header_by_hash(&cursor.parent_hash)?
                .ok_or(ChainError::UnknownAncestor)?;
            if self.has_state(&parent.state_root) {
                break;
            }
            if parent.number.int() == 0 {
                return Err(ChainError::PrunedAncestor {
                    block: parent.hash(),
                });
            }
            cursor = parent;
        }

        // Re-execute from oldest to newest.
        for block in pending.iter().rev() {
            let parent = self
                .header_by_hash(&block.header.parent_hash)?
                .ok_or(ChainError::UnknownAncestor)?;
            let output = self.execute_block(block, &parent)?;

            let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
            wb.set_receipts(&block.hash(), &output.receipts)?;
            self.kv.write(wb.0);

            self.pin_root(output.state_root, output.nodes);
        }

        Ok(())
    }

    /* ↓↓↓ Canonicalization ↓↓↓ */

    /// Make `tip` the canonical head (steps 4–7). `full` distinguishes block-level
    /// canonicalization (all three heads move, log events fire) from header-level (only the
    /// header head moves).
    ///
    /// This is the commit phase: every canonical-index change and head movement lands in one
    /// atomic write batch, and events are published only after the batch is written.
    fn canonicalize(&mut self, tip: Header, full: bool) -> Result<(), ChainError> {
        let tip_hash = tip.hash();
        let tip_ptr = HeadPointer::new(tip_hash, tip.number);
        let old_header_head = self.heads.head_header();
        let old_block_head = self.heads.head_block();

        // Collect the new chain back to the lowest common ancestor: walk parent links until a
        // canonical block is met.
        let mut added: Vec<Header> = Vec::new();
        let mut cursor = tip.clone();
        while self.header_chain.canonical_hash(cursor.number)? != Some(cursor.hash()) {
            let parent_hash = cursor.parent_hash;
            added.push(cursor);
            cursor = self
                .header_chain
                .header(&parent_hash)?
                .ok_or(ChainError::UnknownAncestor)?;
        }

        if added.is_empty() {
            // `tip` is already canonical: either bodies are catching up under pre-inserted
            // headers (fill-forward), or an external directive rewinds to an ancestor.
            return self.canonicalize_in_place(tip_ptr, old_block_head, full);
        }

        let ancestor = cursor;
        added.reverse();

        // Collect the old chain strictly above the ancestor, ascending.
        let mut deleted: Vec<Header> = Vec::new();
        let mut n = ancestor.number + 1;
        while n <= old_header_head.number {
            match self.header_chain.canonical_hash(n)? {
                Some(hash) => match self.header_chain.header(&hash)? {
                    Some(header) => deleted.push(header),
                    None => break,
                },
                None => break,
            }
            n += 1;
        }

        // Step 5: rewrite the canonical index and move the heads, atomically.
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        for header in &added {
            wb.set_canonical_hash(header.number, &header.hash())?;
        }
        let mut stale = tip.number + 1;
        while stale <= old_header_head.number {
            wb.delete_canonical_hash(stale);
            stale += 1;
        }

        if full {
            self.heads.set_all(tip_ptr);
        } else {
            self.rewind_decanonicalized_heads(&ancestor)?;
            self.heads.promote_header(tip_ptr);
        }
        self.stage_heads(&mut wb)?;
        self.kv.write(wb.0);

        // Step 6: ordered log events — removed first, then added, each ascending.
        if full {
            let mut removed_logs: Vec<LocatedLog> = Vec::new();
            for header in &deleted {
                removed_logs.extend(self.located_logs(header, true)?);
            }
            let mut added_logs: Vec<LocatedLog> = Vec::new();
            for header in &added {
                added_logs.extend(self.located_logs(header, false)?);
            }
            if !removed_logs.is_empty() {
                self.publish(Event::LogsRemoved(LogsRemovedEvent {
                    timestamp: Self::now(),
                    logs: removed_logs,
                }));
            }
            if !added_logs.is_empty() {
                self.publish(Event::LogsAdded(LogsAddedEvent {
                    timestamp: Self::now(),
                    logs: added_logs,
                }));
            }
        }

        if !deleted.is_empty() {
            self.publish(Event::Reorg(ReorgEvent {
                timestamp: Self::now(),
                old_head: old_header_head.hash,
                new_head: tip_hash,
                common_ancestor: ancestor.number,
            }));
        }
        self.publish(Event::NewCanonicalHead(NewCanonicalHeadEvent {
            timestamp: Self::now(),
            block: tip_hash,
            number: tip.number,
        }));

        Ok(())
    }

    /// Canonicalization when the target is already part of the canonical chain: promote the
    /// lower heads up to it (fill-forward), or rewind everything down to it (external
    /// directive onto an ancestor).
    fn canonicalize_in_place(
        &mut self,
        tip: HeadPointer,
        old_block_head: HeadPointer,
        full: bool,
    ) -> Result<(), ChainError> {
        if !full {
            // Header-level: the header head never rewinds onto its own chain implicitly.
            return Ok(());
        }

        if tip.number >= old_block_head.number {
            if tip == old_block_head {
                return Ok(());
            }

            // Fill-forward: every canonical block in (old_block_head, tip] gains full
            // availability; their logs are added in ascending order.
            let mut added_logs: Vec<LocatedLog> = Vec::new();
            let mut n = old_block_head.number + 1;
            while n <= tip.number {
                if let Some(header) = self.header_by_number(n)? {
                    added_logs.extend(self.located_logs(&header, false)?);
                }
                n += 1;
            }

            let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
            self.heads.promote_full(tip);
            self.stage_heads(&mut wb)?;
            self.kv.write(wb.0);

            if !added_logs.is_empty() {
                self.publish(Event::LogsAdded(LogsAddedEvent {
                    timestamp: Self::now(),
                    logs: added_logs,
                }));
            }
        } else {
            // Rewind onto an ancestor: canonical mappings above it are dropped and its
            // descendants' logs are removed in ascending order.
            let old_header_head = self.heads.head_header();
            let mut removed_logs: Vec<LocatedLog> = Vec::new();
            let mut n = tip.number + 1;
            while n <= old_header_head.number {
                if let Some(header) = self.header_by_number(n)? {
                    removed_logs.extend(self.located_logs(&header, true)?);
                }
                n += 1;
            }

            let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
            let mut stale = tip.number + 1;
            while stale <= old_header_head.number {
                wb.delete_canonical_hash(stale);
                stale += 1;
            }
            self.heads.set_all(tip);
            self.stage_heads(&mut wb)?;
            self.kv.write(wb.0);

            if !removed_logs.is_empty() {
                self.publish(Event::LogsRemoved(LogsRemovedEvent {
                    timestamp: Self::now(),
                    logs: removed_logs,
                }));
            }
        }

        self.publish(Event::NewCanonicalHead(NewCanonicalHeadEvent {
            timestamp: Self::now(),
            block: tip.hash,
            number: tip.number,
        }));

        Ok(())
    }

    /// After a header-level reorg, the snap and full heads may rest on blocks that are no
    /// longer canonical; rewind them to the nearest available position at or below the common
    /// ancestor.
    fn rewind_decanonicalized_heads(&mut self, ancestor: &Header) -> Result<(), ChainError> {
        let ancestor_ptr = HeadPointer::new(ancestor.hash(), ancestor.number);
        let genesis_ptr = self.genesis_pointer()?;

        let snap = self.heads.head_snap_block();
        if snap.number > ancestor.number {
            let recovered = rewind_until(
                &self.header_chain,
                ancestor_ptr,
                genesis_ptr,
                |hash, number| {
                    Ok(number.int() < self.ancient.items() || self.kv.receipts(hash)?.is_some())
                },
            )?;
            self.heads.rewind_snap(recovered);
        }

        let block = self.heads.head_block();
        if block.number > ancestor.number {
            let recovered = rewind_until(
                &self.header_chain,
                ancestor_ptr,
                genesis_ptr,
                |hash, _| match self.header_chain.header(hash)? {
                    Some(header) => Ok(self.has_state(&header.state_root)),
                    None => Ok(false),
                },
            )?;
            self.heads.rewind_full(recovered);
        }

        Ok(())
    }

    /// The located logs of the canonical block at `header`, in ascending transaction order.
    fn located_logs(&self, header: &Header, removed: bool) -> Result<Vec<LocatedLog>, ChainError> {
        let hash = header.hash();
        let receipts = match self.receipts_by_hash(&hash)? {
            Some(receipts) => receipts,
            None => return Ok(Vec::new()),
        };

        let mut logs = Vec::new();
        for (tx_index, receipt) in receipts.iter().enumerate() {
            for log in &receipt.logs {
                logs.push(LocatedLog {
                    block_number: header.number,
                    block_hash: hash,
                    tx_index: tx_index as u32,
                    log: log.clone(),
                    removed,
                });
            }
        }
        Ok(logs)
    }

    fn genesis_pointer(&self) -> Result<HeadPointer, ChainError> {
        let hash = self
            .header_chain
            .canonical_hash(BlockNumber::new(0))?
            .ok_or(ChainError::Uninitialized)?;
        let header = self
            .header_chain
            .header(&hash)?
            .ok_or(ChainError::Uninitialized)?;
        Ok(HeadPointer::new(hash, header.number))
    }

    /* ↓↓↓ Receipt-chain import (snap sync) ↓↓↓ */

    /// Import a segment of blocks with externally-derived receipts, routing numbers below
    /// `ancient_limit` to the ancient tier and the rest to the live tier. Advances the snap
    /// head; never executes anything.
    ///
    /// # Asymmetric rollback contract
    ///
    /// Ancient appends are all-or-nothing per call: if any item fails validation, every row this
    /// call staged in the ancient store is truncated back out and the store is left at its
    /// pre-call item count. Live-tier writes made earlier in the same call are NOT rolled back —
    /// they are individually durable the moment they are written. This asymmetry reflects the
    /// actual durability boundaries of the two tiers and is deliberate.
    pub fn insert_receipt_chain(
        &mut self,
        blocks: &[Block],
        receipts: &[Vec<Receipt>],
        ancient_limit: u64,
    ) -> Result<usize, InsertError> {
        self.check_active()
            .map_err(|err| InsertError::new(0, err))?;
        if blocks.len() != receipts.len() {
            return Err(InsertError::new(
                0,
                ChainError::MismatchedReceipts {
                    blocks: blocks.len(),
                    receipts: receipts.len(),
                },
            ));
        }
        if blocks.is_empty() {
            return Ok(0);
        }

        let pre_items = self.ancient.items();
        match self.import_receipt_chain(blocks, receipts, ancient_limit, pre_items) {
            Ok(()) => Ok(blocks.len()),
            Err(err) => {
                // Roll back the partial ancient append; the store must be left in its
                // last-known-good state.
                let _ = self.ancient.truncate_to(pre_items);
                Err(err)
            }
        }
    }

    fn import_receipt_chain(
        &mut self,
        blocks: &[Block],
        receipts: &[Vec<Receipt>],
        ancient_limit: u64,
        pre_items: u64,
    ) -> Result<(), InsertError> {
        let fail = |index: usize, source: ChainError| Err(InsertError::new(index, source));

        for (i, block) in blocks.iter().enumerate() {
            let hash = block.hash();
            let header = &block.header;

            if i > 0
                && (header.parent_hash != blocks[i - 1].hash()
                    || header.number != blocks[i - 1].number() + 1)
            {
                return fail(
                    i,
                    ChainError::BrokenChain {
                        number: header.number,
                    },
                );
            }

            // Receipt chains only fill in data under the already-synced canonical header
            // chain; an injected side chain is rejected and rolled back.
            match self.header_chain.has_header(&hash) {
                Ok(true) => {}
                Ok(false) => return fail(i, ChainError::UnknownAncestor),
                Err(err) => return fail(i, err),
            }
            match self.header_chain.canonical_hash(header.number) {
                Ok(Some(canonical)) if canonical == hash => {}
                Ok(_) => return fail(i, ChainError::SideChainReceipts { block: hash }),
                Err(err) => return fail(i, err),
            }

            let got_receipts_root = receipts_root(&receipts[i]);
            if got_receipts_root != header.receipts_root {
                return fail(
                    i,
                    ChainError::Execution {
                        source: ExecutionError::ReceiptsRootMismatch {
                            expected: header.receipts_root,
                            got: got_receipts_root,
                        },
                    },
                );
            }

            if header.number.int() < ancient_limit {
                // Already frozen by an earlier call: idempotent skip.
                if header.number.int() < pre_items {
                    continue;
                }

                // The first freeze seeds the tables with the genesis tuple so the boundary
                // stays gapless.
                if header.number.int() == 1 && pre_items == 0 {
                    if let Err(err) = self.freeze_genesis() {
                        return fail(i, err);
                    }
                }

                let td = match self.header_chain.total_difficulty(&hash) {
                    Ok(Some(td)) => td,
                    Ok(None) => return fail(i, ChainError::BlockExpectedButNotFound { block: hash }),
                    Err(err) => return fail(i, err),
                };

                let append = self.ancient.append(
                    header.number,
                    &header.try_to_vec().unwrap(),
                    &block.body.try_to_vec().unwrap(),
                    &receipts[i].try_to_vec().unwrap(),
                    &td.try_to_vec().unwrap(),
                );
                if let Err(err) = append {
                    return fail(i, err.into());
                }
            } else {
                // Live tier: individually durable, deliberately not rolled back on a later
                // failure.
                let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
                if let Err(err) = wb.set_body(&hash, &block.body) {
                    return fail(i, err.into());
                }
                if let Err(err) = wb.set_receipts(&hash, &receipts[i]) {
                    return fail(i, err.into());
                }
                self.kv.write(wb.0);
            }
        }

        // Make the staged ancient rows durable.
        if let Err(err) = self.ancient.commit() {
            return fail(0, err.into());
        }

        // The frozen region now serves reads for the migrated numbers; drop their live-tier
        // duplicates (the hash→number index stays, it resolves by-hash reads into the tables).
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        for block in blocks {
            let number = block.number().int();
            if number < ancient_limit && number >= pre_items {
                let hash = block.hash();
                wb.delete_header(&hash);
                wb.delete_body(&hash);
                wb.delete_receipts(&hash);
                wb.delete_total_difficulty(&hash);
                wb.delete_canonical_hash(block.number());
            }
        }

        let last = &blocks[blocks.len() - 1];
        self.heads
            .promote_snap(HeadPointer::new(last.hash(), last.number()));
        if let Err(err) = self.stage_heads(&mut wb) {
            return fail(blocks.len() - 1, err);
        }
        self.kv.write(wb.0);

        Ok(())
    }

    fn freeze_genesis(&mut self) -> Result<(), ChainError> {
        let genesis = self.genesis_pointer()?;
        let header = self
            .header_by_hash(&genesis.hash)?
            .ok_or(ChainError::Uninitialized)?;
        let body = self.body_by_hash(&genesis.hash)?.unwrap_or_default();
        let receipts = self.receipts_by_hash(&genesis.hash)?.unwrap_or_default();
        let td = self
            .total_difficulty(&genesis.hash)?
            .ok_or(ChainError::Uninitialized)?;
        self.ancient.append(
            BlockNumber::new(0),
            &header.try_to_vec().unwrap(),
            &body.try_to_vec().unwrap(),
            &receipts.try_to_vec().unwrap(),
            &td.try_to_vec().unwrap(),
        )?;
        Ok(())
    }

    /// Record the number marking where a partial snap sync's reliable data begins. Recovery
    /// discards snap-head positions beyond it.
    pub fn set_pivot(&mut self, number: BlockNumber) -> Result<(), ChainError> {
        self.check_active()?;
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        wb.set_pivot_number(number)?;
        self.kv.write(wb.0);
        Ok(())
    }

    /// Remove the pivot marker once a snap sync has fully completed.
    pub fn clear_pivot(&mut self) -> Result<(), ChainError> {
        self.check_active()?;
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        wb.delete_pivot_number();
        self.kv.write(wb.0);
        Ok(())
    }

    /* ↓↓↓ Explicit rewind ↓↓↓ */

    /// Rewind the chain so that nothing canonical exists above `number`: canonical-index
    /// entries and live data above it are deleted, the ancient tail is truncated if the rewind
    /// dips below the boundary, and the three heads are rewound to the latest positions
    /// satisfying their availability predicates.
    pub fn set_head(&mut self, number: BlockNumber) -> Result<(), ChainError> {
        self.check_active()?;

        let old_header_head = self.heads.head_header();
        if number >= old_header_head.number {
            return Ok(());
        }

        // Resolve the canonical blocks above the target while the index still maps them.
        let mut doomed: Vec<CryptoHash> = Vec::new();
        let mut n = old_header_head.number;
        while n > number {
            if let Some(hash) = self.header_chain.canonical_hash(n)? {
                doomed.push(hash);
            }
            n = n - 1;
        }

        // The header chain rewinds the canonical index and the header head marker.
        let target_hash = self.header_chain.set_head(number)?;
        let target = HeadPointer::new(target_hash, number);

        // Delete the displaced canonical blocks from the live tier. Non-canonical siblings
        // keep their by-hash entries.
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        for hash in &doomed {
            wb.delete_header(hash);
            wb.delete_body(hash);
            wb.delete_receipts(hash);
            wb.delete_total_difficulty(hash);
            wb.delete_hash_to_number(hash);
        }
        self.kv.write(wb.0);

        // Truncate the ancient tail if the rewind goes below the boundary.
        if number.int() + 1 < self.ancient.items() {
            self.ancient.truncate_to(number.int() + 1)?;
        }
        let genesis_ptr = self.genesis_pointer()?;

        let snap_start = if self.heads.head_snap_block().number < number {
            self.heads.head_snap_block()
        } else {
            target
        };
        let head_snap_block = rewind_until(
            &self.header_chain,
            snap_start,
            genesis_ptr,
            |hash, n| Ok(n.int() < self.ancient.items() || self.kv.receipts(hash)?.is_some()),
        )?;

        let block_start = if self.heads.head_block().number < number {
            self.heads.head_block()
        } else {
            target
        };
        let head_block = rewind_until(
            &self.header_chain,
            block_start,
            genesis_ptr,
            |hash, _| match self.header_chain.header(hash)? {
                Some(header) => Ok(self.has_state(&header.state_root)),
                None => Ok(false),
            },
        )?;

        self.heads = HeadPointers::recovered(head_block, head_snap_block, target);

        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        self.stage_heads(&mut wb)?;
        self.kv.write(wb.0);

        self.publish(Event::SetHead(SetHeadEvent {
            timestamp: Self::now(),
            number,
        }));

        Ok(())
    }
}
