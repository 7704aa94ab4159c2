/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The three independently-advancing head pointers and the operations that move them.
//!
//! # Invariant
//!
//! `head_block.number <= head_snap_block.number <= head_header.number`, each pointing at a block
//! that is canonical at the pointer's own path. The pointers move only through the named
//! operations below — never through ad hoc field writes — so the invariant is enforced in one
//! place.
//!
//! The three pointers deliberately decouple during partial (snap) sync: headers arrive first,
//! then bodies and receipts, then state. Each tier has its own availability predicate, and each
//! promotion operation advances exactly the pointers whose predicate the new block satisfies.

use crate::types::data_types::{BlockNumber, CryptoHash};

/// A resolved head: the hash and number of the block a pointer rests on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadPointer {
    pub hash: CryptoHash,
    pub number: BlockNumber,
}

impl HeadPointer {
    pub fn new(hash: CryptoHash, number: BlockNumber) -> Self {
        HeadPointer { hash, number }
    }
}

/// The three chain heads: full-state head, body+receipt head, and header head.
#[derive(Clone, Copy, Debug)]
pub struct HeadPointers {
    head_block: HeadPointer,
    head_snap_block: HeadPointer,
    head_header: HeadPointer,
}

impl HeadPointers {
    /// Create head pointers with all three heads resting on the same block (normally genesis).
    pub fn at(pointer: HeadPointer) -> Self {
        HeadPointers {
            head_block: pointer,
            head_snap_block: pointer,
            head_header: pointer,
        }
    }

    /// Create head pointers from three independently recovered positions, clamping the lower
    /// tiers so the invariant holds.
    pub fn recovered(
        head_block: HeadPointer,
        head_snap_block: HeadPointer,
        head_header: HeadPointer,
    ) -> Self {
        let head_snap_block = if head_snap_block.number > head_header.number {
            head_header
        } else {
            head_snap_block
        };
        let head_block = if head_block.number > head_snap_block.number {
            head_snap_block
        } else {
            head_block
        };
        HeadPointers {
            head_block,
            head_snap_block,
            head_header,
        }
    }

    pub fn head_block(&self) -> HeadPointer {
        self.head_block
    }

    pub fn head_snap_block(&self) -> HeadPointer {
        self.head_snap_block
    }

    pub fn head_header(&self) -> HeadPointer {
        self.head_header
    }

    /// Advance the header head. Does not move the snap or full heads.
    pub fn promote_header(&mut self, pointer: HeadPointer) {
        self.head_header = pointer;
        debug_assert!(self.head_snap_block.number <= self.head_header.number);
    }

    /// Advance the snap head: body and receipts are available at `pointer`, state may not be.
    /// Raises the header head along if it is behind.
    pub fn promote_snap(&mut self, pointer: HeadPointer) {
        self.head_snap_block = pointer;
        if self.head_header.number < pointer.number {
            self.head_header = pointer;
        }
        debug_assert!(self.head_block.number <= self.head_snap_block.number);
    }

    /// Advance the full head: state, body and receipts are all available at `pointer`. Raises
    /// the snap and header heads along if they are behind.
    pub fn promote_full(&mut self, pointer: HeadPointer) {
        self.head_block = pointer;
        if self.head_snap_block.number < pointer.number {
            self.head_snap_block = pointer;
        }
        if self.head_header.number < pointer.number {
            self.head_header = pointer;
        }
    }

    /// Move all three heads to `pointer`. Used when a fully-available block becomes canonical
    /// (including reorgs onto shorter-but-heavier chains, where the heads move backwards in
    /// number space).
    pub fn set_all(&mut self, pointer: HeadPointer) {
        self.head_block = pointer;
        self.head_snap_block = pointer;
        self.head_header = pointer;
    }

    /// Rewind the snap head (and the full head below it, if needed) without touching the header
    /// head. Used when a header-level reorg invalidates the block the snap head rested on.
    pub fn rewind_snap(&mut self, pointer: HeadPointer) {
        self.head_snap_block = pointer;
        if self.head_block.number > pointer.number {
            self.head_block = pointer;
        }
    }

    /// Rewind the full head without touching the other two.
    pub fn rewind_full(&mut self, pointer: HeadPointer) {
        self.head_block = pointer;
        debug_assert!(self.head_block.number <= self.head_snap_block.number);
    }
}
