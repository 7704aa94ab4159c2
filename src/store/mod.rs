/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The two-tier persistence layer.
//!
//! # Two tiers
//!
//! Chain data is physically split into two stores that together give the illusion of a single
//! contiguous block-indexed store:
//!
//! 1. A mutable **live store**: a key-value store holding recent, possibly-reorganized chain data
//!    (headers, bodies, receipts, the canonical number→hash index, flushed trie nodes) plus
//!    metadata markers (head pointers, the snap-sync pivot).
//! 2. An immutable **ancient store**: an append-only log of finalized
//!    (header, body, receipts, total difficulty) tuples indexed by block number.
//!
//! The boundary between the tiers is the ancient store's item count: data for numbers below it
//! lives exclusively in the ancient store, data at or above it in the live store. The boundary
//! only moves forward, except during an explicit [`set_head`](crate::chain_store) rewind that
//! truncates the ancient tail.
//!
//! # Pluggable persistence
//!
//! Library users get to choose how both tiers are physically stored. chainstore merely requires
//! a key-value store with atomic batched writes for the live tier, and a strictly sequential
//! multi-table log with a durable commit cursor for the ancient tier. These abstract requirements
//! are made concrete by the traits in the [`pluggables`] module.
//!
//! The [`variables`] module lists every variable kept in the live store and the key paths they
//! sit at. The [`write_batch`] module wraps a raw write batch with typed setters that put each
//! variable in its right place.

pub mod pluggables;

pub mod variables;

pub mod write_batch;
