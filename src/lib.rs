/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! chainstore is the canonical-chain storage and consistency core of a blockchain node: it owns
//! the durable record of headers, blocks, receipts and state, decides which of several competing
//! chains is canonical, and keeps the header, snap, and full head pointers consistent under
//! insertion, reorganization, pruning, and crash recovery.
//!
//! The crate is organized around five components:
//! - [`store`]: the two-tier persistence layer — a pluggable mutable key-value store for recent
//!   data and a pluggable append-only ancient store for finalized history.
//! - [`header_chain`]: header insertion, total-difficulty accounting, and the canonical
//!   number→hash index.
//! - [`trie_cache`]: the in-memory, reference-counted trie-node cache that bounds state-growth
//!   memory while serving a sliding window of recent state roots.
//! - [`chain_store`]: the composition root — insertion, fork choice, reorgs, head-pointer
//!   management, and recovery.
//! - [`engine`]: the traits through which the consensus engine and the state executor plug in.
//!
//! Cross-cutting observers subscribe to ordered [`events`]; see [`chain_store`] for the
//! concurrency model.

pub mod chain_store;

pub mod config;

pub mod engine;

pub mod error;

pub(crate) mod event_bus;

pub mod events;

pub mod header_chain;

pub mod logging;

pub mod store;

pub mod trie_cache;

pub mod types;
