/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The composition root: owns the two-tier store, the header chain, the trie node cache, and the
//! three head pointers, and implements insertion, reorganization, pruning, and recovery.
//!
//! # Building and starting a chain store
//!
//! ```ignore
//! ChainStore::initialize(&mut kv, &genesis_block, &genesis_state)?;
//!
//! let mut chain = ChainStoreSpec::builder()
//!     .kv_store(kv)
//!     .ancient_store(ancient)
//!     .engine(engine)
//!     .executor(executor)
//!     .config(config)
//!     .on_logs_added(handler)
//!     .build()
//!     .start()?;
//! ```
//!
//! # Concurrency model
//!
//! Structural mutations (insertion, reorg, [`set_head`](ChainStore::set_head),
//! [`set_canonical`](ChainStore::set_canonical)) all require `&mut ChainStore`: exclusive access
//! to the handle *is* the chain-mutation lock, enforced statically instead of at runtime. A
//! mutation's commit phase is written as a single atomic write batch, so no reader ever
//! observes a half-updated canonical index.
//!
//! Concurrent readers do not go through the handle at all: they hold a [`ChainStoreCamera`]
//! (cheap to clone, safe to send to other threads) and take [`ChainStoreSnapshot`]s of committed
//! data, lock-free with respect to the mutation path.
//!
//! Validation and execution work that precedes a commit may run without the lock; results are
//! re-checked against the canonical index under the lock before being applied.
//!
//! # Lifecycle
//!
//! A chain store is `Active` from [`start`](ChainStoreSpec::start) until
//! [`stop`](ChainStore::stop). `stop` is terminal: it flushes the head state generation to the
//! live store, shuts down the event bus, and rejects every later mutation with
//! [`ChainError::Stopped`].

pub mod fork_choice;

pub mod heads;

mod insert;

use std::collections::VecDeque;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::SystemTime;

use typed_builder::TypedBuilder;

use crate::config::ChainConfig;
use crate::engine::{ConsensusEngine, StateExecutor, TrieNode};
use crate::error::ChainError;
use crate::event_bus::{start_event_bus, EventHandlers, HandlerPtr};
use crate::events::*;
use crate::header_chain::HeaderChain;
use crate::logging::Logger;
use crate::store::pluggables::{AncientStore, KVGet, KVStore};
use crate::store::write_batch::ChainWriteBatch;
use crate::trie_cache::TrieNodeCache;
use crate::types::{
    block::{Block, Body, Header, Receipt},
    data_types::{BlockNumber, CryptoHash, TotalDifficulty},
};

use heads::{HeadPointer, HeadPointers};

/// The canonical-chain store. See the [module docs](self) for an overview.
pub struct ChainStore<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> {
    pub(crate) kv: K,
    pub(crate) ancient: F,
    pub(crate) header_chain: HeaderChain<K, F>,
    pub(crate) trie_cache: TrieNodeCache,
    pub(crate) recent_roots: VecDeque<CryptoHash>,
    pub(crate) heads: HeadPointers,
    pub(crate) config: ChainConfig,
    pub(crate) engine: E,
    pub(crate) executor: X,
    pub(crate) event_publisher: Option<Sender<Event>>,
    event_bus: Option<(Sender<()>, JoinHandle<()>)>,
    pub(crate) stopped: bool,
}

/// Stores all necessary parameters and trait implementations required to run a [`ChainStore`].
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [ChainStoreSpec]. On the builder call the following methods to construct a valid [ChainStoreSpec].

    Required:
    - `.kv_store(...)`
    - `.ancient_store(...)`
    - `.engine(...)`
    - `.executor(...)`
    - `.config(...)`

    Optional:
    - `.on_insert_block(...)`
    - `.on_new_canonical_head(...)`
    - `.on_reorg(...)`
    - `.on_set_head(...)`
    - `.on_logs_added(...)`
    - `.on_logs_removed(...)`
"))]
pub struct ChainStoreSpec<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> {
    // Required parameters
    #[builder(setter(doc = "Set the live tier of the persistence layer. The argument must implement the [KVStore](crate::store::pluggables::KVStore) trait. Required."))]
    kv_store: K,
    #[builder(setter(doc = "Set the ancient tier of the persistence layer. The argument must implement the [AncientStore](crate::store::pluggables::AncientStore) trait. Required."))]
    ancient_store: F,
    #[builder(setter(doc = "Set the consensus engine used to verify headers. The argument must implement the [ConsensusEngine](crate::engine::ConsensusEngine) trait. Required."))]
    engine: E,
    #[builder(setter(doc = "Set the state-transition function used to execute blocks. The argument must implement the [StateExecutor](crate::engine::StateExecutor) trait. Required."))]
    executor: X,
    #[builder(setter(doc = "Set the [configuration](ChainConfig), which contains the necessary parameters to run a chain store. Required."))]
    config: ChainConfig,
    // Optional parameters
    #[builder(default, setter(transform = |handler: impl Fn(&InsertBlockEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<InsertBlockEvent>),
    doc = "Register a handler closure to be invoked after a block is inserted into the store. Optional."))]
    on_insert_block: Option<HandlerPtr<InsertBlockEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&NewCanonicalHeadEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<NewCanonicalHeadEvent>),
    doc = "Register a handler closure to be invoked after the canonical head advances. Optional."))]
    on_new_canonical_head: Option<HandlerPtr<NewCanonicalHeadEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReorgEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReorgEvent>),
    doc = "Register a handler closure to be invoked after a reorganization replaces part of the canonical chain. Optional."))]
    on_reorg: Option<HandlerPtr<ReorgEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SetHeadEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SetHeadEvent>),
    doc = "Register a handler closure to be invoked after an explicit head rewind. Optional."))]
    on_set_head: Option<HandlerPtr<SetHeadEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&LogsAddedEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<LogsAddedEvent>),
    doc = "Register a handler closure to be invoked with the ordered logs of blocks that became canonical. Optional."))]
    on_logs_added: Option<HandlerPtr<LogsAddedEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&LogsRemovedEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<LogsRemovedEvent>),
    doc = "Register a handler closure to be invoked with the ordered logs of blocks that left the canonical chain. Optional."))]
    on_logs_removed: Option<HandlerPtr<LogsRemovedEvent>>,
}

impl<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> ChainStoreSpec<K, F, E, X> {
    /// Open the chain store described by this spec, recovering the head pointers from the
    /// persisted markers.
    ///
    /// The backing stores must have been [initialized](ChainStore::initialize) at some point in
    /// the past; otherwise this fails with [`ChainError::Uninitialized`].
    pub fn start(self) -> Result<ChainStore<K, F, E, X>, ChainError> {
        // Recover before spawning anything, so a failed open leaves no thread behind.
        let kv = self.kv_store;
        let ancient = self.ancient_store;
        let header_chain = HeaderChain::new(kv.clone(), ancient.clone());
        let heads = recover_heads(&kv, &ancient, &header_chain)?;

        let mut event_handlers = EventHandlers {
            insert_block_handlers: Vec::new(),
            new_canonical_head_handlers: Vec::new(),
            reorg_handlers: Vec::new(),
            set_head_handlers: Vec::new(),
            logs_added_handlers: Vec::new(),
            logs_removed_handlers: Vec::new(),
        };

        if self.config.log_events {
            event_handlers
                .insert_block_handlers
                .push(InsertBlockEvent::get_logger());
            event_handlers
                .new_canonical_head_handlers
                .push(NewCanonicalHeadEvent::get_logger());
            event_handlers.reorg_handlers.push(ReorgEvent::get_logger());
            event_handlers
                .set_head_handlers
                .push(SetHeadEvent::get_logger());
            event_handlers
                .logs_added_handlers
                .push(LogsAddedEvent::get_logger());
            event_handlers
                .logs_removed_handlers
                .push(LogsRemovedEvent::get_logger());
        }

        if let Some(handler) = self.on_insert_block {
            event_handlers.insert_block_handlers.push(handler);
        }
        if let Some(handler) = self.on_new_canonical_head {
            event_handlers.new_canonical_head_handlers.push(handler);
        }
        if let Some(handler) = self.on_reorg {
            event_handlers.reorg_handlers.push(handler);
        }
        if let Some(handler) = self.on_set_head {
            event_handlers.set_head_handlers.push(handler);
        }
        if let Some(handler) = self.on_logs_added {
            event_handlers.logs_added_handlers.push(handler);
        }
        if let Some(handler) = self.on_logs_removed {
            event_handlers.logs_removed_handlers.push(handler);
        }

        let any_handlers = !(event_handlers.insert_block_handlers.is_empty()
            && event_handlers.new_canonical_head_handlers.is_empty()
            && event_handlers.reorg_handlers.is_empty()
            && event_handlers.set_head_handlers.is_empty()
            && event_handlers.logs_added_handlers.is_empty()
            && event_handlers.logs_removed_handlers.is_empty());

        let (event_publisher, event_bus) = if any_handlers {
            let (event_publisher, event_subscriber) = mpsc::channel();
            let (shutdown_sender, shutdown_receiver) = mpsc::channel();
            let handle = start_event_bus(event_handlers, event_subscriber, shutdown_receiver);
            (Some(event_publisher), Some((shutdown_sender, handle)))
        } else {
            (None, None)
        };

        let mut store = ChainStore {
            kv,
            ancient,
            header_chain,
            trie_cache: TrieNodeCache::new(),
            recent_roots: VecDeque::new(),
            heads,
            config: self.config,
            engine: self.engine,
            executor: self.executor,
            event_publisher,
            event_bus,
            stopped: false,
        };

        // Persist the recovered positions so a second recovery starts from them.
        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        store.stage_heads(&mut wb)?;
        store.kv.write(wb.0);

        Ok(store)
    }
}

impl<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> ChainStore<K, F, E, X> {
    /// Initialize an empty live store with `genesis`: its header, (normally empty) body and
    /// receipt set, its difficulty as the chain's first total-difficulty entry, the canonical
    /// mapping for number 0, and all three head markers.
    ///
    /// `genesis_state` is flushed to the live store so that the genesis state root is
    /// disk-resolvable from the start; it must contain the node keyed by the root itself.
    ///
    /// This function must be called exactly once on an empty `kv_store`, before the first
    /// [`start`](ChainStoreSpec::start).
    pub fn initialize(
        kv_store: &mut K,
        genesis: &Block,
        genesis_state: &[TrieNode],
    ) -> Result<(), ChainError> {
        let hash = genesis.hash();
        let no_receipts: Vec<Receipt> = Vec::new();

        let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
        wb.set_header(&genesis.header)?;
        wb.set_body(&hash, &genesis.body)?;
        wb.set_receipts(&hash, &no_receipts)?;
        wb.set_total_difficulty(&hash, TotalDifficulty::new(genesis.header.difficulty.int()))?;
        wb.set_hash_to_number(&hash, genesis.number())?;
        wb.set_canonical_hash(genesis.number(), &hash)?;
        for node in genesis_state {
            wb.set_state_node(&node.hash, &node.blob);
        }
        wb.set_head_header(&hash)?;
        wb.set_head_snap_block(&hash)?;
        wb.set_head_block(&hash)?;
        kv_store.write(wb.0);

        Ok(())
    }

    /// Create a [`ChainStoreCamera`], through which read-only snapshots of committed chain data
    /// can be taken from any thread.
    pub fn camera(&self) -> ChainStoreCamera<K> {
        ChainStoreCamera(self.kv.clone())
    }

    /// Flush the head state generation to the live store, shut down the event bus, and mark the
    /// store stopped. Terminal: every later mutation fails with [`ChainError::Stopped`].
    pub fn stop(&mut self) -> Result<(), ChainError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        let head_root = self
            .header_by_hash(&self.heads.head_block().hash)?
            .map(|header| header.state_root);
        if let Some(root) = head_root {
            if let Some(nodes) = self.trie_cache.nodes_of(&root) {
                let mut wb = ChainWriteBatch::<K::WriteBatch>::new();
                for node in nodes {
                    wb.set_state_node(&node.hash, &node.blob);
                }
                self.kv.write(wb.0);
            }
        }

        self.shutdown_event_bus();
        Ok(())
    }

    fn shutdown_event_bus(&mut self) {
        if let Some((shutdown_sender, handle)) = self.event_bus.take() {
            // Dropping the publisher first would make the bus thread observe a disconnect and
            // panic; signal shutdown while the channel is still alive.
            let _ = shutdown_sender.send(());
            let _ = handle.join();
            self.event_publisher = None;
        }
    }

    /* ↓↓↓ Head accessors ↓↓↓ */

    /// The current positions of the three head pointers.
    pub fn heads(&self) -> HeadPointers {
        self.heads
    }

    /// The header of the canonical block with full state available.
    pub fn current_block(&self) -> Result<Header, ChainError> {
        self.expect_header(self.heads.head_block().hash)
    }

    /// The header of the canonical block whose body and receipts are available; its state may be
    /// absent.
    pub fn current_snap_block(&self) -> Result<Header, ChainError> {
        self.expect_header(self.heads.head_snap_block().hash)
    }

    /// The highest canonical header.
    pub fn current_header(&self) -> Result<Header, ChainError> {
        self.expect_header(self.heads.head_header().hash)
    }

    fn expect_header(&self, hash: CryptoHash) -> Result<Header, ChainError> {
        self.header_by_hash(&hash)?
            .ok_or(ChainError::BlockExpectedButNotFound { block: hash })
    }

    /* ↓↓↓ Two-tier read accessors ↓↓↓ */

    /// Get the header identified by `hash`, from whichever tier holds it.
    pub fn header_by_hash(&self, hash: &CryptoHash) -> Result<Option<Header>, ChainError> {
        self.header_chain.header(hash)
    }

    /// Get the canonical header at `number`, from whichever tier holds it.
    pub fn header_by_number(&self, number: BlockNumber) -> Result<Option<Header>, ChainError> {
        match self.header_chain.canonical_hash(number)? {
            Some(hash) => self.header_by_hash(&hash),
            None => Ok(None),
        }
    }

    /// Get the body of the block identified by `hash`, from whichever tier holds it.
    pub fn body_by_hash(&self, hash: &CryptoHash) -> Result<Option<Body>, ChainError> {
        if let Some(body) = self.kv.body(hash)? {
            return Ok(Some(body));
        }
        if let Some(number) = self.header_chain.number(hash)? {
            if let Some(header) = self.ancient.ancient_header(number)? {
                if header.hash() == *hash {
                    return Ok(self.ancient.ancient_body(number)?);
                }
            }
        }
        Ok(None)
    }

    /// Get the block identified by `hash`, from whichever tier holds it. `None` if either the
    /// header or the body is missing (e.g. header-only imports).
    pub fn block_by_hash(&self, hash: &CryptoHash) -> Result<Option<Block>, ChainError> {
        let header = match self.header_by_hash(hash)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let body = match self.body_by_hash(hash)? {
            Some(body) => body,
            None => return Ok(None),
        };
        Ok(Some(Block { header, body }))
    }

    /// Get the canonical block at `number`, from whichever tier holds it.
    pub fn block_by_number(&self, number: BlockNumber) -> Result<Option<Block>, ChainError> {
        match self.header_chain.canonical_hash(number)? {
            Some(hash) => self.block_by_hash(&hash),
            None => Ok(None),
        }
    }

    /// Get the receipts of the block identified by `hash`, from whichever tier holds them.
    pub fn receipts_by_hash(&self, hash: &CryptoHash) -> Result<Option<Vec<Receipt>>, ChainError> {
        if let Some(receipts) = self.kv.receipts(hash)? {
            return Ok(Some(receipts));
        }
        if let Some(number) = self.header_chain.number(hash)? {
            if let Some(header) = self.ancient.ancient_header(number)? {
                if header.hash() == *hash {
                    return Ok(self.ancient.ancient_receipts(number)?);
                }
            }
        }
        Ok(None)
    }

    /// Get the cumulative fork-choice weight from genesis to the header identified by `hash`.
    pub fn total_difficulty(&self, hash: &CryptoHash) -> Result<Option<TotalDifficulty>, ChainError> {
        self.header_chain.total_difficulty(hash)
    }

    /// Get the hash that `number` canonically maps to, if any.
    pub fn canonical_hash(&self, number: BlockNumber) -> Result<Option<CryptoHash>, ChainError> {
        self.header_chain.canonical_hash(number)
    }

    /// Is the full block (header and body) identified by `hash` present in either tier?
    pub fn has_block(&self, hash: &CryptoHash) -> Result<bool, ChainError> {
        Ok(self.block_by_hash(hash)?.is_some())
    }

    /// Is the state root `root` currently resolvable — pinned in the trie node cache, or flushed
    /// to the live store?
    pub fn has_state(&self, root: &CryptoHash) -> bool {
        self.trie_cache.contains(root) || self.kv.state_node(root).is_some()
    }

    /// The number of items in the ancient store, which is also the boundary below which chain
    /// data lives exclusively in the ancient tier.
    pub fn ancient_items(&self) -> u64 {
        self.ancient.items()
    }

    /* ↓↓↓ Internal helpers shared by mutations ↓↓↓ */

    pub(crate) fn check_active(&self) -> Result<(), ChainError> {
        if self.stopped {
            Err(ChainError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Stage all three head markers into `wb`, so head movements commit atomically with the
    /// structural change that caused them.
    pub(crate) fn stage_heads(
        &self,
        wb: &mut ChainWriteBatch<K::WriteBatch>,
    ) -> Result<(), ChainError> {
        wb.set_head_header(&self.heads.head_header().hash)?;
        wb.set_head_snap_block(&self.heads.head_snap_block().hash)?;
        wb.set_head_block(&self.heads.head_block().hash)?;
        Ok(())
    }

    pub(crate) fn publish(&self, event: Event) {
        event.publish(&self.event_publisher);
    }

    pub(crate) fn now() -> SystemTime {
        SystemTime::now()
    }

    /// Pin an executed root and advance the retention window, dereferencing the root that falls
    /// out its trailing edge.
    pub(crate) fn pin_root(&mut self, root: CryptoHash, nodes: Vec<TrieNode>) {
        self.trie_cache.commit(root, nodes);
        if self.recent_roots.back() != Some(&root) {
            self.recent_roots.push_back(root);
        }
        while self.recent_roots.len() > self.config.retained_roots() {
            if let Some(evicted) = self.recent_roots.pop_front() {
                self.trie_cache.dereference(&evicted);
            }
        }
    }
}

impl<K: KVStore, F: AncientStore, E: ConsensusEngine, X: StateExecutor> Drop
    for ChainStore<K, F, E, X>
{
    fn drop(&mut self) {
        self.shutdown_event_bus();
    }
}

/// A read-only view into the live tier that can be cloned and sent to other threads.
///
/// Readers are lock-free against committed data: take a [`snapshot`](Self::snapshot) and read
/// through it while mutations proceed on the owning [`ChainStore`].
pub struct ChainStoreCamera<K: KVStore>(K);

impl<K: KVStore> ChainStoreCamera<K> {
    /// Take a snapshot of committed chain data.
    pub fn snapshot(&self) -> ChainStoreSnapshot<K::Snapshot<'_>> {
        ChainStoreSnapshot(self.0.snapshot())
    }
}

impl<K: KVStore> Clone for ChainStoreCamera<K> {
    fn clone(&self) -> Self {
        ChainStoreCamera(self.0.clone())
    }
}

/// A snapshot of committed live-tier chain data. All of the typed getters of
/// [`KVGet`](crate::store::pluggables::KVGet) are available on it.
pub struct ChainStoreSnapshot<S: KVGet>(S);

impl<S: KVGet> KVGet for ChainStoreSnapshot<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key)
    }
}

/// Re-derive the three head pointers from the persisted markers, rewinding each to the latest
/// position satisfying its own availability predicate.
///
/// Recovery never fabricates data — it only rewinds:
/// - `head_header` requires header presence only; a dangling marker falls back to the snap and
///   full markers and finally to genesis.
/// - `head_snap_block` requires body and receipts (ancient or live), and is discarded beyond the
///   pivot marker when a partial snap sync left one.
/// - `head_block` requires disk-resolvable state; in-memory generations do not survive a
///   restart, so after an unclean shutdown this walks back to the last flushed root.
fn recover_heads<K: KVStore, F: AncientStore>(
    kv: &K,
    ancient: &F,
    header_chain: &HeaderChain<K, F>,
) -> Result<HeadPointers, ChainError> {
    let genesis_hash =
        header_chain
            .canonical_hash(BlockNumber::new(0))?
            .ok_or(ChainError::Uninitialized)?;
    let genesis = header_chain
        .header(&genesis_hash)?
        .ok_or(ChainError::Uninitialized)?;
    let genesis_ptr = HeadPointer::new(genesis_hash, genesis.number);

    // Resolve a marker to a known header, if it points at one.
    let resolve = |marker: Option<CryptoHash>| -> Result<Option<HeadPointer>, ChainError> {
        match marker {
            Some(hash) => Ok(header_chain
                .header(&hash)?
                .map(|header| HeadPointer::new(hash, header.number))),
            None => Ok(None),
        }
    };

    let header_marker = resolve(kv.head_header()?)?;
    let snap_marker = resolve(kv.head_snap_block()?)?;
    let block_marker = resolve(kv.head_block()?)?;

    let head_header = header_marker
        .or(snap_marker)
        .or(block_marker)
        .unwrap_or(genesis_ptr);

    // Snap head: rewind to the nearest ancestor with receipts available, discarding positions
    // beyond the pivot when an interrupted snap sync left one.
    let mut snap = snap_marker.unwrap_or(genesis_ptr);
    if let Some(pivot) = kv.pivot_number()? {
        if snap.number > pivot {
            if let Some(hash) = header_chain.canonical_hash(pivot)? {
                if let Some(header) = header_chain.header(&hash)? {
                    snap = HeadPointer::new(hash, header.number);
                }
            }
        }
    }
    let head_snap_block = rewind_until(header_chain, snap, genesis_ptr, |hash, number| {
        Ok(number.int() < ancient.items() || kv.receipts(hash)?.is_some())
    })?;

    // Full head: rewind to the nearest ancestor whose state root is disk-resolvable.
    let block = block_marker.unwrap_or(genesis_ptr);
    let head_block = rewind_until(header_chain, block, genesis_ptr, |hash, _| {
        match header_chain.header(hash)? {
            Some(header) => Ok(kv.state_node(&header.state_root).is_some()),
            None => Ok(false),
        }
    })?;

    Ok(HeadPointers::recovered(
        head_block,
        head_snap_block,
        head_header,
    ))
}

/// Walk `from` backwards along parent links until `available` holds, bottoming out at genesis.
pub(crate) fn rewind_until<K: KVStore, F: AncientStore>(
    header_chain: &HeaderChain<K, F>,
    from: HeadPointer,
    genesis: HeadPointer,
    available: impl Fn(&CryptoHash, BlockNumber) -> Result<bool, ChainError>,
) -> Result<HeadPointer, ChainError> {
    let mut current = from;
    loop {
        if available(&current.hash, current.number)? {
            return Ok(current);
        }
        if current.number.int() == 0 {
            return Ok(genesis);
        }
        let header = header_chain
            .header(&current.hash)?
            .ok_or(ChainError::BlockExpectedButNotFound {
                block: current.hash,
            })?;
        let parent =
            header_chain
                .header(&header.parent_hash)?
                .ok_or(ChainError::BlockExpectedButNotFound {
                    block: header.parent_hash,
                })?;
        current = HeadPointer::new(header.parent_hash, parent.number);
    }
}
