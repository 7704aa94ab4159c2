//! Reorganization behavior: the canonical index across deep reorgs, retrievability of displaced
//! blocks, and the ordering contract of the log event streams.

mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chainstore::chain_store::ChainStoreSpec;
use chainstore::types::block::LocatedLog;
use chainstore::types::data_types::BlockNumber;

use common::chain_gen::*;
use common::mem_db::{MemAncient, MemDB};

#[test]
fn fork_from_block_five_reorgs_the_upper_chain() {
    // The canonical scenario: genesis + 10-block chain A, then a 6-block fork from block 5
    // with faster timestamps (higher difficulty) inserted as chain B.
    let (mut store, genesis) = new_chain_store(default_config());
    let chain_a = make_chain(&genesis, 10, 0, 0);
    store.insert_chain(&chain_a).unwrap();

    let chain_b = make_chain(&chain_a[4], 6, -9, 1);
    store.insert_chain(&chain_b).unwrap();

    // B is canonical; its blocks own numbers 6 through 11.
    assert_eq!(store.heads().head_block().number, BlockNumber::new(11));
    assert_eq!(store.heads().head_block().hash, chain_b[5].hash());
    for (i, block) in chain_b.iter().enumerate() {
        assert_eq!(
            store
                .canonical_hash(BlockNumber::new(6 + i as u64))
                .unwrap(),
            Some(block.hash())
        );
    }

    // A's blocks 6..10 are retrievable only by hash.
    for block in &chain_a[5..] {
        let hash = block.hash();
        assert!(store.has_block(&hash).unwrap());
        assert_ne!(
            store.canonical_hash(block.number()).unwrap(),
            Some(hash)
        );
    }

    // The common prefix is untouched.
    assert_eq!(
        store.canonical_hash(BlockNumber::new(5)).unwrap(),
        Some(chain_a[4].hash())
    );
}

#[test]
fn canonical_number_and_hash_lookups_agree() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 12, 0, 0);
    store.insert_chain(&base).unwrap();

    for n in 0..=12u64 {
        let number = BlockNumber::new(n);
        let hash = store.canonical_hash(number).unwrap().unwrap();
        let by_number = store.block_by_number(number).unwrap().unwrap();
        let by_hash = store.block_by_hash(&hash).unwrap().unwrap();
        assert_eq!(by_number.hash(), hash);
        assert_eq!(by_hash.hash(), hash);
        assert_eq!(by_number.number(), number);
    }
}

/// One recorded log event: whether it was a "removed" batch, and the batch itself.
type RecordedEvents = Arc<Mutex<Vec<(bool, Vec<LocatedLog>)>>>;

/// Like [`default_config`], but with the built-in CSV event logging enabled.
fn logged_config() -> chainstore::config::ChainConfig {
    chainstore::config::ChainConfig::builder()
        .chain_id(CHAIN_ID)
        .log_events(true)
        .build()
}

fn wait_until(pred: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting for events");
        thread::sleep(Duration::from_millis(10));
    }
}

fn assert_ascending(logs: &[LocatedLog]) {
    for pair in logs.windows(2) {
        assert!(
            (pair[0].block_number, pair[0].tx_index) <= (pair[1].block_number, pair[1].tx_index),
            "log events must ascend by (block number, tx index)"
        );
    }
}

#[test]
fn reorg_emits_removed_then_added_logs_in_order() {
    common::logging::setup_logger(log::LevelFilter::Info);

    let events: RecordedEvents = Arc::new(Mutex::new(Vec::new()));
    let (kv, ancient, genesis): (MemDB, MemAncient, _) = new_tiers();

    let added_sink = events.clone();
    let removed_sink = events.clone();
    let mut store = ChainStoreSpec::builder()
        .kv_store(kv)
        .ancient_store(ancient)
        .engine(FakeEngine::new())
        .executor(FakeExecutor)
        .config(logged_config())
        .on_logs_added(move |event| {
            added_sink.lock().unwrap().push((false, event.logs.clone()))
        })
        .on_logs_removed(move |event| {
            removed_sink.lock().unwrap().push((true, event.logs.clone()))
        })
        .build()
        .start()
        .unwrap();

    let chain_a = make_chain(&genesis, 10, 0, 0);
    store.insert_chain(&chain_a).unwrap();

    // Drain the per-block "added" events of the initial import before the interesting part.
    wait_until(|| events.lock().unwrap().len() == 10);
    events.lock().unwrap().clear();

    let chain_b = make_chain(&chain_a[4], 6, -9, 1);
    store.insert_chain(&chain_b).unwrap();

    // B overtakes A at its third block (number 8): one removed batch and one added batch for
    // the reorg itself, then one added batch per simple extension (numbers 9, 10, 11).
    wait_until(|| events.lock().unwrap().len() == 5);
    let recorded = events.lock().unwrap().clone();

    let (first_removed, removed_logs) = &recorded[0];
    let (second_removed, added_logs) = &recorded[1];
    assert!(*first_removed, "removed logs must be emitted before added logs");
    assert!(!*second_removed);

    // Removed: one log per displaced block of A (numbers 6..=10), ascending.
    assert_eq!(removed_logs.len(), 5);
    assert!(removed_logs.iter().all(|log| log.removed));
    assert_eq!(removed_logs[0].block_number, BlockNumber::new(6));
    assert_eq!(removed_logs[4].block_number, BlockNumber::new(10));
    assert_ascending(removed_logs);

    // Added at the reorg: B's blocks 6..=8, ascending.
    assert_eq!(added_logs.len(), 3);
    assert!(added_logs.iter().all(|log| !log.removed));
    assert_eq!(added_logs[0].block_number, BlockNumber::new(6));
    assert_eq!(added_logs[2].block_number, BlockNumber::new(8));
    assert_ascending(added_logs);

    // The extension batches continue ascending from where the reorg left off.
    let extension_logs: Vec<LocatedLog> = recorded[2..]
        .iter()
        .flat_map(|(removed, logs)| {
            assert!(!*removed);
            logs.clone()
        })
        .collect();
    assert_eq!(extension_logs.len(), 3);
    assert_eq!(extension_logs[0].block_number, BlockNumber::new(9));
    assert_eq!(extension_logs[2].block_number, BlockNumber::new(11));
    assert_ascending(&extension_logs);

    store.stop().unwrap();
}

#[test]
fn side_chain_promotion_emits_rebirth_logs() {
    // A lighter side chain produces no events while it waits; promoting it later emits the
    // removed/added pair exactly like a difficulty-driven reorg.
    let events: RecordedEvents = Arc::new(Mutex::new(Vec::new()));
    let (kv, ancient, genesis): (MemDB, MemAncient, _) = new_tiers();

    let added_sink = events.clone();
    let removed_sink = events.clone();
    let mut store = ChainStoreSpec::builder()
        .kv_store(kv)
        .ancient_store(ancient)
        .engine(FakeEngine::new())
        .executor(FakeExecutor)
        .config(default_config())
        .on_logs_added(move |event| {
            added_sink.lock().unwrap().push((false, event.logs.clone()))
        })
        .on_logs_removed(move |event| {
            removed_sink.lock().unwrap().push((true, event.logs.clone()))
        })
        .build()
        .start()
        .unwrap();

    let chain_a = make_chain(&genesis, 5, 0, 0);
    store.insert_chain(&chain_a).unwrap();
    wait_until(|| events.lock().unwrap().len() == 5);
    events.lock().unwrap().clear();

    // Lighter fork from block 2: stored silently.
    let side = make_chain(&chain_a[1], 2, 9, 1);
    for block in &side {
        store.insert_block_without_set_head(block).unwrap();
    }
    assert!(events.lock().unwrap().is_empty());

    store.set_canonical(&side[1].hash()).unwrap();
    wait_until(|| events.lock().unwrap().len() == 2);
    let recorded = events.lock().unwrap().clone();

    let (first_removed, removed_logs) = &recorded[0];
    assert!(*first_removed);
    // A's blocks 3..=5 fall out.
    assert_eq!(removed_logs.len(), 3);
    assert_ascending(removed_logs);

    let (_, added_logs) = &recorded[1];
    // Side blocks 3..=4 come in.
    assert_eq!(added_logs.len(), 2);
    assert_ascending(added_logs);

    store.stop().unwrap();
}
