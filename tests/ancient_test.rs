//! Two-tier persistence behavior: freezing finalized history into the ancient store,
//! transparent reads across the boundary, the asymmetric rollback contract of receipt-chain
//! insertion, and rewinds that truncate the ancient tail.

mod common;

use chainstore::error::ChainError;
use chainstore::types::data_types::BlockNumber;

use common::chain_gen::*;

#[test]
fn receipt_chain_freezes_below_the_ancient_limit() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 8, 0, 0);
    let receipts = receipts_of(&base);

    store.insert_header_chain(&headers_of(&base)).unwrap();
    assert_eq!(store.insert_receipt_chain(&base, &receipts, 5).unwrap(), 8);

    // Numbers 0..=4 (genesis included) are frozen; the boundary is their count.
    assert_eq!(store.ancient_items(), 5);

    // Reads are transparent across the boundary.
    for block in &base {
        let hash = block.hash();
        assert_eq!(
            store.header_by_hash(&hash).unwrap().unwrap().hash(),
            hash
        );
        assert_eq!(
            store.body_by_hash(&hash).unwrap().unwrap(),
            block.body
        );
        assert_eq!(
            store.receipts_by_hash(&hash).unwrap().unwrap(),
            fake_receipts(&block.body)
        );
        assert!(store.total_difficulty(&hash).unwrap().is_some());
        assert_eq!(
            store.canonical_hash(block.number()).unwrap(),
            Some(hash)
        );
    }

    // Receipt import advances the snap head only; state was never executed.
    assert_eq!(store.heads().head_header().number, BlockNumber::new(8));
    assert_eq!(store.heads().head_snap_block().number, BlockNumber::new(8));
    assert_eq!(store.heads().head_block().number, BlockNumber::new(0));
}

#[test]
fn failed_receipt_chain_rolls_back_ancient_but_keeps_live_writes() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 8, 0, 0);
    store.insert_header_chain(&headers_of(&base)).unwrap();

    // Splice a non-canonical sibling into position 5 (number 6). Its header is known and it
    // hash-links to its predecessor, so only the canonical check can catch it.
    let side = make_chain(&base[4], 1, -9, 7);
    store.insert_header_chain(&headers_of(&side)).unwrap();
    let mut blocks: Vec<_> = base[..7].to_vec();
    blocks[5] = side[0].clone();
    let receipts = receipts_of(&blocks);

    let pre_items = store.ancient_items();
    let err = store.insert_receipt_chain(&blocks, &receipts, 4).unwrap_err();
    assert_eq!(err.index, 5);
    assert!(matches!(err.source, ChainError::SideChainReceipts { .. }));

    // Ancient appends are all-or-nothing per call: the staged rows (genesis plus numbers
    // 1..=3) are gone and the item count is exactly the pre-call count.
    assert_eq!(store.ancient_items(), pre_items);
    assert_eq!(
        store.receipts_by_hash(&base[1].hash()).unwrap(),
        None
    );

    // Live-tier writes made before the failure are retained: number 5 sits at or above the
    // ancient limit and its receipts were individually durable.
    assert_eq!(
        store.receipts_by_hash(&base[4].hash()).unwrap().unwrap(),
        fake_receipts(&base[4].body)
    );

    // Resubmitting the corrected segment from the reported index onward succeeds.
    let fixed = base[..7].to_vec();
    let fixed_receipts = receipts_of(&fixed);
    assert_eq!(
        store
            .insert_receipt_chain(&fixed, &fixed_receipts, 4)
            .unwrap(),
        7
    );
    assert_eq!(store.ancient_items(), 4);
}

#[test]
fn refreezing_already_frozen_numbers_is_idempotent() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 8, 0, 0);
    let receipts = receipts_of(&base);

    store.insert_header_chain(&headers_of(&base)).unwrap();
    store.insert_receipt_chain(&base, &receipts, 5).unwrap();
    assert_eq!(store.ancient_items(), 5);

    // A second call skips the frozen numbers and leaves the boundary alone.
    assert_eq!(store.insert_receipt_chain(&base, &receipts, 5).unwrap(), 8);
    assert_eq!(store.ancient_items(), 5);
}

#[test]
fn set_head_truncates_the_ancient_tail() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 8, 0, 0);
    let receipts = receipts_of(&base);
    store.insert_header_chain(&headers_of(&base)).unwrap();
    store.insert_receipt_chain(&base, &receipts, 5).unwrap();

    store.set_head(BlockNumber::new(2)).unwrap();

    // The rewind dipped below the boundary, so the tables were physically shortened.
    assert_eq!(store.ancient_items(), 3);
    assert_eq!(
        store.canonical_hash(BlockNumber::new(2)).unwrap(),
        Some(base[1].hash())
    );
    assert_eq!(store.canonical_hash(BlockNumber::new(3)).unwrap(), None);
    assert_eq!(store.canonical_hash(BlockNumber::new(4)).unwrap(), None);

    // Heads land on the new top; the full head needs state, which snap-synced data never had,
    // so it bottoms out at genesis.
    assert_eq!(store.heads().head_header().number, BlockNumber::new(2));
    assert_eq!(store.heads().head_snap_block().number, BlockNumber::new(2));
    assert_eq!(store.heads().head_block().number, BlockNumber::new(0));
}

#[test]
fn set_head_above_the_boundary_keeps_the_ancient_tail() {
    let (mut store, genesis) = new_chain_store(default_config());
    let base = make_chain(&genesis, 8, 0, 0);
    let receipts = receipts_of(&base);
    store.insert_header_chain(&headers_of(&base)).unwrap();
    store.insert_receipt_chain(&base, &receipts, 5).unwrap();

    store.set_head(BlockNumber::new(6)).unwrap();

    assert_eq!(store.ancient_items(), 5);
    assert_eq!(
        store.canonical_hash(BlockNumber::new(6)).unwrap(),
        Some(base[5].hash())
    );
    assert_eq!(store.canonical_hash(BlockNumber::new(7)).unwrap(), None);
    assert_eq!(store.heads().head_snap_block().number, BlockNumber::new(6));
}
