//! Deterministic chain generation for tests, plus the fake consensus engine and state executor
//! the generated chains validate against.
//!
//! The difficulty rule mirrors proof-of-work chains in one respect that the fork-choice tests
//! depend on: blocks produced faster than the target interval are heavier. Generating a fork
//! with a negative `time_offset` therefore raises its weight, and a positive offset lowers it.

use borsh::BorshSerialize;
use rand::RngCore;
use sha2::Digest;

use chainstore::chain_store::{ChainStore, ChainStoreSpec};
use chainstore::config::ChainConfig;
use chainstore::engine::{
    ConsensusEngine, EngineError, ExecutionError, ExecutionOutput, StateExecutor, TrieNode,
};
use chainstore::types::block::{
    receipts_root, Block, Body, CryptoHasher, Header, Log, Receipt, Transaction,
};
use chainstore::types::data_types::{BlockNumber, ChainId, CryptoHash, Difficulty};

use super::mem_db::{MemAncient, MemDB};

pub(crate) const CHAIN_ID: ChainId = ChainId::new(1);

/// Target seconds between blocks. Blocks produced faster are heavier.
pub(crate) const BLOCK_INTERVAL: u64 = 10;

/// The difficulty rule shared by the generator and [`FakeEngine`].
pub(crate) fn calc_difficulty(parent_timestamp: u64, timestamp: u64) -> Difficulty {
    let delta = timestamp.saturating_sub(parent_timestamp).min(20);
    Difficulty::new((21 - delta) as u128)
}

/// The state-commitment rule shared by the generator and [`FakeExecutor`]: the post-state root
/// is a hash over the parent root and the block body.
pub(crate) fn fake_state_root(parent_root: &CryptoHash, body: &Body) -> CryptoHash {
    let mut hasher = CryptoHasher::new();
    hasher.update(&parent_root.bytes());
    hasher.update(&body.try_to_vec().unwrap());
    CryptoHash::new(hasher.finalize().into())
}

/// The node set committed for a root: the root node itself plus one distinct leaf per root.
pub(crate) fn fake_nodes(root: &CryptoHash) -> Vec<TrieNode> {
    let mut hasher = CryptoHasher::new();
    hasher.update(b"leaf");
    hasher.update(&root.bytes());
    let leaf = CryptoHash::new(hasher.finalize().into());
    vec![
        TrieNode {
            hash: *root,
            blob: root.bytes().to_vec(),
        },
        TrieNode {
            hash: leaf,
            blob: leaf.bytes().to_vec(),
        },
    ]
}

/// The receipt rule shared by the generator and [`FakeExecutor`]: one successful receipt per
/// transaction, each carrying one log topic'd with the transaction hash.
pub(crate) fn fake_receipts(body: &Body) -> Vec<Receipt> {
    body.transactions
        .iter()
        .map(|tx| Receipt {
            success: true,
            gas_used: 21_000,
            logs: vec![Log {
                topics: vec![tx.hash()],
                data: Vec::new(),
            }],
        })
        .collect()
}

/// The genesis block and the state nodes backing its (empty) state.
pub(crate) fn genesis() -> (Block, Vec<TrieNode>) {
    let empty_body = Body::default();
    let state_root = fake_state_root(&CryptoHash::new([0; 32]), &empty_body);
    let block = Block {
        header: Header {
            number: BlockNumber::new(0),
            parent_hash: CryptoHash::new([0; 32]),
            state_root,
            receipts_root: receipts_root(&[]),
            difficulty: Difficulty::new(1),
            timestamp: 0,
            extra: b"genesis".to_vec(),
        },
        body: empty_body,
    };
    let nodes = fake_nodes(&state_root);
    (block, nodes)
}

/// Generate `n` blocks extending `parent`, each containing one transaction that emits one log.
///
/// `time_offset` shifts every block time relative to [`BLOCK_INTERVAL`]: negative offsets
/// produce a heavier chain, positive a lighter one (the original's `OffsetTime`). `seed`
/// differentiates forks that would otherwise have identical content.
pub(crate) fn make_chain(parent: &Block, n: usize, time_offset: i64, seed: u8) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(n);
    let mut parent_header = parent.header.clone();
    let mut parent_root = parent.header.state_root;

    for _ in 0..n {
        let number = parent_header.number + 1;
        let timestamp =
            (parent_header.timestamp as i64 + BLOCK_INTERVAL as i64 + time_offset) as u64;
        // The payload is irrelevant to every invariant under test (roots and receipts are
        // derived from the body by generator and executor alike), so pad it with noise.
        let mut payload = vec![seed];
        let mut noise = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut noise);
        payload.extend_from_slice(&noise);

        let body = Body {
            transactions: vec![Transaction {
                chain_id: CHAIN_ID,
                nonce: number.int(),
                payload,
            }],
            ommers: Vec::new(),
        };
        let state_root = fake_state_root(&parent_root, &body);
        let header = Header {
            number,
            parent_hash: parent_header.hash(),
            state_root,
            receipts_root: receipts_root(&fake_receipts(&body)),
            difficulty: calc_difficulty(parent_header.timestamp, timestamp),
            timestamp,
            extra: Vec::new(),
        };

        let block = Block {
            header: header.clone(),
            body,
        };
        blocks.push(block);
        parent_header = header;
        parent_root = state_root;
    }

    blocks
}

/// The headers of `blocks`, for header-only imports.
pub(crate) fn headers_of(blocks: &[Block]) -> Vec<Header> {
    blocks.iter().map(|block| block.header.clone()).collect()
}

/// The receipt sets of `blocks`, for receipt-chain imports.
pub(crate) fn receipts_of(blocks: &[Block]) -> Vec<Vec<Receipt>> {
    blocks.iter().map(|block| fake_receipts(&block.body)).collect()
}

/// A consensus engine that checks structural rules and the test difficulty rule, and can be
/// told to reject a specific block number (simulating a seal failure mid-batch).
pub(crate) struct FakeEngine {
    pub(crate) fail_at: Option<BlockNumber>,
}

impl FakeEngine {
    pub(crate) fn new() -> FakeEngine {
        FakeEngine { fail_at: None }
    }

    #[allow(dead_code)]
    pub(crate) fn failing_at(number: BlockNumber) -> FakeEngine {
        FakeEngine {
            fail_at: Some(number),
        }
    }
}

impl ConsensusEngine for FakeEngine {
    fn verify_header(&self, header: &Header, parent: &Header) -> Result<(), EngineError> {
        if self.fail_at == Some(header.number) {
            return Err(EngineError::InvalidSeal);
        }
        if header.number != parent.number + 1 {
            return Err(EngineError::InvalidNumber);
        }
        if header.timestamp <= parent.timestamp {
            return Err(EngineError::InvalidTimestamp);
        }
        if header.difficulty != calc_difficulty(parent.timestamp, header.timestamp) {
            return Err(EngineError::InvalidDifficulty);
        }
        Ok(())
    }
}

/// A state executor implementing the shared fake state and receipt rules.
pub(crate) struct FakeExecutor;

impl StateExecutor for FakeExecutor {
    fn execute(
        &self,
        parent_state_root: CryptoHash,
        block: &Block,
    ) -> Result<ExecutionOutput, ExecutionError> {
        for tx in &block.body.transactions {
            if tx.chain_id != CHAIN_ID {
                return Err(ExecutionError::InvalidChainId { tx: tx.hash() });
            }
        }
        let state_root = fake_state_root(&parent_state_root, &block.body);
        Ok(ExecutionOutput {
            state_root,
            nodes: fake_nodes(&state_root),
            receipts: fake_receipts(&block.body),
        })
    }
}

/// Fresh in-memory tiers with [`genesis`] already initialized into the live store. The returned
/// handles share backing state with every clone, so tests can keep them to reopen stores or to
/// inspect the tiers directly.
pub(crate) fn new_tiers() -> (MemDB, MemAncient, Block) {
    let mut kv = MemDB::new();
    let ancient = MemAncient::new();
    let (genesis_block, genesis_state) = genesis();
    ChainStore::<MemDB, MemAncient, FakeEngine, FakeExecutor>::initialize(
        &mut kv,
        &genesis_block,
        &genesis_state,
    )
    .unwrap();
    (kv, ancient, genesis_block)
}

/// Open a chain store over existing tiers.
pub(crate) fn start_store(
    kv: MemDB,
    ancient: MemAncient,
    config: ChainConfig,
) -> ChainStore<MemDB, MemAncient, FakeEngine, FakeExecutor> {
    start_store_with_engine(kv, ancient, config, FakeEngine::new())
}

/// Open a chain store over existing tiers with a specific engine (e.g. one rigged to fail).
pub(crate) fn start_store_with_engine(
    kv: MemDB,
    ancient: MemAncient,
    config: ChainConfig,
    engine: FakeEngine,
) -> ChainStore<MemDB, MemAncient, FakeEngine, FakeExecutor> {
    ChainStoreSpec::builder()
        .kv_store(kv)
        .ancient_store(ancient)
        .engine(engine)
        .executor(FakeExecutor)
        .config(config)
        .build()
        .start()
        .unwrap()
}

/// A fully-wired chain store over fresh in-memory tiers, initialized with [`genesis`].
pub(crate) fn new_chain_store(
    config: ChainConfig,
) -> (
    ChainStore<MemDB, MemAncient, FakeEngine, FakeExecutor>,
    Block,
) {
    let (kv, ancient, genesis_block) = new_tiers();
    (start_store(kv, ancient, config), genesis_block)
}

/// A config with test-friendly defaults.
pub(crate) fn default_config() -> ChainConfig {
    ChainConfig::builder()
        .chain_id(CHAIN_ID)
        .log_events(false)
        .build()
}
