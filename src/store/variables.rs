/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte-prefixes that specify where each chain variable is stored in the user-provided live
//! key-value store.
//!
//! # List of state variables
//!
//! chainstore keeps its live-tier state in 11 separate conceptual "variables", grouped into 3
//! categories:
//!
//! ## Hash-keyed chain data
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Headers|[`CryptoHash`](crate::types::data_types::CryptoHash) -> [`Header`](crate::types::block::Header)|Every header accepted into the recent, mutable region of the chain, canonical or not.|
//! |Bodies|[`CryptoHash`](crate::types::data_types::CryptoHash) -> [`Body`](crate::types::block::Body)|Block bodies, keyed by the owning block's hash.|
//! |Receipts|[`CryptoHash`](crate::types::data_types::CryptoHash) -> `Vec<Receipt>`|The receipt set derived from executing a block, keyed by the block's hash.|
//! |Total Difficulties|[`CryptoHash`](crate::types::data_types::CryptoHash) -> [`TotalDifficulty`](crate::types::data_types::TotalDifficulty)|Cumulative fork-choice weight from genesis to each accepted header. Written once, never mutated.|
//! |Hash to Number|[`CryptoHash`](crate::types::data_types::CryptoHash) -> [`BlockNumber`](crate::types::data_types::BlockNumber)|Number of every known header, used to resolve by-hash reads against the number-indexed ancient tier.|
//! |State Nodes|[`CryptoHash`](crate::types::data_types::CryptoHash) -> `Vec<u8>`|Trie nodes flushed out of the in-memory [`TrieNodeCache`](crate::trie_cache::TrieNodeCache). A state root is disk-resolvable iff a node keyed by the root hash itself is present.|
//!
//! ## Number-keyed chain data
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Canonical Hashes|[`BlockNumber`](crate::types::data_types::BlockNumber) -> [`CryptoHash`](crate::types::data_types::CryptoHash)|The canonical number→hash index. Entries above the head are deleted, and entries below it overwritten, whenever the canonical chain changes. Not append-only.|
//!
//! ## Markers
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Head Header|[`CryptoHash`](crate::types::data_types::CryptoHash)|Hash of the highest canonical header.|
//! |Head Snap Block|[`CryptoHash`](crate::types::data_types::CryptoHash)|Hash of the highest canonical block whose body and receipts are available; its state may be absent.|
//! |Head Block|[`CryptoHash`](crate::types::data_types::CryptoHash)|Hash of the highest canonical block whose state is resolvable.|
//! |Pivot Number|[`BlockNumber`](crate::types::data_types::BlockNumber)|Number marking where a partial snap sync's reliable data begins. Absent outside snap sync.|
//!
//! # Persistence of state variables
//!
//! Every variable is stored as **borsh-serialized values** at keys formed from the constants in
//! this module. Single values (the markers) are stored at one-byte constant keys. Mappings are
//! stored at the concatenation of a one-byte prefix and the serialization of the key material
//! (a hash's bytes, or a number's little-endian bytes).

// State variables
pub const HEADERS: [u8; 1] = [0];
pub const BODIES: [u8; 1] = [1];
pub const RECEIPTS: [u8; 1] = [2];
pub const TOTAL_DIFFICULTIES: [u8; 1] = [3];
pub const HASH_TO_NUMBER: [u8; 1] = [4];
pub const CANONICAL_HASHES: [u8; 1] = [5];
pub const STATE_NODES: [u8; 1] = [6];
pub const HEAD_HEADER: [u8; 1] = [7];
pub const HEAD_SNAP_BLOCK: [u8; 1] = [8];
pub const HEAD_BLOCK: [u8; 1] = [9];
pub const PIVOT_NUMBER: [u8; 1] = [10];

/// Concatenate two byteslices into one vector.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}
