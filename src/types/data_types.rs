/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store bytes or numbers, and do not have any major "active" behavior.

use std::{
    fmt::{self, Debug, Display, Formatter},
    hash::Hash,
    ops::{Add, AddAssign, Sub},
};

use borsh::{BorshDeserialize, BorshSerialize};

/// Number that uniquely identifies a blockchain.
///
/// Every block in the same chain should share the same `ChainId`, which in turn should be unique
/// between different chains. Transactions carry the `ChainId` of the chain they are destined for,
/// so that a transaction signed for one chain cannot be replayed on another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ChainId(u64);

impl ChainId {
    /// Create a new `ChainId` with an `int` value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the `u64` value of this `ChainId`.
    pub const fn int(&self) -> u64 {
        self.0
    }
}

/// Position of a block in the canonical chain.
///
/// Starts at 0 for the genesis block and increases by 1 for every child. Multiple blocks may
/// share a number while their forks compete; only one of them is canonical at that number at any
/// given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Create a new `BlockNumber` with an `int` inner value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the inner `u64` value of this `BlockNumber`.
    pub const fn int(&self) -> u64 {
        self.0
    }

    /// Get the little-endian representation of the inner `u64` value of this `BlockNumber`.
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl Display for BlockNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl AddAssign<u64> for BlockNumber {
    fn add_assign(&mut self, rhs: u64) {
        self.0.add_assign(rhs)
    }
}

impl Add<u64> for BlockNumber {
    type Output = BlockNumber;
    fn add(self, rhs: u64) -> Self::Output {
        BlockNumber::new(self.0.add(rhs))
    }
}

impl Sub<u64> for BlockNumber {
    type Output = BlockNumber;
    fn sub(self, rhs: u64) -> Self::Output {
        BlockNumber::new(self.0 - rhs)
    }
}

impl Sub<BlockNumber> for BlockNumber {
    type Output = u64;
    fn sub(self, rhs: BlockNumber) -> Self::Output {
        self.0 - rhs.0
    }
}

/// Fork-choice weight contributed by a single block.
///
/// Set by the block's producer and validated by the
/// [consensus engine](crate::engine::ConsensusEngine); this crate only accumulates it into
/// [`TotalDifficulty`] and never interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct Difficulty(u128);

impl Difficulty {
    /// Create a new `Difficulty` wrapping `int`.
    pub const fn new(int: u128) -> Self {
        Self(int)
    }

    /// Get the inner `u128` value of this `Difficulty`.
    pub const fn int(&self) -> u128 {
        self.0
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Cumulative fork-choice weight from genesis to a given header.
///
/// Stored once per accepted header and never mutated afterwards. Comparisons between
/// `TotalDifficulty` values are purely numeric; the
/// [fork choice](crate::chain_store::fork_choice) rule is built entirely on top of them.
///
/// The inner type is `u128`, wider than [`Difficulty`]'s contribution space needs, so that
/// accumulating difficulties over very long chains does not overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct TotalDifficulty(u128);

impl TotalDifficulty {
    /// Create a new `TotalDifficulty` wrapping `int`.
    pub const fn new(int: u128) -> Self {
        Self(int)
    }

    /// Get the inner `u128` value of this `TotalDifficulty`.
    pub const fn int(&self) -> u128 {
        self.0
    }
}

impl Display for TotalDifficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Add<Difficulty> for TotalDifficulty {
    type Output = TotalDifficulty;
    fn add(self, rhs: Difficulty) -> Self::Output {
        TotalDifficulty(self.0 + rhs.0)
    }
}

impl AddAssign<Difficulty> for TotalDifficulty {
    fn add_assign(&mut self, rhs: Difficulty) {
        self.0.add_assign(rhs.0)
    }
}

/// 32-byte cryptographic hash.
///
/// Within chainstore, `CryptoHash`-es identify headers, blocks, transactions, state roots, and
/// trie nodes. Header and block hashes are always SHA-256 hashes of a borsh encoding; state roots
/// and trie-node hashes may be produced by any 32-byte cryptographic hash function, since this
/// crate treats them as opaque keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    /// Create a new `CryptoHash` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the inner `[u8; 32]` value of this `CryptoHash`.
    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl From<[u8; 32]> for CryptoHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
