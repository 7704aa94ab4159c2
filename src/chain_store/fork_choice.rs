/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The rule that decides which of several competing chains is canonical.

use crate::config::ChainConfig;
use crate::types::data_types::TotalDifficulty;

/// The fork-choice policy in force for one insertion.
///
/// Modeled as a tagged variant selected by configuration rather than a type switch scattered
/// through the engine: the insertion engine resolves the policy once per decision from the
/// configured terminal total difficulty and the canonical head's current weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForkChoice {
    /// Pre-merge rule: strictly greater total difficulty wins. Equal total difficulty does NOT
    /// displace the incumbent — first-seen-wins on ties. Shorter-but-heavier chains overtake
    /// longer-but-lighter ones.
    ByDifficulty,

    /// Post-merge rule: difficulty comparison is bypassed entirely. Blocks are stored without
    /// becoming canonical; only an explicit
    /// [`set_canonical`](crate::chain_store::ChainStore::set_canonical) directive from the
    /// external driver changes the canonical chain.
    ByExternalDirective,
}

impl ForkChoice {
    /// Resolve the policy in force given the canonical head's current total difficulty.
    pub fn resolve(config: &ChainConfig, head_total_difficulty: TotalDifficulty) -> ForkChoice {
        match config.terminal_total_difficulty {
            Some(terminal) if head_total_difficulty >= terminal => ForkChoice::ByExternalDirective,
            _ => ForkChoice::ByDifficulty,
        }
    }

    /// Should a candidate chain with weight `candidate` displace the canonical chain with weight
    /// `incumbent`?
    pub fn prefers(&self, candidate: TotalDifficulty, incumbent: TotalDifficulty) -> bool {
        match self {
            ForkChoice::ByDifficulty => candidate > incumbent,
            ForkChoice::ByExternalDirective => false,
        }
    }
}
