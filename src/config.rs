/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! User-specified parameters that govern a chain store instance.

use typed_builder::TypedBuilder;

use crate::types::data_types::{ChainId, TotalDifficulty};

/// Stores the user-defined parameters governing a chain store, that is:
/// 1. The [chain ID](crate::types::data_types::ChainId) of the target blockchain.
/// 2. The state retention window: how many of the most recent canonical state roots are kept
///    resolvable in memory.
/// 3. The [state scheme](StateScheme), which decides whether one extra generation is retained
///    beyond the window.
/// 4. The optional terminal total difficulty. While the canonical head's total difficulty is
///    below this threshold, fork choice compares difficulties; at or beyond it, the store only
///    changes its canonical chain on an explicit external directive
///    ([`set_canonical`](crate::chain_store::ChainStore::set_canonical)).
/// 5. The "Log Events" flag, if set to "true" then logs should be printed.
///
/// ## Retention window
///
/// A root that falls out the trailing edge of the window is dereferenced from the in-memory
/// [trie node cache](crate::trie_cache::TrieNodeCache) and, unless it was flushed to the live
/// store, becomes permanently unresolvable. 128 is the conventional default: deep enough to
/// serve forks and short reorgs without re-execution, shallow enough to bound memory.
///
/// ## Log Events
///
/// chainstore logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [ChainConfig]. On the builder call the following methods to construct a valid [ChainConfig].

    Required:
    - `.chain_id(...)`
    - `.log_events(...)`

    Optional:
    - `.state_retention(...)` (default 128)
    - `.state_scheme(...)` (default [StateScheme::Hash])
    - `.terminal_total_difficulty(...)` (default none)
"))]
pub struct ChainConfig {
    #[builder(setter(doc = "Set the chain ID of the blockchain. Required."))]
    pub chain_id: ChainId,
    #[builder(default = 128, setter(doc = "Set how many recent canonical state roots are kept resolvable in memory. Optional, defaults to 128."))]
    pub state_retention: usize,
    #[builder(default = StateScheme::Hash, setter(doc = "Set the state scheme, which decides whether one extra generation is retained beyond the window. Optional, defaults to [StateScheme::Hash]."))]
    pub state_scheme: StateScheme,
    #[builder(default = None, setter(strip_option, doc = "Set the total difficulty at which fork choice switches from difficulty comparison to external directives. Optional, defaults to never."))]
    pub terminal_total_difficulty: Option<TotalDifficulty>,
    #[builder(setter(doc = "Enable logging? Required."))]
    pub log_events: bool,
}

impl ChainConfig {
    /// The number of recent canonical state roots actually kept pinned, which is the configured
    /// window plus the scheme-dependent extra generation.
    pub fn retained_roots(&self) -> usize {
        match self.state_scheme {
            StateScheme::Hash => self.state_retention,
            // The most recent generation is kept as a diff layer rather than immediately
            // flushed, so one extra generation stays pinned.
            StateScheme::Path => self.state_retention + 1,
        }
    }
}

/// How trie nodes are laid out in persistent storage.
///
/// chainstore does not itself read or write persistent tries; the scheme only decides the
/// retention policy of the in-memory [trie node cache](crate::trie_cache::TrieNodeCache).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateScheme {
    /// Nodes are keyed by content hash. Roots outside the retention window may become
    /// permanently unavailable.
    Hash,

    /// Nodes are keyed by trie path. The most recent generation is a diff layer, so the cache
    /// retains one generation more than the window.
    Path,
}
