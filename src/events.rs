//! Definitions of chainstore events for event handling and logging.
//! Note: an event for a given action indicates that the action has been committed to storage.

use crate::types::block::LocatedLog;
use crate::types::data_types::{BlockNumber, CryptoHash};
use std::sync::mpsc::Sender;
use std::time::SystemTime;

pub enum Event {
    // Events that change which blocks are stored.
    InsertBlock(InsertBlockEvent),
    // Events that change what is canonical.
    NewCanonicalHead(NewCanonicalHeadEvent),
    Reorg(ReorgEvent),
    SetHead(SetHeadEvent),
    // Events that carry the log streams consumed by cross-cutting observers.
    LogsAdded(LogsAddedEvent),
    LogsRemoved(LogsRemovedEvent),
}

impl Event {
    pub(crate) fn publish(self, event_publisher: &Option<Sender<Event>>) {
        if let Some(event_publisher) = event_publisher {
            event_publisher.send(self).unwrap()
        }
    }
}

pub struct InsertBlockEvent {
    pub timestamp: SystemTime,
    pub block: CryptoHash,
    pub number: BlockNumber,
}

pub struct NewCanonicalHeadEvent {
    pub timestamp: SystemTime,
    pub block: CryptoHash,
    pub number: BlockNumber,
}

pub struct ReorgEvent {
    pub timestamp: SystemTime,
    pub old_head: CryptoHash,
    pub new_head: CryptoHash,
    pub common_ancestor: BlockNumber,
}

pub struct SetHeadEvent {
    pub timestamp: SystemTime,
    pub number: BlockNumber,
}

/// Logs produced by blocks that just became canonical.
///
/// # Ordering
///
/// Within one event, `logs` is ordered by ascending `(block_number, tx_index)`. Consumers may
/// rely on this: a single reorg emits one [`LogsRemovedEvent`] followed by one
/// [`LogsAddedEvent`], each internally ordered.
pub struct LogsAddedEvent {
    pub timestamp: SystemTime,
    pub logs: Vec<LocatedLog>,
}

/// Logs produced by blocks that a reorg or rewind displaced from the canonical chain.
///
/// Ordered like [`LogsAddedEvent`].
pub struct LogsRemovedEvent {
    pub timestamp: SystemTime,
    pub logs: Vec<LocatedLog>,
}
