/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the chain store's
//! [config](crate::config::ChainConfig::log_events).
//!
//! chainstore logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values
//! are always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following
//! snippet is how a [NewCanonicalHead](crate::events::NewCanonicalHeadEvent) is printed:
//!
//! ```text
//! NewCanonicalHead, 1701329264, fNGCJyk, 42
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the new head's
//!   hash.
//! - The fourth value is the new head's block number.

use crate::events::*;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log;
use std::time::SystemTime;

// Names of each event in PascalCase for printing:
pub const INSERT_BLOCK: &str = "InsertBlock";
pub const NEW_CANONICAL_HEAD: &str = "NewCanonicalHead";
pub const REORG: &str = "Reorg";
pub const SET_HEAD: &str = "SetHead";
pub const LOGS_ADDED: &str = "LogsAdded";
pub const LOGS_REMOVED: &str = "LogsRemoved";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for InsertBlockEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |insert_block_event: &InsertBlockEvent| {
            log::info!(
                "{}, {}, {}, {}",
                INSERT_BLOCK,
                secs_since_unix_epoch(insert_block_event.timestamp),
                first_seven_base64_chars(&insert_block_event.block.bytes()),
                insert_block_event.number
            )
        };
        Box::new(logger)
    }
}

impl Logger for NewCanonicalHeadEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |new_canonical_head_event: &NewCanonicalHeadEvent| {
            log::info!(
                "{}, {}, {}, {}",
                NEW_CANONICAL_HEAD,
                secs_since_unix_epoch(new_canonical_head_event.timestamp),
                first_seven_base64_chars(&new_canonical_head_event.block.bytes()),
                new_canonical_head_event.number
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReorgEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reorg_event: &ReorgEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                REORG,
                secs_since_unix_epoch(reorg_event.timestamp),
                first_seven_base64_chars(&reorg_event.old_head.bytes()),
                first_seven_base64_chars(&reorg_event.new_head.bytes()),
                reorg_event.common_ancestor
            )
        };
        Box::new(logger)
    }
}

impl Logger for SetHeadEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |set_head_event: &SetHeadEvent| {
            log::info!(
                "{}, {}, {}",
                SET_HEAD,
                secs_since_unix_epoch(set_head_event.timestamp),
                set_head_event.number
            )
        };
        Box::new(logger)
    }
}

impl Logger for LogsAddedEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |logs_added_event: &LogsAddedEvent| {
            log::info!(
                "{}, {}, {}",
                LOGS_ADDED,
                secs_since_unix_epoch(logs_added_event.timestamp),
                logs_added_event.logs.len()
            )
        };
        Box::new(logger)
    }
}

impl Logger for LogsRemovedEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |logs_removed_event: &LogsRemovedEvent| {
            log::info!(
                "{}, {}, {}",
                LOGS_REMOVED,
                secs_since_unix_epoch(logs_removed_event.timestamp),
                logs_removed_event.logs.len()
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("Event occured before the Unix Epoch.")
        .as_secs()
}
