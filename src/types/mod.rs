/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the data types that make up a chain: scalar newtypes, headers, blocks,
//! receipts, and logs.

pub mod block;

pub mod data_types;
