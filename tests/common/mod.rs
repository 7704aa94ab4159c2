// Not every test binary exercises every fixture.
#![allow(dead_code)]

pub(crate) mod chain_gen;

pub(crate) mod logging;

pub(crate) mod mem_db;
