//! Integration tests for disabled-table snapshots.
//!
//! Run with: cargo test --test snapshot

#[path = "../common/mod.rs"]
mod common;

mod dedupe;
mod failures;
mod runner;
