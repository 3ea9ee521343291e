//! Test Helper Utilities
//!
//! Shared utilities for testing podium-import

#![allow(dead_code)]

pub mod db_utils;
pub mod stubs;

pub use db_utils::{create_test_db, seed_athlete, write_source_file};
pub use stubs::{StubOcr, StubPdf};
