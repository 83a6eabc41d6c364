//! Integration tests for the processor module
//!
//! Tests the complete run over temporary station directories.

pub mod multi_station;
