//! Property-based tests using proptest
//!
//! Tests invariants of configuration parsing and the access gate.

pub mod gate_tests;
