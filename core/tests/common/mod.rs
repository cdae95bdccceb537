//! Common test utilities for integration tests
//!
//! This module provides shared functionality including:
//! - Temp tree fixtures (files, nested dirs, FIFOs, disk images)
//! - Content verification helpers
#![allow(dead_code)]

pub mod test_helpers;
pub mod tree_fixture;
