//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem with the
//! real task loops running against mock adapters. All tests run on the
//! host (x86_64) with no real hardware required.

mod cooking_flow_tests;
mod mock_hw;
mod remote_link_tests;
