//! Test module organization.
//!
//! This module organizes all integration tests for the SDRAM controller.


/// Command bus arbiter ownership tests.
mod arbiter_tests;



/// Configuration parsing and validation tests.
mod config_tests;



/// Top-level scheduler turn and refresh ordering tests.
mod scheduler_tests;


/// End-to-end controller plus device scenarios.
mod system_tests;
