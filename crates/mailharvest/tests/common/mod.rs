//! Shared test utilities for mailharvest integration tests.
//!
//! This module provides:
//! - `ScriptedStore`, an in-memory mail store with injectable failures
//! - `TestHarness` for isolated runs against temporary dataset files
//! - `RecordingProgress` to assert on the status stream

pub mod harness;
pub mod mailbox;

pub use harness::{RecordingProgress, TestHarness};
pub use mailbox::{message, ScriptedStore};
