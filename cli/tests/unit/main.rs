//! Unit tests for tfharness
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod retry_driver;
