//! Infrastructure layer: concrete implementations of application port traits.
//!
//! All I/O lives here: process execution and options files.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.

pub mod command_runner;
pub mod config;
