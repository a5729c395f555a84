//! Domain layer: pure logic over [`tfharness_options::Options`].
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::process`. All functions are synchronous and
//! take data in, returning data out. The one outside crate it touches is
//! clap, for the `ValueEnum` derive on [`Subcommand`] that lets the `args`
//! command take a subcommand by name.

pub mod args;
pub mod error;

pub use args::{Subcommand, args_for, prepend, to_hcl};
pub use error::{ArgsError, RunError};
