//! Command-line interface module.

mod args;
pub mod convert;
pub mod live;

pub use args::{Cli, Commands};
