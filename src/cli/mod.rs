//! Command-line interface module.

mod args;
pub mod process;
pub mod serve;

pub use args::{Cli, Commands, TidyArgs};
