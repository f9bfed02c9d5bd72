//! CLI module - argument parsing, prompts and subcommands

mod args;
mod prompts;
pub mod rules;

pub use args::{Cli, Commands};
pub use prompts::*;
pub use rules::{load_rules, run_rules};
