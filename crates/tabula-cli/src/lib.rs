//! The `tabula` command line: load a delimited file, reshape it with the `tabula-frame` verbs
//! and print the result.

#![forbid(unsafe_code)]

pub mod cli;
mod logger;

pub use cli::{demo_table, parse_selector, run, run_with_args, Args};
