//! tracemotif command-line support: subcommand implementations and error
//! display, shared by the `tracemotif` binary and its tests.

pub mod commands;
pub mod error_chain;
