//! CLI subcommands.

pub mod start;
