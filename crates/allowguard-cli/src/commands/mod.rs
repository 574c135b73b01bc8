//! CLI subcommands.

pub(crate) mod classify;
pub(crate) mod config;
