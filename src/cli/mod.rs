//! Command-line interface for the `cai-translate` binary

pub mod commands;
