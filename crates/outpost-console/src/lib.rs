//! The operator console: a clap CLI over the query, chain, and sequencer
//! clients, plus the output list controller the output views run on.

pub mod cli;
pub mod controller;

pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod connection;

pub use config::ConsoleConfig;
