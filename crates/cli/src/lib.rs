//! Command-line front end for the `autoclick` session manager.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod styles;
