//! protium library surface - exposes the command modules for testing.

pub mod commands;
pub mod logging;
