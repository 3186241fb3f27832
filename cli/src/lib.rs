//! cabrig-cli library surface, exposed for unit tests.

pub mod app;
pub mod commands;
