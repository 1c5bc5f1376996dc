//! Library components of the `claims` command-line tool.

pub mod config;
pub mod logging;
pub mod pipeline;
