//! Library components of the `maisa` command-line tool.

pub mod logging;
