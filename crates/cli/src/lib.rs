//! Terminal front end for the colander interactive filter.
//!
//! Wires the pure filtering core to a real terminal: argument parsing, the
//! raw-mode session loop, and the plumbing that gets text in and out of the
//! process.

pub mod cli_args;
pub mod orchestrator;
pub mod session;
