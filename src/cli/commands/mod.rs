//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod annotate;
pub mod init;
pub mod link;
pub mod normalize;
