//! Terminal front-end for the todo service.
//!
//! Owns the I/O the core leaves to its host: a ureq `Transport`, text
//! rendering of the store, and an interactive shell that keeps one `Store`
//! alive across commands.

pub mod render;
pub mod shell;
pub mod transport;

pub use shell::{Reply, Shell, ShellCommand};
pub use transport::UreqTransport;
