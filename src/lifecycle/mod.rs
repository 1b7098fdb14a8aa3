//! Process lifecycle.
//!
//! # Design Decisions
//! - Shutdown is a broadcast: every incident task holds its own receiver
//!   and stops at its next durable suspend point
//! - An interrupted incident is not a failure; its checkpoint stays
//!   non-terminal and `resume_all` continues it on the next start

pub mod shutdown;

pub use shutdown::Shutdown;
