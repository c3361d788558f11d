//! Shared utilities for the tnac interpreter pipeline
//!
//! This crate provides the pieces every stage needs:
//! - Error types and handling utilities
//! - Source location tracking
//! - Diagnostic collection
//! - The feedback handler bundle through which the core talks to its host

pub mod commands;
pub mod diagnostics;
pub mod error;
pub mod feedback;
pub mod span;

pub use commands::*;
pub use diagnostics::*;
pub use error::*;
pub use feedback::*;
pub use span::*;
