//! Error handling utilities for the tnac pipeline

use thiserror::Error;

/// The main error type for the tnac interpreter
#[derive(Error, Debug, Clone)]
pub enum TnacError {
    #[error("Lexical error: {message}")]
    LexError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Compile error: {message}")]
    CompileError { message: String },

    #[error("Runtime error: {message}")]
    RuntimeError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Result type alias for tnac operations
pub type TnacResult<T> = Result<T, TnacError>;

impl TnacError {
    pub fn lex_error(message: impl Into<String>) -> Self {
        Self::LexError { message: message.into() }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError { message: message.into() }
    }

    pub fn compile_error(message: impl Into<String>) -> Self {
        Self::CompileError { message: message.into() }
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::RuntimeError { message: message.into() }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::IoError { message: message.into() }
    }
}
