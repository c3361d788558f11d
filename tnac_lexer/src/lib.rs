//! Lexical analysis for the tnac expression language
//!
//! Produces a lazy token stream with single-token lookahead. Once the
//! source buffer is exhausted the stream yields `Eol` forever.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
