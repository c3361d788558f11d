//! Token definitions for the tnac language

use serde::{Deserialize, Serialize};
use std::fmt;
use tnac_common::Span;

/// Token kinds in the tnac language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Error,
    Eol,

    /// Expression separator `:`
    ExprSep,

    // Numeric literals
    IntBin,
    IntOct,
    IntDec,
    IntHex,
    Float,

    /// `'...'` delimited string literal
    String,

    // Operators
    Dot,          // .
    Exclamation,  // !
    Question,     // ?
    Plus,         // +
    Minus,        // -
    Asterisk,     // *
    Slash,        // /
    Percent,      // %
    Assign,       // =
    Tilde,        // ~
    Amp,          // &
    Hat,          // ^
    Pipe,         // |
    Pow,          // **
    Root,         // //
    Eq,           // ==
    NotEq,        // !=
    Less,         // <
    LessEq,       // <=
    Greater,      // >
    GreaterEq,    // >=
    LogAnd,       // &&
    LogOr,        // ||
    Arrow,        // ->

    // Punctuation
    ParenOpen,
    ParenClose,
    Comma,
    Semicolon,
    CurlyOpen,
    CurlyClose,
    BracketOpen,
    BracketClose,

    Identifier,
    /// `#name` command token
    Command,

    // Keywords
    KwResult,
    KwFunction,
    KwRet,
    KwComplex,
    KwFraction,
    KwInt,
    KwFloat,
    KwBool,
    KwTrue,
    KwFalse,
    KwI,
    KwE,
    KwPi,
    KwEntry,
    KwImport,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            KwResult | KwFunction | KwRet | KwComplex | KwFraction | KwInt | KwFloat | KwBool
                | KwTrue | KwFalse | KwI | KwE | KwPi | KwEntry | KwImport
        )
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(self, IntBin | IntOct | IntDec | IntHex | Float | KwTrue | KwFalse | KwI | KwPi | KwE)
    }

    pub fn is_type_keyword(self) -> bool {
        use TokenKind::*;
        matches!(self, KwComplex | KwFraction | KwInt | KwFloat | KwBool)
    }

    pub fn is_unary_op(self) -> bool {
        use TokenKind::*;
        matches!(self, Plus | Minus | Tilde | Exclamation | Question)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Error => "<error>",
            Eol => "<eol>",
            ExprSep => ":",
            IntBin | IntOct | IntDec | IntHex => "<int>",
            Float => "<float>",
            String => "<string>",
            Dot => ".",
            Exclamation => "!",
            Question => "?",
            Plus => "+",
            Minus => "-",
            Asterisk => "*",
            Slash => "/",
            Percent => "%",
            Assign => "=",
            Tilde => "~",
            Amp => "&",
            Hat => "^",
            Pipe => "|",
            Pow => "**",
            Root => "//",
            Eq => "==",
            NotEq => "!=",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            LogAnd => "&&",
            LogOr => "||",
            Arrow => "->",
            ParenOpen => "(",
            ParenClose => ")",
            Comma => ",",
            Semicolon => ";",
            CurlyOpen => "{",
            CurlyClose => "}",
            BracketOpen => "[",
            BracketClose => "]",
            Identifier => "<id>",
            Command => "<command>",
            KwResult => "_result",
            KwFunction => "_fn",
            KwRet => "_ret",
            KwComplex => "_cplx",
            KwFraction => "_frac",
            KwInt => "_int",
            KwFloat => "_flt",
            KwBool => "_bool",
            KwTrue => "_true",
            KwFalse => "_false",
            KwI => "_i",
            KwE => "_e",
            KwPi => "_pi",
            KwEntry => "_entry",
            KwImport => "_import",
        };
        write!(f, "{}", s)
    }
}

/// A lexeme: its kind, raw text and source location.
///
/// The location is fixed at construction; `at()` never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    kind: TokenKind,
    text: String,
    span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }

    pub fn eol(span: Span) -> Self {
        Self::new(TokenKind::Eol, "", span)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn at(&self) -> Span {
        self.span
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    pub fn is_eol(&self) -> bool {
        self.is(TokenKind::Eol)
    }

    pub fn is_identifier(&self) -> bool {
        self.is(TokenKind::Identifier)
    }

    pub fn is_literal(&self) -> bool {
        self.kind.is_literal()
    }

    /// A zero-width error anchor just past this token.
    /// Used when a diagnostic should point at the gap after the last
    /// consumed lexeme rather than at the lexeme itself.
    pub fn after(&self) -> Token {
        let delta = self.text.chars().count() as u32;
        let pos = self.span.start.shifted(delta);
        Token::new(TokenKind::Error, self.text.clone(), Span::single(pos, self.span.file_id))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}", self.text)
        }
    }
}
