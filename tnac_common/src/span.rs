//! Source location tracking for the tnac pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an interned source file inside a [`SourceIndex`]
pub type FileId = u32;

/// A position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column, offset }
    }

    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Shifts the column right without touching the line.
    /// Used for "just past the last token" error anchors.
    pub fn shifted(self, by: u32) -> Self {
        Self::new(self.line, self.column + by, self.offset + by)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A byte range of source text together with its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub file_id: FileId,
}

impl Span {
    pub fn new(start: Position, end: Position, file_id: FileId) -> Self {
        Self { start, end, file_id }
    }

    pub fn single(pos: Position, file_id: FileId) -> Self {
        Self::new(pos, pos, file_id)
    }

    pub fn dummy() -> Self {
        Self::single(Position::start(), 0)
    }

    pub fn combine(self, other: Span) -> Span {
        Span::new(
            if self.start.offset <= other.start.offset { self.start } else { other.start },
            if self.end.offset >= other.end.offset { self.end } else { other.end },
            self.file_id,
        )
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset <= self.end.offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A value with associated source location information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned::new(f(self.value), self.span)
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.value, self.span)
    }
}

/// Interns file paths and maps byte offsets back to line/column pairs.
///
/// The index is consumed by the core but owned by the host: the lexer
/// produces positions eagerly, so this only needs to resolve file ids
/// for display.
#[derive(Debug, Default)]
pub struct SourceIndex {
    files: Vec<String>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a path, returning the id of an existing entry when the
    /// same path was registered before.
    pub fn intern(&mut self, path: impl Into<String>) -> FileId {
        let path = path.into();
        if let Some(idx) = self.files.iter().position(|p| *p == path) {
            return idx as FileId;
        }
        self.files.push(path);
        (self.files.len() - 1) as FileId
    }

    pub fn path(&self, id: FileId) -> Option<&str> {
        self.files.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
