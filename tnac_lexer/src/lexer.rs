//! Single-buffer scanner with one-token lookahead
//!
//! The scanner is separator-driven, like the language it serves: a
//! numeric or identifier lexeme is only accepted when the character
//! following it is a separator (blank, operator, punctuation or end of
//! input). Anything else consumes up to the next separator and yields
//! an `Error` token carrying the offending slice.

use crate::{Token, TokenKind};
use tnac_common::{FileId, Position, Span};

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\x0c' | '\x0b' | '\r' | '\0')
}

fn is_operator_start(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '%' | '~' | '&' | '|' | '^' | '!' | '?' | '=' | '<' | '>' | '.')
}

fn is_punct(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' | ':')
}

fn is_separator(c: char) -> bool {
    is_blank(c) || is_operator_start(c) || is_punct(c)
}

fn is_digit(c: char, base: u32) -> bool {
    c.is_digit(base)
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lookup_keyword(name: &str) -> TokenKind {
    use TokenKind::*;
    // Name arrives without the leading underscore. The two constructor
    // keywords accept both their short and long spellings.
    match name {
        "result" => KwResult,
        "fn" => KwFunction,
        "ret" => KwRet,
        "cplx" | "complex" => KwComplex,
        "frac" | "fraction" => KwFraction,
        "int" => KwInt,
        "flt" => KwFloat,
        "bool" => KwBool,
        "true" => KwTrue,
        "false" => KwFalse,
        "i" => KwI,
        "e" => KwE,
        "pi" => KwPi,
        "entry" => KwEntry,
        "import" => KwImport,
        _ => Error,
    }
}

/// Lazy lexer over a single source buffer.
///
/// `next()` consumes, `peek()` previews without consuming. Once the
/// buffer is exhausted both yield `Eol` indefinitely.
pub struct Lexer {
    buf: Vec<char>,
    pos: usize,
    loc: Position,
    file_id: FileId,
    preview: Option<Token>,
}

impl Lexer {
    pub fn new(input: &str, file_id: FileId) -> Self {
        let mut lex = Self {
            buf: input.chars().collect(),
            pos: 0,
            loc: Position::start(),
            file_id,
            preview: None,
        };
        lex.skip_blanks();
        lex
    }

    /// Consumes and returns the next token
    pub fn next_token(&mut self) -> Token {
        let tok = self.peek().clone();
        self.preview = None;
        tok
    }

    /// Previews the next token without consuming it
    pub fn peek(&mut self) -> &Token {
        if self.preview.is_none() {
            let tok = self.scan();
            self.preview = Some(tok);
        }
        self.preview.as_ref().unwrap()
    }

    fn good(&self) -> bool {
        self.pos < self.buf.len()
    }

    fn cur(&self) -> char {
        if self.good() { self.buf[self.pos] } else { '\0' }
    }

    fn advance(&mut self) {
        if !self.good() {
            return;
        }
        if self.buf[self.pos] == '\n' {
            self.loc.line += 1;
            self.loc.column = 1;
        } else {
            self.loc.column += 1;
        }
        self.loc.offset += 1;
        self.pos += 1;
    }

    fn skip_blanks(&mut self) {
        while self.good() && is_blank(self.cur()) {
            self.advance();
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_blanks();

        if !self.good() {
            return Token::eol(Span::single(self.loc, self.file_id));
        }

        let start_pos = self.pos;
        let start_loc = self.loc;

        let c = self.cur();
        let kind = if c == '\'' {
            self.string()
        } else if c == '_' || c == '#' || is_id_start(c) {
            self.identifier()
        } else if c.is_ascii_digit() {
            self.number()
        } else if is_operator_start(c) {
            self.op()
        } else if is_punct(c) {
            self.punct()
        } else {
            self.advance();
            self.ffwd();
            TokenKind::Error
        };

        self.finish(kind, start_pos, start_loc)
    }

    fn finish(&mut self, kind: TokenKind, start_pos: usize, start_loc: Position) -> Token {
        let kind = if kind == TokenKind::Error {
            self.ffwd();
            TokenKind::Error
        } else {
            kind
        };

        let mut from = start_pos;
        let mut to = self.pos;
        let text: String = match kind {
            // Strings drop the surrounding quotes, commands the leading '#'
            TokenKind::String => {
                from += 1;
                to -= 1;
                self.buf[from..to].iter().collect()
            }
            TokenKind::Command => self.buf[from + 1..to].iter().collect(),
            _ => self.buf[from..to].iter().collect(),
        };

        let span = Span::new(start_loc, self.loc, self.file_id);
        Token::new(kind, text, span)
    }

    /// Consumes everything up to the next separator; used for error
    /// recovery so garbage lexemes come out as one token
    fn ffwd(&mut self) {
        while self.good() && !is_separator(self.cur()) {
            self.advance();
        }
    }

    fn string(&mut self) -> TokenKind {
        self.advance();
        while self.good() {
            if self.cur() == '\'' {
                self.advance();
                return TokenKind::String;
            }
            self.advance();
        }
        TokenKind::Error
    }

    fn identifier(&mut self) -> TokenKind {
        let first = self.cur();
        if !is_id_start(first) {
            self.advance(); // leading '_' or '#'
        }
        let name_start = self.pos;
        if !self.id_seq() {
            return TokenKind::Error;
        }
        let name: String = self.buf[name_start..self.pos].iter().collect();
        if first == '_' {
            lookup_keyword(&name)
        } else if first == '#' {
            TokenKind::Command
        } else {
            TokenKind::Identifier
        }
    }

    fn id_seq(&mut self) -> bool {
        let mut ok = false;
        while self.good() {
            let c = self.cur();
            if is_id_char(c) {
                ok = true;
                self.advance();
                continue;
            }
            if is_separator(c) {
                break;
            }
            return false;
        }
        ok
    }

    fn number(&mut self) -> TokenKind {
        let leading_zero = self.cur() == '0';
        if leading_zero {
            self.advance();
            let next = self.cur();

            if !self.good() || is_separator_not_dot(next) {
                // literal 0 is decimal
                return TokenKind::IntDec;
            }
            if next.eq_ignore_ascii_case(&'b') {
                return self.radix_number(2, TokenKind::IntBin);
            }
            if next.eq_ignore_ascii_case(&'x') {
                return self.radix_number(16, TokenKind::IntHex);
            }
            if is_digit(next, 8) {
                let probe = self.pos;
                if self.digit_seq(8) && (!self.good() || is_separator(self.cur())) {
                    return TokenKind::IntOct;
                }
                self.rewind(probe);
            }
        }

        self.decimal_number(leading_zero)
    }

    fn rewind(&mut self, to: usize) {
        // Only valid inside a single line; numbers never span lines
        while self.pos > to {
            self.pos -= 1;
            self.loc.column -= 1;
            self.loc.offset -= 1;
        }
    }

    fn radix_number(&mut self, base: u32, kind: TokenKind) -> TokenKind {
        self.advance(); // prefix char
        if !self.digit_seq(base) {
            return TokenKind::Error;
        }
        if !self.good() || is_separator(self.cur()) {
            kind
        } else {
            TokenKind::Error
        }
    }

    fn decimal_number(&mut self, leading_zero: bool) -> TokenKind {
        let had_digits = self.digit_seq(10);
        if !had_digits && self.cur() != '.' {
            return TokenKind::Error;
        }

        if !self.good() || is_separator_not_dot(self.cur()) {
            return if leading_zero { TokenKind::Error } else { TokenKind::IntDec };
        }

        if self.cur() == '.' {
            self.advance();
            // a '.' demands at least one fractional digit
            if self.digit_seq(10) && (!self.good() || is_separator_not_dot(self.cur())) {
                return TokenKind::Float;
            }
        }

        TokenKind::Error
    }

    fn digit_seq(&mut self, base: u32) -> bool {
        let mut ok = false;
        while self.good() {
            let c = self.cur();
            if is_digit(c, base) {
                ok = true;
                self.advance();
                continue;
            }
            if c == '.' || is_separator(c) {
                break;
            }
            return false;
        }
        ok
    }

    fn op(&mut self) -> TokenKind {
        use TokenKind::*;
        let c = self.cur();
        self.advance();
        match c {
            '+' => Plus,
            '-' => self.two(">", Arrow, Minus),
            '*' => self.two("*", Pow, Asterisk),
            '/' => self.two("/", Root, Slash),
            '%' => Percent,
            '~' => Tilde,
            '&' => self.two("&", LogAnd, Amp),
            '|' => self.two("|", LogOr, Pipe),
            '^' => Hat,
            '!' => self.two("=", NotEq, Exclamation),
            '?' => Question,
            '=' => self.two("=", Eq, Assign),
            '<' => self.two("=", LessEq, Less),
            '>' => self.two("=", GreaterEq, Greater),
            '.' => Dot,
            _ => Error,
        }
    }

    fn two(&mut self, follow: &str, long: TokenKind, short: TokenKind) -> TokenKind {
        let f = follow.chars().next().unwrap();
        if self.good() && self.cur() == f {
            self.advance();
            long
        } else {
            short
        }
    }

    fn punct(&mut self) -> TokenKind {
        use TokenKind::*;
        let c = self.cur();
        self.advance();
        match c {
            ':' => ExprSep,
            '(' => ParenOpen,
            ')' => ParenClose,
            '{' => CurlyOpen,
            '}' => CurlyClose,
            '[' => BracketOpen,
            ']' => BracketClose,
            ',' => Comma,
            ';' => Semicolon,
            _ => Error,
        }
    }
}

fn is_separator_not_dot(c: char) -> bool {
    c != '.' && is_separator(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lex = Lexer::new(input, 0);
        let mut out = Vec::new();
        loop {
            let t = lex.next_token();
            if t.is_eol() {
                break;
            }
            out.push(t.kind());
        }
        out
    }

    fn texts(input: &str) -> Vec<String> {
        let mut lex = Lexer::new(input, 0);
        let mut out = Vec::new();
        loop {
            let t = lex.next_token();
            if t.is_eol() {
                break;
            }
            out.push(t.text().to_string());
        }
        out
    }

    #[test]
    fn integer_forms() {
        use TokenKind::*;
        assert_eq!(kinds("0"), vec![IntDec]);
        assert_eq!(kinds("42"), vec![IntDec]);
        assert_eq!(kinds("0b101"), vec![IntBin]);
        assert_eq!(kinds("0xfF"), vec![IntHex]);
        assert_eq!(kinds("017"), vec![IntOct]);
        assert_eq!(kinds("08"), vec![Error]);
        assert_eq!(kinds("0b2"), vec![Error]);
    }

    #[test]
    fn float_needs_fraction_digits() {
        use TokenKind::*;
        assert_eq!(kinds("1.5"), vec![Float]);
        assert_eq!(kinds("0.25"), vec![Float]);
        assert_eq!(kinds("1."), vec![Error]);
        assert_eq!(kinds("42.69"), vec![Float]);
    }

    #[test]
    fn operators_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("+ - * / % ** // == != <= >= && || -> = < > & | ^ ~ ! ? ."),
            vec![
                Plus, Minus, Asterisk, Slash, Percent, Pow, Root, Eq, NotEq, LessEq, GreaterEq,
                LogAnd, LogOr, Arrow, Assign, Less, Greater, Amp, Pipe, Hat, Tilde, Exclamation,
                Question, Dot
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(kinds("_true _false _pi _e _i _fn _ret _result"),
            vec![KwTrue, KwFalse, KwPi, KwE, KwI, KwFunction, KwRet, KwResult]);
        assert_eq!(kinds("_cplx _complex _frac _fraction"),
            vec![KwComplex, KwComplex, KwFraction, KwFraction]);
        assert_eq!(kinds("abc a1_b"), vec![Identifier, Identifier]);
        assert_eq!(kinds("_nosuch"), vec![Error]);
    }

    #[test]
    fn commands_strip_hash() {
        use TokenKind::*;
        assert_eq!(kinds("#exit"), vec![Command]);
        assert_eq!(texts("#result hex"), vec!["result".to_string(), "hex".to_string()]);
    }

    #[test]
    fn strings_strip_quotes() {
        let t = texts("'hello there'");
        assert_eq!(t, vec!["hello there".to_string()]);
        assert_eq!(kinds("'unterminated"), vec![TokenKind::Error]);
    }

    #[test]
    fn punctuation_and_separator() {
        use TokenKind::*;
        assert_eq!(kinds("( ) { } [ ] , ; :"),
            vec![ParenOpen, ParenClose, CurlyOpen, CurlyClose, BracketOpen, BracketClose, Comma,
                Semicolon, ExprSep]);
    }

    #[test]
    fn expression_shapes() {
        use TokenKind::*;
        assert_eq!(kinds("a = 10 : a * 2"),
            vec![Identifier, Assign, IntDec, ExprSep, Identifier, Asterisk, IntDec]);
        assert_eq!(kinds("f(x) x * 2 ;"),
            vec![Identifier, ParenOpen, Identifier, ParenClose, Identifier, Asterisk, IntDec,
                Semicolon]);
    }

    #[test]
    fn eol_repeats_forever() {
        let mut lex = Lexer::new("1", 0);
        assert_eq!(lex.next_token().kind(), TokenKind::IntDec);
        assert!(lex.next_token().is_eol());
        assert!(lex.next_token().is_eol());
        assert!(lex.peek().is_eol());
    }

    #[test]
    fn peek_is_stable() {
        let mut lex = Lexer::new("a + b", 0);
        let first = lex.peek().clone();
        assert_eq!(&first, lex.peek());
        assert_eq!(first, lex.next_token());
    }

    #[test]
    fn garbage_consumes_to_separator() {
        use TokenKind::*;
        assert_eq!(kinds("1abc + 2"), vec![Error, Plus, IntDec]);
        assert_eq!(texts("1abc + 2")[0], "1abc");
        assert_eq!(kinds("@@@ : 1"), vec![Error, ExprSep, IntDec]);
    }

    #[test]
    fn locations_track_lines() {
        let mut lex = Lexer::new("a\n  b", 0);
        let a = lex.next_token();
        let b = lex.next_token();
        assert_eq!(a.at().start.line, 1);
        assert_eq!(b.at().start.line, 2);
        assert_eq!(b.at().start.column, 3);
    }
}
