//! Byte-stream-to-token-stream conversion.
//!
//! Single pass, deterministic, at most one character of lookahead beyond the
//! current character. Never panics: anything it cannot classify becomes an
//! [`TokenKind::Illegal`] token carrying the offending text, which the parser
//! turns into a recorded parse error.

mod token;

pub use token::{Position, Token, TokenKind, lookup_keyword};

pub struct Lexer {
    source: Vec<char>,
    cursor: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            cursor: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.cursor + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => break,
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.pos();
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, start);
        };

        if c.is_ascii_digit() {
            return self.read_number(start);
        }
        if is_ident_start(c) {
            return self.read_ident(start);
        }
        if c == '"' {
            return self.read_string(start);
        }
        if c == '\'' {
            return self.read_char(start);
        }

        self.advance();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            '+' => self.maybe_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => self.maybe_eq(TokenKind::Minus, TokenKind::MinusEq),
            '*' => self.maybe_eq(TokenKind::Star, TokenKind::StarEq),
            '/' => self.maybe_eq(TokenKind::Slash, TokenKind::SlashEq),
            '%' => self.maybe_eq(TokenKind::Percent, TokenKind::PercentEq),
            '^' => self.maybe_eq(TokenKind::Caret, TokenKind::CaretEq),
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    self.maybe_eq(TokenKind::Amp, TokenKind::AmpEq)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    self.maybe_eq(TokenKind::Pipe, TokenKind::PipeEq)
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::StrictEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::StrictNotEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    self.maybe_eq(TokenKind::Shl, TokenKind::ShlEq)
                } else {
                    self.maybe_eq(TokenKind::Lt, TokenKind::LtEq)
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    self.maybe_eq(TokenKind::Shr, TokenKind::ShrEq)
                } else {
                    self.maybe_eq(TokenKind::Gt, TokenKind::GtEq)
                }
            }
            other => TokenKind::Illegal(other.to_string()),
        };
        Token::new(kind, start)
    }

    /// Consumes a trailing `=` if present, switching between a plain operator
    /// and its compound-assignment form.
    fn maybe_eq(&mut self, plain: TokenKind, compound: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            compound
        } else {
            plain
        }
    }

    fn read_number(&mut self, start: Position) -> Token {
        let mut text = String::new();

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return match i64::from_str_radix(&digits, 16) {
                Ok(n) => Token::new(TokenKind::Int(n), start),
                Err(_) => Token::new(TokenKind::Illegal(format!("{text}{digits}")), start),
            };
        }
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('o') | Some('O')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if ('0'..='7').contains(&c) {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return match i64::from_str_radix(&digits, 8) {
                Ok(n) => Token::new(TokenKind::Int(n), start),
                Err(_) => Token::new(TokenKind::Illegal(format!("{text}{digits}")), start),
            };
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return match text.parse::<f64>() {
                Ok(f) => Token::new(TokenKind::Float(f), start),
                Err(_) => Token::new(TokenKind::Illegal(text), start),
            };
        }

        match text.parse::<i64>() {
            Ok(n) => Token::new(TokenKind::Int(n), start),
            Err(_) => Token::new(TokenKind::Illegal(text), start),
        }
    }

    fn read_ident(&mut self, start: Position) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = lookup_keyword(&text).unwrap_or(TokenKind::Ident(text));
        Token::new(kind, start)
    }

    fn read_escape(&mut self) -> Option<char> {
        match self.advance()? {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            other => Some(other),
        }
    }

    fn read_string(&mut self, start: Position) -> Token {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Token::new(TokenKind::Illegal(text), start),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.read_escape() {
                        Some(c) => text.push(c),
                        None => return Token::new(TokenKind::Illegal(text), start),
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Str(text), start)
    }

    fn read_char(&mut self, start: Position) -> Token {
        self.advance(); // opening quote
        let c = match self.peek() {
            Some('\\') => {
                self.advance();
                self.read_escape()
            }
            Some(c) => {
                self.advance();
                Some(c)
            }
            None => None,
        };
        let Some(c) = c else {
            return Token::new(TokenKind::Illegal(String::new()), start);
        };
        if self.peek() != Some('\'') {
            return Token::new(TokenKind::Illegal(c.to_string()), start);
        }
        self.advance();
        Token::new(TokenKind::Char(c), start)
    }

    /// Tokenizes the whole source, always ending with an [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_arithmetic() {
        assert_eq!(
            kinds("3 * (4 + 5)"),
            vec![
                TokenKind::Int(3),
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::Int(4),
                TokenKind::Plus,
                TokenKind::Int(5),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn maximal_munch_operators() {
        assert_eq!(
            kinds("=== !== << <<= >>= && ||"),
            vec![
                TokenKind::StrictEq,
                TokenKind::StrictNotEq,
                TokenKind::Shl,
                TokenKind::ShlEq,
                TokenKind::ShrEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hex_and_octal_literals() {
        assert_eq!(
            kinds("0x1F 0o17"),
            vec![TokenKind::Int(31), TokenKind::Int(15), TokenKind::Eof]
        );
    }

    #[test]
    fn string_and_char_escapes() {
        assert_eq!(
            kinds(r#" "a\nb" 'x' '\t' "#),
            vec![
                TokenKind::Str("a\nb".to_string()),
                TokenKind::Char('x'),
                TokenKind::Char('\t'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_and_block_comment_are_skipped() {
        assert_eq!(
            kinds("1 // comment\n2 /* block \n comment */ 3"),
            vec![
                TokenKind::Int(1),
                TokenKind::Int(2),
                TokenKind::Int(3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let toks = Lexer::new("x\n  y").tokenize();
        assert_eq!(toks[0].pos, Position { line: 1, column: 1 });
        assert_eq!(toks[1].pos, Position { line: 2, column: 3 });
    }

    #[test]
    fn unknown_byte_is_illegal() {
        let toks = Lexer::new("@").tokenize();
        assert!(matches!(toks[0].kind, TokenKind::Illegal(_)));
    }

    #[test]
    fn keywords_classified() {
        assert_eq!(
            kinds("var let const func struct enum import"),
            vec![
                TokenKind::KwVar,
                TokenKind::KwLet,
                TokenKind::KwConst,
                TokenKind::KwFunc,
                TokenKind::KwStruct,
                TokenKind::KwEnum,
                TokenKind::KwImport,
                TokenKind::Eof,
            ]
        );
    }
}
