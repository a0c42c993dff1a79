//! Byte-oriented lexer.
//!
//! Source text is treated as raw bytes: identifiers and punctuation are
//! ASCII, and string/character literals carry their bytes through
//! untouched. Identifiers are interned as they are scanned so the parser
//! and evaluator only ever see [`NameId`]s.

use crate::{
    area::SourceArea,
    errors::{ErrorKind, RunError, RunResult},
    intern::{Interner, NameId},
};

/// One lexed token with the area it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub area: SourceArea,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(NameId),
    Integer(i64),
    Real(f64),
    Character(u8),
    Str(Vec<u8>),

    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwFunction,
    KwRecord,
    KwReturn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,
    KwNothing,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
    AndAnd,
    OrOr,
    Bang,
    Tilde,
    PlusPlus,
    MinusMinus,
    Lt,
    Leq,
    Gt,
    Geq,
    EqEq,
    Neq,
    Assign,
    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Eof,
}

impl TokenKind {
    /// Short human-readable description for parse diagnostics.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Integer(_) => "integer literal",
            Self::Real(_) => "real literal",
            Self::Character(_) => "character literal",
            Self::Str(_) => "string literal",
            Self::KwIf => "'if'",
            Self::KwElse => "'else'",
            Self::KwWhile => "'while'",
            Self::KwFor => "'for'",
            Self::KwFunction => "'function'",
            Self::KwRecord => "'record'",
            Self::KwReturn => "'return'",
            Self::KwBreak => "'break'",
            Self::KwContinue => "'continue'",
            Self::KwTrue => "'true'",
            Self::KwFalse => "'false'",
            Self::KwNothing => "'nothing'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Shl => "'<<'",
            Self::Shr => "'>>'",
            Self::Amp => "'&'",
            Self::Pipe => "'|'",
            Self::Caret => "'^'",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
            Self::Bang => "'!'",
            Self::Tilde => "'~'",
            Self::PlusPlus => "'++'",
            Self::MinusMinus => "'--'",
            Self::Lt => "'<'",
            Self::Leq => "'<='",
            Self::Gt => "'>'",
            Self::Geq => "'>='",
            Self::EqEq => "'=='",
            Self::Neq => "'!='",
            Self::Assign => "'='",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Eof => "end of file",
        }
    }
}

/// Lexer state: a cursor over the source bytes with line/column tracking.
pub struct Lexer<'a> {
    source: &'a [u8],
    file: NameId,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str, file: NameId) -> Self {
        Self {
            source: source.as_bytes(),
            file,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Lexes the whole source into a token list terminated by `Eof`.
    pub fn tokenize(mut self, interner: &mut Interner) -> RunResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.here();
            let Some(byte) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    area: SourceArea::point(self.file, self.line, self.column),
                });
                return Ok(tokens);
            };
            let kind = match byte {
                b'0'..=b'9' => self.number(start)?,
                b'"' => self.string(start)?,
                b'\'' => self.character(start)?,
                b if b.is_ascii_alphabetic() || b == b'_' => self.word(interner),
                _ => self.punctuation(start)?,
            };
            tokens.push(Token {
                kind,
                area: self.area_from(start),
            });
        }
    }

    fn here(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn area_from(&self, start: (u32, u32)) -> SourceArea {
        // The cursor sits one past the token, so back the column off by one.
        let last_column = self.column.saturating_sub(1).max(start.1);
        SourceArea::new(self.file, start.0, start.1, self.line, last_column)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>, start: (u32, u32)) -> RunError {
        RunError::new(
            ErrorKind::Lex,
            message,
            SourceArea::new(self.file, start.0, start.1, self.line, self.column.max(1)),
        )
    }

    /// Skips whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> RunResult<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => return Err(self.error("unterminated block comment", start)),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn word(&mut self, interner: &mut Interner) -> TokenKind {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).expect("identifier bytes are ASCII");
        match text {
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "for" => TokenKind::KwFor,
            "function" => TokenKind::KwFunction,
            "record" => TokenKind::KwRecord,
            "return" => TokenKind::KwReturn,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "nothing" => TokenKind::KwNothing,
            _ => TokenKind::Identifier(interner.intern(text)),
        }
    }

    fn number(&mut self, start: (u32, u32)) -> RunResult<TokenKind> {
        let digits_start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        // A '.' followed by a digit, or an exponent, makes this a real.
        let mut is_real = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            is_real = true;
            self.bump();
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                lookahead = 2;
            }
            if self.peek_at(lookahead).is_some_and(|b| b.is_ascii_digit()) {
                is_real = true;
                for _ in 0..=lookahead {
                    self.bump();
                }
                while let Some(b) = self.peek() {
                    if b.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        let text = std::str::from_utf8(&self.source[digits_start..self.pos]).expect("number bytes are ASCII");
        if is_real {
            let value: f64 = text.parse().map_err(|_| self.error("invalid real literal", start))?;
            Ok(TokenKind::Real(value))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.error("integer literal out of range", start))?;
            Ok(TokenKind::Integer(value))
        }
    }

    fn escape(&mut self, start: (u32, u32)) -> RunResult<u8> {
        let Some(byte) = self.bump() else {
            return Err(self.error("unterminated escape sequence", start));
        };
        Ok(match byte {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'0' => 0,
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            other => return Err(self.error(format!("unknown escape '\\{}'", other as char), start)),
        })
    }

    fn string(&mut self, start: (u32, u32)) -> RunResult<TokenKind> {
        self.bump(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => return Ok(TokenKind::Str(bytes)),
                Some(b'\\') => bytes.push(self.escape(start)?),
                Some(b'\n') | None => return Err(self.error("unterminated string literal", start)),
                Some(b) => bytes.push(b),
            }
        }
    }

    fn character(&mut self, start: (u32, u32)) -> RunResult<TokenKind> {
        self.bump(); // opening quote
        let byte = match self.bump() {
            Some(b'\\') => self.escape(start)?,
            Some(b'\'') | None => return Err(self.error("empty character literal", start)),
            Some(b) => b,
        };
        if !self.eat(b'\'') {
            return Err(self.error("unterminated character literal", start));
        }
        Ok(TokenKind::Character(byte))
    }

    fn punctuation(&mut self, start: (u32, u32)) -> RunResult<TokenKind> {
        let byte = self.bump().expect("caller checked a byte is present");
        Ok(match byte {
            b'+' => {
                if self.eat(b'+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    TokenKind::MinusMinus
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'&' => {
                if self.eat(b'&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            b'^' => TokenKind::Caret,
            b'~' => TokenKind::Tilde,
            b'!' => {
                if self.eat(b'=') {
                    TokenKind::Neq
                } else {
                    TokenKind::Bang
                }
            }
            b'<' => {
                if self.eat(b'<') {
                    TokenKind::Shl
                } else if self.eat(b'=') {
                    TokenKind::Leq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    TokenKind::Shr
                } else if self.eat(b'=') {
                    TokenKind::Geq
                } else {
                    TokenKind::Gt
                }
            }
            b'=' => {
                if self.eat(b'=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            other => {
                return Err(self.error(format!("unexpected character '{}'", other as char), start));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        Lexer::new(source, file)
            .tokenize(&mut interner)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_expression_tokens() {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let tokens = Lexer::new("a = 1 + 2.5;", file).tokenize(&mut interner).unwrap();
        let a = interner.get("a").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier(a));
        assert_eq!(tokens[1].kind, TokenKind::Assign);
        assert_eq!(tokens[2].kind, TokenKind::Integer(1));
        assert_eq!(tokens[3].kind, TokenKind::Plus);
        assert_eq!(tokens[4].kind, TokenKind::Real(2.5));
        assert_eq!(tokens[5].kind, TokenKind::Semicolon);
        assert_eq!(tokens[6].kind, TokenKind::Eof);
    }

    #[test]
    fn distinguishes_compound_operators() {
        assert_eq!(
            lex("++ + -- - << <= < == ="),
            vec![
                TokenKind::PlusPlus,
                TokenKind::Plus,
                TokenKind::MinusMinus,
                TokenKind::Minus,
                TokenKind::Shl,
                TokenKind::Leq,
                TokenKind::Lt,
                TokenKind::EqEq,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_and_character_escapes() {
        assert_eq!(
            lex(r#""ab\ncd" '\t'"#),
            vec![
                TokenKind::Str(b"ab\ncd".to_vec()),
                TokenKind::Character(b'\t'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            lex("1 // line\n/* block\nstill */ 2"),
            vec![TokenKind::Integer(1), TokenKind::Integer(2), TokenKind::Eof]
        );
    }

    #[test]
    fn tracks_token_areas() {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let tokens = Lexer::new("ab\n  cde", file).tokenize(&mut interner).unwrap();
        assert_eq!(tokens[0].area, SourceArea::new(file, 1, 1, 1, 2));
        assert_eq!(tokens[1].area, SourceArea::new(file, 2, 3, 2, 5));
    }

    #[test]
    fn reports_unterminated_string() {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let err = Lexer::new("\"oops", file).tokenize(&mut interner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let tokens = Lexer::new("while whilex", file).tokenize(&mut interner).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::KwWhile);
        let TokenKind::Identifier(id) = tokens[1].kind else {
            panic!("expected an identifier, got {:?}", tokens[1].kind);
        };
        assert_eq!(interner.name_of(id), "whilex");
    }
}
