//! Tokenizer for the SSSOM/T surface grammar (component H).
//!
//! Modelled on `linkml-service::expression::parser`'s hand-written
//! `Tokenizer` over a peekable `Chars` iterator, generalised to the
//! SSSOM/T token set (CURIE-like bare words, glob/empty/absent markers,
//! significant newlines).

use crate::error::{Result, SssomError};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier, CURIE, glob pattern, or the `~` absent marker — any
    /// maximal run of `[A-Za-z0-9_:.\-*~]`. The grammar's `ident`, `slot`,
    /// and bare `value` productions all lex to this one kind; the parser
    /// disambiguates by position.
    Word(String),
    /// A single- or double-quoted string, already unescaped.
    Str(String),
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
    Assign,
    Arrow,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Slash,
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '*' | '~' | '/' | '#')
}

/// `/` doubles as both a word-char (inside an IRI-shaped bare word) and the
/// keyword-argument separator punctuation. A bare word absorbs it only when
/// at least one alnum/`:`/`.`/`-` char has already been seen in this run,
/// so a lone `/` before a `kw=` pair still lexes as [`TokenKind::Slash`].
struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else if c.is_some() {
            self.column += 1;
        }
        c
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.is_comment_start() {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn is_comment_start(&mut self) -> bool {
        let mut clone = self.chars.clone();
        clone.next();
        clone.peek() == Some(&'/')
    }

    fn read_string(&mut self, quote: char) -> Result<TokenKind> {
        let (line, column) = (self.line, self.column);
        self.advance();
        let mut out = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(SssomError::dsl_parse(
                        "unterminated string literal",
                        line,
                        column,
                    ))
                }
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => {
                        return Err(SssomError::dsl_parse(
                            "unterminated escape in string literal",
                            line,
                            column,
                        ))
                    }
                },
                Some(c) => out.push(c),
            }
        }
        Ok(TokenKind::Str(out))
    }

    fn read_word(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_word_char(c) {
                out.push(c);
                self.advance();
            } else {
                break;
            }
        }
        out
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_inline_whitespace();
        let (line, column) = (self.line, self.column);
        let Some(&c) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };
        let kind = match c {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '"' | '\'' => self.read_string(c)?,
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            '[' => {
                self.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.advance();
                TokenKind::RBracket
            }
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            '=' => {
                self.advance();
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '>' => {
                self.advance();
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '<' => {
                self.advance();
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '!' => {
                self.advance();
                TokenKind::Bang
            }
            '&' => {
                self.advance();
                if self.chars.peek() == Some(&'&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    return Err(SssomError::dsl_parse("unexpected '&'", line, column));
                }
            }
            '|' => {
                self.advance();
                if self.chars.peek() == Some(&'|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    return Err(SssomError::dsl_parse("unexpected '|'", line, column));
                }
            }
            '-' if matches!(self.peek_second(), Some('>')) => {
                self.advance();
                self.advance();
                TokenKind::Arrow
            }
            c if is_word_char(c) => TokenKind::Word(self.read_word()),
            other => {
                return Err(SssomError::dsl_parse(
                    format!("unexpected character '{other}'"),
                    line,
                    column,
                ))
            }
        };
        Ok(Token { kind, line, column })
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }
}

/// Tokenize an entire SSSOM/T source string, including a trailing `Eof`.
///
/// # Errors
/// Returns [`SssomError::DslParse`] on an unterminated string or an
/// unrecognised character.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tok = Tokenizer::new(input);
    let mut out = Vec::new();
    loop {
        let next = tok.next_token()?;
        let is_eof = next.kind == TokenKind::Eof;
        out.push(next);
        if is_eof {
            break;
        }
    }
    Ok(out)
}
