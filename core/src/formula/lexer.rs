//! Tokenizer for formula text.
//!
//! Produces the whole token stream up front, each token annotated with its
//! byte span in the source so the parser can rewrite names afterwards.

use super::chars;
use super::error::ParseError;
use crate::units::{LengthUnit, Unformat};
use std::ops::Range;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// Identifier, lower-cased
    Name(String),
    Plus,
    Minus,
    Percent,
    Star,
    Slash,
    Caret,
    LParen,
    Comma,
    RParen,
    /// A `+` or `-` directly after an arithmetic operator
    Blank,
    End,
}

impl TokenKind {
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Plus | Self::Minus | Self::Percent | Self::Star | Self::Slash | Self::Caret | Self::Blank
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Split `input` into tokens, ending with exactly one [`TokenKind::End`].
pub fn tokenize(input: &str, units: &dyn Unformat) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(input, units);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::End;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
    previous: Option<TokenKind>,
    units: &'a dyn Unformat,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, units: &'a dyn Unformat) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            position: 0,
            previous: None,
            units,
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek() else {
            let end = self.offset(start);
            return Ok(Token {
                kind: TokenKind::End,
                span: end..end,
            });
        };

        let kind = if self.at_number(c) {
            self.read_number()?
        } else if chars::is_word(c) {
            self.read_identifier()
        } else {
            let kind = match c {
                '+' | '-' if self.after_operator() => TokenKind::Blank,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '%' => TokenKind::Percent,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '^' => TokenKind::Caret,
                '(' => TokenKind::LParen,
                ',' => TokenKind::Comma,
                ')' => TokenKind::RParen,
                _ => {
                    return Err(ParseError::new(
                        format!("Unexpected character: '{}'", c),
                        self.offset(start),
                    ))
                }
            };
            self.advance();
            kind
        };

        self.previous = Some(kind.clone());
        Ok(Token {
            kind,
            span: self.offset(start)..self.offset(self.position),
        })
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).map(|&(_, c)| c)
    }

    fn digit_at(&self, offset: usize) -> bool {
        self.peek_at(offset).is_some_and(chars::is_digit)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Byte offset of the char at `index`.
    fn offset(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map_or(self.input.len(), |&(byte, _)| byte)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[self.offset(start)..self.offset(end)]
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(chars::is_space) {
            self.advance();
        }
    }

    fn after_operator(&self) -> bool {
        self.previous.as_ref().is_some_and(TokenKind::is_operator)
    }

    /// A sign can only open a literal at the start, or after `(` or `,`.
    fn admits_sign(&self) -> bool {
        matches!(
            self.previous,
            None | Some(TokenKind::LParen) | Some(TokenKind::Comma)
        )
    }

    fn lead_at(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some(c) if chars::is_digit(c) => true,
            Some(c) if chars::is_dot(c) => self.digit_at(offset + 1),
            _ => false,
        }
    }

    fn at_number(&self, c: char) -> bool {
        if chars::is_numeric_lead(c) {
            return self.lead_at(0);
        }
        if chars::is_signum(c) && self.admits_sign() {
            let mut offset = 1;
            while self.peek_at(offset).is_some_and(chars::is_space) {
                offset += 1;
            }
            return self.lead_at(offset);
        }
        false
    }

    fn read_number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.position;
        let negative = match self.peek() {
            Some(c) if chars::is_signum(c) => {
                self.advance();
                self.skip_whitespace();
                chars::is_minus(c)
            }
            _ => false,
        };

        let body = self.position;
        self.scan_decimal();
        let plain_end = self.position;

        let value = if self.peek().is_some_and(chars::is_inch_mark) {
            self.advance();
            self.convert(body, self.position)
        } else {
            self.read_architectural(body, plain_end)
        };

        let value = value.ok_or_else(|| {
            ParseError::new(
                format!("Invalid number: '{}'", self.slice(start, self.position)),
                self.offset(start),
            )
        })?;
        Ok(TokenKind::Number(if negative { -value } else { value }))
    }

    /// Feet, inches and fractions after the leading decimal.
    ///
    /// When the unformatter refuses the longest span, the cursor falls back
    /// once to just before the first `-`, ` ` or `/` separator and the shorter
    /// span is converted instead.
    fn read_architectural(&mut self, body: usize, plain_end: usize) -> Option<f64> {
        let mut boundary = None;
        let mut feet = false;
        let mut fraction = false;

        if self.peek().is_some_and(chars::is_foot_mark) {
            feet = true;
            self.advance();
            if self.peek().is_some_and(chars::is_spacer) && self.digit_at(1) {
                self.advance();
            }
            self.scan_whole();
        }

        if self.peek().is_some_and(chars::is_fraction) && self.digit_at(1) {
            boundary.get_or_insert(self.position);
            self.advance();
            self.scan_digits();
            fraction = true;
        } else if self.peek().is_some_and(chars::is_spacer) && self.digit_at(1) {
            boundary.get_or_insert(self.position);
            self.advance();
            self.scan_digits();
            if self.peek().is_some_and(chars::is_fraction) && self.digit_at(1) {
                self.advance();
                self.scan_digits();
                fraction = true;
            }
        }

        let mut foot_fraction = false;
        if self.peek().is_some_and(chars::is_inch_mark) {
            self.advance();
        } else if fraction && !feet && self.peek().is_some_and(chars::is_foot_mark) {
            self.advance();
            foot_fraction = true;
        }

        if self.position == plain_end {
            return self.convert(body, plain_end);
        }

        let candidate = if foot_fraction {
            self.convert_foot_fraction(body, self.position)
        } else {
            self.convert(body, self.position)
        };
        if candidate.is_some() {
            return candidate;
        }

        let retreat = boundary.unwrap_or(plain_end);
        self.position = retreat;
        self.convert(body, retreat)
    }

    fn convert(&self, start: usize, end: usize) -> Option<f64> {
        self.units.unformat(self.slice(start, end))
    }

    // `N/D'` without an inch-mark: convert as inches, then scale to feet.
    fn convert_foot_fraction(&self, start: usize, end: usize) -> Option<f64> {
        let inches = format!("{}\"", self.slice(start, end - 1));
        self.units
            .unformat(&inches)
            .map(|value| LengthUnit::Foot.to_inches(value))
    }

    fn scan_digits(&mut self) {
        while self.digit_at(0) {
            self.advance();
        }
    }

    fn scan_whole(&mut self) {
        while self
            .peek()
            .is_some_and(|c| chars::is_digit(c) || chars::is_dot(c))
        {
            self.advance();
        }
    }

    fn scan_decimal(&mut self) {
        self.scan_whole();
        if self.peek().is_some_and(chars::is_exponent) {
            let signed = self.peek_at(1).is_some_and(chars::is_signum);
            let digit_at = if signed { 2 } else { 1 };
            if self.digit_at(digit_at) {
                self.position += digit_at;
                self.scan_digits();
            }
        }
    }

    fn read_identifier(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek().is_some_and(chars::is_word) {
            self.advance();
        }
        TokenKind::Name(self.slice(start, self.position).to_lowercase())
    }
}
