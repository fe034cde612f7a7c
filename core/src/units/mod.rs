//! Distance unformatting for numeric literals.
//!
//! Turns a literal span such as `12.5`, `5'-6 1/2"` or `1/2"` into a value
//! in inches. The lexer hands every number span to an [`Unformat`]
//! implementation and backtracks when it refuses the text.

use crate::formula::chars;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    Inch,
    Foot,
}

impl LengthUnit {
    pub fn to_inches(&self, value: f64) -> f64 {
        match self {
            Self::Inch => value,
            Self::Foot => value * 12.0,
        }
    }
}

/// Converts the text of a number literal into a double.
///
/// Returning `None` rejects the span; the lexer then retries with a shorter one.
pub trait Unformat {
    fn unformat(&self, text: &str) -> Option<f64>;
}

/// Decimal and architectural (feet-inches-fraction) distances, in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Architectural;

impl Unformat for Architectural {
    fn unformat(&self, text: &str) -> Option<f64> {
        unformat_distance(text)
    }
}

/// Parse a distance string into inches.
///
/// Accepted forms: `12.5`, `1e3`, `5'`, `5'6`, `5'-6"`, `5' 6 1/2"`, `6"`,
/// `6-1/2"`, `6 1/2"`, `1/2"`, each with an optional leading `-`. A fraction
/// without a feet part must be closed by an inch-mark.
pub fn unformat_distance(text: &str) -> Option<f64> {
    let mut cursor = Cursor::new(text);
    let negative = cursor.eat(chars::is_minus);
    let value = cursor.distance()?;
    if !cursor.at_end() {
        return None;
    }
    Some(if negative { -value } else { value })
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, pred: fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if pred(c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn distance(&mut self) -> Option<f64> {
        if let Some(fraction) = self.fraction() {
            return self.eat(chars::is_inch_mark).then_some(fraction);
        }

        let lead = self.decimal()?;

        if self.eat(chars::is_foot_mark) {
            let feet = LengthUnit::Foot.to_inches(lead);
            if self.at_end() {
                return Some(feet);
            }
            self.eat(chars::is_spacer);
            let inches = self.inches()?;
            self.eat(chars::is_inch_mark);
            return Some(feet + inches);
        }

        if self.eat(chars::is_inch_mark) || self.at_end() {
            return Some(lead);
        }

        // Whole inches plus a fraction, closed by the inch-mark.
        if !self.eat(chars::is_spacer) {
            return None;
        }
        let fraction = self.fraction()?;
        self.eat(chars::is_inch_mark).then_some(lead + fraction)
    }

    // Inches after a feet part: `6`, `6.5`, `1/2`, `6-1/2` or `6 1/2`.
    fn inches(&mut self) -> Option<f64> {
        if let Some(fraction) = self.fraction() {
            return Some(fraction);
        }
        let whole = self.decimal()?;
        let mark = self.pos;
        if self.eat(chars::is_spacer) {
            if let Some(fraction) = self.fraction() {
                return Some(whole + fraction);
            }
            self.pos = mark;
        }
        Some(whole)
    }

    // `digits '/' digits` with a non-zero denominator; restores the cursor on failure.
    fn fraction(&mut self) -> Option<f64> {
        let start = self.pos;
        let numerator = self.digits();
        if numerator.is_empty() || !self.eat(chars::is_fraction) {
            self.pos = start;
            return None;
        }
        let denominator = self.digits();
        let value = match (numerator.parse::<f64>(), denominator.parse::<f64>()) {
            (Ok(n), Ok(d)) if d != 0.0 => Some(n / d),
            _ => None,
        };
        if value.is_none() {
            self.pos = start;
        }
        value
    }

    fn digits(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !chars::is_digit(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }

    // Digits and dots with an optional exponent suffix.
    fn decimal(&mut self) -> Option<f64> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !(chars::is_digit(c) || chars::is_dot(c)) {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        if !text.chars().any(chars::is_digit) {
            return None;
        }

        if self.peek().is_some_and(chars::is_exponent) {
            let signed = self.peek_at(1).is_some_and(chars::is_signum);
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(chars::is_digit) {
                for _ in 0..digit_at {
                    text.extend(self.peek());
                    self.pos += 1;
                }
                text.push_str(&self.digits());
            }
        }

        text.parse::<f64>().ok()
    }
}
