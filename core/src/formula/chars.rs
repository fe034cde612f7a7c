//! Single-character classifiers shared by the lexer and the units unformatter.

pub fn is_signum(c: char) -> bool {
    c == '+' || c == '-'
}

pub fn is_minus(c: char) -> bool {
    c == '-'
}

pub fn is_fraction(c: char) -> bool {
    c == '/'
}

/// Separator between whole inches and a fraction, or after a foot-mark.
pub fn is_spacer(c: char) -> bool {
    c == '-' || c == ' '
}

pub fn is_exponent(c: char) -> bool {
    c == 'e' || c == 'E'
}

pub fn is_dot(c: char) -> bool {
    c == '.'
}

pub fn is_numeric_lead(c: char) -> bool {
    is_digit(c) || is_dot(c)
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_space(c: char) -> bool {
    c.is_whitespace()
}

/// Identifier character: underscore or any Unicode alphanumeric.
pub fn is_word(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

pub fn is_foot_mark(c: char) -> bool {
    c == '\''
}

pub fn is_inch_mark(c: char) -> bool {
    c == '"'
}
