//! Lexing of bez glyph programs.

use types::Fixed;

use super::{decrypt::is_whitespace, Error};

/// Longest glyph name accepted in the leading comment.
pub const MAX_GLYPH_NAME_LEN: usize = 63;

/// A lexical item in a bez program.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Token<'a> {
    /// A numeric operand, rounded to hundredths.
    Number(Fixed),
    /// An operator name.
    Operator(&'a [u8]),
    /// Text following a `%` up to the end of the line.
    Comment(&'a [u8]),
}

impl Token<'_> {
    /// Returns the glyph name carried by a comment token, if any.
    ///
    /// The name is the first whitespace delimited word of the comment.
    pub fn glyph_name(&self) -> Result<Option<&str>, Error> {
        let Token::Comment(text) = self else {
            return Ok(None);
        };
        let Some(start) = text.iter().position(|b| !is_whitespace(*b)) else {
            return Ok(None);
        };
        let word = &text[start..];
        let end = word
            .iter()
            .position(|b| is_whitespace(*b))
            .unwrap_or(word.len());
        if end > MAX_GLYPH_NAME_LEN {
            return Err(Error::MalformedName);
        }
        std::str::from_utf8(&word[..end])
            .map(Some)
            .map_err(|_| Error::MalformedName)
    }
}

/// Iterator over the tokens of a bez program.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Byte offset of the next unread token.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.data.get(self.pos) {
            if !is_whitespace(*c) {
                break;
            }
            self.pos += 1;
        }
    }

    fn read_until(&mut self, stop: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while let Some(c) = self.data.get(self.pos) {
            if stop(*c) {
                break;
            }
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let first = *self.data.get(self.pos)?;
        if first == b'%' {
            self.pos += 1;
            let text = self.read_until(|c| c == b'\n' || c == b'\r');
            return Some(Ok(Token::Comment(text)));
        }
        let lexeme = self.read_until(|c| is_whitespace(c) || c == b'%');
        Some(classify(lexeme))
    }
}

fn classify(lexeme: &[u8]) -> Result<Token<'_>, Error> {
    match lexeme.first() {
        Some(c) if c.is_ascii_alphabetic() => Ok(Token::Operator(lexeme)),
        Some(b'0'..=b'9' | b'-' | b'+' | b'.') => decode_number(lexeme)
            .map(Token::Number)
            .ok_or_else(|| Error::MalformedNumber(String::from_utf8_lossy(lexeme).into())),
        _ => Err(Error::UnknownOperator(
            String::from_utf8_lossy(lexeme).into(),
        )),
    }
}

/// Parses a decimal number, rounding to the nearest hundredth.
fn decode_number(lexeme: &[u8]) -> Option<Fixed> {
    let (negative, digits) = match lexeme.split_first()? {
        (b'-', rest) => (true, rest),
        (b'+', rest) => (false, rest),
        _ => (false, lexeme),
    };
    let (int_part, frac_part) = match digits.iter().position(|c| *c == b'.') {
        Some(dot) => (&digits[..dot], &digits[dot + 1..]),
        None => (digits, &digits[digits.len()..]),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part
        .iter()
        .chain(frac_part)
        .all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let mut hundredths: i64 = 0;
    for c in int_part {
        hundredths = hundredths.checked_mul(10)?.checked_add((c - b'0') as i64)?;
    }
    hundredths = hundredths.checked_mul(100)?;
    let digit_at = |i: usize| frac_part.get(i).map(|c| (c - b'0') as i64).unwrap_or(0);
    hundredths += digit_at(0) * 10 + digit_at(1);
    if digit_at(2) >= 5 {
        hundredths += 1;
    }
    if negative {
        hundredths = -hundredths;
    }
    Some(Fixed::from_hundredths(hundredths))
}
