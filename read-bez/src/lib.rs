//! Reading bez glyph programs.
//!
//! A bez program is the textual charstring form used by the autohinter:
//! whitespace separated operands and operators such as
//! `% A sc 0 0 mt 500 0 rdt cp ed`. This crate decrypts such buffers when
//! needed, tokenises them and evaluates the operators into absolute
//! path commands delivered to a [`CommandSink`].

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;

mod charstring;
pub mod decrypt;
mod stack;
mod token;

/// Public re-export of the bez-types crate.
pub extern crate bez_types as types;

pub use charstring::{evaluate, CommandSink, HintKind, Operator};
pub use stack::{Stack, MAX_STACK};
pub use token::{Token, Tokenizer, MAX_GLYPH_NAME_LEN};

/// Errors that may occur while reading a bez program.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// More operands were pushed than the stack can hold.
    StackOverflow,
    /// An operator required more operands than were available.
    StackUnderflow,
    /// A lexeme that is neither a number nor a known operator.
    UnknownOperator(String),
    /// A lexeme that looks like a number but could not be parsed.
    MalformedNumber(String),
    /// The glyph name comment exceeded the maximum length.
    MalformedName,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow => {
                write!(f, "operand stack overflow (limit is {MAX_STACK})")
            }
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::UnknownOperator(name) => write!(f, "unknown operator '{name}'"),
            Self::MalformedNumber(lexeme) => write!(f, "malformed number '{lexeme}'"),
            Self::MalformedName => write!(
                f,
                "glyph name is longer than {MAX_GLYPH_NAME_LEN} bytes"
            ),
        }
    }
}

impl std::error::Error for Error {}
