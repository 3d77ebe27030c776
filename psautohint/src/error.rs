//! Error types associated with hinting.

use core::fmt;

use bez_types::{Fixed, Point};

pub use read_bez::Error as ReadError;

/// How processing continues after an error has been reported.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    /// Logged; processing continues.
    Ok,
    /// The current glyph is abandoned; the session remains usable.
    NonFatal,
    /// The session is torn down and must be reset before reuse.
    Fatal,
}

/// Level of a message delivered to [`ReportSink::log`](crate::ReportSink::log).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// Errors that may occur while hinting a glyph.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum HintError {
    /// More than twenty operands were pushed.
    StackOverflow,
    /// An operator required more operands than were pushed.
    StackUnderflow,
    /// A lexeme that is neither a number nor a known operator.
    UnknownOperator(String),
    /// A lexeme that looks like a number but could not be parsed.
    MalformedNumber(String),
    /// The glyph name exceeded 63 bytes.
    MalformedName,
    /// The outline is structurally invalid.
    MalformedPath(String),
    /// The per-glyph arena ran out of space.
    ArenaExhausted { capacity: usize },
    /// A hint group would overflow the rasteriser's operand stack.
    HintStackExceeded { operands: usize },
    /// No flat was found when probing a curve for its inflection.
    InflectionFindFailed,
    /// Consecutive movetos were collapsed.
    DuplicateMoveTo(Point<Fixed>),
    /// A zero length segment was removed.
    ZeroLengthDegenerate(Point<Fixed>),
    /// The outline turns back on itself at a junction.
    SharpAngle(Point<Fixed>),
    /// The em square or design transform is missing or zero.
    ScalingMissing,
    /// The session hit a fatal error and has not been reset.
    SessionPoisoned,
}

impl HintError {
    /// Returns the severity used when the report sink does not override it.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::ArenaExhausted { .. } | Self::SessionPoisoned => Severity::Fatal,
            _ if self.is_diagnostic() => Severity::Ok,
            _ => Severity::NonFatal,
        }
    }

    /// Returns true for errors that describe the outline rather than
    /// prevent it from being hinted.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::DuplicateMoveTo(_)
                | Self::ZeroLengthDegenerate(_)
                | Self::SharpAngle(_)
                | Self::HintStackExceeded { .. }
                | Self::InflectionFindFailed
        )
    }

    /// Returns the level at which the error is logged.
    pub fn level(&self) -> Level {
        if self.is_diagnostic() {
            Level::Warning
        } else {
            Level::Error
        }
    }
}

impl From<ReadError> for HintError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::StackOverflow => Self::StackOverflow,
            ReadError::StackUnderflow => Self::StackUnderflow,
            ReadError::UnknownOperator(name) => Self::UnknownOperator(name),
            ReadError::MalformedNumber(lexeme) => Self::MalformedNumber(lexeme),
            ReadError::MalformedName => Self::MalformedName,
        }
    }
}

impl fmt::Display for HintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StackOverflow => write!(f, "operand stack overflow"),
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::UnknownOperator(name) => write!(f, "unknown operator '{name}'"),
            Self::MalformedNumber(lexeme) => write!(f, "malformed number '{lexeme}'"),
            Self::MalformedName => write!(
                f,
                "glyph name is longer than {} bytes",
                read_bez::MAX_GLYPH_NAME_LEN
            ),
            Self::MalformedPath(reason) => write!(f, "malformed path: {reason}"),
            Self::ArenaExhausted { capacity } => {
                write!(f, "glyph exceeded the {capacity} byte arena")
            }
            Self::HintStackExceeded { operands } => write!(
                f,
                "hint group needs {operands} operands; trimmed to {}",
                crate::synth::MAX_HINT_OPERANDS
            ),
            Self::InflectionFindFailed => write!(f, "could not find an inflection point"),
            Self::DuplicateMoveTo(at) => {
                write!(f, "removed duplicate moveto at ({}, {})", at.x, at.y)
            }
            Self::ZeroLengthDegenerate(at) => {
                write!(f, "removed zero length segment at ({}, {})", at.x, at.y)
            }
            Self::SharpAngle(at) => write!(f, "sharp angle at ({}, {})", at.x, at.y),
            Self::ScalingMissing => write!(f, "em square scaling is missing or zero"),
            Self::SessionPoisoned => {
                write!(f, "session stopped after a fatal error and must be reset")
            }
        }
    }
}

impl std::error::Error for HintError {}
