//! Error types
//!
//! Pattern errors are raised synchronously by [`Fsa::build`](crate::fsa::Fsa::build).
//! Parse errors are recorded by the combinators while parsing and surfaced by
//! [`Parser`](crate::parser::Parser). Each error carries enough position
//! information to point at the offending input.
//!
//! # Example Output
//!
//! ```text
//! Error at line 1, column 5:
//! 1 + * 2
//!     ^
//! Expected operand after '+' but found '*' (token 4)
//! ```

use crate::fsa::TokenId;
use crate::source_location::SourcePosition;
use std::fmt;

/// Error raised while compiling a pattern into an automaton
///
/// Offsets are byte offsets into the pattern text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A character that cannot appear at this position
    UnexpectedChar {
        /// Byte offset of the character
        offset: usize,
        /// The offending character
        found: char,
    },

    /// A required delimiter or value is missing
    ExpectedToken {
        /// Byte offset where it was expected
        offset: usize,
        /// What was expected (e.g. "')'", "numeric value")
        expected: &'static str,
    },

    /// A repetition was applied to something that can match the empty string
    EmptyRepetition {
        /// Byte offset of the quantifier
        offset: usize,
    },

    /// A bounded repetition whose upper bound is below its lower bound
    RangeBounds {
        /// Byte offset of the upper bound
        offset: usize,
        /// Lower bound
        lower: usize,
        /// Upper bound
        upper: usize,
    },

    /// A character class range whose end does not come after its start
    InvalidClassRange {
        /// Byte offset of the range end
        offset: usize,
        /// Range start
        start: char,
        /// Range end
        end: char,
    },

    /// Groups nested deeper than the compiler allows
    NestingTooDeep {
        /// Byte offset of the first group past the limit
        offset: usize,
        /// Maximum nesting depth
        limit: usize,
    },

    /// The automaton was already converted and can no longer be extended
    FrozenAutomaton,
}

impl PatternError {
    /// Byte offset into the pattern, if the error has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            PatternError::UnexpectedChar { offset, .. }
            | PatternError::ExpectedToken { offset, .. }
            | PatternError::EmptyRepetition { offset }
            | PatternError::RangeBounds { offset, .. }
            | PatternError::InvalidClassRange { offset, .. }
            | PatternError::NestingTooDeep { offset, .. } => Some(*offset),
            PatternError::FrozenAutomaton => None,
        }
    }

    /// Human-readable reason, without the offset
    pub fn reason(&self) -> String {
        match self {
            PatternError::UnexpectedChar { found, .. } => format!("Unexpected '{}'", found),
            PatternError::ExpectedToken { expected, .. } => format!("Expected {}", expected),
            PatternError::EmptyRepetition { .. } => {
                "Cannot use '+', '{}', or '*' on the empty string".to_string()
            }
            PatternError::RangeBounds { lower, upper, .. } => format!(
                "Loop upper bound {} must be greater than or equal to lower bound {}",
                upper, lower
            ),
            PatternError::InvalidClassRange { start, end, .. } => {
                format!("Range end '{}' must be greater than '{}'", end, start)
            }
            PatternError::NestingTooDeep { limit, .. } => {
                format!("Groups nested more than {} levels deep", limit)
            }
            PatternError::FrozenAutomaton => {
                "Automaton is frozen and cannot be extended".to_string()
            }
        }
    }

    /// Whether this is a plain syntax error (as opposed to a repetition error)
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            PatternError::UnexpectedChar { .. }
                | PatternError::ExpectedToken { .. }
                | PatternError::InvalidClassRange { .. }
        )
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset() {
            Some(offset) => write!(f, "{} at offset {}", self.reason(), offset),
            None => write!(f, "{}", self.reason()),
        }
    }
}

impl std::error::Error for PatternError {}

/// Error type for parse operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required token or operand was not found
    UnexpectedToken {
        /// Description of what was required
        expected: String,
        /// Token id found instead (`-1` at end of input, `0` if nothing matched)
        found: TokenId,
        /// Text of the token found instead
        found_text: String,
        /// Where the token was found
        position: SourcePosition,
    },

    /// Parsing was cancelled through a cancellation token
    Cancelled,

    /// The scheduler dispatched more steps than allowed
    StepLimitExceeded {
        /// Maximum allowed steps
        max_steps: usize,
    },

    /// Timeout exceeded during parsing
    TimeoutExceeded {
        /// Time elapsed in milliseconds
        elapsed_ms: u64,
        /// Timeout limit in milliseconds
        timeout_ms: u64,
    },

    /// Input exceeds maximum allowed size
    InputTooLarge {
        /// Size of the input in bytes
        input_size: usize,
        /// Maximum allowed size
        max_size: usize,
    },

    /// A rule reference could not be resolved at parse time
    UndefinedRule {
        /// Name of the missing rule
        name: String,
    },
}

impl ParseError {
    /// Position in the source, for errors that have one
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            ParseError::UnexpectedToken { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Format with the offending source line and a caret under the column
    pub fn format_with_source(&self, source: &str) -> String {
        match self.position() {
            Some(position) => format!(
                "Error at {}:\n{}\n{}",
                position,
                position.format_with_underline(source),
                self
            ),
            None => self.to_string(),
        }
    }
}

fn describe_found(found: TokenId, text: &str) -> String {
    match found {
        -1 => "end of input".to_string(),
        0 if text.is_empty() => "unrecognized input".to_string(),
        _ => format!("'{}' (token {})", text, found),
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                found_text,
                ..
            } => write!(
                f,
                "Expected {} but found {}",
                expected,
                describe_found(*found, found_text)
            ),
            ParseError::Cancelled => write!(f, "Parsing was cancelled"),
            ParseError::StepLimitExceeded { max_steps } => {
                write!(f, "Parsing exceeded the limit of {} steps", max_steps)
            }
            ParseError::TimeoutExceeded {
                elapsed_ms,
                timeout_ms,
            } => write!(
                f,
                "Parsing timed out after {} ms (limit {} ms)",
                elapsed_ms, timeout_ms
            ),
            ParseError::InputTooLarge {
                input_size,
                max_size,
            } => write!(
                f,
                "Input of {} bytes exceeds the maximum of {} bytes",
                input_size, max_size
            ),
            ParseError::UndefinedRule { name } => write!(f, "Undefined rule '{}'", name),
        }
    }
}

impl std::error::Error for ParseError {}

/// A grammar refers to rules it never defines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A rule reference names no defined rule
    UndefinedRule {
        /// The missing rule name
        name: String,
    },
    /// The grammar has no rules at all
    Empty,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UndefinedRule { name } => {
                write!(f, "Rule '{}' is referenced but never defined", name)
            }
            GrammarError::Empty => write!(f, "Grammar has no rules"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// A token definition in a token table failed to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenTableError {
    /// The pattern of a named token is invalid
    Pattern {
        /// Name of the token definition
        name: String,
        /// The pattern error
        error: PatternError,
    },
    /// The table has more entries than the id space below the discard id allows
    TooManyTokens {
        /// Number of non-discarded entries
        count: usize,
    },
    /// The table could not be decoded from JSON
    Json {
        /// Decoder message
        message: String,
    },
}

impl fmt::Display for TokenTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenTableError::Pattern { name, error } => {
                write!(f, "Invalid pattern for token '{}': {}", name, error)
            }
            TokenTableError::TooManyTokens { count } => {
                write!(f, "Token table has too many entries ({})", count)
            }
            TokenTableError::Json { message } => write!(f, "Invalid token table: {}", message),
        }
    }
}

impl std::error::Error for TokenTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TokenTableError::Pattern { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A serialized automaton could not be restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// What was wrong with the input
    pub message: String,
}

impl FormatError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid serialized automaton: {}", self.message)
    }
}

impl std::error::Error for FormatError {}
