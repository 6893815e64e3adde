//! tramlex - automaton compiler, lexer and trampolined parser runtime
//!
//! tramlex turns user-supplied token patterns and operator grammars into
//! working tokenizers and parsers at run time. It provides:
//! - A compiler from a small regular-expression language to an NFA
//! - Subset construction (NFA to DFA) and partition-refinement minimization
//! - Longest-match scanning with lowest-id tie-breaking over either form
//! - A token stream with one token of lookahead and discardable tokens
//! - A work-queue/tail-stack trampoline that runs continuation-passing code
//!   in constant host stack, with cancellation, step and time limits
//! - Precedence-climbing productions (prefix, infix, postfix, dispatch,
//!   delimiters) that run on that trampoline
//! - Developer tools (tree printing, DOT/Mermaid automaton diagrams)
//!
//! ## Quick Start
//!
//! ```rust
//! use tramlex::fsa::{Fsa, DISCARD_TOKEN};
//!
//! let mut nfa = Fsa::new();
//! nfa.build("if", 1).unwrap();
//! nfa.build("[a-z]+", 2).unwrap();
//! nfa.build("[ \t]+", DISCARD_TOKEN).unwrap();
//! let dfa = nfa.minimize();
//!
//! assert_eq!(dfa.search("if x", 0).token, 1);
//! assert_eq!(dfa.search("iffy", 0).token, 2);
//! ```
//!
//! ## Parsing
//!
//! ```rust
//! use tramlex::prelude::*;
//!
//! let table = TokenTable::new(vec![
//!     TokenDef::new("Number", "[0-9]+"),
//!     TokenDef::new("Minus", "-"),
//!     TokenDef::skip("Space", " +"),
//! ])
//! .unwrap();
//!
//! let number = table.id("Number").unwrap();
//! let minus = table.id("Minus").unwrap();
//! let grammar = GrammarBuilder::new()
//!     .rule(
//!         "difference",
//!         infix_postfix_operator(vec![OperatorDef::binary(minus)], literal(&[number]), Assoc::Left),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let tree = Parser::from_table(&table, grammar).parse("7 - 2 - 1").unwrap();
//! assert_eq!(tree.to_expr().unwrap().to_string(), "(- (- 7 2) 1)");
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Run batch tokenizing and parsing on rayon

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

// Debug logging, compiled out unless the `logging` feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

// Prelude module for convenient imports
pub mod prelude;

pub mod debug;
pub mod error;
pub mod fsa;
pub mod lexer;
pub mod parallel;
pub mod parser;
pub mod source_location;

/// Re-export commonly used types for convenience
pub use error::{FormatError, GrammarError, ParseError, PatternError, TokenTableError};
pub use fsa::{Fsa, Match, StateId, TokenId, DISCARD_TOKEN, END_OF_INPUT, NO_MATCH};
pub use lexer::{Token, TokenDef, TokenStream, TokenTable};
pub use parser::{
    Assoc, CancellationToken, Expr, Grammar, GrammarBuilder, ParseNode, Parser, ParserConfig,
    Production,
};
pub use source_location::SourcePosition;
