//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions.
//! Importing it with a wildcard brings the core types into scope:
//!
//! ```
//! use tramlex::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Automata
//! - [`Fsa`] - automaton arena; build, determinize, minimize, search
//! - [`Match`] - result of a longest-match search
//! - [`TokenId`], [`DISCARD_TOKEN`], [`END_OF_INPUT`], [`NO_MATCH`]
//!
//! ## Lexing
//! - [`TokenDef`], [`TokenTable`] - named token patterns
//! - [`TokenStream`], [`Token`] - lexer cursor and its tokens
//!
//! ## Parsing
//! - [`literal`], [`prefix_operator`], [`infix_postfix_operator`],
//!   [`first_set`], [`body`], [`rule`] - production constructors
//! - [`OperatorDef`], [`Assoc`] - operator registrations
//! - [`GrammarBuilder`], [`Grammar`] - named rules
//! - [`Parser`], [`ParserConfig`], [`CancellationToken`] - running a grammar
//! - [`ParseNode`], [`Expr`] - results
//!
//! ## Errors
//! - [`PatternError`], [`ParseError`], [`GrammarError`], [`TokenTableError`]

pub use crate::error::{GrammarError, ParseError, PatternError, TokenTableError};
pub use crate::fsa::{Fsa, Match, TokenId, DISCARD_TOKEN, END_OF_INPUT, NO_MATCH};
pub use crate::lexer::{Token, TokenDef, TokenStream, TokenTable};
pub use crate::parser::production::{
    body, first_set, infix_postfix_operator, literal, prefix_operator, rule,
};
pub use crate::parser::{
    Assoc, CancellationToken, Expr, Grammar, GrammarBuilder, OperatorDef, ParseNode, Parser,
    ParserConfig, Production,
};
