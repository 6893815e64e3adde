//! Trampolined precedence-climbing parser
//!
//! - [`trampoline`] - generic work-queue/tail-stack scheduler
//! - [`production`] - prefix, infix/postfix, dispatch and delimiter productions
//! - [`grammar`] - named rules and reference checking
//! - [`node`] - parse trees and their binary expression form
//!
//! # Example
//!
//! ```rust
//! use tramlex::lexer::{TokenDef, TokenTable};
//! use tramlex::parser::production::{infix_postfix_operator, literal, OperatorDef};
//! use tramlex::parser::{Assoc, GrammarBuilder, Parser};
//!
//! let table = TokenTable::new(vec![
//!     TokenDef::new("Number", "[0-9]+"),
//!     TokenDef::new("Add", "\\+"),
//!     TokenDef::new("Mul", "\\*"),
//!     TokenDef::skip("Space", " +"),
//! ])
//! .unwrap();
//! let id = |name: &str| table.id(name).unwrap();
//!
//! let product = infix_postfix_operator(
//!     vec![OperatorDef::binary(id("Mul"))],
//!     literal(&[id("Number")]),
//!     Assoc::Left,
//! );
//! let sum = infix_postfix_operator(vec![OperatorDef::binary(id("Add"))], product, Assoc::Left);
//! let grammar = GrammarBuilder::new().rule("sum", sum).build().unwrap();
//!
//! let parser = Parser::from_table(&table, grammar);
//! let tree = parser.parse("1 + 2 * 3").unwrap();
//! assert_eq!(tree.to_expr().unwrap().to_string(), "(+ 1 (* 2 3))");
//! ```

// =============================================================================
// Core modules
// =============================================================================

pub mod context;
pub mod driver;
pub mod grammar;
pub mod node;
pub mod production;
pub mod trampoline;

// =============================================================================
// Re-exports
// =============================================================================

pub use context::ParseContext;
pub use driver::{ParseReport, Parser, ParserConfig, DEFAULT_MAX_ERRORS, DEFAULT_MAX_INPUT_SIZE};
pub use grammar::{Grammar, GrammarBuilder};
pub use node::{Assoc, Expr, Lexeme, Member, ParseNode};
pub use production::{OperatorDef, ParseAgenda, Production, ProductionKind};
pub use trampoline::{
    Agenda, CancellationToken, ExecuteError, SchedulerConfig, Trampoline, WorkId,
};
