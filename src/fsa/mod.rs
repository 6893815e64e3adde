//! Finite state automata
//!
//! Pattern text is compiled into an epsilon-NFA, which can be searched as
//! is or converted into a (minimal) DFA:
//!
//! ```rust
//! use tramlex::fsa::Fsa;
//!
//! let mut nfa = Fsa::new();
//! nfa.build("[0-9]+", 1).unwrap();
//! nfa.build("[a-z][a-z0-9]*", 2).unwrap();
//! nfa.build("let", 3).unwrap();
//!
//! let dfa = nfa.to_deterministic().minimize();
//! assert_eq!(dfa.search("let", 0).token, 2);
//! assert_eq!(dfa.search("42", 0).text, "42");
//! ```
//!
//! Note that `let` matches token 2 above: at equal length the lowest id
//! wins, so keywords should be built before identifiers.
//!
//! # Module Organization
//!
//! - [`state`] - States, handles and the state arena
//! - [`builder`] - Pattern compiler
//! - [`determinize`] - Subset construction
//! - [`minimize`] - Partition refinement
//! - [`search`] - Longest-match search
//! - [`common`] - Shared matcher for numbers, letters and whitespace
//! - [`serialize`] - JSON form

// ============================================================================
// Module Declarations
// ============================================================================

pub mod builder;
pub mod common;
pub mod determinize;
pub mod minimize;
pub mod search;
pub mod serialize;
pub mod state;

// ============================================================================
// Core Types
// ============================================================================

pub use builder::MAX_NESTING_DEPTH;
pub use state::{Fsa, Phase, State, StateId, TokenId, DISCARD_TOKEN, END_OF_INPUT, NO_MATCH};

// ============================================================================
// Matching
// ============================================================================

pub use common::{classify, common_matcher, CommonMatch};
pub use search::Match;
