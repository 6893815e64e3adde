//! Lexing on top of compiled automata
//!
//! - [`TokenStream`] - cursor with one token of lookahead
//! - [`TokenTable`] - named token definitions compiled into one DFA

pub mod token_stream;
pub mod token_table;

pub use token_stream::{Token, TokenStream};
pub use token_table::{TokenDef, TokenTable};
