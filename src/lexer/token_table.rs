//! Token tables
//!
//! An ordered list of named token patterns compiled into one minimal DFA.
//! Ids follow the order of the list starting at 1, so earlier entries win
//! ties at equal match length. Entries marked `discard` (whitespace,
//! comments) all map to the discard id and are skipped by token streams.
//!
//! # Example
//!
//! ```rust
//! use tramlex::lexer::{TokenDef, TokenTable};
//!
//! let table = TokenTable::new(vec![
//!     TokenDef::new("Number", "[0-9]+"),
//!     TokenDef::new("Add", "\\+"),
//!     TokenDef::skip("Whitespace", "[ \t]+"),
//! ])
//! .unwrap();
//!
//! let names: Vec<&str> = table
//!     .tokenize("1 + 2")
//!     .iter()
//!     .filter_map(|t| table.name(t.id))
//!     .collect();
//! assert_eq!(names, ["Number", "Add", "Number"]);
//! ```

use super::token_stream::{Token, TokenStream};
use crate::error::TokenTableError;
use crate::fsa::{Fsa, TokenId, DISCARD_TOKEN};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A named token pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDef {
    /// Token name
    pub name: String,
    /// Pattern in the automaton pattern syntax
    pub pattern: String,
    /// Whether matches are skipped by token streams
    #[serde(default)]
    pub discard: bool,
}

impl TokenDef {
    /// A significant token
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            discard: false,
        }
    }

    /// A discardable token
    pub fn skip(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            discard: true,
            ..Self::new(name, pattern)
        }
    }
}

/// Compiled token table
#[derive(Debug, Clone)]
pub struct TokenTable {
    defs: Vec<TokenDef>,
    ids: Vec<TokenId>,
    by_name: HashMap<String, TokenId>,
    automaton: Fsa,
    discard: TokenId,
}

impl TokenTable {
    /// Compile a table using [`DISCARD_TOKEN`] for discardable entries
    pub fn new(defs: Vec<TokenDef>) -> Result<Self, TokenTableError> {
        Self::with_discard_token(defs, DISCARD_TOKEN)
    }

    /// Compile a table with a custom discard id
    ///
    /// # Errors
    ///
    /// Fails if a pattern does not compile, or if there are so many
    /// significant entries that their ids would reach the discard id.
    pub fn with_discard_token(
        defs: Vec<TokenDef>,
        discard: TokenId,
    ) -> Result<Self, TokenTableError> {
        let significant = defs.iter().filter(|d| !d.discard).count();
        if significant as i64 >= discard as i64 {
            return Err(TokenTableError::TooManyTokens { count: significant });
        }

        let mut nfa = Fsa::new();
        let mut ids = Vec::with_capacity(defs.len());
        let mut by_name = HashMap::with_capacity(defs.len());
        let mut next_id: TokenId = 1;

        for def in &defs {
            let id = if def.discard {
                discard
            } else {
                let id = next_id;
                next_id += 1;
                id
            };
            nfa.build(&def.pattern, id)
                .map_err(|error| TokenTableError::Pattern {
                    name: def.name.clone(),
                    error,
                })?;
            ids.push(id);
            by_name.entry(def.name.clone()).or_insert(id);
        }

        let automaton = nfa.minimize();
        log_debug!(
            "Compiled token table: {} entries, {} states",
            defs.len(),
            automaton.len()
        );

        Ok(Self {
            defs,
            ids,
            by_name,
            automaton,
            discard,
        })
    }

    /// Load and compile a table from a JSON array of token definitions
    pub fn from_json(s: &str) -> Result<Self, TokenTableError> {
        let defs: Vec<TokenDef> = serde_json::from_str(s).map_err(|e| TokenTableError::Json {
            message: e.to_string(),
        })?;
        Self::new(defs)
    }

    /// Serialize the definitions to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.defs)
    }

    /// The compiled minimal automaton
    #[inline]
    pub fn automaton(&self) -> &Fsa {
        &self.automaton
    }

    /// The definitions in declaration order
    #[inline]
    pub fn defs(&self) -> &[TokenDef] {
        &self.defs
    }

    /// Id assigned to each definition, in declaration order
    #[inline]
    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }

    /// Id used for discardable entries
    #[inline]
    pub fn discard_token(&self) -> TokenId {
        self.discard
    }

    /// Number of definitions
    #[inline]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the table has no definitions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Id of the token named `name`
    pub fn id(&self, name: &str) -> Option<TokenId> {
        self.by_name.get(name).copied()
    }

    /// Name of the first definition with id `id`
    pub fn name(&self, id: TokenId) -> Option<&str> {
        self.ids
            .iter()
            .position(|candidate| *candidate == id)
            .map(|i| self.defs[i].name.as_str())
    }

    /// A token stream over `source` using this table
    pub fn stream<'a>(&'a self, source: &'a str) -> TokenStream<'a> {
        TokenStream::new(&self.automaton, source).with_discard_token(self.discard)
    }

    /// Tokenize the whole of `source`
    pub fn tokenize<'a>(&'a self, source: &'a str) -> Vec<Token<'a>> {
        self.stream(source).collect()
    }
}
