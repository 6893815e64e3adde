//! Parser driver
//!
//! Ties an automaton, a grammar and a [`ParserConfig`] together and runs a
//! grammar's root production over a source text on the trampoline.

use super::context::ParseContext;
use super::grammar::Grammar;
use super::node::ParseNode;
use super::trampoline::{CancellationToken, ExecuteError, SchedulerConfig, Trampoline};
use crate::error::ParseError;
use crate::fsa::{Fsa, TokenId, DISCARD_TOKEN};
use crate::lexer::{TokenStream, TokenTable};
use hashbrown::HashMap;

/// Default maximum input size (100 MB)
pub const DEFAULT_MAX_INPUT_SIZE: usize = 100 * 1024 * 1024;

/// Default number of recorded errors that aborts a parse
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum allowed input size in bytes
    pub max_input_size: usize,

    /// Token id skipped by the token stream
    pub discard_token: TokenId,

    /// Whether input left after the root production is an error
    pub require_end_of_input: bool,

    /// Recorded errors after which parsing aborts (0 = never)
    pub max_errors: usize,

    /// Step and time limits of the scheduler
    pub scheduler: SchedulerConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            discard_token: DISCARD_TOKEN,
            require_end_of_input: true,
            max_errors: DEFAULT_MAX_ERRORS,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum input size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the discard token id
    pub fn with_discard_token(mut self, token: TokenId) -> Self {
        self.discard_token = token;
        self
    }

    /// Set whether the whole input must be consumed
    pub fn with_require_end_of_input(mut self, require: bool) -> Self {
        self.require_end_of_input = require;
        self
    }

    /// Set the error limit
    pub fn with_max_errors(mut self, errors: usize) -> Self {
        self.max_errors = errors;
        self
    }

    /// Set the scheduler step limit
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.scheduler.max_steps = steps;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.scheduler.timeout_ms = ms;
        self
    }
}

/// Tree and diagnostics of one parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// Tree built by the root production, possibly with missing operands
    pub tree: Option<ParseNode>,
    /// Errors in the order they were recorded
    pub errors: Vec<ParseError>,
}

impl ParseReport {
    /// Whether no error was recorded
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.tree.is_some()
    }

    /// The tree if no error was recorded, otherwise the first error
    pub fn into_result(self) -> Result<ParseNode, ParseError> {
        let mut errors = self.errors.into_iter();
        match (errors.next(), self.tree) {
            (Some(first), _) => Err(first),
            (None, Some(tree)) => Ok(tree),
            (None, None) => Err(ParseError::UnexpectedToken {
                expected: "input".to_string(),
                found: crate::fsa::END_OF_INPUT,
                found_text: String::new(),
                position: Default::default(),
            }),
        }
    }
}

/// Runs a grammar over source texts
#[derive(Debug, Clone)]
pub struct Parser<'t> {
    automaton: &'t Fsa,
    grammar: Grammar,
    names: HashMap<TokenId, String>,
    config: ParserConfig,
}

impl<'t> Parser<'t> {
    /// Create a parser over a compiled automaton
    pub fn new(automaton: &'t Fsa, grammar: Grammar) -> Self {
        Self {
            automaton,
            grammar,
            names: HashMap::new(),
            config: ParserConfig::default(),
        }
    }

    /// Create a parser over a token table, using its names in messages
    pub fn from_table(table: &'t TokenTable, grammar: Grammar) -> Self {
        let mut names = HashMap::with_capacity(table.len());
        for (def, id) in table.defs().iter().zip(table.ids()) {
            names.entry(*id).or_insert_with(|| def.name.clone());
        }
        Self {
            automaton: table.automaton(),
            grammar,
            names,
            config: ParserConfig::default().with_discard_token(table.discard_token()),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Name a token in error messages
    pub fn with_token_name(mut self, token: TokenId, name: impl Into<String>) -> Self {
        self.names.insert(token, name.into());
        self
    }

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The grammar
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The automaton tokens are matched with
    pub fn automaton(&self) -> &'t Fsa {
        self.automaton
    }

    /// Parse `source`, returning the tree or the first recorded error
    pub fn parse(&self, source: &str) -> Result<ParseNode, ParseError> {
        self.parse_with_cancel(source, &CancellationToken::new())
    }

    /// Parse `source`, stopping early if `cancel` is set
    pub fn parse_with_cancel(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseNode, ParseError> {
        self.parse_with_diagnostics(source, cancel)?.into_result()
    }

    /// Parse `source` and return every recorded error with the tree
    ///
    /// # Errors
    ///
    /// Only failures that leave no tree to report: oversized input,
    /// cancellation, exhausted limits and undefined rules. An aborted parse
    /// (error limit reached) is reported with no tree.
    pub fn parse_with_diagnostics(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseReport, ParseError> {
        if source.len() > self.config.max_input_size {
            return Err(ParseError::InputTooLarge {
                input_size: source.len(),
                max_size: self.config.max_input_size,
            });
        }

        let stream =
            TokenStream::new(self.automaton, source).with_discard_token(self.config.discard_token);
        let mut ctx = ParseContext::new(stream, &self.grammar, &self.names, self.config.max_errors);
        let root = self.grammar.root().clone();

        let outcome = Trampoline::with_config(self.config.scheduler).execute(
            move |ctx, agenda| root.run(ctx, agenda),
            &mut ctx,
            cancel,
        );

        let tree = match outcome {
            Ok(tree) => tree,
            Err(ExecuteError::Fault(ParseError::UnexpectedToken { .. })) => {
                return Ok(ParseReport {
                    tree: None,
                    errors: ctx.into_diagnostics(),
                });
            }
            Err(ExecuteError::Fault(fault)) => return Err(fault),
            Err(ExecuteError::Cancelled) => return Err(ParseError::Cancelled),
            Err(ExecuteError::StepLimitExceeded { max_steps }) => {
                return Err(ParseError::StepLimitExceeded { max_steps })
            }
            Err(ExecuteError::TimeoutExceeded {
                elapsed_ms,
                timeout_ms,
            }) => {
                return Err(ParseError::TimeoutExceeded {
                    elapsed_ms,
                    timeout_ms,
                })
            }
        };

        // Recording may still hit the error limit here; the report keeps
        // every error either way.
        if tree.is_none() {
            let _ = ctx.expected(self.grammar.root_name().to_string());
        } else if self.config.require_end_of_input && !ctx.stream().at_end() {
            let _ = ctx.expected("end of input");
        }

        Ok(ParseReport {
            tree,
            errors: ctx.into_diagnostics(),
        })
    }
}
