//! Parse context
//!
//! The state every production continuation receives explicitly: the token
//! stream, the grammar used to resolve rule references, token names for
//! messages, and the diagnostics recorded so far.

use super::grammar::Grammar;
use super::node::Lexeme;
use crate::error::ParseError;
use crate::fsa::{TokenId, END_OF_INPUT};
use crate::lexer::TokenStream;
use crate::source_location::SourcePosition;
use hashbrown::HashMap;

/// Mutable state of one parse
pub struct ParseContext<'a> {
    stream: TokenStream<'a>,
    grammar: &'a Grammar,
    names: &'a HashMap<TokenId, String>,
    diagnostics: Vec<ParseError>,
    max_errors: usize,
}

impl<'a> ParseContext<'a> {
    /// Create a context
    ///
    /// `max_errors` is the number of recorded errors after which the parse
    /// aborts (0 = never).
    pub fn new(
        stream: TokenStream<'a>,
        grammar: &'a Grammar,
        names: &'a HashMap<TokenId, String>,
        max_errors: usize,
    ) -> Self {
        Self {
            stream,
            grammar,
            names,
            diagnostics: Vec::new(),
            max_errors,
        }
    }

    /// The token stream
    #[inline]
    pub fn stream(&mut self) -> &mut TokenStream<'a> {
        &mut self.stream
    }

    /// The grammar being parsed
    #[inline]
    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    /// Errors recorded so far, in order
    #[inline]
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    /// Consume the context, keeping the recorded errors
    pub fn into_diagnostics(self) -> Vec<ParseError> {
        self.diagnostics
    }

    /// Name of a token for messages
    pub fn describe(&self, token: TokenId) -> String {
        match self.names.get(&token) {
            Some(name) => name.clone(),
            None if token == END_OF_INPUT => "end of input".to_string(),
            None => format!("token {}", token),
        }
    }

    /// The next significant token as an owned lexeme
    pub fn lexeme(&mut self) -> Lexeme {
        let token = self.stream.peek_token();
        Lexeme::new(token.id, token.text, token.offset)
    }

    /// Record that `expected` was required at the current token
    ///
    /// # Errors
    ///
    /// Returns the first recorded error once the error limit is reached, which
    /// aborts the parse when returned from a continuation.
    pub fn expected(&mut self, expected: impl Into<String>) -> Result<(), ParseError> {
        let found = self.stream.peek_token();
        let error = ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.id,
            found_text: found.text.to_string(),
            position: SourcePosition::from_offset(self.stream.source(), found.offset),
        };
        log_debug!("Recorded parse error: {}", error);
        self.diagnostics.push(error);

        if self.max_errors > 0 && self.diagnostics.len() >= self.max_errors {
            return Err(self.diagnostics[0].clone());
        }
        Ok(())
    }

    pub(crate) fn error_mark(&self) -> usize {
        self.diagnostics.len()
    }

    pub(crate) fn discard_errors_from(&mut self, mark: usize) {
        self.diagnostics.truncate(mark);
    }

    /// Consume `op` unless something already moved past it
    pub(crate) fn ensure_consumed(&mut self, op: &Lexeme) {
        if self.stream.offset() <= op.offset {
            self.stream.seek(op.offset);
            self.stream.poll();
        }
    }
}
