//! Token stream
//!
//! A cursor over source text that tokenizes on demand with a single token of
//! lookahead. Discardable tokens (whitespace, comments) are skipped
//! transparently by [`TokenStream::peek`].
//!
//! # Example
//!
//! ```rust
//! use tramlex::fsa::{Fsa, DISCARD_TOKEN, END_OF_INPUT};
//! use tramlex::lexer::TokenStream;
//!
//! let mut fsa = Fsa::new();
//! fsa.build("[0-9]+", 1).unwrap();
//! fsa.build("\\+", 2).unwrap();
//! fsa.build(" +", DISCARD_TOKEN).unwrap();
//! let dfa = fsa.minimize();
//!
//! let mut stream = TokenStream::new(&dfa, "1 + 2");
//! assert_eq!(stream.poll(), 1);
//! assert_eq!(stream.poll(), 2);
//! assert_eq!(stream.peek(), 1);
//! assert_eq!(stream.text(), "2");
//! stream.poll();
//! assert_eq!(stream.peek(), END_OF_INPUT);
//! ```

use crate::fsa::{Fsa, TokenId, DISCARD_TOKEN, END_OF_INPUT, NO_MATCH};
use crate::source_location::SourcePosition;
use serde::Serialize;

/// A token produced by a [`TokenStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    /// Token id, [`NO_MATCH`] for an unrecognized character
    pub id: TokenId,
    /// Matched text
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub offset: usize,
}

impl Token<'_> {
    /// Byte offset just past the token
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Lexer cursor over an automaton and a source text
///
/// [`peek`](Self::peek) reports the next significant token without
/// consuming it; [`poll`](Self::poll) consumes it. A position where no token
/// matches (or only an empty string matches) yields [`NO_MATCH`] with the
/// offending character as its text, and polling it skips that character, so
/// the cursor always makes progress. The end of the source yields
/// [`END_OF_INPUT`].
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    automaton: &'a Fsa,
    source: &'a str,
    offset: usize,
    /// Next token and its length, valid at `offset`
    lookahead: Option<(TokenId, usize)>,
    text: &'a str,
    discard: TokenId,
}

impl<'a> TokenStream<'a> {
    /// Create a stream at the start of `source`
    pub fn new(automaton: &'a Fsa, source: &'a str) -> Self {
        Self {
            automaton,
            source,
            offset: 0,
            lookahead: None,
            text: "",
            discard: DISCARD_TOKEN,
        }
    }

    /// Use a different id for discardable tokens
    pub fn with_discard_token(mut self, discard: TokenId) -> Self {
        self.discard = discard;
        self.lookahead = None;
        self
    }

    /// The automaton used for matching
    #[inline]
    pub fn automaton(&self) -> &'a Fsa {
        self.automaton
    }

    /// The full source text
    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Id of discardable tokens
    #[inline]
    pub fn discard_token(&self) -> TokenId {
        self.discard
    }

    /// Current byte offset of the cursor
    ///
    /// After [`peek`](Self::peek) this is the start of the peeked token,
    /// since discarded tokens before it have been consumed.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Line and column of the cursor
    pub fn position(&self) -> SourcePosition {
        SourcePosition::from_offset(self.source, self.offset)
    }

    /// Source text from the cursor onwards
    pub fn remaining(&self) -> &'a str {
        self.source.get(self.offset..).unwrap_or("")
    }

    /// Text of the most recently peeked or polled token
    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Move the cursor and drop the lookahead
    ///
    /// The offset should be a token boundary. Offsets past the end are
    /// clamped, and offsets inside a character are moved back to its start.
    pub fn seek(&mut self, offset: usize) {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        self.offset = offset;
        self.lookahead = None;
        self.text = "";
    }

    /// The next significant token id, without consuming it
    pub fn peek(&mut self) -> TokenId {
        if let Some((token, _)) = self.lookahead {
            return token;
        }

        loop {
            if self.offset >= self.source.len() {
                self.text = "";
                self.lookahead = Some((END_OF_INPUT, 0));
                return END_OF_INPUT;
            }

            let found = self.automaton.search(self.source, self.offset);
            if found.is_empty() {
                let len = self.remaining().chars().next().map_or(0, char::len_utf8);
                self.text = &self.source[self.offset..self.offset + len];
                self.lookahead = Some((NO_MATCH, len));
                return NO_MATCH;
            }

            if found.token == self.discard {
                self.offset = found.end();
                continue;
            }

            self.text = found.text;
            self.lookahead = Some((found.token, found.len()));
            return found.token;
        }
    }

    /// Consume and return the next significant token id
    ///
    /// [`text`](Self::text) keeps the consumed token's text afterwards.
    pub fn poll(&mut self) -> TokenId {
        let token = self.peek();
        if let Some((_, len)) = self.lookahead.take() {
            self.offset += len;
        }
        token
    }

    /// The next significant token with its text and offset, without consuming it
    pub fn peek_token(&mut self) -> Token<'a> {
        let id = self.peek();
        Token {
            id,
            text: self.text,
            offset: self.offset,
        }
    }

    /// Whether only discardable input remains
    pub fn at_end(&mut self) -> bool {
        self.peek() == END_OF_INPUT
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.peek_token();
        if token.id == END_OF_INPUT {
            return None;
        }
        self.poll();
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBER: TokenId = 1;
    const ADD: TokenId = 2;

    fn arithmetic() -> Fsa {
        let mut fsa = Fsa::new();
        fsa.build("[0-9]+", NUMBER).unwrap();
        fsa.build("\\+", ADD).unwrap();
        fsa.build("[ \t\n]+", DISCARD_TOKEN).unwrap();
        fsa.minimize()
    }

    #[test]
    fn test_whitespace_is_skipped() {
        let fsa = arithmetic();
        let tokens: Vec<(TokenId, &str)> = TokenStream::new(&fsa, "1 + 2")
            .map(|t| (t.id, t.text))
            .collect();
        assert_eq!(tokens, vec![(NUMBER, "1"), (ADD, "+"), (NUMBER, "2")]);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let fsa = arithmetic();
        let mut stream = TokenStream::new(&fsa, "  12+3");
        assert_eq!(stream.peek(), NUMBER);
        assert_eq!(stream.peek(), NUMBER);
        assert_eq!(stream.offset(), 2);
        assert_eq!(stream.text(), "12");
        assert_eq!(stream.poll(), NUMBER);
        assert_eq!(stream.offset(), 4);
        assert_eq!(stream.text(), "12");
        assert_eq!(stream.remaining(), "+3");
    }

    #[test]
    fn test_end_of_input() {
        let fsa = arithmetic();
        let mut stream = TokenStream::new(&fsa, "7   ");
        assert_eq!(stream.poll(), NUMBER);
        assert!(stream.at_end());
        assert_eq!(stream.poll(), END_OF_INPUT);
        assert_eq!(stream.poll(), END_OF_INPUT);
        assert_eq!(stream.text(), "");
    }

    #[test]
    fn test_seek_resets_lookahead() {
        let fsa = arithmetic();
        let mut stream = TokenStream::new(&fsa, "1+2");
        assert_eq!(stream.poll(), NUMBER);
        assert_eq!(stream.peek(), ADD);
        stream.seek(0);
        assert_eq!(stream.peek(), NUMBER);
        stream.seek(100);
        assert_eq!(stream.peek(), END_OF_INPUT);
    }

    #[test]
    fn test_unmatched_character_advances() {
        let fsa = arithmetic();
        let tokens: Vec<Token<'_>> = TokenStream::new(&fsa, "1 é 2").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].id, NO_MATCH);
        assert_eq!(tokens[1].text, "é");
        assert_eq!(tokens[1].offset, 2);
        assert_eq!(tokens[2].offset, 5);
    }

    #[test]
    fn test_zero_length_match_does_not_stall() {
        let mut fsa = Fsa::new();
        fsa.build("a*", 1).unwrap();
        fsa.build(" *", DISCARD_TOKEN).unwrap();
        let tokens: Vec<Token<'_>> = TokenStream::new(&fsa, "aa b").collect();
        let ids: Vec<TokenId> = tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, NO_MATCH]);
        assert_eq!(tokens[1].text, "b");
    }

    #[test]
    fn test_custom_discard_token() {
        let mut fsa = Fsa::new();
        fsa.build("x", 1).unwrap();
        fsa.build(";", 50).unwrap();
        let mut stream = TokenStream::new(&fsa, ";;x;").with_discard_token(50);
        assert_eq!(stream.poll(), 1);
        assert_eq!(stream.poll(), END_OF_INPUT);
    }

    #[test]
    fn test_position_tracks_lines() {
        let fsa = arithmetic();
        let mut stream = TokenStream::new(&fsa, "1\n + 2");
        stream.poll();
        stream.peek();
        let pos = stream.position();
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
    }
}
