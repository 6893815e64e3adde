//! Longest-match search
//!
//! Works on any automaton. Deterministic paths are followed one state at a
//! time; once a state with epsilon edges is reached, the search continues on
//! the epsilon closure of the whole frontier. Every accepting step records the
//! current end and the lowest accepted token id, so the result is the longest
//! match, with ties going to the earliest-declared token.

use super::state::{Fsa, StateId, TokenId, NO_MATCH};

/// Result of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    /// Accepted token id, [`NO_MATCH`] if nothing matched
    pub token: TokenId,
    /// Matched text, empty if nothing matched
    pub text: &'t str,
    /// Byte offset where the search started
    pub start: usize,
}

impl<'t> Match<'t> {
    /// A failed match at `start`
    #[inline]
    pub fn none(start: usize) -> Self {
        Self {
            token: NO_MATCH,
            text: "",
            start,
        }
    }

    /// Whether an accepting state was reached
    #[inline]
    pub fn is_match(&self) -> bool {
        self.token != NO_MATCH
    }

    /// Byte offset just past the matched text
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Length of the matched text in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the matched text is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Fsa {
    /// Find the longest match starting at byte offset `start`
    ///
    /// An offset past the end of `text` or inside a multi-byte character
    /// yields no match.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tramlex::fsa::Fsa;
    ///
    /// let mut fsa = Fsa::new();
    /// fsa.build("[0-9]+", 1).unwrap();
    ///
    /// let found = fsa.search("x = 42;", 4);
    /// assert_eq!(found.token, 1);
    /// assert_eq!(found.text, "42");
    /// ```
    pub fn search<'t>(&self, text: &'t str, start: usize) -> Match<'t> {
        if start > text.len() || !text.is_char_boundary(start) {
            return Match::none(start);
        }

        let mut node: Option<StateId> = Some(self.root);
        let mut closure: Vec<StateId> = Vec::new();
        let mut nfa_mode = false;
        let mut pos = start;
        let mut longest: Option<(usize, TokenId)> = None;
        let mut chars = text[start..].chars();

        loop {
            if !nfa_mode {
                if let Some(id) = node {
                    if !self.state(id).epsilon.is_empty() {
                        nfa_mode = true;
                        closure = self.epsilon_closure(&[id]);
                    }
                }
            }

            if nfa_mode {
                let best = closure
                    .iter()
                    .filter_map(|id| self.state(*id).best_accept())
                    .min();
                if let Some(token) = best {
                    longest = Some((pos, token));
                }
                if closure.is_empty() {
                    break;
                }
            } else {
                match node {
                    Some(id) => {
                        if let Some(token) = self.state(id).best_accept() {
                            longest = Some((pos, token));
                        }
                    }
                    None => break,
                }
            }

            let Some(c) = chars.next() else {
                break;
            };
            pos += c.len_utf8();

            if nfa_mode {
                let targets: Vec<StateId> = closure
                    .iter()
                    .filter_map(|id| self.state(*id).transitions.get(&c).copied())
                    .collect();
                closure = self.epsilon_closure(&targets);
            } else {
                node = node.and_then(|id| self.state(id).transitions.get(&c).copied());
            }
        }

        match longest {
            Some((end, token)) => Match {
                token,
                text: &text[start..end],
                start,
            },
            None => Match::none(start),
        }
    }

    /// Find the first offset where any token matches
    ///
    /// Start offsets are tried in order; the longest match at the first
    /// matching offset is returned.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        text.char_indices()
            .map(|(offset, _)| self.search(text, offset))
            .find(Match::is_match)
    }

    /// The token accepted for the whole of `text`, if any
    pub fn full_match(&self, text: &str) -> Option<TokenId> {
        let found = self.search(text, 0);
        (found.is_match() && found.len() == text.len()).then_some(found.token)
    }
}
