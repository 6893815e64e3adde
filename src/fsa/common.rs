//! Shared matcher for common character runs
//!
//! A small minimal DFA recognizing runs of digits, ASCII letters and
//! whitespace. The pattern compiler uses it to read the bounds of `{m,n}`
//! repetitions; it is also handy for quick classification of input.

use super::search::Match;
use super::state::{Fsa, TokenId};
use std::sync::OnceLock;

/// Token ids recognized by [`common_matcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonMatch {
    /// `[0-9]+`
    Numbers = 1,
    /// `[a-zA-Z]+`
    Letters = 2,
    /// Runs of space, tab, newline, carriage return, vertical tab and form feed
    Whitespace = 3,
}

impl CommonMatch {
    /// Token id used in the automaton
    #[inline]
    pub fn id(self) -> TokenId {
        self as TokenId
    }

    /// Map a token id back to its kind
    pub fn from_id(id: TokenId) -> Option<Self> {
        match id {
            1 => Some(CommonMatch::Numbers),
            2 => Some(CommonMatch::Letters),
            3 => Some(CommonMatch::Whitespace),
            _ => None,
        }
    }
}

static COMMON_MATCHER: OnceLock<Fsa> = OnceLock::new();

/// The shared common matcher, created on first use
pub fn common_matcher() -> &'static Fsa {
    COMMON_MATCHER.get_or_init(build_common_matcher)
}

/// Classify the longest common run starting at `start`
pub fn classify(text: &str, start: usize) -> Option<(CommonMatch, Match<'_>)> {
    let found = common_matcher().search(text, start);
    CommonMatch::from_id(found.token).map(|kind| (kind, found))
}

/// Patterns of the common matcher, in token id order
///
/// None of them uses `{m,n}` bounds, so compiling them never reads the
/// matcher being built.
const PATTERNS: [(CommonMatch, &str); 3] = [
    (CommonMatch::Numbers, "[0-9]+"),
    (CommonMatch::Letters, "[a-zA-Z]+"),
    (CommonMatch::Whitespace, "[ \n\r\t\u{b}\u{c}]+"),
];

fn build_common_matcher() -> Fsa {
    let mut fsa = Fsa::new();
    for (kind, pattern) in PATTERNS {
        let built = fsa.build(pattern, kind.id());
        debug_assert!(built.is_ok(), "common pattern {:?}: {:?}", pattern, built);
    }
    fsa.minimize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_matcher_numbers() {
        let (kind, found) = classify("{12,3}", 1).unwrap();
        assert_eq!(kind, CommonMatch::Numbers);
        assert_eq!(found.text, "12");
    }

    #[test]
    fn test_common_matcher_letters_and_whitespace() {
        assert_eq!(classify("abcDEF1", 0).unwrap().1.text, "abcDEF");
        let (kind, found) = classify("x \t\n y", 1).unwrap();
        assert_eq!(kind, CommonMatch::Whitespace);
        assert_eq!(found.text, " \t\n ");
    }

    #[test]
    fn test_common_matcher_no_match() {
        assert!(classify("+", 0).is_none());
        assert!(classify("", 0).is_none());
    }

    #[test]
    fn test_common_matcher_is_minimal_dfa() {
        let mut fsa = Fsa::new();
        fsa.build("[0-9]+", 1).unwrap();
        fsa.build("[a-zA-Z]+", 2).unwrap();
        fsa.build("[ \n\r\t\u{b}\u{c}]+", 3).unwrap();
        let minimal = fsa.to_deterministic().minimize();

        let common = common_matcher();
        assert!(common.is_frozen());
        assert!(common.is_deterministic());
        // Root plus one looping state per run kind
        assert_eq!(common.reachable().len(), 4);
        assert_eq!(minimal.reachable().len(), common.reachable().len());
        assert_eq!(minimal.fingerprint(), common.fingerprint());
        assert_eq!(common.minimize(), *common);
    }
}
