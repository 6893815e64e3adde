//! Integration tests for the automaton pipeline
//!
//! Pattern compilation, determinization, minimization, search and the
//! serialized form, exercised through the public API only.

use tramlex::fsa::{classify, CommonMatch, Fsa, Phase, NO_MATCH};
use tramlex::PatternError;

fn compile(patterns: &[(&str, i32)]) -> Fsa {
    let mut fsa = Fsa::new();
    for (pattern, id) in patterns {
        fsa.build(pattern, *id).unwrap();
    }
    fsa
}

/// Every form of the automaton must agree on every input
fn assert_all_forms(fsa: &Fsa, inputs: &[&str]) {
    let dfa = fsa.to_deterministic();
    let min = fsa.minimize();
    for input in inputs {
        let expected = fsa.search(input, 0);
        for other in [&dfa, &min] {
            let found = other.search(input, 0);
            assert_eq!(found.token, expected.token, "token mismatch on {:?}", input);
            assert_eq!(found.text, expected.text, "text mismatch on {:?}", input);
        }
    }
}

// ============================================================================
// Repetition
// ============================================================================

#[test]
fn test_bounded_repetition() {
    let fsa = compile(&[("a{2,3}", 1)]);
    assert_eq!(fsa.full_match("a"), None);
    assert_eq!(fsa.full_match("aa"), Some(1));
    assert_eq!(fsa.full_match("aaa"), Some(1));
    assert_eq!(fsa.full_match("aaaa"), None);
    assert_eq!(fsa.search("aaaa", 0).text, "aaa");
    assert_all_forms(&fsa, &["", "a", "aa", "aaa", "aaaa", "b"]);
}

#[test]
fn test_open_and_exact_bounds() {
    let fsa = compile(&[("x{2,}", 1), ("y{3}", 2)]);
    assert_eq!(fsa.full_match("x"), None);
    assert_eq!(fsa.full_match("xxxxxx"), Some(1));
    assert_eq!(fsa.full_match("yy"), None);
    assert_eq!(fsa.full_match("yyy"), Some(2));
    assert_eq!(fsa.full_match("yyyy"), None);
}

#[test]
fn test_star_matches_empty() {
    let fsa = compile(&[("a*", 1)]);
    let found = fsa.search("b", 0);
    assert_eq!(found.token, 1);
    assert!(found.is_empty());
    assert_eq!(fsa.search("aaab", 0).text, "aaa");
    assert_all_forms(&fsa, &["", "a", "aaab", "b"]);
}

#[test]
fn test_repeating_a_nullable_group_fails() {
    let mut fsa = Fsa::new();
    assert!(matches!(
        fsa.build("(a?)+", 1),
        Err(PatternError::EmptyRepetition { .. })
    ));
    assert!(matches!(
        fsa.build("(b*){2}", 1),
        Err(PatternError::EmptyRepetition { .. })
    ));
}

// ============================================================================
// Classes and errors
// ============================================================================

#[test]
fn test_class_range() {
    let fsa = compile(&[("[a-c]", 1)]);
    for c in ["a", "b", "c"] {
        assert_eq!(fsa.full_match(c), Some(1));
    }
    assert_eq!(fsa.full_match("d"), None);
}

#[test]
fn test_reversed_class_range() {
    let mut fsa = Fsa::new();
    assert!(matches!(
        fsa.build("[c-a]", 1),
        Err(PatternError::InvalidClassRange {
            start: 'c',
            end: 'a',
            ..
        })
    ));
}

#[test]
fn test_pattern_errors_carry_offsets() {
    let mut fsa = Fsa::new();

    let err = fsa.build("(ab", 1).unwrap_err();
    assert!(matches!(err, PatternError::ExpectedToken { .. }));
    assert!(err.offset().is_some());

    let err = fsa.build("ab)", 1).unwrap_err();
    assert_eq!(err, PatternError::UnexpectedChar { offset: 2, found: ')' });

    let err = fsa.build("a{3,2}", 1).unwrap_err();
    assert!(matches!(
        err,
        PatternError::RangeBounds {
            lower: 3,
            upper: 2,
            ..
        }
    ));
    assert!(err.to_string().contains("at offset"));
}

#[test]
fn test_failed_build_leaves_automaton_usable() {
    let mut fsa = compile(&[("ab", 1)]);
    let before = fsa.fingerprint();
    assert!(fsa.build("a(b", 2).is_err());
    assert_eq!(fsa.fingerprint(), before);
    assert_eq!(fsa.full_match("ab"), Some(1));
}

// ============================================================================
// Ambiguity and longest match
// ============================================================================

#[test]
fn test_keyword_beats_identifier_at_equal_length() {
    let fsa = compile(&[("if", 1), ("[a-z]+", 2)]).minimize();
    assert_eq!(fsa.search("if", 0).token, 1);
    assert_eq!(fsa.search("iffy", 0).token, 2);
    assert_eq!(fsa.search("iffy", 0).text, "iffy");
    assert_eq!(fsa.search("i", 0).token, 2);
}

#[test]
fn test_search_from_offset() {
    let fsa = compile(&[("[0-9]+", 1), ("[a-z]+", 2)]);
    let found = fsa.search("abc123", 3);
    assert_eq!(found.token, 1);
    assert_eq!(found.start, 3);
    assert_eq!(found.end(), 6);
    assert_eq!(fsa.search("abc", 10).token, NO_MATCH);
}

#[test]
fn test_find_scans_offsets() {
    let fsa = compile(&[("[0-9]+", 1)]);
    let found = fsa.find("total: 42 items").unwrap();
    assert_eq!(found.text, "42");
    assert_eq!(found.start, 7);
    assert!(fsa.find("none here").is_none());
}

#[test]
fn test_unicode_literals() {
    let fsa = compile(&[("é+", 1), ("[α-γ]", 2)]);
    assert_eq!(fsa.search("ééx", 0).text, "éé");
    assert_eq!(fsa.full_match("β"), Some(2));
    assert_eq!(fsa.search("éé", 1).token, NO_MATCH);
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_conversions_freeze() {
    let mut fsa = compile(&[("a|b", 1)]);
    assert_eq!(fsa.phase(), Phase::Building);

    let mut dfa = fsa.to_deterministic();
    assert!(dfa.is_frozen());
    assert!(dfa.is_deterministic());
    assert_eq!(dfa.build("c", 2), Err(PatternError::FrozenAutomaton));

    fsa.freeze();
    assert_eq!(fsa.build("c", 2), Err(PatternError::FrozenAutomaton));
}

#[test]
fn test_textbook_minimization() {
    let fsa = compile(&[("(a|b)*abb", 1)]);
    let min = fsa.minimize();
    assert_eq!(min.len(), 4);
    assert_eq!(min.minimize().fingerprint(), min.fingerprint());
    assert_all_forms(&fsa, &["abb", "aabb", "babb", "ab", "abba", ""]);
}

#[test]
fn test_many_tokens_agree_across_forms() {
    let fsa = compile(&[
        ("while", 1),
        ("for", 2),
        ("[a-z_][a-z0-9_]*", 3),
        ("[0-9]+(\\.[0-9]+)?", 4),
        ("\\.\\.\\.?", 5),
        ("[ \t]+", 6),
    ]);
    assert_all_forms(
        &fsa,
        &["while", "whiles", "for_", "3.14", "3.", "...", "..", "   x", "_x9"],
    );
    assert_eq!(fsa.search("3.", 0).text, "3");
}

#[test]
fn test_json_round_trip_preserves_matching() {
    let fsa = compile(&[("if", 1), ("[a-z]+", 2), ("[0-9]+", 3)]);
    let json = fsa.to_json().unwrap();
    let restored = Fsa::from_json(&json).unwrap();

    assert!(restored.is_frozen());
    for input in ["if", "iffy", "12", "x1", ""] {
        assert_eq!(restored.search(input, 0), fsa.search(input, 0));
    }
    assert!(!json.contains("epsilon"));
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(Fsa::from_json("not json").is_err());
    assert!(Fsa::from_json(r#"{"root": 5, "states": []}"#).is_err());
    assert!(Fsa::from_json(r#"{"root": 0, "states": [{"n": {"ab": 0}, "a": []}]}"#).is_err());
}

// ============================================================================
// Common matcher
// ============================================================================

#[test]
fn test_classify() {
    let (kind, found) = classify("123abc", 0).unwrap();
    assert_eq!(kind, CommonMatch::Numbers);
    assert_eq!(found.text, "123");

    let (kind, found) = classify("123abc", 3).unwrap();
    assert_eq!(kind, CommonMatch::Letters);
    assert_eq!(found.text, "abc");

    let (kind, _) = classify(" \t\nx", 0).unwrap();
    assert_eq!(kind, CommonMatch::Whitespace);

    assert!(classify("+", 0).is_none());
}
