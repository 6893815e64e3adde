//! JSON form of an automaton
//!
//! ```json
//! {"root": 0, "states": [{"n": {"a": 1}, "a": []}, {"n": {}, "a": ["1"]}]}
//! ```
//!
//! `n` maps single-character keys to state indices and `a` lists the accepted
//! token ids as strings. Epsilon edges and letters are not part of the
//! format, so automata with epsilon edges are determinized before they are
//! written. Unreachable states are dropped.

use super::state::{Fsa, State, StateId, TokenId};
use crate::error::FormatError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedFsa {
    root: u32,
    states: Vec<SerializedState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SerializedState {
    #[serde(default)]
    n: BTreeMap<String, u32>,
    #[serde(default)]
    a: Vec<String>,
}

impl From<&Fsa> for SerializedFsa {
    fn from(fsa: &Fsa) -> Self {
        let canonical = if fsa.is_deterministic() {
            fsa.compact()
        } else {
            fsa.to_deterministic()
        };

        let states = canonical
            .states
            .iter()
            .map(|state| SerializedState {
                n: state
                    .transitions
                    .iter()
                    .map(|(c, target)| (c.to_string(), target.0))
                    .collect(),
                a: state.accept_set().iter().map(|id| id.to_string()).collect(),
            })
            .collect();

        SerializedFsa {
            root: canonical.root.0,
            states,
        }
    }
}

impl TryFrom<SerializedFsa> for Fsa {
    type Error = FormatError;

    fn try_from(raw: SerializedFsa) -> Result<Self, Self::Error> {
        let count = raw.states.len();
        let check = |target: u32| -> Result<StateId, FormatError> {
            if (target as usize) < count {
                Ok(StateId(target))
            } else {
                Err(FormatError::new(format!(
                    "state {} is out of range ({} states)",
                    target, count
                )))
            }
        };

        let root = check(raw.root)?;
        let mut states = Vec::with_capacity(count);
        for (index, entry) in raw.states.into_iter().enumerate() {
            let mut state = State::default();
            for (key, target) in entry.n {
                let mut chars = key.chars();
                let c = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(FormatError::new(format!(
                            "transition key {:?} of state {} is not a single character",
                            key, index
                        )))
                    }
                };
                state.transitions.insert(c, check(target)?);
            }
            for id in entry.a {
                let token: TokenId = id.parse().map_err(|_| {
                    FormatError::new(format!(
                        "accepted id {:?} of state {} is not an integer",
                        id, index
                    ))
                })?;
                if !state.accepts.contains(&token) {
                    state.accepts.push(token);
                }
            }
            states.push(state);
        }

        Ok(Fsa::from_states(states, root))
    }
}

impl Serialize for Fsa {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializedFsa::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fsa {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = SerializedFsa::deserialize(deserializer)?;
        Fsa::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Fsa {
    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a frozen automaton from JSON
    pub fn from_json(s: &str) -> Result<Self, FormatError> {
        let raw: SerializedFsa =
            serde_json::from_str(s).map_err(|e| FormatError::new(e.to_string()))?;
        Fsa::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut fsa = Fsa::new();
        fsa.build("a", 1).unwrap();
        let json = fsa.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"root":0,"states":[{"n":{"a":1},"a":[]},{"n":{},"a":["1"]}]}"#
        );
    }

    #[test]
    fn test_json_restores_matching() {
        let mut fsa = Fsa::new();
        fsa.build("[a-z]+", 2).unwrap();
        fsa.build("if", 1).unwrap();
        let min = fsa.minimize();

        let restored = Fsa::from_json(&min.to_json().unwrap()).unwrap();
        assert!(restored.is_frozen());
        assert_eq!(restored.fingerprint(), min.fingerprint());
        assert_eq!(restored.search("if", 0).token, 1);
        assert_eq!(restored.search("ifs", 0).token, 2);
    }

    #[test]
    fn test_nfa_is_written_deterministically() {
        let mut fsa = Fsa::new();
        fsa.build("ab*", 4).unwrap();
        assert!(!fsa.is_deterministic());

        let restored = Fsa::from_json(&fsa.to_json().unwrap()).unwrap();
        assert!(restored.is_deterministic());
        assert_eq!(restored.full_match("abbb"), Some(4));
    }

    #[test]
    fn test_missing_fields_default() {
        let fsa = Fsa::from_json(r#"{"root":0,"states":[{}]}"#).unwrap();
        assert_eq!(fsa.len(), 1);
        assert!(!fsa.search("x", 0).is_match());
    }

    #[test]
    fn test_malformed_json() {
        assert!(Fsa::from_json("not json").is_err());

        let err = Fsa::from_json(r#"{"root":3,"states":[{}]}"#).unwrap_err();
        assert!(err.message.contains("out of range"));

        let err = Fsa::from_json(r#"{"root":0,"states":[{"n":{"ab":0}}]}"#).unwrap_err();
        assert!(err.message.contains("single character"));

        let err = Fsa::from_json(r#"{"root":0,"states":[{"a":["x"]}]}"#).unwrap_err();
        assert!(err.message.contains("not an integer"));
    }
}
