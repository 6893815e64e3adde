//! Pattern compiler
//!
//! Compiles a small regular-expression dialect into the epsilon-NFA of an
//! [`Fsa`] by recursive descent:
//!
//! ```text
//! alternation := series ('|' series)*
//! series      := quantified*
//! quantified  := atom ('+' | '*' | '?' | '{' m '}' | '{' m ',' n? '}' | '{' m '+' '}')?
//! atom        := char | '\' char | '(' alternation ')' | '[' class ']'
//! class       := (member ('-' member)?)+
//! ```
//!
//! Each rule returns the byte offset it stopped at and its *frontier*: the
//! states where every path through the parsed text currently ends. The next
//! unit of a series is attached to the frontier (joined into one state first
//! when it has several members).
//!
//! Groups may nest at most [`MAX_NESTING_DEPTH`] levels deep; deeper
//! patterns fail with [`PatternError::NestingTooDeep`] instead of exhausting
//! the stack.
//!
//! # Example
//!
//! ```rust
//! use tramlex::fsa::Fsa;
//!
//! let mut fsa = Fsa::new();
//! fsa.build("if", 1).unwrap();
//! fsa.build("[a-z]+", 2).unwrap();
//!
//! assert_eq!(fsa.search("if", 0).token, 1);
//! assert_eq!(fsa.search("ifx", 0).token, 2);
//! ```

use super::common::{common_matcher, CommonMatch};
use super::state::{Fsa, Phase, StateId, TokenId};
use crate::error::PatternError;

/// Maximum number of nested groups in one pattern
pub const MAX_NESTING_DEPTH: usize = 256;

type Parsed = Result<(usize, Vec<StateId>), PatternError>;

impl Fsa {
    /// Compile `pattern` into this automaton, rooted at the root state
    ///
    /// Every state of the resulting frontier accepts `accept`, unless
    /// `accept <= 0` (such patterns still extend the graph but never produce
    /// a token). Patterns built into the same automaton compete for the
    /// longest match; ties go to the lowest token id.
    ///
    /// On error the automaton is left as it was before the call.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for malformed patterns and
    /// [`PatternError::FrozenAutomaton`] if the automaton is frozen.
    pub fn build(&mut self, pattern: &str, accept: TokenId) -> Result<Vec<StateId>, PatternError> {
        if self.phase == Phase::Frozen {
            return Err(PatternError::FrozenAutomaton);
        }

        let root = self.root;
        let mark = self.states.len();
        let saved_root = self.states[root.index()].clone();

        let result = PatternCompiler {
            fsa: self,
            pattern,
            depth: 0,
        }
        .compile(root);

        match result {
            Ok(frontier) => {
                if accept > 0 {
                    for &state in &frontier {
                        self.add_accept(state, accept);
                    }
                }
                log_debug!(
                    "Compiled pattern {:?} as token {} ({} states)",
                    pattern,
                    accept,
                    self.states.len()
                );
                Ok(frontier)
            }
            Err(err) => {
                // Only the root and states created by this call were touched
                self.states.truncate(mark);
                self.states[root.index()] = saved_root;
                Err(err)
            }
        }
    }
}

struct PatternCompiler<'f, 'p> {
    fsa: &'f mut Fsa,
    pattern: &'p str,
    /// Open groups around the current position
    depth: usize,
}

impl PatternCompiler<'_, '_> {
    #[inline]
    fn peek(&self, pos: usize) -> Option<char> {
        self.pattern.get(pos..)?.chars().next()
    }

    fn compile(&mut self, root: StateId) -> Result<Vec<StateId>, PatternError> {
        let (end, frontier) = self.alternation(0, root)?;
        match self.peek(end) {
            Some(found) => Err(PatternError::UnexpectedChar { offset: end, found }),
            None => Ok(frontier),
        }
    }

    fn alternation(&mut self, pos: usize, anchor: StateId) -> Parsed {
        let (mut pos, mut frontier) = self.series(pos, anchor)?;
        while self.peek(pos) == Some('|') {
            let (next, branch) = self.series(pos + 1, anchor)?;
            for state in branch {
                if !frontier.contains(&state) {
                    frontier.push(state);
                }
            }
            pos = next;
        }
        Ok((pos, frontier))
    }

    fn series(&mut self, mut pos: usize, anchor: StateId) -> Parsed {
        let mut frontier = vec![anchor];
        while let Some(c) = self.peek(pos) {
            if c == '|' || c == ')' {
                break;
            }
            let current = self.join(&frontier);
            let (next, unit) = self.quantified(pos, current)?;
            pos = next;
            frontier = unit;
        }
        Ok((pos, frontier))
    }

    fn quantified(&mut self, pos: usize, anchor: StateId) -> Parsed {
        match self.peek(pos) {
            Some('+') | Some('*') | Some('{') => {
                return Err(PatternError::EmptyRepetition { offset: pos });
            }
            Some('?') => {
                return Err(PatternError::ExpectedToken {
                    offset: pos,
                    expected: "expression before '?'",
                });
            }
            _ => {}
        }

        // The atom is compiled onto a detached state first; the quantifier
        // decides how it gets attached to the anchor
        let mark = self.fsa.states.len();
        let scratch = self.fsa.add_state(None);
        let (end, atom) = self.atom(pos, scratch)?;

        match self.peek(end) {
            Some('+') => {
                self.ensure_not_nullable(scratch, &atom, end)?;
                self.repeat(anchor, scratch, &atom);
                Ok((end + 1, atom))
            }
            Some('*') => {
                self.ensure_not_nullable(scratch, &atom, end)?;
                self.repeat(anchor, scratch, &atom);
                let mut outs = atom;
                outs.push(anchor);
                Ok((end + 1, vec![self.fsa.merge(&outs)]))
            }
            Some('?') => {
                self.fsa.add_epsilon(anchor, scratch);
                let mut outs = atom;
                outs.push(anchor);
                Ok((end + 1, vec![self.fsa.merge(&outs)]))
            }
            Some('{') => {
                self.ensure_not_nullable(scratch, &atom, end)?;
                // Copies are compiled afresh from the atom text
                self.fsa.states.truncate(mark);
                self.bounded(pos, end, anchor)
            }
            _ => {
                self.fsa.splice(scratch, anchor);
                Ok((end, atom))
            }
        }
    }

    fn atom(&mut self, pos: usize, anchor: StateId) -> Parsed {
        match self.peek(pos) {
            None => Err(PatternError::ExpectedToken {
                offset: pos,
                expected: "expression",
            }),
            Some('(') => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(PatternError::NestingTooDeep {
                        offset: pos,
                        limit: MAX_NESTING_DEPTH,
                    });
                }
                self.depth += 1;
                let inner = self.alternation(pos + 1, anchor);
                self.depth -= 1;
                let (end, frontier) = inner?;
                if self.peek(end) != Some(')') {
                    return Err(PatternError::ExpectedToken {
                        offset: end,
                        expected: "')'",
                    });
                }
                Ok((end + 1, vec![self.fsa.merge(&frontier)]))
            }
            Some('[') => self.class(pos + 1, anchor),
            Some('\\') => {
                let c = self.peek(pos + 1).ok_or(PatternError::ExpectedToken {
                    offset: pos + 1,
                    expected: "escaped character",
                })?;
                let target = self.fsa.add_transition(anchor, c);
                Ok((pos + 1 + c.len_utf8(), vec![target]))
            }
            Some(c) => {
                let target = self.fsa.add_transition(anchor, c);
                Ok((pos + c.len_utf8(), vec![target]))
            }
        }
    }

    fn class(&mut self, mut pos: usize, anchor: StateId) -> Parsed {
        if self.peek(pos) == Some(']') {
            return Err(PatternError::UnexpectedChar {
                offset: pos,
                found: ']',
            });
        }

        let mut members = Vec::new();
        loop {
            let c = match self.peek(pos) {
                None => {
                    return Err(PatternError::ExpectedToken {
                        offset: pos,
                        expected: "']'",
                    })
                }
                Some(']') => break,
                Some(c) => c,
            };
            let (start, next) = self.class_member(pos, c, false)?;
            pos = next;

            if self.peek(pos) != Some('-') {
                members.push(self.fsa.add_transition(anchor, start));
                continue;
            }

            let end_pos = pos + 1;
            let end_char = match self.peek(end_pos) {
                None | Some(']') => {
                    return Err(PatternError::ExpectedToken {
                        offset: end_pos,
                        expected: "range end character",
                    })
                }
                Some(c) => c,
            };
            let (end, next) = self.class_member(end_pos, end_char, true)?;
            if end <= start {
                return Err(PatternError::InvalidClassRange {
                    offset: end_pos,
                    start,
                    end,
                });
            }
            for c in start..=end {
                members.push(self.fsa.add_transition(anchor, c));
            }
            pos = next;
        }

        Ok((pos + 1, vec![self.fsa.merge(&members)]))
    }

    /// Read one class member at `pos`, whose first character is `c`
    fn class_member(
        &self,
        pos: usize,
        c: char,
        allow_dash: bool,
    ) -> Result<(char, usize), PatternError> {
        match c {
            '\\' => {
                let escaped = self.peek(pos + 1).ok_or(PatternError::ExpectedToken {
                    offset: pos + 1,
                    expected: "escaped character",
                })?;
                Ok((escaped, pos + 1 + escaped.len_utf8()))
            }
            '-' if !allow_dash => Err(PatternError::UnexpectedChar {
                offset: pos,
                found: '-',
            }),
            _ => Ok((c, pos + c.len_utf8())),
        }
    }

    /// Compile `{m,n}`, `{m,}`, `{m+}` or `{m}` applied to the atom at `atom_pos`
    fn bounded(&mut self, atom_pos: usize, brace: usize, anchor: StateId) -> Parsed {
        let (after, lower, upper) = self.bounds(brace)?;

        let mut outs = Vec::new();
        if lower == 0 {
            outs.push(anchor);
        }

        let mut current = anchor;
        for count in 1..=upper.unwrap_or(lower) {
            let (_, unit) = self.single(atom_pos, current)?;
            current = self.join(&unit);
            if count >= lower {
                outs.push(current);
            }
        }

        if upper.is_none() {
            let scratch = self.fsa.add_state(None);
            let (_, unit) = self.atom(atom_pos, scratch)?;
            self.repeat(current, scratch, &unit);
            outs.extend(unit);
        }

        Ok((after, vec![self.fsa.merge(&outs)]))
    }

    /// Parse the bounds starting at the `{` at `brace`
    ///
    /// Returns the offset after `}`, the lower bound and the upper bound
    /// (`None` when unbounded).
    fn bounds(&self, brace: usize) -> Result<(usize, usize, Option<usize>), PatternError> {
        let (lower, mut pos) = self.number(brace + 1)?;

        let upper = match self.peek(pos) {
            Some('}') => Some(lower),
            Some('+') => {
                pos += 1;
                None
            }
            Some(',') => {
                pos += 1;
                if self.peek(pos) == Some('}') {
                    None
                } else {
                    let (upper, next) = self.number(pos)?;
                    if upper < lower {
                        return Err(PatternError::RangeBounds {
                            offset: pos,
                            lower,
                            upper,
                        });
                    }
                    pos = next;
                    Some(upper)
                }
            }
            _ => {
                return Err(PatternError::ExpectedToken {
                    offset: pos,
                    expected: "',', '+' or '}'",
                })
            }
        };

        if self.peek(pos) != Some('}') {
            return Err(PatternError::ExpectedToken {
                offset: pos,
                expected: "'}'",
            });
        }
        Ok((pos + 1, lower, upper))
    }

    fn number(&self, pos: usize) -> Result<(usize, usize), PatternError> {
        let expected = PatternError::ExpectedToken {
            offset: pos,
            expected: "numeric value",
        };
        let found = common_matcher().search(self.pattern, pos);
        if found.token != CommonMatch::Numbers.id() {
            return Err(expected);
        }
        let value = found.text.parse::<usize>().map_err(|_| expected)?;
        Ok((value, found.end()))
    }

    /// Compile the atom at `pos` once and attach it directly to `anchor`
    fn single(&mut self, pos: usize, anchor: StateId) -> Parsed {
        let scratch = self.fsa.add_state(None);
        let (end, frontier) = self.atom(pos, scratch)?;
        self.fsa.splice(scratch, anchor);
        Ok((end, frontier))
    }

    /// Turn the atom compiled at `start` into a one-or-more loop entered from `anchor`
    fn repeat(&mut self, anchor: StateId, start: StateId, frontier: &[StateId]) {
        self.fsa.add_epsilon(anchor, start);
        for &state in frontier {
            self.fsa.add_epsilon(state, start);
        }
    }

    fn ensure_not_nullable(
        &self,
        start: StateId,
        frontier: &[StateId],
        offset: usize,
    ) -> Result<(), PatternError> {
        let nullable = self
            .fsa
            .epsilon_closure(&[start])
            .iter()
            .any(|state| frontier.contains(state));
        if nullable {
            Err(PatternError::EmptyRepetition { offset })
        } else {
            Ok(())
        }
    }

    fn join(&mut self, frontier: &[StateId]) -> StateId {
        match frontier {
            [single] => *single,
            _ => self.fsa.merge(frontier),
        }
    }
}
