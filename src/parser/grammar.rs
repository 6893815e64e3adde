//! Named rules
//!
//! A [`Grammar`] maps rule names to productions so that productions can
//! refer to each other (and to themselves) through [`rule`](super::production::rule)
//! references. The first rule added is the root unless another is chosen.
//!
//! # Example
//!
//! ```rust
//! use tramlex::parser::production::{body, first_set, literal, rule};
//! use tramlex::parser::GrammarBuilder;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("value", first_set(None, 0, vec![
//!         (1, literal(&[1])),
//!         (2, body(2, 3, rule("value"))),
//!     ]))
//!     .build()
//!     .unwrap();
//! assert_eq!(grammar.root_name(), "value");
//!
//! let broken = GrammarBuilder::new().rule("value", rule("missing")).build();
//! assert!(broken.is_err());
//! ```

use super::production::Production;
use crate::error::GrammarError;
use hashbrown::HashMap;

/// Validated set of named productions
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<(String, Production)>,
    index: HashMap<String, usize>,
    root: usize,
}

impl Grammar {
    /// Production of the rule `name`
    pub fn get(&self, name: &str) -> Option<&Production> {
        self.index.get(name).map(|&i| &self.rules[i].1)
    }

    /// Production parsing starts from
    pub fn root(&self) -> &Production {
        &self.rules[self.root].1
    }

    /// Name of the root rule
    pub fn root_name(&self) -> &str {
        &self.rules[self.root].0
    }

    /// Rule names in definition order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the grammar has no rules (never true for a built grammar)
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`Grammar`]
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<(String, Production)>,
    root: Option<String>,
}

impl GrammarBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule, replacing any earlier definition with the same name
    pub fn rule(mut self, name: &str, production: Production) -> Self {
        match self.rules.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = production,
            None => self.rules.push((name.to_string(), production)),
        }
        self
    }

    /// Start parsing from `name` instead of the first rule
    pub fn root(mut self, name: &str) -> Self {
        self.root = Some(name.to_string());
        self
    }

    /// Check all references and build the grammar
    ///
    /// # Errors
    ///
    /// [`GrammarError::Empty`] without rules, [`GrammarError::UndefinedRule`]
    /// for the first reference (or root name) that names no rule.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let index: HashMap<String, usize> = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();

        for (_, production) in &self.rules {
            if let Some(name) = production
                .references()
                .into_iter()
                .find(|name| !index.contains_key(name))
            {
                return Err(GrammarError::UndefinedRule { name });
            }
        }

        let root = match &self.root {
            Some(name) => *index
                .get(name)
                .ok_or_else(|| GrammarError::UndefinedRule { name: name.clone() })?,
            None => 0,
        };

        log_debug!("Built grammar with {} rules", self.rules.len());

        Ok(Grammar {
            rules: self.rules,
            index,
            root,
        })
    }
}
