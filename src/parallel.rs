//! Batch tokenizing and parsing
//!
//! Frozen automata, token tables and parsers are shared read-only, so many
//! independent inputs can be processed at once. With the `parallel` feature
//! the batch functions run on rayon's work-stealing pool; without it they
//! run sequentially with the same signatures and results.
//!
//! ```toml
//! [dependencies]
//! tramlex = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use tramlex::lexer::{TokenDef, TokenTable};
//! use tramlex::parallel::tokenize_batch;
//!
//! let table = TokenTable::new(vec![
//!     TokenDef::new("Word", "[a-z]+"),
//!     TokenDef::skip("Space", " +"),
//! ])
//! .unwrap();
//!
//! let tokens = tokenize_batch(&table, &["a b", "c"]);
//! assert_eq!(tokens[0].len(), 2);
//! assert_eq!(tokens[1][0].text, "c");
//! ```

use crate::error::ParseError;
use crate::lexer::{Token, TokenTable};
use crate::parser::{ParseNode, Parser};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Tokenize every input with one table, results in input order
#[cfg(feature = "parallel")]
pub fn tokenize_batch<'a>(table: &'a TokenTable, inputs: &[&'a str]) -> Vec<Vec<Token<'a>>> {
    inputs.par_iter().map(|input| table.tokenize(*input)).collect()
}

/// Tokenize every input with one table, results in input order
#[cfg(not(feature = "parallel"))]
pub fn tokenize_batch<'a>(table: &'a TokenTable, inputs: &[&'a str]) -> Vec<Vec<Token<'a>>> {
    inputs.iter().map(|input| table.tokenize(*input)).collect()
}

/// Parse every input with one parser, results in input order
#[cfg(feature = "parallel")]
pub fn parse_batch(parser: &Parser<'_>, inputs: &[&str]) -> Vec<Result<ParseNode, ParseError>> {
    inputs.par_iter().map(|input| parser.parse(input)).collect()
}

/// Parse every input with one parser, results in input order
#[cfg(not(feature = "parallel"))]
pub fn parse_batch(parser: &Parser<'_>, inputs: &[&str]) -> Vec<Result<ParseNode, ParseError>> {
    inputs.iter().map(|input| parser.parse(input)).collect()
}

/// Parse owned inputs, results in input order
#[cfg(feature = "parallel")]
pub fn parse_batch_owned(
    parser: &Parser<'_>,
    inputs: Vec<String>,
) -> Vec<Result<ParseNode, ParseError>> {
    inputs.into_par_iter().map(|input| parser.parse(&input)).collect()
}

/// Parse owned inputs, results in input order
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_owned(
    parser: &Parser<'_>,
    inputs: Vec<String>,
) -> Vec<Result<ParseNode, ParseError>> {
    inputs.into_iter().map(|input| parser.parse(&input)).collect()
}

/// Parse with an explicit thread count and chunk size
///
/// Falls back to the global pool if a dedicated pool cannot be created.
#[cfg(feature = "parallel")]
pub fn parse_batch_with_config(
    parser: &Parser<'_>,
    inputs: &[&str],
    config: &ParallelConfig,
) -> Vec<Result<ParseNode, ParseError>> {
    let run = || -> Vec<Result<ParseNode, ParseError>> {
        inputs
            .par_iter()
            .with_min_len(config.min_chunk_size.max(1))
            .map(|input| parser.parse(input))
            .collect()
    };

    let pool = config
        .num_threads
        .and_then(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build().ok());
    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}

/// Parse with an explicit thread count and chunk size (sequential fallback)
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_with_config(
    parser: &Parser<'_>,
    inputs: &[&str],
    _config: &ParallelConfig,
) -> Vec<Result<ParseNode, ParseError>> {
    parse_batch(parser, inputs)
}

/// Configuration for batch parsing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use (None = auto)
    pub num_threads: Option<usize>,
    /// Minimum number of inputs handed to one task
    pub min_chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_size: 1,
        }
    }
}

impl ParallelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set the minimum chunk size
    pub fn with_min_chunk_size(mut self, size: usize) -> Self {
        self.min_chunk_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenDef;
    use crate::parser::production::{infix_postfix_operator, literal, OperatorDef};
    use crate::parser::{Assoc, GrammarBuilder};

    fn table() -> TokenTable {
        TokenTable::new(vec![
            TokenDef::new("Number", "[0-9]+"),
            TokenDef::new("Add", "\\+"),
            TokenDef::skip("Space", " +"),
        ])
        .unwrap()
    }

    fn parser(table: &TokenTable) -> Parser<'_> {
        let grammar = GrammarBuilder::new()
            .rule(
                "sum",
                infix_postfix_operator(vec![OperatorDef::binary(2)], literal(&[1]), Assoc::Left),
            )
            .build()
            .unwrap();
        Parser::from_table(table, grammar)
    }

    #[test]
    fn test_tokenize_batch_keeps_order() {
        let table = table();
        let tokens = tokenize_batch(&table, &["1", "1 + 2", ""]);
        let counts: Vec<usize> = tokens.iter().map(Vec::len).collect();
        assert_eq!(counts, vec![1, 3, 0]);
    }

    #[test]
    fn test_parse_batch_with_failures() {
        let table = table();
        let parser = parser(&table);
        let results = parse_batch(&parser, &["1 + 2", "1 +", "3"]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_parse_batch_owned() {
        let table = table();
        let parser = parser(&table);
        let results = parse_batch_owned(&parser, vec!["4".to_string(), "5 + 6".to_string()]);
        assert!(results.iter().all(Result::is_ok));
    }

    #[test]
    fn test_parse_batch_with_config() {
        let table = table();
        let parser = parser(&table);
        let inputs: Vec<String> = (0..20).map(|i| format!("{} + {}", i, i)).collect();
        let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        let config = ParallelConfig::new().with_num_threads(2).with_min_chunk_size(4);
        let results = parse_batch_with_config(&parser, &refs, &config);
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(Result::is_ok));
    }

    #[test]
    fn test_parallel_config_builder() {
        let config = ParallelConfig::new().with_num_threads(4).with_min_chunk_size(10);
        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.min_chunk_size, 10);
        assert!(ParallelConfig::default().num_threads.is_none());
    }
}
