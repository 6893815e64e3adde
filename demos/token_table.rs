//! Token Table Example
//!
//! Loads a token table from JSON, tokenizes a snippet, and prints the
//! compiled automaton as a transition table and as a Mermaid diagram.
//!
//! Run with: cargo run --example token-table

use tramlex::debug::FsaVisualizer;
use tramlex::lexer::TokenTable;
use tramlex::NO_MATCH;

const TABLE: &str = r#"[
    {"name": "Let", "pattern": "let"},
    {"name": "Ident", "pattern": "[a-z_][a-z0-9_]*"},
    {"name": "Number", "pattern": "[0-9]+"},
    {"name": "Assign", "pattern": "="},
    {"name": "Semi", "pattern": ";"},
    {"name": "Space", "pattern": "[ \t\n]+", "discard": true}
]"#;

fn main() {
    let table = match TokenTable::from_json(TABLE) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Invalid token table: {}", e);
            return;
        }
    };

    let source = "let answer = 42;\nlet letters = answer ? 1;";
    println!("Tokens for {:?}:\n", source);
    for token in table.tokenize(source) {
        let name = match token.id {
            NO_MATCH => "<unmatched>",
            id => table.name(id).unwrap_or("<unknown>"),
        };
        println!("  {:>3}  {:<12} {:?}", token.offset, name, token.text);
    }

    let automaton = table.automaton();
    println!(
        "\nMinimal automaton: {} states (fingerprint {:016x})\n",
        automaton.len(),
        automaton.fingerprint()
    );

    let visualizer = FsaVisualizer::new(automaton);
    println!("{}", visualizer.to_table());
    println!("{}", visualizer.to_mermaid());

    match automaton.to_json() {
        Ok(json) => println!("Serialized form: {} bytes", json.len()),
        Err(e) => eprintln!("Serialization failed: {}", e),
    }
}
