//! Calculator Example
//!
//! Builds a token table and an operator grammar at run time, parses a few
//! expressions and evaluates the resulting expression trees.
//!
//! Run with: cargo run --example calculator

use tramlex::debug::TreePrinter;
use tramlex::prelude::*;

const NUMBER: TokenId = 1;
const ADD: TokenId = 2;
const SUB: TokenId = 3;
const MUL: TokenId = 4;
const DIV: TokenId = 5;
const POW: TokenId = 6;
const BANG: TokenId = 7;
const LPAREN: TokenId = 8;
const RPAREN: TokenId = 9;

fn build_token_table() -> Result<TokenTable, TokenTableError> {
    TokenTable::new(vec![
        TokenDef::new("Number", "[0-9]+(\\.[0-9]+)?"),
        TokenDef::new("Add", "\\+"),
        TokenDef::new("Sub", "-"),
        TokenDef::new("Mul", "\\*"),
        TokenDef::new("Div", "/"),
        TokenDef::new("Pow", "\\^"),
        TokenDef::new("Bang", "!"),
        TokenDef::new("LParen", "\\("),
        TokenDef::new("RParen", "\\)"),
        TokenDef::skip("Space", "[ \t]+"),
    ])
}

/// Precedence from loosest to tightest: `+ -`, `* /`, `^`, unary `-`, `!`
fn build_calculator_grammar() -> Result<Grammar, GrammarError> {
    let primary = first_set(
        None,
        0,
        vec![
            (NUMBER, literal(&[NUMBER])),
            (LPAREN, body(LPAREN, RPAREN, rule("expr"))),
        ],
    );
    let factorial = infix_postfix_operator(vec![OperatorDef::unary(BANG)], primary, Assoc::Left);
    let negation = prefix_operator(vec![OperatorDef::unary(SUB)], factorial);
    let power = infix_postfix_operator(vec![OperatorDef::binary(POW)], negation, Assoc::Right);
    let product = infix_postfix_operator(
        vec![OperatorDef::binary(MUL), OperatorDef::binary(DIV)],
        power,
        Assoc::Left,
    );
    let sum = infix_postfix_operator(
        vec![OperatorDef::binary(ADD), OperatorDef::binary(SUB)],
        product,
        Assoc::Left,
    );

    GrammarBuilder::new().rule("expr", sum).build()
}

fn evaluate(expr: &Expr) -> Result<f64, String> {
    match expr {
        Expr::Atom(lexeme) => lexeme
            .text
            .parse::<f64>()
            .map_err(|e| format!("bad number {:?}: {}", lexeme.text, e)),
        Expr::Unary { operand, .. } => Ok(-evaluate(operand)?),
        Expr::Postfix { operand, .. } => {
            let n = evaluate(operand)?;
            if n < 0.0 || n.fract() != 0.0 {
                return Err(format!("factorial of {}", n));
            }
            Ok((1..=n as u64).map(|i| i as f64).product())
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            let (l, r) = (evaluate(left)?, evaluate(right)?);
            match op.token {
                ADD => Ok(l + r),
                SUB => Ok(l - r),
                MUL => Ok(l * r),
                DIV if r == 0.0 => Err("division by zero".into()),
                DIV => Ok(l / r),
                POW => Ok(l.powf(r)),
                other => Err(format!("unknown operator token {}", other)),
            }
        }
    }
}

fn main() {
    println!("Calculator");
    println!("==========\n");

    let table = match build_token_table() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Token table error: {}", e);
            return;
        }
    };
    let grammar = match build_calculator_grammar() {
        Ok(grammar) => grammar,
        Err(e) => {
            eprintln!("Grammar error: {}", e);
            return;
        }
    };
    let parser = Parser::from_table(&table, grammar);

    let inputs = [
        "42",
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "2 ^ 3 ^ 2",
        "-3! + 10 / 4",
        "1 + * 2",
        "(1 + 2",
    ];

    for input in inputs {
        match parser.parse(input) {
            Ok(tree) => match tree.to_expr() {
                Some(expr) => match evaluate(&expr) {
                    Ok(value) => println!("{:<16} {:<28} = {}", input, expr.to_string(), value),
                    Err(e) => println!("{:<16} {:<28} error: {}", input, expr.to_string(), e),
                },
                None => println!("{:<16} incomplete tree", input),
            },
            Err(e) => println!("{}\n", e.format_with_source(input)),
        }
    }

    println!("\nTree for \"1 + 2 * 3\":");
    if let Ok(tree) = parser.parse("1 + 2 * 3") {
        print!("{}", TreePrinter::new().print(&tree));
    }
}
