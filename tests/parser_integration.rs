//! End-to-end parsing: token table, grammar and parser together

use tramlex::debug::TreePrinter;
use tramlex::parallel::parse_batch;
use tramlex::prelude::*;
use tramlex::ParseError;

const NUMBER: TokenId = 1;
const IDENT: TokenId = 2;
const ADD: TokenId = 3;
const SUB: TokenId = 4;
const MUL: TokenId = 5;
const DIV: TokenId = 6;
const POW: TokenId = 7;
const BANG: TokenId = 8;
const LPAREN: TokenId = 9;
const RPAREN: TokenId = 10;

fn table() -> TokenTable {
    let table = TokenTable::new(vec![
        TokenDef::new("Number", "[0-9]+(\\.[0-9]+)?"),
        TokenDef::new("Ident", "[a-z]+"),
        TokenDef::new("Add", "\\+"),
        TokenDef::new("Sub", "-"),
        TokenDef::new("Mul", "\\*"),
        TokenDef::new("Div", "/"),
        TokenDef::new("Pow", "\\^"),
        TokenDef::new("Bang", "!"),
        TokenDef::new("LParen", "\\("),
        TokenDef::new("RParen", "\\)"),
        TokenDef::new("Comma", ","),
        TokenDef::skip("Space", "[ \t\n]+"),
    ])
    .unwrap();
    assert_eq!(table.id("RParen"), Some(RPAREN));
    table
}

fn grammar() -> Grammar {
    let primary = first_set(
        None,
        0,
        vec![
            (NUMBER, literal(&[NUMBER])),
            (IDENT, literal(&[IDENT])),
            (LPAREN, body(LPAREN, RPAREN, rule("sum"))),
        ],
    );
    let call = infix_postfix_operator(
        vec![
            OperatorDef::unary(LPAREN).with_data(body(LPAREN, RPAREN, rule("sum"))),
            OperatorDef::unary(BANG),
        ],
        primary,
        Assoc::Left,
    );
    let unary = prefix_operator(vec![OperatorDef::unary(SUB)], call);
    let power = infix_postfix_operator(vec![OperatorDef::binary(POW)], unary, Assoc::Right);
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

    GrammarBuilder::new().rule("sum", sum).build().unwrap()
}

fn sexpr(parser: &Parser<'_>, source: &str) -> String {
    let tree = parser
        .parse(source)
        .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e));
    tree.to_expr().unwrap().to_string()
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_operator_precedence_and_associativity() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());

    assert_eq!(sexpr(&parser, "1 + 2 * 3"), "(+ 1 (* 2 3))");
    assert_eq!(sexpr(&parser, "(1 + 2) * 3"), "(* (+ 1 2) 3)");
    assert_eq!(sexpr(&parser, "2 ^ 3 ^ 2"), "(^ 2 (^ 3 2))");
    assert_eq!(sexpr(&parser, "8 / 4 / 2"), "(/ (/ 8 4) 2)");
    assert_eq!(sexpr(&parser, "-1 - -2"), "(- (- 1) (- 2))");
    assert_eq!(sexpr(&parser, "1.5"), "1.5");
}

#[test]
fn test_postfix_and_calls() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());

    assert_eq!(sexpr(&parser, "3!"), "(!post 3)");
    assert_eq!(sexpr(&parser, "f(1 + 2)"), "((post f (+ 1 2))");
    assert_eq!(sexpr(&parser, "2 * g(x)!"), "(* 2 (!post ((post g x)))");
}

#[test]
fn test_chain_keeps_source_offsets() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let tree = parser.parse("10 + 20").unwrap();

    match &tree {
        ParseNode::InfixPostfix { assoc, members } => {
            assert_eq!(*assoc, Assoc::Left);
            assert_eq!(members.len(), 2);
            assert_eq!(members[1].op.as_ref().unwrap().offset, 3);
            let right = members[1].value.as_ref().unwrap().as_literal().unwrap();
            assert_eq!(right.text, "20");
            assert_eq!(right.offset, 5);
        }
        other => panic!("unexpected node: {:?}", other),
    }
    assert_eq!(tree.offset(), Some(0));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_operand_reports_position() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let source = "1 + * 2";

    let err = parser.parse(source).unwrap_err();
    assert_eq!(err.to_string(), "Expected operand after '+' but found '*' (token 5)");

    let rendered = err.format_with_source(source);
    assert!(rendered.contains("line 1, column 5"));
    assert!(rendered.contains("1 + * 2\n    ^"));
}

#[test]
fn test_unclosed_group_names_the_token() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let err = parser.parse("(1 + 2").unwrap_err();
    assert_eq!(err.to_string(), "Expected RParen but found end of input");
}

#[test]
fn test_diagnostics_keep_partial_tree() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let report = parser
        .parse_with_diagnostics("1 + ", &CancellationToken::new())
        .unwrap();

    assert!(!report.is_ok());
    assert_eq!(report.errors.len(), 1);
    let tree = report.tree.unwrap();
    match &tree {
        ParseNode::InfixPostfix { members, .. } => assert!(members[1].value.is_none()),
        other => panic!("unexpected node: {:?}", other),
    }
}

#[test]
fn test_trailing_input() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let err = parser.parse("1 2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected end of input but found '2' (token 1)"
    );

    let lenient = Parser::from_table(&table, grammar())
        .with_config(ParserConfig::new().with_require_end_of_input(false));
    assert_eq!(sexpr(&lenient, "1 2"), "1");
}

#[test]
fn test_error_limit_aborts() {
    let table = table();
    let parser = Parser::from_table(&table, grammar())
        .with_config(ParserConfig::new().with_max_errors(1));
    let report = parser
        .parse_with_diagnostics("1 + * 2 + * 3", &CancellationToken::new())
        .unwrap();
    assert!(report.tree.is_none());
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_unnamed_tokens_fall_back_to_ids() {
    let table = table();
    let parser = Parser::new(table.automaton(), grammar());
    let err = parser.parse("(1").unwrap_err();
    assert_eq!(err.to_string(), "Expected token 10 but found end of input");

    let named = Parser::new(table.automaton(), grammar()).with_token_name(RPAREN, "')'");
    let err = named.parse("(1").unwrap_err();
    assert_eq!(err.to_string(), "Expected ')' but found end of input");
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_cancelled_before_start() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        parser.parse_with_cancel("1 + 2", &cancel),
        Err(ParseError::Cancelled)
    );
}

#[test]
fn test_step_limit() {
    let table = table();
    let parser = Parser::from_table(&table, grammar())
        .with_config(ParserConfig::new().with_max_steps(10));
    let source = vec!["1"; 100].join(" + ");
    assert_eq!(
        parser.parse(&source),
        Err(ParseError::StepLimitExceeded { max_steps: 10 })
    );
}

#[test]
fn test_input_size_limit() {
    let table = table();
    let parser = Parser::from_table(&table, grammar())
        .with_config(ParserConfig::new().with_max_input_size(4));
    assert!(matches!(
        parser.parse("1 + 2"),
        Err(ParseError::InputTooLarge {
            input_size: 5,
            max_size: 4
        })
    ));
}

#[test]
fn test_deep_parentheses() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let depth = 10_000;
    let source = format!("{}7{}", "(".repeat(depth), ")".repeat(depth));
    let tree = parser.parse(&source).unwrap();
    assert_eq!(tree.as_literal().unwrap().text, "7");
}

#[test]
fn test_deep_trees_fold_print_and_drop() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let depth = 100_000;

    let nested = format!("{}1{}", "1+(".repeat(depth), ")".repeat(depth));
    let tree = parser.parse(&nested).unwrap();
    let text = tree.to_expr().unwrap().to_string();
    assert_eq!(text.len(), depth * 6 + 1);
    assert!(TreePrinter::new().max_depth(6).print(&tree).ends_with("...\n"));
    drop(tree);

    let negated = format!("{}1", "-".repeat(depth));
    let tree = parser.parse(&negated).unwrap();
    let text = tree.to_expr().unwrap().to_string();
    assert!(text.starts_with("(- (- "));
    assert_eq!(text.len(), depth * 4 + 1);
    assert_eq!(TreePrinter::new().max_depth(1).print(&tree).lines().count(), 3);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_json_output() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let tree = parser.parse("-x").unwrap();
    let json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();

    assert_eq!(json["kind"], "Prefix");
    assert_eq!(json["op"]["text"], "-");
    assert_eq!(json["value"]["kind"], "Literal");
    assert_eq!(json["value"]["text"], "x");
}

#[test]
fn test_tree_printer_output() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let tree = parser.parse("1 * 2").unwrap();
    let expected = "\
InfixPostfix Left
  \"1\" (token 1) @ 0
  op \"*\" @ 2
    \"2\" (token 1) @ 4
";
    assert_eq!(TreePrinter::new().print(&tree), expected);
}

#[test]
fn test_batch_parsing_matches_single_parses() {
    let table = table();
    let parser = Parser::from_table(&table, grammar());
    let inputs = ["1 + 2", "(3", "4 ^ 5 ^ 6", "x!"];
    let results = parse_batch(&parser, &inputs);

    assert_eq!(results.len(), inputs.len());
    for (input, result) in inputs.iter().zip(&results) {
        assert_eq!(result, &parser.parse(input));
    }
    assert!(results[1].is_err());
}
