//! Precedence-climbing productions
//!
//! A grammar is a tree of [`Production`] values built with the constructor
//! functions in this module. Running a production never recurses on the
//! host stack: each step schedules its sub-productions as work on the
//! [`Agenda`](super::trampoline::Agenda) and registers a tail that picks up
//! their results.
//!
//! Each production yields `Some(node)` on success and `None` for a soft
//! failure. Soft failures record nothing; the consumer that needed the value
//! records an error and carries on.
//!
//! # Example
//!
//! ```rust
//! use tramlex::parser::production::{body, first_set, infix_postfix_operator, literal, rule, OperatorDef};
//! use tramlex::parser::Assoc;
//!
//! const NUMBER: i32 = 1;
//! const ADD: i32 = 2;
//! const LPAREN: i32 = 3;
//! const RPAREN: i32 = 4;
//!
//! let primary = first_set(
//!     None,
//!     0,
//!     vec![
//!         (NUMBER, literal(&[NUMBER])),
//!         (LPAREN, body(LPAREN, RPAREN, rule("expr"))),
//!     ],
//! );
//! let expr = infix_postfix_operator(vec![OperatorDef::binary(ADD)], primary, Assoc::Left);
//! assert_eq!(expr.references(), vec!["expr".to_string()]);
//! ```

use super::context::ParseContext;
use super::node::{Assoc, Lexeme, Member, ParseNode};
use super::trampoline::{Agenda, WorkId};
use crate::error::ParseError;
use crate::fsa::TokenId;
use std::sync::Arc;

/// Agenda used while parsing
pub type ParseAgenda<'a> = Agenda<ParseContext<'a>, ParseNode, ParseError>;

type Step = Result<Option<ParseNode>, ParseError>;

/// An operator registered at one precedence level
#[derive(Debug, Clone)]
pub struct OperatorDef {
    /// Token that introduces the operator
    pub token: TokenId,
    /// Whether a right operand follows (infix) or not (prefix, postfix)
    pub binary: bool,
    /// Production run in place of consuming the operator token
    pub data: Option<Production>,
}

impl OperatorDef {
    /// A prefix or postfix operator
    pub fn unary(token: TokenId) -> Self {
        Self {
            token,
            binary: false,
            data: None,
        }
    }

    /// An infix operator
    pub fn binary(token: TokenId) -> Self {
        Self {
            token,
            binary: true,
            data: None,
        }
    }

    /// Run `data` at the operator instead of consuming its token
    ///
    /// The production should consume the operator token itself (a call
    /// suffix `f(x)` is `body(LParen, RParen, ...)` registered on `LParen`).
    /// If it does not, the token is consumed after it ran.
    pub fn with_data(mut self, data: Production) -> Self {
        self.data = Some(data);
        self
    }
}

/// Operators of one precedence level and the level below it
#[derive(Debug)]
pub struct OperatorLevel {
    /// Registered operators
    pub ops: Vec<OperatorDef>,
    /// Production for operands
    pub next: Production,
    /// Associativity of chains at this level
    pub assoc: Assoc,
}

impl OperatorLevel {
    fn find(&self, token: TokenId) -> Option<OperatorDef> {
        self.ops.iter().find(|op| op.token == token).cloned()
    }
}

/// The kinds of production
#[derive(Debug)]
pub enum ProductionKind {
    /// One token out of a set
    Literal(Vec<TokenId>),
    /// Stacked prefix operators over the next level
    Prefix(Arc<OperatorLevel>),
    /// A chain of infix and postfix operators over the next level
    InfixPostfix(Arc<OperatorLevel>),
    /// Dispatch on a token of lookahead
    FirstSet {
        /// Production used when no option matches
        fallback: Option<Production>,
        /// Tokens skipped before dispatching
        lookahead: usize,
        /// Production per dispatch token
        options: Vec<(TokenId, Production)>,
    },
    /// Content between two delimiters
    Body {
        /// Opening token
        start: TokenId,
        /// Closing token
        end: TokenId,
        /// Production between them
        content: Production,
    },
    /// Reference to a named rule of the grammar
    Rule(String),
}

/// A shareable production
#[derive(Debug, Clone)]
pub struct Production(Arc<ProductionKind>);

/// Match one of `tokens`
pub fn literal(tokens: &[TokenId]) -> Production {
    Production::new(ProductionKind::Literal(tokens.to_vec()))
}

/// Stacked prefix operators, delegating to `next` when none applies
pub fn prefix_operator(ops: Vec<OperatorDef>, next: Production) -> Production {
    Production::new(ProductionKind::Prefix(Arc::new(OperatorLevel {
        ops,
        next,
        assoc: Assoc::Right,
    })))
}

/// A chain of infix and postfix operators over `next`
pub fn infix_postfix_operator(ops: Vec<OperatorDef>, next: Production, assoc: Assoc) -> Production {
    Production::new(ProductionKind::InfixPostfix(Arc::new(OperatorLevel {
        ops,
        next,
        assoc,
    })))
}

/// Dispatch on the token `lookahead` tokens ahead
pub fn first_set(
    fallback: Option<Production>,
    lookahead: usize,
    options: Vec<(TokenId, Production)>,
) -> Production {
    Production::new(ProductionKind::FirstSet {
        fallback,
        lookahead,
        options,
    })
}

/// `content` enclosed in `start` and `end`
pub fn body(start: TokenId, end: TokenId, content: Production) -> Production {
    Production::new(ProductionKind::Body {
        start,
        end,
        content,
    })
}

/// Reference to the rule `name`, resolved when parsing
pub fn rule(name: &str) -> Production {
    Production::new(ProductionKind::Rule(name.to_string()))
}

impl Production {
    fn new(kind: ProductionKind) -> Self {
        Self(Arc::new(kind))
    }

    /// The kind of production
    pub fn kind(&self) -> &ProductionKind {
        &self.0
    }

    /// Names of all rules referenced by this production, in order
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        match &*self.0 {
            ProductionKind::Literal(_) => {}
            ProductionKind::Prefix(level) | ProductionKind::InfixPostfix(level) => {
                for op in &level.ops {
                    if let Some(data) = &op.data {
                        data.collect_references(names);
                    }
                }
                level.next.collect_references(names);
            }
            ProductionKind::FirstSet {
                fallback, options, ..
            } => {
                for (_, option) in options {
                    option.collect_references(names);
                }
                if let Some(fallback) = fallback {
                    fallback.collect_references(names);
                }
            }
            ProductionKind::Body { content, .. } => content.collect_references(names),
            ProductionKind::Rule(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }

    /// Short description used in error messages
    pub fn describe(&self, ctx: &ParseContext<'_>) -> String {
        match &*self.0 {
            ProductionKind::Literal(tokens) => tokens
                .iter()
                .map(|t| ctx.describe(*t))
                .collect::<Vec<_>>()
                .join(" or "),
            ProductionKind::Rule(name) => name.clone(),
            ProductionKind::Body { start, .. } => ctx.describe(*start),
            _ => "expression".to_string(),
        }
    }

    /// Schedule this production and return the handle its result lands on
    pub fn schedule<'a>(&self, agenda: &mut ParseAgenda<'a>) -> WorkId {
        let production = self.clone();
        agenda.add_work(move |ctx: &mut ParseContext<'a>, agenda: &mut ParseAgenda<'a>| {
            production.run(ctx, agenda)
        })
    }

    /// Run one step of this production
    ///
    /// The result is either returned directly or delivered later by a tail
    /// registered here.
    pub fn run<'a>(&self, ctx: &mut ParseContext<'a>, agenda: &mut ParseAgenda<'a>) -> Step {
        match &*self.0 {
            ProductionKind::Literal(tokens) => Ok(accept(tokens, ctx)),
            ProductionKind::Prefix(level) => prefix(self, level, ctx, agenda),
            ProductionKind::InfixPostfix(level) => {
                infix_postfix(level, agenda);
                Ok(None)
            }
            ProductionKind::FirstSet {
                fallback,
                lookahead,
                options,
            } => {
                first_set_dispatch(fallback.as_ref(), *lookahead, options, ctx, agenda);
                Ok(None)
            }
            ProductionKind::Body {
                start,
                end,
                content,
            } => delimited(*start, *end, content, ctx, agenda),
            ProductionKind::Rule(name) => {
                let target = ctx
                    .grammar()
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ParseError::UndefinedRule { name: name.clone() })?;
                delegate(&target, agenda);
                Ok(None)
            }
        }
    }
}

/// Run `target` and forward its result
fn delegate(target: &Production, agenda: &mut ParseAgenda<'_>) {
    let id = target.schedule(agenda);
    agenda.add_tail(move |_, agenda| Ok(agenda.take_result(id)));
}

fn accept(tokens: &[TokenId], ctx: &mut ParseContext<'_>) -> Option<ParseNode> {
    let lexeme = ctx.lexeme();
    if !tokens.contains(&lexeme.token) {
        return None;
    }
    ctx.stream().poll();
    Some(ParseNode::Literal(lexeme))
}

// =============================================================================
// Prefix operators
// =============================================================================

fn prefix<'a>(
    this: &Production,
    level: &OperatorLevel,
    ctx: &mut ParseContext<'a>,
    agenda: &mut ParseAgenda<'a>,
) -> Step {
    let token = ctx.stream().peek();
    let Some(op) = level.find(token) else {
        delegate(&level.next, agenda);
        return Ok(None);
    };

    let lexeme = ctx.lexeme();
    match op.data {
        None => {
            ctx.stream().poll();
            prefix_operand(this.clone(), lexeme, None, agenda);
        }
        Some(data) => {
            let data_id = data.schedule(agenda);
            let this = this.clone();
            agenda.add_tail(move |ctx, agenda| {
                let data = agenda.take_result(data_id);
                ctx.ensure_consumed(&lexeme);
                prefix_operand(this, lexeme, data, agenda);
                Ok(None)
            });
        }
    }
    Ok(None)
}

/// Parse the operand of a prefix operator at the same level
fn prefix_operand(this: Production, op: Lexeme, data: Option<ParseNode>, agenda: &mut ParseAgenda<'_>) {
    let value_id = this.schedule(agenda);
    agenda.add_tail(move |ctx, agenda| {
        let value = agenda.take_result(value_id);
        if value.is_none() {
            ctx.expected(format!("operand after '{}'", op.text))?;
        }
        Ok(Some(ParseNode::Prefix {
            op,
            value: value.map(Box::new),
            data: data.map(Box::new),
        }))
    });
}

// =============================================================================
// Infix and postfix operators
// =============================================================================

fn infix_postfix(level: &Arc<OperatorLevel>, agenda: &mut ParseAgenda<'_>) {
    let first = level.next.schedule(agenda);
    let level = Arc::clone(level);
    agenda.add_tail(move |ctx, agenda| match agenda.take_result(first) {
        Some(value) => chain_step(level, vec![Member::operand(value)], ctx, agenda),
        None => Ok(None),
    });
}

/// Extend the chain by one operator, or finish it
///
/// Only ever called from a tail, so chains of any length run in constant
/// host stack.
fn chain_step<'a>(
    level: Arc<OperatorLevel>,
    members: Vec<Member>,
    ctx: &mut ParseContext<'a>,
    agenda: &mut ParseAgenda<'a>,
) -> Step {
    let token = ctx.stream().peek();
    let op = match level.assoc {
        Assoc::NonAssoc if members.len() > 1 => None,
        _ => level.find(token),
    };
    let Some(op) = op else {
        return Ok(Some(collapse(level.assoc, members)));
    };

    let lexeme = ctx.lexeme();
    match op.data.clone() {
        None => {
            ctx.stream().poll();
            chain_operand(level, members, op, lexeme, None, agenda);
        }
        Some(data) => {
            let data_id = data.schedule(agenda);
            agenda.add_tail(move |ctx, agenda| {
                let data = agenda.take_result(data_id);
                ctx.ensure_consumed(&lexeme);
                chain_operand(level, members, op, lexeme, data, agenda);
                Ok(None)
            });
        }
    }
    Ok(None)
}

fn chain_operand(
    level: Arc<OperatorLevel>,
    mut members: Vec<Member>,
    op: OperatorDef,
    lexeme: Lexeme,
    data: Option<ParseNode>,
    agenda: &mut ParseAgenda<'_>,
) {
    if !op.binary {
        agenda.add_tail(move |ctx, agenda| {
            members.push(Member {
                op: Some(lexeme),
                value: None,
                data: data.map(Box::new),
            });
            chain_step(level, members, ctx, agenda)
        });
        return;
    }

    let right = level.next.schedule(agenda);
    agenda.add_tail(move |ctx, agenda| {
        let value = agenda.take_result(right);
        if value.is_none() {
            ctx.expected(format!("operand after '{}'", lexeme.text))?;
        }
        members.push(Member {
            op: Some(lexeme),
            value: value.map(Box::new),
            data: data.map(Box::new),
        });
        chain_step(level, members, ctx, agenda)
    });
}

fn collapse(assoc: Assoc, mut members: Vec<Member>) -> ParseNode {
    if members.len() == 1 && members[0].op.is_none() {
        if let Some(value) = members[0].value.take() {
            return *value;
        }
    }
    ParseNode::InfixPostfix { assoc, members }
}

// =============================================================================
// Dispatch and delimiters
// =============================================================================

fn first_set_dispatch(
    fallback: Option<&Production>,
    lookahead: usize,
    options: &[(TokenId, Production)],
    ctx: &mut ParseContext<'_>,
    agenda: &mut ParseAgenda<'_>,
) {
    let origin = ctx.stream().offset();
    for _ in 0..lookahead {
        ctx.stream().poll();
    }
    let token = ctx.stream().peek();
    let choice = options
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, p)| p)
        .or(fallback);

    if ctx.stream().offset() != origin {
        ctx.stream().seek(origin);
    }

    let Some(choice) = choice else {
        return;
    };

    let mark = ctx.error_mark();
    let id = choice.schedule(agenda);
    agenda.add_tail(move |ctx, agenda| {
        let result = agenda.take_result(id);
        if result.is_none() {
            ctx.stream().seek(origin);
            ctx.discard_errors_from(mark);
        }
        Ok(result)
    });
}

fn delimited<'a>(
    start: TokenId,
    end: TokenId,
    content: &Production,
    ctx: &mut ParseContext<'a>,
    agenda: &mut ParseAgenda<'a>,
) -> Step {
    if ctx.stream().peek() == start {
        ctx.stream().poll();
    } else {
        let expected = ctx.describe(start);
        ctx.expected(expected)?;
    }

    let content_id = content.schedule(agenda);
    let content = content.clone();
    agenda.add_tail(move |ctx, agenda| {
        let result = agenda.take_result(content_id);
        if result.is_none() {
            let expected = content.describe(ctx);
            ctx.expected(expected)?;
        }
        if ctx.stream().peek() == end {
            ctx.stream().poll();
        } else {
            let expected = ctx.describe(end);
            ctx.expected(expected)?;
        }
        Ok(result)
    });
    Ok(None)
}
