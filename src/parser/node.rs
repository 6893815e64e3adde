//! Parse results
//!
//! The combinators produce [`ParseNode`] trees. Operator chains are kept flat
//! ([`ParseNode::InfixPostfix`] holds every member of one precedence level,
//! tagged with its associativity); [`ParseNode::to_expr`] folds them into
//! binary [`Expr`] trees.

use crate::fsa::TokenId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assoc {
    /// Left-associative: a + b + c = (a + b) + c
    Left,
    /// Right-associative: a = b = c = a = (b = c)
    Right,
    /// Non-associative: a < b < c stops after a < b
    NonAssoc,
}

/// A consumed token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lexeme {
    /// Token id
    pub token: TokenId,
    /// Matched text
    pub text: String,
    /// Byte offset in the source
    pub offset: usize,
}

impl Lexeme {
    /// Create a lexeme
    pub fn new(token: TokenId, text: impl Into<String>, offset: usize) -> Self {
        Self {
            token,
            text: text.into(),
            offset,
        }
    }
}

/// One member of an operator chain
///
/// The first member of a chain has no operator. Postfix members have no
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Operator preceding the value
    pub op: Option<Lexeme>,
    /// Operand following the operator
    pub value: Option<Box<ParseNode>>,
    /// Result of the operator's own sub-production
    pub data: Option<Box<ParseNode>>,
}

impl Member {
    pub(crate) fn operand(value: ParseNode) -> Self {
        Self {
            op: None,
            value: Some(Box::new(value)),
            data: None,
        }
    }
}

/// A node of the parse tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ParseNode {
    /// A single token
    Literal(Lexeme),
    /// A prefix operator applied to an operand
    Prefix {
        /// The operator
        op: Lexeme,
        /// The operand, missing only if an error was recorded
        value: Option<Box<ParseNode>>,
        /// Result of the operator's own sub-production
        data: Option<Box<ParseNode>>,
    },
    /// A chain of infix and postfix operators at one precedence level
    InfixPostfix {
        /// Associativity of the level
        assoc: Assoc,
        /// Members in source order, at least two
        members: Vec<Member>,
    },
}

impl ParseNode {
    /// Byte offset where the node starts
    pub fn offset(&self) -> Option<usize> {
        let mut node = self;
        loop {
            match node {
                ParseNode::Literal(lexeme) => return Some(lexeme.offset),
                ParseNode::Prefix { op, .. } => return Some(op.offset),
                ParseNode::InfixPostfix { members, .. } => {
                    node = members.first()?.value.as_deref()?;
                }
            }
        }
    }

    /// The token, if this is a literal
    pub fn as_literal(&self) -> Option<&Lexeme> {
        match self {
            ParseNode::Literal(lexeme) => Some(lexeme),
            _ => None,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Fold operator chains into a binary expression tree
    ///
    /// Left-associative (and non-associative) chains fold from the left.
    /// Right-associative chains first bind postfix operators to the operand
    /// before them, then fold binary operators from the right. A member
    /// without a value folds as a postfix operator. Returns `None` if the
    /// first operand of a chain or the operand of a prefix is missing.
    ///
    /// The walk keeps its own stack, so tree depth is bounded by memory
    /// rather than by the thread's stack.
    pub fn to_expr(&self) -> Option<Expr> {
        let mut tasks = vec![Fold::Visit(self)];
        let mut done: Vec<Expr> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Fold::Visit(ParseNode::Literal(lexeme)) => {
                    done.push(Expr::Atom(lexeme.clone()));
                }
                Fold::Visit(ParseNode::Prefix { op, value, data }) => {
                    tasks.push(Fold::Prefix(op, data.is_some()));
                    tasks.push(Fold::Visit(value.as_deref()?));
                    if let Some(data) = data.as_deref() {
                        tasks.push(Fold::Visit(data));
                    }
                }
                Fold::Visit(ParseNode::InfixPostfix { assoc, members }) => {
                    if members.first()?.value.is_none() {
                        return None;
                    }
                    tasks.push(Fold::Chain(*assoc, members));
                    // Children run in source order: each member's data, then its value.
                    for member in members.iter().rev() {
                        if let Some(value) = member.value.as_deref() {
                            tasks.push(Fold::Visit(value));
                        }
                        if let Some(data) = member.data.as_deref() {
                            tasks.push(Fold::Visit(data));
                        }
                    }
                }
                Fold::Prefix(op, has_data) => {
                    let operand = Box::new(done.pop()?);
                    let data = if has_data {
                        Some(Box::new(done.pop()?))
                    } else {
                        None
                    };
                    done.push(Expr::Unary {
                        op: op.clone(),
                        operand,
                        data,
                    });
                }
                Fold::Chain(assoc, members) => {
                    let count: usize = members
                        .iter()
                        .map(|m| m.value.iter().count() + m.data.iter().count())
                        .sum();
                    let split = done.len().checked_sub(count)?;
                    let mut children = done.split_off(split).into_iter();
                    let (first, rest) = members.split_first()?;
                    if first.data.is_some() {
                        children.next()?;
                    }
                    let head = children.next()?;

                    let mut steps = Vec::with_capacity(rest.len());
                    for member in rest {
                        let op = member.op.clone()?;
                        let data = match member.data {
                            Some(_) => Some(Box::new(children.next()?)),
                            None => None,
                        };
                        let value = match member.value {
                            Some(_) => Some(children.next()?),
                            None => None,
                        };
                        steps.push(Step { op, value, data });
                    }

                    done.push(match assoc {
                        Assoc::Right => fold_right(head, steps)?,
                        Assoc::Left | Assoc::NonAssoc => fold_left(head, steps),
                    });
                }
            }
        }
        done.pop()
    }

    /// Move the direct children out of the node
    fn detach_children(&mut self, out: &mut Vec<Box<ParseNode>>) {
        match self {
            ParseNode::Literal(_) => {}
            ParseNode::Prefix { value, data, .. } => {
                out.extend(value.take());
                out.extend(data.take());
            }
            ParseNode::InfixPostfix { members, .. } => {
                for member in members.iter_mut() {
                    out.extend(member.value.take());
                    out.extend(member.data.take());
                }
            }
        }
    }
}

impl Drop for ParseNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

/// Pending work of [`ParseNode::to_expr`]
enum Fold<'n> {
    Visit(&'n ParseNode),
    Prefix(&'n Lexeme, bool),
    Chain(Assoc, &'n [Member]),
}

/// A converted chain member after the first
struct Step {
    op: Lexeme,
    value: Option<Expr>,
    data: Option<Box<Expr>>,
}

fn fold_left(head: Expr, steps: Vec<Step>) -> Expr {
    let mut acc = head;
    for Step { op, value, data } in steps {
        acc = match value {
            Some(value) => Expr::Binary {
                op,
                left: Box::new(acc),
                right: Box::new(value),
                data,
            },
            None => Expr::Postfix {
                op,
                operand: Box::new(acc),
                data,
            },
        };
    }
    acc
}

fn fold_right(head: Expr, steps: Vec<Step>) -> Option<Expr> {
    let mut operands = vec![head];
    let mut operators = Vec::new();

    for Step { op, value, data } in steps {
        match value {
            Some(value) => {
                operators.push((op, data));
                operands.push(value);
            }
            None => {
                let operand = Box::new(operands.pop()?);
                operands.push(Expr::Postfix { op, operand, data });
            }
        }
    }

    let mut acc = operands.pop()?;
    while let Some(left) = operands.pop() {
        let (op, data) = operators.pop()?;
        acc = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(acc),
            data,
        };
    }
    Some(acc)
}

/// Binary expression tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    /// A single token
    Atom(Lexeme),
    /// Prefix operator
    Unary {
        /// The operator
        op: Lexeme,
        /// The operand
        operand: Box<Expr>,
        /// Operator sub-production result
        data: Option<Box<Expr>>,
    },
    /// Postfix operator
    Postfix {
        /// The operator
        op: Lexeme,
        /// The operand
        operand: Box<Expr>,
        /// Operator sub-production result
        data: Option<Box<Expr>>,
    },
    /// Infix operator
    Binary {
        /// The operator
        op: Lexeme,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Operator sub-production result
        data: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Move the direct children out, leaving empty atoms behind
    fn detach_children(&mut self, out: &mut Vec<Expr>) {
        match self {
            Expr::Atom(_) => {}
            Expr::Unary { operand, data, .. } | Expr::Postfix { operand, data, .. } => {
                out.push(detach(operand));
                if let Some(data) = data {
                    out.push(detach(data));
                }
            }
            Expr::Binary {
                left, right, data, ..
            } => {
                out.push(detach(left));
                out.push(detach(right));
                if let Some(data) = data {
                    out.push(detach(data));
                }
            }
        }
    }
}

fn detach(slot: &mut Expr) -> Expr {
    std::mem::replace(slot, Expr::Atom(Lexeme::new(0, String::new(), 0)))
}

impl Drop for Expr {
    fn drop(&mut self) {
        if let Expr::Atom(_) = self {
            return;
        }
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}

/// Output of the s-expression writer
enum Piece<'e> {
    Expr(&'e Expr),
    Text(&'e str),
}

/// S-expression rendering, e.g. `(+ 1 (* 2 3))`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Expr(self)];
        while let Some(piece) = pieces.pop() {
            let expr = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Expr(expr) => expr,
            };
            // Pushed in reverse of the written order.
            match expr {
                Expr::Atom(lexeme) => f.write_str(&lexeme.text)?,
                Expr::Unary { op, operand, data } => {
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Expr(operand));
                    if let Some(data) = data {
                        pieces.push(Piece::Text(" "));
                        pieces.push(Piece::Expr(data));
                    }
                    pieces.push(Piece::Text(" "));
                    pieces.push(Piece::Text(&op.text));
                    pieces.push(Piece::Text("("));
                }
                Expr::Postfix { op, operand, data } => {
                    pieces.push(Piece::Text(")"));
                    if let Some(data) = data {
                        pieces.push(Piece::Expr(data));
                        pieces.push(Piece::Text(" "));
                    }
                    pieces.push(Piece::Expr(operand));
                    pieces.push(Piece::Text("post "));
                    pieces.push(Piece::Text(&op.text));
                    pieces.push(Piece::Text("("));
                }
                Expr::Binary {
                    op, left, right, ..
                } => {
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Expr(right));
                    pieces.push(Piece::Text(" "));
                    pieces.push(Piece::Expr(left));
                    pieces.push(Piece::Text(" "));
                    pieces.push(Piece::Text(&op.text));
                    pieces.push(Piece::Text("("));
                }
            }
        }
        Ok(())
    }
}
