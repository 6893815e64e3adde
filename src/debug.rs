//! Developer tools
//!
//! - [`TreePrinter`] - indented rendering of parse trees
//! - [`FsaVisualizer`] - Mermaid and GraphViz DOT renderings of automata

use crate::fsa::{Fsa, State, StateId};
use crate::parser::{Member, ParseNode};
use std::fmt::{self, Write};

/// Parse tree pretty printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Render a parse tree, one node per line
    pub fn print(&self, node: &ParseNode) -> String {
        let mut output = String::new();
        // Writing to a String cannot fail
        let _ = self.write_tree(node, &mut output);
        output
    }

    /// Depth-first walk on an explicit stack
    fn write_tree(&self, root: &ParseNode, output: &mut String) -> fmt::Result {
        let mut stack = vec![Line::Node(root, 0)];
        while let Some(line) = stack.pop() {
            // Children are pushed in reverse of their printed order.
            match line {
                Line::Node(node, depth) => {
                    self.pad(depth, output);
                    if self.max_depth.is_some_and(|max| depth > max) {
                        writeln!(output, "...")?;
                        continue;
                    }
                    match node {
                        ParseNode::Literal(lexeme) => writeln!(
                            output,
                            "{:?} (token {}) @ {}",
                            lexeme.text, lexeme.token, lexeme.offset
                        )?,
                        ParseNode::Prefix { op, value, data } => {
                            writeln!(output, "Prefix {:?} @ {}", op.text, op.offset)?;
                            stack.push(Line::Child("value", value.as_deref(), depth + 1));
                            stack.push(Line::Child("data", data.as_deref(), depth + 1));
                        }
                        ParseNode::InfixPostfix { assoc, members } => {
                            writeln!(output, "InfixPostfix {:?}", assoc)?;
                            stack.extend(members.iter().rev().map(|m| Line::Member(m, depth + 1)));
                        }
                    }
                }
                Line::Member(member, depth) => match (&member.op, member.value.as_deref()) {
                    (Some(op), value) => {
                        self.pad(depth, output);
                        writeln!(output, "op {:?} @ {}", op.text, op.offset)?;
                        if let Some(value) = value {
                            stack.push(Line::Node(value, depth + 1));
                        }
                        stack.push(Line::Child("data", member.data.as_deref(), depth + 1));
                    }
                    (None, Some(value)) => stack.push(Line::Node(value, depth)),
                    (None, None) => {
                        self.pad(depth, output);
                        writeln!(output, "<missing>")?;
                    }
                },
                Line::Child(label, Some(node), depth) => {
                    self.pad(depth, output);
                    writeln!(output, "{}:", label)?;
                    stack.push(Line::Node(node, depth + 1));
                }
                Line::Child("value", None, depth) => {
                    self.pad(depth, output);
                    writeln!(output, "value: <missing>")?;
                }
                Line::Child(_, None, _) => {}
            }
        }
        Ok(())
    }

    fn pad(&self, depth: usize, output: &mut String) {
        for _ in 0..depth {
            output.push_str(&self.indent);
        }
    }
}

/// Pending output of [`TreePrinter`]
enum Line<'n> {
    Node(&'n ParseNode, usize),
    Member(&'n Member, usize),
    Child(&'static str, Option<&'n ParseNode>, usize),
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Automaton visualizer
///
/// Only states reachable from the root are drawn.
pub struct FsaVisualizer<'a> {
    fsa: &'a Fsa,
}

impl<'a> FsaVisualizer<'a> {
    /// Create a new automaton visualizer
    pub fn new(fsa: &'a Fsa) -> Self {
        Self { fsa }
    }

    /// Generate a Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut output = String::new();
        let _ = self.write_mermaid(&mut output);
        output
    }

    fn write_mermaid(&self, output: &mut String) -> fmt::Result {
        output.push_str("graph LR\n");
        writeln!(output, "  start(( )) --> s{}", self.fsa.root().0)?;

        for id in self.fsa.reachable() {
            let state = self.fsa.state(id);
            match accept_label(state) {
                Some(accepts) => writeln!(output, "  s{}((({}: {})))", id.0, id.0, accepts)?,
                None => writeln!(output, "  s{}(({}))", id.0, id.0)?,
            }
            for (c, target) in state.sorted_transitions() {
                writeln!(output, "  s{} -->|{}| s{}", id.0, mermaid_char(c), target.0)?;
            }
            for target in &state.epsilon {
                writeln!(output, "  s{} -.-> s{}", id.0, target.0)?;
            }
        }
        Ok(())
    }

    /// Generate a GraphViz DOT diagram
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        let _ = self.write_dot(&mut output);
        output
    }

    fn write_dot(&self, output: &mut String) -> fmt::Result {
        output.push_str("digraph Fsa {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=circle];\n");
        output.push_str("  start [shape=point];\n");
        writeln!(output, "  start -> s{};", self.fsa.root().0)?;

        for id in self.fsa.reachable() {
            let state = self.fsa.state(id);
            match accept_label(state) {
                Some(accepts) => writeln!(
                    output,
                    "  s{} [shape=doublecircle, label=\"{}\\n{}\"];",
                    id.0, id.0, accepts
                )?,
                None => writeln!(output, "  s{} [label=\"{}\"];", id.0, id.0)?,
            }
            for (c, target) in state.sorted_transitions() {
                writeln!(
                    output,
                    "  s{} -> s{} [label=\"{}\"];",
                    id.0,
                    target.0,
                    c.escape_default()
                )?;
            }
            for target in &state.epsilon {
                writeln!(output, "  s{} -> s{} [style=dashed];", id.0, target.0)?;
            }
        }

        output.push_str("}\n");
        Ok(())
    }

    /// One line per reachable state: id, accepted tokens and edges
    pub fn to_table(&self) -> String {
        let mut output = String::new();
        for id in self.fsa.reachable() {
            let _ = self.write_row(id, &mut output);
        }
        output
    }

    fn write_row(&self, id: StateId, output: &mut String) -> fmt::Result {
        let state = self.fsa.state(id);
        write!(output, "{}", id.0)?;
        if let Some(accepts) = accept_label(state) {
            write!(output, " [{}]", accepts)?;
        }
        for (c, target) in state.sorted_transitions() {
            write!(output, " {:?}->{}", c, target.0)?;
        }
        for target in &state.epsilon {
            write!(output, " ε->{}", target.0)?;
        }
        output.push('\n');
        Ok(())
    }
}

fn accept_label(state: &State) -> Option<String> {
    if !state.is_accepting() {
        return None;
    }
    let ids: Vec<String> = state.accept_set().iter().map(|id| id.to_string()).collect();
    Some(ids.join(","))
}

/// Mermaid edge labels break on punctuation; emit entity codes for it
fn mermaid_char(c: char) -> String {
    if c.is_alphanumeric() {
        c.to_string()
    } else {
        format!("#{};", c as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Assoc, Lexeme};

    fn lit(text: &str, offset: usize) -> Box<ParseNode> {
        Box::new(ParseNode::Literal(Lexeme::new(1, text, offset)))
    }

    #[test]
    fn test_tree_printer() {
        let node = ParseNode::InfixPostfix {
            assoc: Assoc::Left,
            members: vec![
                Member {
                    op: None,
                    value: Some(lit("1", 0)),
                    data: None,
                },
                Member {
                    op: Some(Lexeme::new(2, "+", 2)),
                    value: Some(Box::new(ParseNode::Prefix {
                        op: Lexeme::new(3, "-", 4),
                        value: Some(lit("2", 5)),
                        data: None,
                    })),
                    data: None,
                },
            ],
        };

        let output = TreePrinter::new().print(&node);
        let expected = "\
InfixPostfix Left
  \"1\" (token 1) @ 0
  op \"+\" @ 2
    Prefix \"-\" @ 4
      value:
        \"2\" (token 1) @ 5
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_tree_printer_max_depth() {
        let node = ParseNode::Prefix {
            op: Lexeme::new(3, "-", 0),
            value: Some(lit("2", 1)),
            data: None,
        };
        let output = TreePrinter::new().max_depth(1).indent("-").print(&node);
        assert_eq!(output, "Prefix \"-\" @ 0\n-value:\n--...\n");
    }

    #[test]
    fn test_tree_printer_handles_deep_trees() {
        let mut node = *lit("1", 100_000);
        for i in (0..100_000).rev() {
            node = ParseNode::Prefix {
                op: Lexeme::new(3, "-", i),
                value: Some(Box::new(node)),
                data: None,
            };
        }
        let output = TreePrinter::new().max_depth(4).print(&node);
        assert_eq!(output.lines().count(), 7);
        assert_eq!(output.lines().last(), Some("            ..."));
    }

    #[test]
    fn test_tree_printer_missing_operands() {
        let node = ParseNode::InfixPostfix {
            assoc: Assoc::Left,
            members: vec![
                Member {
                    op: None,
                    value: None,
                    data: None,
                },
                Member {
                    op: Some(Lexeme::new(2, "(", 1)),
                    value: None,
                    data: Some(lit("7", 2)),
                },
            ],
        };
        let output = TreePrinter::new().indent(".").print(&node);
        assert_eq!(
            output,
            "InfixPostfix Left\n.<missing>\n.op \"(\" @ 1\n..data:\n...\"7\" (token 1) @ 2\n"
        );
    }

    #[test]
    fn test_fsa_visualizer() {
        let mut fsa = Fsa::new();
        fsa.build("ab", 1).unwrap();
        let dfa = fsa.minimize();
        let viz = FsaVisualizer::new(&dfa);

        let mermaid = viz.to_mermaid();
        assert!(mermaid.starts_with("graph LR\n"));
        assert!(mermaid.contains("-->|a|"));
        assert!(mermaid.contains(": 1)))"));

        let dot = viz.to_dot();
        assert!(dot.starts_with("digraph Fsa {"));
        assert!(dot.contains("[label=\"b\"]"));
        assert!(dot.contains("doublecircle"));
        assert!(dot.ends_with("}\n"));

        assert_eq!(viz.to_table().lines().count(), 3);
    }

    #[test]
    fn test_nfa_shows_epsilon_edges() {
        let mut fsa = Fsa::new();
        fsa.build("a?b", 1).unwrap();
        let has_epsilon = fsa
            .reachable()
            .iter()
            .any(|id| !fsa.state(*id).epsilon.is_empty());
        let viz = FsaVisualizer::new(&fsa);
        assert_eq!(viz.to_dot().contains("style=dashed"), has_epsilon);
        assert_eq!(viz.to_table().lines().count(), fsa.reachable().len());
    }

    #[test]
    fn test_mermaid_escapes_punctuation() {
        assert_eq!(mermaid_char('x'), "x");
        assert_eq!(mermaid_char('|'), "#124;");
    }
}
