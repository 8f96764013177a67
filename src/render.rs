//! Render a rule-node tree back to canonical Remarkup source.
//!
//! This is the inverse of parsing: for documents written in canonical
//! syntax, `parse` then `to_markup` reproduces the input up to
//! trailing-newline normalization. The XML import path relies on this
//! to turn a rebuilt tree back into authorable markup.

use crate::node::{NodeKind, RuleNode};

pub fn to_markup(nodes: &[RuleNode]) -> String {
    let mut blocks = Vec::new();
    for node in nodes {
        blocks.push(block_markup(node));
    }
    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn block_markup(node: &RuleNode) -> String {
    match &node.kind {
        NodeKind::Paragraph => inline_markup(&node.children),

        NodeKind::Header { level, closed } => {
            let fence = "=".repeat(*level as usize);
            let title = inline_markup(&node.children);
            if *closed {
                format!("{} {} {}", fence, title, fence)
            } else {
                format!("{} {}", fence, title)
            }
        }

        NodeKind::HorizontalRule => "---".to_string(),

        NodeKind::List { .. } => {
            let mut lines = Vec::new();
            for item in &node.children {
                let marker = match item.kind {
                    NodeKind::ListItem { marker } => marker,
                    _ => '-',
                };
                lines.push(format!("{} {}", marker, inline_markup(&item.children)));
            }
            lines.join("\n")
        }

        NodeKind::Table => {
            let mut lines = Vec::new();
            for row in &node.children {
                let cells: Vec<String> = row
                    .children
                    .iter()
                    .map(|cell| inline_markup(&cell.children))
                    .collect();
                lines.push(format!("| {} |", cells.join(" | ")));
            }
            lines.join("\n")
        }

        NodeKind::Blockquote => {
            let inner: Vec<String> = node.children.iter().map(block_markup).collect();
            let mut lines = Vec::new();
            for line in inner.join("\n\n").lines() {
                if line.is_empty() {
                    lines.push(">".to_string());
                } else {
                    lines.push(format!("> {}", line));
                }
            }
            lines.join("\n")
        }

        NodeKind::CodeBlock { info, content, .. } => fenced("```", info, content),
        NodeKind::InterpreterBlock { info, content, .. } => fenced("```", info, content),
        NodeKind::LiteralBlock(content) => fenced("%%%", "", content),

        // Inline nodes surfacing at block level (degraded import input)
        // render in their inline form.
        _ => {
            let mut out = String::new();
            inline_node(node, &mut out);
            out
        }
    }
}

fn fenced(fence: &str, info: &str, content: &str) -> String {
    let mut out = String::new();
    out.push_str(fence);
    out.push_str(info);
    out.push('\n');
    if !content.is_empty() {
        out.push_str(content);
        out.push('\n');
    }
    out.push_str(fence);
    out
}

fn inline_markup(nodes: &[RuleNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        inline_node(node, &mut out);
    }
    out
}

fn inline_node(node: &RuleNode, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) => out.push_str(text),

        NodeKind::Bold => delimited(node, out, "**"),
        NodeKind::Italic => delimited(node, out, "//"),
        NodeKind::Strikethrough => delimited(node, out, "~~"),
        NodeKind::Underline => delimited(node, out, "__"),

        NodeKind::Monospace(content) => {
            out.push('`');
            out.push_str(content);
            out.push('`');
        }

        NodeKind::Link {
            target,
            label,
            bracketed,
            ..
        } => {
            if *bracketed {
                out.push_str("[[");
                out.push_str(target);
                if let Some(label) = label {
                    out.push_str(" | ");
                    out.push_str(label);
                }
                out.push_str("]]");
            } else {
                out.push_str(target);
            }
        }

        NodeKind::FileRef { id, .. } => {
            out.push_str("{F");
            out.push_str(&id.to_string());
            out.push('}');
        }

        // Block node nested in inline position; degrade to its block
        // form rather than dropping it.
        _ => out.push_str(&block_markup(node)),
    }
}

fn delimited(node: &RuleNode, out: &mut String, marker: &str) {
    out.push_str(marker);
    out.push_str(&inline_markup(&node.children));
    out.push_str(marker);
}
