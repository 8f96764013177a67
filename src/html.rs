//! Depth-first HTML rendering of the rule-node tree.
//!
//! Literal text is escaped; interpreter output is embedded verbatim
//! since it is already HTML. Rendering is a pure function of the tree,
//! so repeated renders of one output are identical.

use crate::node::{NodeKind, RuleNode};
use crate::storage::Translator;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_html(
    nodes: &[RuleNode],
    translator: &dyn Translator,
    locale: &str,
) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 && node.kind.is_block() {
            out.push('\n');
        }
        render_node(node, translator, locale, &mut out);
    }
    out
}

fn render_children(node: &RuleNode, translator: &dyn Translator, locale: &str, out: &mut String) {
    for child in &node.children {
        render_node(child, translator, locale, out);
    }
}

fn render_node(node: &RuleNode, translator: &dyn Translator, locale: &str, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape_html(text)),

        NodeKind::Bold => wrap(node, translator, locale, out, "<strong>", "</strong>"),
        NodeKind::Italic => wrap(node, translator, locale, out, "<em>", "</em>"),
        NodeKind::Strikethrough => wrap(node, translator, locale, out, "<del>", "</del>"),
        NodeKind::Underline => wrap(node, translator, locale, out, "<u>", "</u>"),

        NodeKind::Monospace(content) => {
            out.push_str("<tt class=\"remarkup-monospaced\">");
            out.push_str(&escape_html(content));
            out.push_str("</tt>");
        }

        NodeKind::Link {
            target,
            label,
            invalid,
            ..
        } => {
            out.push_str("<a href=\"");
            out.push_str(&escape_html(target));
            out.push('"');
            if *invalid {
                // Broken references render with a distinct marker but
                // never block rendering.
                out.push_str(" class=\"remarkup-link remarkup-link-broken\" title=\"");
                out.push_str(&escape_html(&translator.translate("Invalid Link", locale)));
                out.push('"');
            } else {
                out.push_str(" class=\"remarkup-link\"");
            }
            out.push('>');
            out.push_str(&escape_html(label.as_deref().unwrap_or(target)));
            out.push_str("</a>");
        }

        NodeKind::FileRef { id, resolved } => {
            out.push_str("<span class=\"remarkup-file");
            if !resolved {
                out.push_str(" remarkup-file-unknown");
            }
            out.push_str("\" data-file=\"");
            out.push_str(&id.to_string());
            out.push('"');
            if !resolved {
                out.push_str(" title=\"");
                out.push_str(&escape_html(&translator.translate("Unknown File", locale)));
                out.push('"');
            }
            out.push('>');
            out.push('F');
            out.push_str(&id.to_string());
            out.push_str("</span>");
        }

        NodeKind::Paragraph => wrap(node, translator, locale, out, "<p>", "</p>"),

        NodeKind::Header { level, .. } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<h{}>", level));
            render_children(node, translator, locale, out);
            out.push_str(&format!("</h{}>", level));
        }

        NodeKind::HorizontalRule => out.push_str("<hr />"),

        NodeKind::List { ordered } => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push('<');
            out.push_str(tag);
            out.push('>');
            render_children(node, translator, locale, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }

        NodeKind::ListItem { .. } => wrap(node, translator, locale, out, "<li>", "</li>"),

        NodeKind::Table => wrap(
            node,
            translator,
            locale,
            out,
            "<table class=\"remarkup-table\">",
            "</table>",
        ),
        NodeKind::TableRow => wrap(node, translator, locale, out, "<tr>", "</tr>"),
        NodeKind::TableCell => wrap(node, translator, locale, out, "<td>", "</td>"),

        NodeKind::Blockquote => {
            out.push_str("<blockquote>");
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                render_node(child, translator, locale, out);
            }
            out.push_str("</blockquote>");
        }

        NodeKind::CodeBlock { lang, content, .. } => {
            out.push_str("<pre class=\"remarkup-code\"");
            if let Some(lang) = lang {
                out.push_str(" data-lang=\"");
                out.push_str(&escape_html(lang));
                out.push('"');
            }
            out.push('>');
            out.push_str(&escape_html(content));
            out.push_str("</pre>");
        }

        // Already HTML; embedded verbatim, never re-escaped.
        NodeKind::InterpreterBlock { rendered, .. } => out.push_str(rendered),

        NodeKind::LiteralBlock(content) => {
            out.push_str("<pre class=\"remarkup-literal\">");
            out.push_str(&escape_html(content));
            out.push_str("</pre>");
        }
    }
}

fn wrap(
    node: &RuleNode,
    translator: &dyn Translator,
    locale: &str,
    out: &mut String,
    open: &str,
    close: &str,
) {
    out.push_str(open);
    render_children(node, translator, locale, out);
    out.push_str(close);
}
