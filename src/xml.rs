//! Structured export and import of the rule-node tree.
//!
//! The wire format is a private tag grammar shared between `to_xml` and
//! `from_xml`, tolerant of the same looseness the BrokenXML tokenizer
//! accepts. It is not well-formed XML and is not meant for third-party
//! consumption. One element per node variant; non-content fields ride
//! as attributes; children nest; literal text is minimally escaped.

use crate::broken_xml::{self, TagToken, XmlToken};
use crate::interpreter::{self, ParameterList};
use crate::node::{NodeKind, RuleNode, Span};
use crate::output::{Diagnostic, DiagnosticKind};
use crate::render;

pub fn to_xml(nodes: &[RuleNode], context_path: &str) -> String {
    let mut out = String::new();
    out.push_str("<remarkup path=\"");
    out.push_str(&escape_attr(context_path));
    out.push_str("\">");
    for node in nodes {
        write_node(node, &mut out);
    }
    out.push_str("</remarkup>");
    out
}

/// Result of an XML import. Import never fails: structurally impossible
/// input is repaired best-effort and noted in `diagnostics`.
#[derive(Debug)]
pub struct XmlImport {
    pub markup: String,
    pub nodes: Vec<RuleNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rebuild a rule-node tree from `xml` and render it back to Remarkup
/// source. Tag balancing happens here, with an explicit stack, since
/// the tokenizer itself never matches tags.
pub fn from_xml(context_path: &str, xml: &str) -> XmlImport {
    let _ = context_path;
    let mut builder = TreeBuilder {
        stack: Vec::new(),
        root: Vec::new(),
        diagnostics: Vec::new(),
    };

    for token in broken_xml::tokenize(xml) {
        builder.feed(token);
    }
    builder.finish();

    let markup = render::to_markup(&builder.root);
    XmlImport {
        markup,
        nodes: builder.root,
        diagnostics: builder.diagnostics,
    }
}

// === Export ===

fn write_node(node: &RuleNode, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),

        NodeKind::HorizontalRule => out.push_str("<hr />"),

        NodeKind::Link {
            target,
            label,
            bracketed,
            invalid,
        } => {
            out.push_str("<link target=\"");
            out.push_str(&escape_attr(target));
            out.push('"');
            if let Some(label) = label {
                out.push_str(" label=\"");
                out.push_str(&escape_attr(label));
                out.push('"');
            }
            out.push_str(" bracketed=\"");
            out.push_str(flag(*bracketed));
            out.push_str("\" invalid=\"");
            out.push_str(flag(*invalid));
            out.push_str("\" />");
        }

        NodeKind::FileRef { id, resolved } => {
            out.push_str("<file id=\"");
            out.push_str(&id.to_string());
            out.push_str("\" resolved=\"");
            out.push_str(flag(*resolved));
            out.push_str("\" />");
        }

        NodeKind::Monospace(content) => {
            content_element("monospace", &[], content, out);
        }

        NodeKind::CodeBlock { info, lang, content } => {
            let mut attrs: Vec<(&str, String)> = vec![("info", info.clone())];
            if let Some(lang) = lang {
                attrs.push(("lang", lang.clone()));
            }
            content_element("codeblock", &attrs, content, out);
        }

        NodeKind::InterpreterBlock {
            name,
            info,
            content,
            ..
        } => {
            content_element(
                "interpreter",
                &[("name", name.clone()), ("info", info.clone())],
                content,
                out,
            );
        }

        NodeKind::LiteralBlock(content) => {
            content_element("literal", &[], content, out);
        }

        NodeKind::Header { level, closed } => {
            out.push_str("<header level=\"");
            out.push_str(&level.to_string());
            out.push_str("\" closed=\"");
            out.push_str(flag(*closed));
            out.push_str("\">");
            for child in &node.children {
                write_node(child, out);
            }
            out.push_str("</header>");
        }

        NodeKind::ListItem { marker } => {
            out.push_str("<item marker=\"");
            out.push(*marker);
            out.push_str("\">");
            for child in &node.children {
                write_node(child, out);
            }
            out.push_str("</item>");
        }

        NodeKind::List { ordered } => {
            out.push_str("<list ordered=\"");
            out.push_str(flag(*ordered));
            out.push_str("\">");
            for child in &node.children {
                write_node(child, out);
            }
            out.push_str("</list>");
        }

        // Plain container variants.
        kind => {
            let name = kind.name();
            out.push('<');
            out.push_str(name);
            out.push('>');
            for child in &node.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn content_element(name: &str, attrs: &[(&str, String)], content: &str, out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    out.push_str(&escape_text(content));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

pub fn escape_text(input: &str) -> String {
    input.replace('&', "&amp;").replace('<', "&lt;")
}

pub fn escape_attr(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

pub fn unescape(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

// === Import ===

struct Frame {
    tag: TagToken,
    children: Vec<RuleNode>,
}

struct TreeBuilder {
    stack: Vec<Frame>,
    root: Vec<RuleNode>,
    diagnostics: Vec<Diagnostic>,
}

impl TreeBuilder {
    fn feed(&mut self, token: XmlToken) {
        match token {
            XmlToken::Text { value, offset } => {
                let len = value.len() as u32;
                let node = RuleNode::new(
                    NodeKind::Text(unescape(&value)),
                    Span::new(offset, offset + len),
                );
                self.attach(node);
            }
            XmlToken::OpeningTag(tag) => {
                self.stack.push(Frame {
                    tag,
                    children: Vec::new(),
                });
            }
            XmlToken::AutoCloseTag(tag) => {
                let end = tag.offset + tag.len;
                self.close_frame(Frame {
                    tag,
                    children: Vec::new(),
                }, end);
            }
            XmlToken::ClosingTag {
                name, offset, len, ..
            } => {
                let Some(index) = self.stack.iter().rposition(|f| f.tag.name == name) else {
                    // Closing tag with no opener: best-effort recovery
                    // is to drop it and carry on.
                    self.diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::StrayClosingTag,
                        offset,
                    });
                    return;
                };
                // Anything above the matching frame was left unclosed;
                // auto-close it in place.
                while self.stack.len() > index + 1 {
                    let frame = self.stack.pop().unwrap();
                    self.diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::UnclosedElement,
                        offset: frame.tag.offset,
                    });
                    self.close_frame(frame, offset);
                }
                let frame = self.stack.pop().unwrap();
                self.close_frame(frame, offset + len);
            }
        }
    }

    fn finish(&mut self) {
        while let Some(frame) = self.stack.pop() {
            self.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnclosedElement,
                offset: frame.tag.offset,
            });
            let end = frame.tag.offset + frame.tag.len;
            self.close_frame(frame, end);
        }
    }

    fn attach(&mut self, node: RuleNode) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.root.push(node),
        }
    }

    fn attach_all(&mut self, nodes: Vec<RuleNode>) {
        for node in nodes {
            self.attach(node);
        }
    }

    fn close_frame(&mut self, frame: Frame, end: u32) {
        let span = Span::new(frame.tag.offset, end);
        let Frame { tag, children } = frame;

        let kind = match tag.name.as_str() {
            // The document wrapper contributes its children directly.
            "remarkup" => {
                self.attach_all(children);
                return;
            }

            "bold" => NodeKind::Bold,
            "italic" => NodeKind::Italic,
            "strike" => NodeKind::Strikethrough,
            "underline" => NodeKind::Underline,
            "paragraph" => NodeKind::Paragraph,
            "quote" => NodeKind::Blockquote,
            "table" => NodeKind::Table,
            "row" => NodeKind::TableRow,
            "cell" => NodeKind::TableCell,
            "item" => NodeKind::ListItem {
                marker: tag
                    .attribute("marker")
                    .and_then(|v| v.chars().next())
                    .unwrap_or('-'),
            },
            "hr" => NodeKind::HorizontalRule,

            "header" => NodeKind::Header {
                level: tag
                    .attribute("level")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1),
                closed: tag.attribute("closed") != Some("0"),
            },

            "list" => NodeKind::List {
                ordered: tag.attribute("ordered") == Some("1"),
            },

            "link" => NodeKind::Link {
                target: unescape(tag.attribute("target").unwrap_or_default()),
                label: tag.attribute("label").map(unescape),
                bracketed: tag.attribute("bracketed") != Some("0"),
                invalid: tag.attribute("invalid") == Some("1"),
            },

            "file" => NodeKind::FileRef {
                id: tag
                    .attribute("id")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
                resolved: tag.attribute("resolved") == Some("1"),
            },

            "monospace" => NodeKind::Monospace(collect_text(&children)),
            "literal" => NodeKind::LiteralBlock(collect_text(&children)),
            "text" => NodeKind::Text(collect_text(&children)),

            "codeblock" => {
                let info = unescape(tag.attribute("info").unwrap_or_default());
                NodeKind::CodeBlock {
                    lang: tag.attribute("lang").map(unescape),
                    info,
                    content: collect_text(&children),
                }
            }

            "interpreter" => {
                let name = tag
                    .attribute("name")
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                let info = unescape(tag.attribute("info").unwrap_or_default());
                let content = collect_text(&children);
                match interpreter::resolve(&name) {
                    Some(interp) => {
                        let params = ParameterList::parse(&info);
                        NodeKind::InterpreterBlock {
                            rendered: interp.render(&params, &content),
                            name,
                            info,
                            content,
                        }
                    }
                    None => {
                        self.diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::UnknownInterpreter,
                            offset: tag.offset,
                        });
                        NodeKind::CodeBlock {
                            lang: Some(name),
                            info,
                            content,
                        }
                    }
                }
            }

            _ => {
                // Unknown element: splice its children into the parent
                // so a corrupt document still renders something.
                self.diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::UnknownElement,
                    offset: tag.offset,
                });
                self.attach_all(children);
                return;
            }
        };

        let leaf = matches!(
            kind,
            NodeKind::Monospace(_)
                | NodeKind::LiteralBlock(_)
                | NodeKind::Text(_)
                | NodeKind::CodeBlock { .. }
                | NodeKind::InterpreterBlock { .. }
        );
        let children = if leaf { Vec::new() } else { children };
        self.attach(RuleNode::with_children(kind, span, children));
    }
}

fn collect_text(children: &[RuleNode]) -> String {
    let mut out = String::new();
    for child in children {
        if let NodeKind::Text(text) = &child.kind {
            out.push_str(text);
        }
    }
    out
}
