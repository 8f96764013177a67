/// Rule nodes are the units of the parsed document tree. Every node
/// tracks the span of source text it was matched from; structural
/// nodes own their children, leaf nodes own their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone)]
pub struct RuleNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<RuleNode>,
}

impl RuleNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        RuleNode {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, span: Span, children: Vec<RuleNode>) -> Self {
        RuleNode {
            kind,
            span,
            children,
        }
    }

    /// Depth-first, order-preserving walk over this node and its subtree.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a RuleNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Unmatched literal text, kept verbatim.
    Text(String),

    // Inline constructs
    Bold,
    Italic,
    Strikethrough,
    Underline,
    /// Inline code; content is never parsed further.
    Monospace(String),
    Link {
        target: String,
        label: Option<String>,
        /// `[[...]]` syntax as opposed to a bare URL run.
        bracketed: bool,
        invalid: bool,
    },
    /// `{Fnnn}` embed. Negative ids reference staged objects.
    FileRef {
        id: i64,
        resolved: bool,
    },

    // Block constructs
    Paragraph,
    Header {
        level: u8,
        /// Whether the source carried a trailing `=` run. Re-rendering
        /// preserves the form it was written in.
        closed: bool,
    },
    HorizontalRule,
    List {
        ordered: bool,
    },
    /// `marker` is the source marker character (`-`, `*`, or `#`).
    ListItem {
        marker: char,
    },
    Table,
    TableRow,
    TableCell,
    Blockquote,
    CodeBlock {
        /// Raw fence info string, preserved for round-tripping.
        info: String,
        lang: Option<String>,
        content: String,
    },
    /// A code block whose `lang` named a registered interpreter. The
    /// interpreter runs mid-parse; `rendered` is final HTML.
    InterpreterBlock {
        name: String,
        info: String,
        content: String,
        rendered: String,
    },
    /// `%%%` fenced block; content emitted verbatim.
    LiteralBlock(String),
}

impl NodeKind {
    /// Stable lower-case name, used as the XML element name.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Text(_) => "text",
            NodeKind::Bold => "bold",
            NodeKind::Italic => "italic",
            NodeKind::Strikethrough => "strike",
            NodeKind::Underline => "underline",
            NodeKind::Monospace(_) => "monospace",
            NodeKind::Link { .. } => "link",
            NodeKind::FileRef { .. } => "file",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Header { .. } => "header",
            NodeKind::HorizontalRule => "hr",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem { .. } => "item",
            NodeKind::Table => "table",
            NodeKind::TableRow => "row",
            NodeKind::TableCell => "cell",
            NodeKind::Blockquote => "quote",
            NodeKind::CodeBlock { .. } => "codeblock",
            NodeKind::InterpreterBlock { .. } => "interpreter",
            NodeKind::LiteralBlock(_) => "literal",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Header { .. }
                | NodeKind::HorizontalRule
                | NodeKind::List { .. }
                | NodeKind::Table
                | NodeKind::Blockquote
                | NodeKind::CodeBlock { .. }
                | NodeKind::InterpreterBlock { .. }
                | NodeKind::LiteralBlock(_)
        )
    }
}
