use crate::node::RuleNode;
use crate::storage::Translator;

/// Result of one parse invocation. Owns the rule-node tree exclusively;
/// nodes are never shared between outputs.
#[derive(Debug)]
pub struct ParserOutput {
    /// Line-ending normalized source the spans point into.
    pub source: String,
    /// Root ordered sequence of rule nodes.
    pub token_list: Vec<RuleNode>,
    /// Header entries collected during the parse, for callers that need
    /// them without re-walking the tree.
    pub toc: Vec<TocEntry>,
    /// Document paths referenced by bracketed links, in source order.
    pub referenced_paths: Vec<String>,
    /// File ids referenced by `{Fnnn}` embeds, in source order.
    pub referenced_files: Vec<i64>,
    /// Non-fatal conditions tolerated during the parse.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParserOutput {
    pub fn to_html(&self, translator: &dyn Translator) -> String {
        self.to_html_localized(translator, "en")
    }

    pub fn to_html_localized(&self, translator: &dyn Translator, locale: &str) -> String {
        crate::html::render_html(&self.token_list, translator, locale)
    }

    pub fn to_xml(&self, context_path: &str) -> String {
        crate::xml::to_xml(&self.token_list, context_path)
    }

    pub fn to_markup(&self) -> String {
        crate::render::to_markup(&self.token_list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

/// A tolerated malformation. Recorded as data, never raised; callers
/// decide whether to surface these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnterminatedCodeBlock,
    UnterminatedLiteralBlock,
    UnknownInterpreter,
    UnresolvedDocument,
    UnresolvedFile,
    StrayClosingTag,
    UnknownElement,
    UnclosedElement,
}

impl DiagnosticKind {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedCodeBlock => "unterminated_code_block",
            DiagnosticKind::UnterminatedLiteralBlock => "unterminated_literal_block",
            DiagnosticKind::UnknownInterpreter => "unknown_interpreter",
            DiagnosticKind::UnresolvedDocument => "unresolved_document",
            DiagnosticKind::UnresolvedFile => "unresolved_file",
            DiagnosticKind::StrayClosingTag => "stray_closing_tag",
            DiagnosticKind::UnknownElement => "unknown_element",
            DiagnosticKind::UnclosedElement => "unclosed_element",
        }
    }
}
