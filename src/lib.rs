//! Remarkup wiki-markup engine.
//!
//! Parses Remarkup source into a tree of rule nodes, then renders that
//! tree as HTML, as canonical Remarkup source, or as a structured XML
//! export that can be re-imported later. Parsing never fails: malformed
//! constructs degrade to literal text and problems surface as
//! diagnostics on the output, not as errors.

pub mod broken_xml;
pub mod engine;
pub mod html;
pub mod interpreter;
pub mod node;
pub mod output;
pub mod render;
pub mod storage;
pub mod validator;
pub mod xml;

pub use engine::{parse, ParseContext};
pub use node::{NodeKind, RuleNode, Span};
pub use output::{Diagnostic, DiagnosticKind, ParserOutput};
pub use storage::{IdentityTranslator, MemoryStorage, Storage, Translator};
pub use validator::{validate, validate_into, ReferenceReport};
pub use xml::{from_xml, XmlImport};

/// Parse `source` and render it straight to HTML, returning the parser
/// output alongside for callers that also want references or the TOC.
pub fn parse_and_render(source: &str, ctx: &ParseContext<'_>) -> (String, ParserOutput) {
    let output = parse(source, ctx);
    let html = output.to_html(ctx.translator);
    (html, output)
}
