//! The Remarkup rule engine.
//!
//! Scans left to right, trying rules in a fixed priority order; the
//! first rule that matches consumes its span. Block rules fire at line
//! starts, inline rules at every cursor position inside paragraph-like
//! content. Ambiguity is resolved by rule order, not longest match.
//! Unmatched characters accumulate into literal text nodes, flushed
//! whenever a structural rule interrupts them or at end of input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::interpreter::{self, ParameterList};
use crate::node::{NodeKind, RuleNode, Span};
use crate::output::{Diagnostic, DiagnosticKind, ParserOutput, TocEntry};
use crate::storage::{Storage, Translator};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s<>\[\]{}|]+").unwrap());

/// Read-only context threaded through every recursive parse call.
/// Lookups against storage happen only on final renders; previews skip
/// them and presume references valid.
pub struct ParseContext<'a> {
    pub path: &'a str,
    pub is_final_render: bool,
    pub storage: &'a dyn Storage,
    pub translator: &'a dyn Translator,
}

pub fn parse(source: &str, ctx: &ParseContext<'_>) -> ParserOutput {
    let normalized = normalize_line_endings(source);

    let mut engine = Engine {
        ctx,
        toc: Vec::new(),
        referenced_paths: Vec::new(),
        referenced_files: Vec::new(),
        diagnostics: Vec::new(),
    };
    let token_list = engine.parse_blocks(&normalized, 0);

    ParserOutput {
        source: normalized,
        token_list,
        toc: engine.toc,
        referenced_paths: engine.referenced_paths,
        referenced_files: engine.referenced_files,
        diagnostics: engine.diagnostics,
    }
}

fn normalize_line_endings(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

struct Engine<'a, 'b> {
    ctx: &'b ParseContext<'a>,
    toc: Vec<TocEntry>,
    referenced_paths: Vec<String>,
    referenced_files: Vec<i64>,
    diagnostics: Vec<Diagnostic>,
}

/// Block rules in priority order. Paragraph is the fallback and is not
/// listed; it matches anything the others reject.
const BLOCK_RULES: &[BlockRule] = &[
    BlockRule::CodeBlock,
    BlockRule::LiteralBlock,
    BlockRule::Header,
    BlockRule::HorizontalRule,
    BlockRule::Table,
    BlockRule::List,
    BlockRule::Blockquote,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockRule {
    CodeBlock,
    LiteralBlock,
    Header,
    HorizontalRule,
    Table,
    List,
    Blockquote,
}

impl BlockRule {
    /// Cheap recognizer, used both for dispatch and for ending
    /// paragraphs at the first structural line.
    fn matches_at(self, text: &str, pos: usize) -> bool {
        let line = current_line(text, pos);
        match self {
            BlockRule::CodeBlock => line.starts_with("```"),
            BlockRule::LiteralBlock => line.trim_end() == "%%%",
            BlockRule::Header => header_level(line).is_some(),
            BlockRule::HorizontalRule => {
                let trimmed = line.trim_end();
                trimmed.len() >= 3 && trimmed.bytes().all(|b| b == b'-')
            }
            BlockRule::Table => line.starts_with('|'),
            BlockRule::List => list_marker(line).is_some(),
            BlockRule::Blockquote => line.starts_with('>'),
        }
    }
}

fn current_line(text: &str, pos: usize) -> &str {
    let end = text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len());
    &text[pos..end]
}

/// End of the line containing `pos`, exclusive of the newline.
fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

/// Position of the first byte after the line containing `pos`.
fn next_line(text: &str, pos: usize) -> usize {
    let end = line_end(text, pos);
    if end < text.len() { end + 1 } else { end }
}

fn header_level(line: &str) -> Option<u8> {
    let count = line.bytes().take_while(|&b| b == b'=').count();
    if (1..=6).contains(&count) && line.as_bytes().get(count) == Some(&b' ') {
        Some(count as u8)
    } else {
        None
    }
}

fn list_marker(line: &str) -> Option<bool> {
    let bytes = line.as_bytes();
    match bytes.first() {
        Some(b'-') | Some(b'*') if bytes.get(1) == Some(&b' ') => Some(false),
        Some(b'#') if bytes.get(1) == Some(&b' ') => Some(true),
        _ => None,
    }
}

impl<'a, 'b> Engine<'a, 'b> {
    fn diagnostic(&mut self, kind: DiagnosticKind, offset: u32) {
        self.diagnostics.push(Diagnostic { kind, offset });
    }

    /// Parse `text` as a sequence of blocks. `base` positions spans for
    /// recursive contexts (block quotes re-parse stripped content).
    fn parse_blocks(&mut self, text: &str, base: u32) -> Vec<RuleNode> {
        let mut nodes = Vec::new();
        let mut pos = 0usize;

        while pos < text.len() {
            if text.as_bytes()[pos] == b'\n' {
                pos += 1;
                continue;
            }

            let rule = BLOCK_RULES
                .iter()
                .copied()
                .find(|rule| rule.matches_at(text, pos));

            pos = match rule {
                Some(BlockRule::CodeBlock) => self.parse_code_block(text, pos, base, &mut nodes),
                Some(BlockRule::LiteralBlock) => {
                    self.parse_literal_block(text, pos, base, &mut nodes)
                }
                Some(BlockRule::Header) => self.parse_header(text, pos, base, &mut nodes),
                Some(BlockRule::HorizontalRule) => {
                    let end = line_end(text, pos);
                    nodes.push(RuleNode::new(
                        NodeKind::HorizontalRule,
                        Span::new(base + pos as u32, base + end as u32),
                    ));
                    next_line(text, pos)
                }
                Some(BlockRule::Table) => self.parse_table(text, pos, base, &mut nodes),
                Some(BlockRule::List) => self.parse_list(text, pos, base, &mut nodes),
                Some(BlockRule::Blockquote) => self.parse_blockquote(text, pos, base, &mut nodes),
                None => self.parse_paragraph(text, pos, base, &mut nodes),
            };
        }

        nodes
    }

    fn parse_code_block(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let info = current_line(text, pos)[3..].trim().to_string();
        let body_start = next_line(text, pos);

        // Find the closing fence line.
        let mut cursor = body_start;
        let mut content_end = text.len();
        let mut after = text.len();
        let mut terminated = false;
        while cursor < text.len() {
            let line = current_line(text, cursor);
            if line.trim_end() == "```" {
                content_end = cursor.saturating_sub(1).max(body_start);
                after = next_line(text, cursor);
                terminated = true;
                break;
            }
            cursor = next_line(text, cursor);
        }
        if !terminated {
            self.diagnostic(DiagnosticKind::UnterminatedCodeBlock, base + pos as u32);
            content_end = text.len();
        }
        let content = text[body_start..content_end.max(body_start)]
            .trim_end_matches('\n')
            .to_string();

        let params = ParameterList::parse(&info);
        let span = Span::new(base + pos as u32, base + after.min(text.len()) as u32);

        let kind = match params.get("lang") {
            Some(lang) => match interpreter::resolve(lang) {
                Some(interp) => NodeKind::InterpreterBlock {
                    name: lang.to_ascii_lowercase(),
                    info: info.clone(),
                    content: content.clone(),
                    rendered: interp.render(&params, &content),
                },
                None => {
                    self.diagnostic(DiagnosticKind::UnknownInterpreter, base + pos as u32);
                    NodeKind::CodeBlock {
                        info: info.clone(),
                        lang: Some(lang.to_string()),
                        content,
                    }
                }
            },
            None => NodeKind::CodeBlock {
                info: info.clone(),
                lang: None,
                content,
            },
        };

        nodes.push(RuleNode::new(kind, span));
        after
    }

    fn parse_literal_block(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let body_start = next_line(text, pos);
        let mut cursor = body_start;
        let mut content_end = text.len();
        let mut after = text.len();
        let mut terminated = false;
        while cursor < text.len() {
            if current_line(text, cursor).trim_end() == "%%%" {
                content_end = cursor.saturating_sub(1).max(body_start);
                after = next_line(text, cursor);
                terminated = true;
                break;
            }
            cursor = next_line(text, cursor);
        }
        if !terminated {
            self.diagnostic(DiagnosticKind::UnterminatedLiteralBlock, base + pos as u32);
        }
        let content = text[body_start..content_end.max(body_start)]
            .trim_end_matches('\n')
            .to_string();

        nodes.push(RuleNode::new(
            NodeKind::LiteralBlock(content),
            Span::new(base + pos as u32, base + after.min(text.len()) as u32),
        ));
        after
    }

    fn parse_header(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let line = current_line(text, pos);
        let level = header_level(line).unwrap_or(1);
        let after_fence = &line[level as usize..];
        let leading = after_fence.len() - after_fence.trim_start().len();
        let raw_title = after_fence.trim();
        let closed = raw_title.ends_with('=');
        let title = raw_title.trim_end_matches('=').trim_end();

        let title_offset = pos + level as usize + leading;
        let children = self.parse_inline(title, base + title_offset as u32);

        self.toc.push(TocEntry {
            level,
            title: title.to_string(),
            anchor: slugify(title),
        });

        nodes.push(RuleNode::with_children(
            NodeKind::Header { level, closed },
            Span::new(base + pos as u32, base + line_end(text, pos) as u32),
            children,
        ));
        next_line(text, pos)
    }

    fn parse_table(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let start = pos;
        let mut pos = pos;
        let mut rows = Vec::new();

        while pos < text.len() && current_line(text, pos).starts_with('|') {
            let line = current_line(text, pos);
            let line_start = pos;

            // Strip the leading pipe and an optional trailing pipe.
            let inner_start = 1;
            let trimmed = line.trim_end();
            let inner_end = if trimmed.len() > 1 && trimmed.ends_with('|') {
                trimmed.len() - 1
            } else {
                line.len()
            };
            let inner = &line[inner_start..inner_end.max(inner_start)];

            let mut cells = Vec::new();
            let mut cell_offset = line_start + inner_start;
            for piece in inner.split('|') {
                let leading = piece.len() - piece.trim_start().len();
                let cell_text = piece.trim();
                let cell_base = base + (cell_offset + leading) as u32;
                let children = self.parse_inline(cell_text, cell_base);
                cells.push(RuleNode::with_children(
                    NodeKind::TableCell,
                    Span::new(cell_base, cell_base + cell_text.len() as u32),
                    children,
                ));
                cell_offset += piece.len() + 1;
            }

            rows.push(RuleNode::with_children(
                NodeKind::TableRow,
                Span::new(base + line_start as u32, base + line_end(text, pos) as u32),
                cells,
            ));
            pos = next_line(text, pos);
        }

        nodes.push(RuleNode::with_children(
            NodeKind::Table,
            Span::new(base + start as u32, base + pos as u32),
            rows,
        ));
        pos
    }

    fn parse_list(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let start = pos;
        let mut pos = pos;
        let ordered = list_marker(current_line(text, pos)).unwrap_or(false);
        let mut items = Vec::new();

        while pos < text.len() {
            let line = current_line(text, pos);
            match list_marker(line) {
                Some(kind) if kind == ordered => {}
                _ => break,
            }
            let marker = line.as_bytes()[0] as char;
            let item_text = &line[2..];
            let item_base = base + (pos + 2) as u32;
            let children = self.parse_inline(item_text, item_base);
            items.push(RuleNode::with_children(
                NodeKind::ListItem { marker },
                Span::new(item_base, item_base + item_text.len() as u32),
                children,
            ));
            pos = next_line(text, pos);
        }

        nodes.push(RuleNode::with_children(
            NodeKind::List { ordered },
            Span::new(base + start as u32, base + pos as u32),
            items,
        ));
        pos
    }

    fn parse_blockquote(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let start = pos;
        let mut pos = pos;
        let mut stripped = String::new();
        // Maps each stripped line's start to where its content begins
        // in the source, so child spans can be translated back.
        let mut line_map: Vec<(usize, usize)> = Vec::new();

        while pos < text.len() && current_line(text, pos).starts_with('>') {
            let line = current_line(text, pos);
            let prefix = if line[1..].starts_with(' ') { 2 } else { 1 };
            line_map.push((stripped.len(), base as usize + pos + prefix));
            stripped.push_str(&line[prefix..]);
            stripped.push('\n');
            pos = next_line(text, pos);
        }

        // Quote content is re-parsed with the full block rule set in
        // stripped coordinates, then every span and diagnostic is
        // translated back through the line map so they index the
        // original source.
        let diagnostics_before = self.diagnostics.len();
        let mut children = self.parse_blocks(&stripped, 0);

        let remap = |p: u32| -> u32 {
            let p = p as usize;
            let idx = line_map
                .partition_point(|&(line_start, _)| line_start <= p)
                .saturating_sub(1);
            let (line_start, source_start) = line_map[idx];
            (source_start + (p - line_start)) as u32
        };
        for child in &mut children {
            remap_spans(child, &remap);
        }
        for diagnostic in &mut self.diagnostics[diagnostics_before..] {
            diagnostic.offset = remap(diagnostic.offset);
        }

        nodes.push(RuleNode::with_children(
            NodeKind::Blockquote,
            Span::new(base + start as u32, base + pos as u32),
            children,
        ));
        pos
    }

    fn parse_paragraph(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        nodes: &mut Vec<RuleNode>,
    ) -> usize {
        let start = pos;
        let mut pos = pos;
        let mut content_end = pos;

        while pos < text.len() {
            let line = current_line(text, pos);
            if line.is_empty() {
                break;
            }
            if pos != start && BLOCK_RULES.iter().any(|rule| rule.matches_at(text, pos)) {
                break;
            }
            content_end = line_end(text, pos);
            pos = next_line(text, pos);
        }

        let content = &text[start..content_end];
        let children = self.parse_inline(content, base + start as u32);
        nodes.push(RuleNode::with_children(
            NodeKind::Paragraph,
            Span::new(base + start as u32, base + content_end as u32),
            children,
        ));
        pos
    }

    // === Inline rules ===

    fn parse_inline(&mut self, text: &str, base: u32) -> Vec<RuleNode> {
        let mut nodes = Vec::new();
        let mut literal_start = 0usize;
        let mut pos = 0usize;

        while pos < text.len() {
            if let Some((node, consumed)) = self.try_inline_rule(text, pos, base) {
                if literal_start < pos {
                    nodes.push(literal_node(&text[literal_start..pos], base + literal_start as u32));
                }
                nodes.push(node);
                pos += consumed;
                literal_start = pos;
            } else {
                pos += text[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }

        if literal_start < text.len() {
            nodes.push(literal_node(&text[literal_start..], base + literal_start as u32));
        }
        nodes
    }

    /// Inline rules in priority order; first match wins.
    fn try_inline_rule(&mut self, text: &str, pos: usize, base: u32) -> Option<(RuleNode, usize)> {
        let rest = &text[pos..];

        if rest.starts_with('`') {
            if let Some(close) = rest[1..].find('`') {
                let content = &rest[1..1 + close];
                let consumed = close + 2;
                return Some((
                    RuleNode::new(
                        NodeKind::Monospace(content.to_string()),
                        span_at(base, pos, consumed),
                    ),
                    consumed,
                ));
            }
        }

        for (marker, kind) in [
            ("**", NodeKind::Bold),
            ("//", NodeKind::Italic),
            ("~~", NodeKind::Strikethrough),
            ("__", NodeKind::Underline),
        ] {
            if let Some(hit) = self.try_delimited(text, pos, base, marker, kind.clone()) {
                return Some(hit);
            }
        }

        if rest.starts_with("[[") {
            if let Some(hit) = self.try_document_link(text, pos, base) {
                return Some(hit);
            }
        }

        if rest.starts_with("{F") {
            if let Some(hit) = self.try_file_ref(text, pos, base) {
                return Some(hit);
            }
        }

        if let Some(m) = URL_RE.find(rest) {
            let target = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
            if !target.is_empty() {
                let consumed = target.len();
                return Some((
                    RuleNode::new(
                        NodeKind::Link {
                            target: target.to_string(),
                            label: None,
                            bracketed: false,
                            invalid: false,
                        },
                        span_at(base, pos, consumed),
                    ),
                    consumed,
                ));
            }
        }

        None
    }

    fn try_delimited(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
        marker: &str,
        kind: NodeKind,
    ) -> Option<(RuleNode, usize)> {
        let rest = &text[pos..];
        if !rest.starts_with(marker) {
            return None;
        }
        let inner_start = marker.len();
        let close = rest[inner_start..].find(marker)?;
        if close == 0 {
            // Empty constructs stay literal text.
            return None;
        }
        let inner = &rest[inner_start..inner_start + close];
        let consumed = inner_start + close + marker.len();
        let children = self.parse_inline(inner, base + (pos + inner_start) as u32);
        Some((
            RuleNode::with_children(kind, span_at(base, pos, consumed), children),
            consumed,
        ))
    }

    fn try_document_link(
        &mut self,
        text: &str,
        pos: usize,
        base: u32,
    ) -> Option<(RuleNode, usize)> {
        let rest = &text[pos..];
        let close = rest.find("]]")?;
        let inner = &rest[2..close];
        let consumed = close + 2;

        let (target, label) = match inner.split_once('|') {
            Some((t, l)) => (t.trim(), Some(l.trim().to_string()).filter(|l| !l.is_empty())),
            None => (inner.trim(), None),
        };
        if target.is_empty() {
            return None;
        }

        let extern_link = target.starts_with("http://") || target.starts_with("https://");
        let mut invalid = false;
        if !extern_link {
            self.referenced_paths.push(target.to_string());
            if self.ctx.is_final_render
                && self.ctx.storage.get_document_by_path(target).is_none()
            {
                invalid = true;
                self.diagnostic(DiagnosticKind::UnresolvedDocument, base + pos as u32);
            }
        }

        Some((
            RuleNode::new(
                NodeKind::Link {
                    target: target.to_string(),
                    label,
                    bracketed: true,
                    invalid,
                },
                span_at(base, pos, consumed),
            ),
            consumed,
        ))
    }

    fn try_file_ref(&mut self, text: &str, pos: usize, base: u32) -> Option<(RuleNode, usize)> {
        let rest = &text[pos..];
        let bytes = rest.as_bytes();
        let mut cursor = 2;
        if bytes.get(cursor) == Some(&b'-') {
            cursor += 1;
        }
        let digits_start = cursor;
        while bytes.get(cursor).is_some_and(|b| b.is_ascii_digit()) {
            cursor += 1;
        }
        if cursor == digits_start || bytes.get(cursor) != Some(&b'}') {
            return None;
        }
        let id: i64 = rest[2..cursor].parse().ok()?;
        let consumed = cursor + 1;

        self.referenced_files.push(id);
        let mut resolved = true;
        if self.ctx.is_final_render {
            let record = if id < 0 {
                self.ctx.storage.get_staged_object_by_id(id)
            } else {
                self.ctx.storage.get_file_by_id(id)
            };
            if record.is_none() {
                resolved = false;
                self.diagnostic(DiagnosticKind::UnresolvedFile, base + pos as u32);
            }
        }

        Some((
            RuleNode::new(
                NodeKind::FileRef { id, resolved },
                span_at(base, pos, consumed),
            ),
            consumed,
        ))
    }
}

fn remap_spans(node: &mut RuleNode, remap: &impl Fn(u32) -> u32) {
    node.span = Span::new(remap(node.span.start), remap(node.span.end));
    for child in &mut node.children {
        remap_spans(child, remap);
    }
}

fn literal_node(text: &str, offset: u32) -> RuleNode {
    RuleNode::new(
        NodeKind::Text(text.to_string()),
        Span::new(offset, offset + text.len() as u32),
    )
}

fn span_at(base: u32, pos: usize, len: usize) -> Span {
    Span::new(base + pos as u32, base + (pos + len) as u32)
}

fn slugify(title: &str) -> String {
    let mut anchor = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !anchor.is_empty() {
                anchor.push('-');
            }
            pending_dash = false;
            anchor.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    anchor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{IdentityTranslator, MemoryStorage};

    fn parse_with(source: &str, storage: &MemoryStorage) -> ParserOutput {
        let ctx = ParseContext {
            path: "test/doc",
            is_final_render: true,
            storage,
            translator: &IdentityTranslator,
        };
        parse(source, &ctx)
    }

    fn parse_plain(source: &str) -> ParserOutput {
        parse_with(source, &MemoryStorage::new())
    }

    #[test]
    fn bold_inside_paragraph() {
        let output = parse_plain("**bold text**");
        assert_eq!(1, output.token_list.len());
        let para = &output.token_list[0];
        assert_eq!(NodeKind::Paragraph, para.kind);
        assert_eq!(NodeKind::Bold, para.children[0].kind);
        assert_eq!(
            NodeKind::Text("bold text".into()),
            para.children[0].children[0].kind
        );
    }

    #[test]
    fn unterminated_bold_stays_literal() {
        let output = parse_plain("**not closed");
        let para = &output.token_list[0];
        assert_eq!(NodeKind::Text("**not closed".into()), para.children[0].kind);
    }

    #[test]
    fn header_levels_and_trailing_markers() {
        let output = parse_plain("== Section ==\n");
        match &output.token_list[0].kind {
            NodeKind::Header { level, closed } => {
                assert_eq!(2, *level);
                assert!(closed);
            }
            other => panic!("expected header, got {:?}", other),
        }
        assert_eq!(
            NodeKind::Text("Section".into()),
            output.token_list[0].children[0].kind
        );
        assert_eq!(1, output.toc.len());
        assert_eq!("section", output.toc[0].anchor);
    }

    #[test]
    fn header_without_trailing_markers_is_open() {
        let output = parse_plain("= Title\n");
        match &output.token_list[0].kind {
            NodeKind::Header { level, closed } => {
                assert_eq!(1, *level);
                assert!(!closed);
            }
            other => panic!("expected header, got {:?}", other),
        }
    }

    #[test]
    fn header_title_span_survives_extra_spaces() {
        let source = "=  Spaced";
        let output = parse_plain(source);
        let title = &output.token_list[0].children[0];
        assert_eq!(
            "Spaced",
            &source[title.span.start as usize..title.span.end as usize]
        );
    }

    #[test]
    fn list_items_keep_their_marker() {
        let output = parse_plain("* one\n- two\n");
        let list = &output.token_list[0];
        assert_eq!(NodeKind::List { ordered: false }, list.kind);
        assert_eq!(NodeKind::ListItem { marker: '*' }, list.children[0].kind);
        assert_eq!(NodeKind::ListItem { marker: '-' }, list.children[1].kind);
    }

    #[test]
    fn rule_priority_table_before_text() {
        let output = parse_plain("| a | b |\n| c | d |\n");
        let table = &output.token_list[0];
        assert_eq!(NodeKind::Table, table.kind);
        assert_eq!(2, table.children.len());
        assert_eq!(2, table.children[0].children.len());
    }

    #[test]
    fn lists_group_consecutive_items() {
        let output = parse_plain("- one\n- two\n\n# first\n# second\n");
        assert_eq!(2, output.token_list.len());
        assert_eq!(NodeKind::List { ordered: false }, output.token_list[0].kind);
        assert_eq!(2, output.token_list[0].children.len());
        assert_eq!(NodeKind::List { ordered: true }, output.token_list[1].kind);
    }

    #[test]
    fn quoted_spans_index_the_source() {
        let source = "intro\n\n> alpha\n> beta\n";
        let output = parse_plain(source);
        let quote = &output.token_list[1];
        assert_eq!(NodeKind::Blockquote, quote.kind);
        let para = &quote.children[0];
        // The paragraph starts at "alpha", past the "> " prefix.
        assert_eq!("alpha", &source[para.span.start as usize..para.span.start as usize + 5]);
        assert_eq!("beta", &source[para.span.end as usize - 4..para.span.end as usize]);
    }

    #[test]
    fn single_line_quote_child_slices_exactly() {
        let source = "> alpha\n";
        let output = parse_plain(source);
        let para = &output.token_list[0].children[0];
        assert_eq!(
            "alpha",
            &source[para.span.start as usize..para.span.end as usize]
        );
    }

    #[test]
    fn blockquote_reparses_blocks() {
        let output = parse_plain("> = Quoted =\n> text\n");
        let quote = &output.token_list[0];
        assert_eq!(NodeKind::Blockquote, quote.kind);
        assert!(matches!(quote.children[0].kind, NodeKind::Header { .. }));
        assert_eq!(NodeKind::Paragraph, quote.children[1].kind);
    }

    #[test]
    fn code_block_keeps_content_verbatim() {
        let output = parse_plain("```lang=rust\nfn main() {}\n```\n");
        match &output.token_list[0].kind {
            NodeKind::CodeBlock { info, lang, content } => {
                assert_eq!("lang=rust", info);
                assert_eq!(Some("rust".to_string()), *lang);
                assert_eq!("fn main() {}", content);
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn interpreter_block_runs_mid_parse() {
        let output = parse_plain("```lang=cowsay\nMoo\n```\n");
        match &output.token_list[0].kind {
            NodeKind::InterpreterBlock { name, rendered, .. } => {
                assert_eq!("cowsay", name);
                assert!(rendered.contains("Moo"));
                assert!(rendered.contains("^__^"));
            }
            other => panic!("expected interpreter block, got {:?}", other),
        }
    }

    #[test]
    fn unknown_interpreter_degrades_to_code_block() {
        let output = parse_plain("```lang=nope\nx\n```\n");
        assert!(matches!(
            output.token_list[0].kind,
            NodeKind::CodeBlock { .. }
        ));
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownInterpreter));
    }

    #[test]
    fn unterminated_code_block_consumes_rest() {
        let output = parse_plain("```\nno closer");
        assert!(matches!(
            output.token_list[0].kind,
            NodeKind::CodeBlock { .. }
        ));
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnterminatedCodeBlock));
    }

    #[test]
    fn document_link_resolution() {
        let mut storage = MemoryStorage::new();
        storage.add_document("guides/intro", "DOC-1", "Intro");
        let output = parse_with("[[guides/intro]] and [[missing/page | label]]", &storage);

        let para = &output.token_list[0];
        match &para.children[0].kind {
            NodeKind::Link { target, invalid, .. } => {
                assert_eq!("guides/intro", target);
                assert!(!invalid);
            }
            other => panic!("expected link, got {:?}", other),
        }
        match &para.children[2].kind {
            NodeKind::Link {
                target,
                label,
                invalid,
                ..
            } => {
                assert_eq!("missing/page", target);
                assert_eq!(Some("label".to_string()), *label);
                assert!(invalid);
            }
            other => panic!("expected link, got {:?}", other),
        }
        assert_eq!(
            vec!["guides/intro".to_string(), "missing/page".to_string()],
            output.referenced_paths
        );
    }

    #[test]
    fn file_refs_and_staged_objects() {
        let mut storage = MemoryStorage::new();
        storage.add_file(12, "a.png");
        storage.add_staged_object(-3, "b.png");
        let output = parse_with("{F12} {F-3} {F99}", &storage);

        let kinds: Vec<_> = output.token_list[0]
            .children
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::FileRef { id, resolved } => Some((id, resolved)),
                _ => None,
            })
            .collect();
        assert_eq!(vec![(12, true), (-3, true), (99, false)], kinds);
        assert_eq!(vec![12, -3, 99], output.referenced_files);
    }

    #[test]
    fn preview_parse_skips_storage() {
        let storage = MemoryStorage::new();
        let ctx = ParseContext {
            path: "p",
            is_final_render: false,
            storage: &storage,
            translator: &IdentityTranslator,
        };
        let output = parse("[[missing]] {F7}", &ctx);
        let para = &output.token_list[0];
        assert!(matches!(
            para.children[0].kind,
            NodeKind::Link { invalid: false, .. }
        ));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn bare_url_trims_trailing_punctuation() {
        let output = parse_plain("see https://example.com/x. done");
        let para = &output.token_list[0];
        match &para.children[1].kind {
            NodeKind::Link { target, bracketed, .. } => {
                assert_eq!("https://example.com/x", target);
                assert!(!bracketed);
            }
            other => panic!("expected link, got {:?}", other),
        }
        assert_eq!(NodeKind::Text(". done".into()), para.children[2].kind);
    }

    #[test]
    fn italic_does_not_eat_url_slashes() {
        let output = parse_plain("go to https://example.com/a//b now");
        let para = &output.token_list[0];
        assert!(matches!(para.children[1].kind, NodeKind::Link { .. }));
    }

    #[test]
    fn crlf_input_is_normalized() {
        let output = parse_plain("line one\r\nline two\r\n");
        assert!(!output.source.contains('\r'));
        assert_eq!(1, output.token_list.len());
    }

    #[test]
    fn spans_stay_within_source() {
        let source = "= H =\n\npara **b** [[x]]\n\n> quote\n";
        let output = parse_plain(source);
        let len = source.len() as u32;
        for node in &output.token_list {
            node.walk(&mut |n| {
                assert!(n.span.end <= len, "span {:?} out of bounds", n.span);
            });
        }
    }
}
