//! Lenient tag tokenizer for the structured export format.
//!
//! This is deliberately not an XML parser: it never validates tag
//! balance, never rejects input, and treats anything that fails to
//! match a tag pattern as literal text. Tag matching is left to the
//! consumer of the token stream.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<(/?)([A-Za-z][A-Za-z0-9_-]*)((?:\s+[A-Za-z_][A-Za-z0-9_-]*="[^"]*")*)\s*(/?)>"#,
    )
    .unwrap()
});

static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)="([^"]*)""#).unwrap());

/// One attribute of an opening or auto-close tag. `offset` is the
/// attribute's position in the overall input, not within its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub name: String,
    /// Source order preserved; it must survive a round-trip.
    pub attributes: Vec<Attribute>,
    pub offset: u32,
    pub len: u32,
    /// Exact source slice, for byte-faithful coverage of the input.
    pub raw: String,
}

impl TagToken {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    Text {
        value: String,
        offset: u32,
    },
    OpeningTag(TagToken),
    ClosingTag {
        name: String,
        offset: u32,
        len: u32,
        raw: String,
    },
    AutoCloseTag(TagToken),
}

impl XmlToken {
    pub fn offset(&self) -> u32 {
        match self {
            XmlToken::Text { offset, .. } => *offset,
            XmlToken::OpeningTag(tag) => tag.offset,
            XmlToken::ClosingTag { offset, .. } => *offset,
            XmlToken::AutoCloseTag(tag) => tag.offset,
        }
    }

    pub fn len(&self) -> u32 {
        match self {
            XmlToken::Text { value, .. } => value.len() as u32,
            XmlToken::OpeningTag(tag) => tag.len,
            XmlToken::ClosingTag { len, .. } => *len,
            XmlToken::AutoCloseTag(tag) => tag.len,
        }
    }

    /// Exact source slice this token covers. Concatenating `raw()` over
    /// a token stream reproduces the input byte-for-byte.
    pub fn raw(&self) -> &str {
        match self {
            XmlToken::Text { value, .. } => value,
            XmlToken::OpeningTag(tag) => &tag.raw,
            XmlToken::ClosingTag { raw, .. } => raw,
            XmlToken::AutoCloseTag(tag) => &tag.raw,
        }
    }

    /// Re-render the token from its parsed structure. Attribute spacing
    /// is normalized to single spaces and auto-close tags re-render as
    /// `<name />`; everything else reproduces the source.
    pub fn render(&self) -> String {
        match self {
            XmlToken::Text { value, .. } => value.clone(),
            XmlToken::ClosingTag { name, .. } => format!("</{}>", name),
            XmlToken::OpeningTag(tag) => render_tag(tag, false),
            XmlToken::AutoCloseTag(tag) => render_tag(tag, true),
        }
    }
}

fn render_tag(tag: &TagToken, auto_close: bool) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(&tag.name);
    for attr in &tag.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&attr.value);
        out.push('"');
    }
    if auto_close {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Tokenize `input` into a flat, gapless token sequence. Pure function;
/// malformed tags degrade to text and never produce an error.
pub fn tokenize(input: &str) -> Vec<XmlToken> {
    let mut tokens = Vec::new();
    let mut pos: usize = 0;

    while pos < input.len() {
        let rest = &input[pos..];

        if rest.starts_with('<') {
            if let Some(caps) = TAG_RE.captures(rest) {
                let whole = caps.get(0).unwrap();
                let closing = !caps.get(1).unwrap().as_str().is_empty();
                let name = caps.get(2).unwrap().as_str().to_string();
                let auto_close = !caps.get(4).unwrap().as_str().is_empty();

                if closing {
                    tokens.push(XmlToken::ClosingTag {
                        name,
                        offset: pos as u32,
                        len: whole.len() as u32,
                        raw: whole.as_str().to_string(),
                    });
                } else {
                    let attr_segment = caps.get(3).unwrap();
                    let segment_base = pos + attr_segment.start();
                    let mut attributes = Vec::new();
                    for attr in ATTR_RE.captures_iter(attr_segment.as_str()) {
                        attributes.push(Attribute {
                            name: attr.get(1).unwrap().as_str().to_string(),
                            value: attr.get(2).unwrap().as_str().to_string(),
                            offset: (segment_base + attr.get(0).unwrap().start()) as u32,
                        });
                    }
                    let tag = TagToken {
                        name,
                        attributes,
                        offset: pos as u32,
                        len: whole.len() as u32,
                        raw: whole.as_str().to_string(),
                    };
                    tokens.push(if auto_close {
                        XmlToken::AutoCloseTag(tag)
                    } else {
                        XmlToken::OpeningTag(tag)
                    });
                }

                pos += whole.len();
                continue;
            }

            // Not a recognizable tag: the '<' is literal. Consume it and
            // the run up to the next '<'.
            let end = match rest[1..].find('<') {
                Some(i) => pos + 1 + i,
                None => input.len(),
            };
            tokens.push(XmlToken::Text {
                value: input[pos..end].to_string(),
                offset: pos as u32,
            });
            pos = end;
            continue;
        }

        // Longest run of characters not containing '<'.
        let end = match rest.find('<') {
            Some(i) => pos + i,
            None => input.len(),
        };
        tokens.push(XmlToken::Text {
            value: input[pos..end].to_string(),
            offset: pos as u32,
        });
        pos = end;
    }

    tokens
}
