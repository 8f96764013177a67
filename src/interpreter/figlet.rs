//! The `figlet` interpreter: renders content as large banner text
//! built from an embedded bitmap font.
//!
//! Font resources use a glyph-block format: a line `@X` opens the glyph
//! for character `X` (a bare `@` opens the space glyph), the following
//! lines are its rows until a `@@` line closes it. Within a row, `#` is
//! a pixel and any other character is blank.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use super::{Interpreter, ParameterList};
use crate::html::escape_html;

const BANNER_FONT: &str = include_str!("data/banner.txt");
const DEFAULT_FONT: &str = "banner";

#[derive(Debug)]
struct Font {
    height: usize,
    glyphs: HashMap<char, Vec<String>>,
}

impl Font {
    fn parse(resource: &str) -> Self {
        let mut glyphs: HashMap<char, Vec<String>> = HashMap::new();
        let mut height = 0;
        let mut current: Option<(char, Vec<String>)> = None;

        for line in resource.lines() {
            if line == "@@" {
                if let Some((ch, rows)) = current.take() {
                    height = height.max(rows.len());
                    glyphs.insert(ch, normalize_rows(rows));
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix('@') {
                let ch = rest.chars().next().unwrap_or(' ');
                current = Some((ch, Vec::new()));
                continue;
            }
            if let Some((_, rows)) = current.as_mut() {
                let row: String = line
                    .chars()
                    .map(|c| if c == '#' { '#' } else { ' ' })
                    .collect();
                rows.push(row);
            }
        }

        Font { height, glyphs }
    }

    fn glyph(&self, ch: char) -> Option<&Vec<String>> {
        self.glyphs
            .get(&ch)
            .or_else(|| self.glyphs.get(&ch.to_ascii_uppercase()))
    }

    /// Column width for characters the font has no glyph for, taken
    /// from the font's own space glyph so substitution keeps columns
    /// aligned.
    fn blank_width(&self) -> usize {
        self.glyph(' ')
            .and_then(|rows| rows.first().map(String::len))
            .unwrap_or(3)
    }
}

fn normalize_rows(rows: Vec<String>) -> Vec<String> {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    rows.into_iter()
        .map(|mut r| {
            while r.len() < width {
                r.push(' ');
            }
            r
        })
        .collect()
}

// Font tables are loaded once per name and shared by all concurrent
// parses; the lock only guards the check-then-populate step.
static FONT_CACHE: Lazy<Mutex<HashMap<String, Arc<Font>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn load_font(name: &str) -> Arc<Font> {
    // Unknown names fall back to the default resource.
    let (key, resource) = match name {
        "banner" => ("banner", BANNER_FONT),
        _ => (DEFAULT_FONT, BANNER_FONT),
    };

    let mut cache = FONT_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache
        .entry(key.to_string())
        .or_insert_with(|| Arc::new(Font::parse(resource)))
        .clone()
}

pub struct Figlet;

impl Interpreter for Figlet {
    fn name(&self) -> &'static str {
        "figlet"
    }

    fn render(&self, params: &ParameterList, content: &str) -> String {
        let font = load_font(params.get_or("font", DEFAULT_FONT));

        let mut art = String::new();
        for (i, line) in content.lines().enumerate() {
            if i > 0 {
                art.push('\n');
            }
            render_line(&font, line, &mut art);
        }

        format!(
            "<pre class=\"remarkup-interpreter\">{}</pre>",
            escape_html(&art)
        )
    }
}

fn render_line(font: &Font, line: &str, out: &mut String) {
    for row in 0..font.height {
        let mut rendered = String::new();
        for ch in line.chars() {
            match font.glyph(ch) {
                Some(rows) => match rows.get(row) {
                    Some(r) => rendered.push_str(r),
                    // Glyph shorter than the font height; keep its
                    // column width so later glyphs line up.
                    None => {
                        let width = rows.first().map(String::len).unwrap_or(0);
                        rendered.push_str(&" ".repeat(width));
                    }
                },
                // Characters missing from the font render as a blank
                // column instead of being dropped silently.
                None => rendered.push_str(&" ".repeat(font.blank_width())),
            }
            rendered.push(' ');
        }
        out.push_str(rendered.trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_font_has_expected_height() {
        let font = load_font("banner");
        assert_eq!(5, font.height);
        assert!(font.glyph('A').is_some());
        assert!(font.glyph('9').is_some());
        assert!(font.glyph(' ').is_some());
    }

    #[test]
    fn glyph_rows_are_rectangular() {
        let font = load_font("banner");
        for rows in font.glyphs.values() {
            let width = rows[0].len();
            assert!(rows.iter().all(|r| r.len() == width));
        }
    }

    #[test]
    fn lowercase_maps_to_uppercase() {
        let font = load_font("banner");
        assert_eq!(font.glyph('a'), font.glyph('A'));
    }

    #[test]
    fn render_is_deterministic() {
        let params = ParameterList::default();
        let a = Figlet.render(&params, "HI");
        let b = Figlet.render(&params, "HI");
        assert_eq!(a, b);
        assert!(a.starts_with("<pre class=\"remarkup-interpreter\">"));
    }

    #[test]
    fn unknown_font_falls_back_to_banner() {
        let params = ParameterList::parse("font=nosuchfont");
        let fallback = Figlet.render(&params, "OK");
        let banner = Figlet.render(&ParameterList::parse("font=banner"), "OK");
        assert_eq!(banner, fallback);
    }

    #[test]
    fn default_matches_explicit_banner() {
        let implicit = Figlet.render(&ParameterList::default(), "Z");
        let explicit = Figlet.render(&ParameterList::parse("font=banner"), "Z");
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn missing_characters_render_blank() {
        let html = Figlet.render(&ParameterList::default(), "~");
        // Five blank rows, no pixels.
        assert!(!html.contains('#'));
    }

    #[test]
    fn missing_characters_take_the_space_glyph_width() {
        let font = load_font("banner");
        let space_width = font.glyph(' ').unwrap()[0].len();
        assert_eq!(space_width, font.blank_width());
        // Substituting a missing char for a space must not shift the
        // columns of the glyphs that follow it.
        let substituted = Figlet.render(&ParameterList::default(), "A~B");
        let spaced = Figlet.render(&ParameterList::default(), "A B");
        assert_eq!(spaced, substituted);
    }
}
