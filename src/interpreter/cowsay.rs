//! The `cowsay` interpreter: wraps its content in a speech bubble and
//! prints an ASCII cow underneath.

use super::{Interpreter, ParameterList};
use crate::html::escape_html;

const DEFAULT_COW: &str = include_str!("data/default.cow");
const TUX_COW: &str = include_str!("data/tux.cow");

const DEFAULT_EYES: &str = "oo";
const DEFAULT_TONGUE: &str = "  ";

pub struct Cowsay;

impl Interpreter for Cowsay {
    fn name(&self) -> &'static str {
        "cowsay"
    }

    fn render(&self, params: &ParameterList, content: &str) -> String {
        let think = params.flag("think");
        let eyes = params.get_or("eyes", DEFAULT_EYES);
        let tongue = params.get_or("tongue", DEFAULT_TONGUE);
        let template = cow_template(params.get_or("cow", "default"));

        let mut art = bubble(content, think);
        let thoughts = if think { "o" } else { "\\" };
        art.push_str(
            &template
                .replace("{thoughts}", thoughts)
                .replace("{eyes}", eyes)
                .replace("{tongue}", tongue),
        );

        format!(
            "<pre class=\"remarkup-interpreter\">{}</pre>",
            escape_html(&art)
        )
    }
}

/// Unknown template names fall back to the default cow.
fn cow_template(name: &str) -> &'static str {
    match name {
        "tux" => TUX_COW,
        _ => DEFAULT_COW,
    }
}

fn bubble(content: &str, think: bool) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        lines.push("");
    }
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    out.push(' ');
    for _ in 0..width + 2 {
        out.push('_');
    }
    out.push('\n');

    let count = lines.len();
    for (i, line) in lines.iter().enumerate() {
        let (open, close) = if think {
            ('(', ')')
        } else if count == 1 {
            ('<', '>')
        } else if i == 0 {
            ('/', '\\')
        } else if i == count - 1 {
            ('\\', '/')
        } else {
            ('|', '|')
        };
        out.push(open);
        out.push(' ');
        out.push_str(line);
        for _ in line.chars().count()..width {
            out.push(' ');
        }
        out.push(' ');
        out.push(close);
        out.push('\n');
    }

    out.push(' ');
    for _ in 0..width + 2 {
        out.push('-');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_bubble() {
        let html = Cowsay.render(&ParameterList::default(), "Moo");
        assert!(html.contains("&lt; Moo &gt;"));
        assert!(html.contains("^__^"));
        assert!(html.contains("(oo)"));
        assert!(html.starts_with("<pre class=\"remarkup-interpreter\">"));
    }

    #[test]
    fn empty_params_match_explicit_defaults() {
        let implicit = Cowsay.render(&ParameterList::default(), "Moo");
        let explicit = Cowsay.render(
            &ParameterList::parse("cow=default, eyes=oo"),
            "Moo",
        );
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn multi_line_bubble_sides() {
        let html = Cowsay.render(&ParameterList::default(), "one\ntwo\nthree");
        assert!(html.contains("/ one   \\"));
        assert!(html.contains("| two   |"));
        assert!(html.contains("\\ three /"));
    }

    #[test]
    fn think_mode_uses_round_bubble_and_o_connector() {
        let html = Cowsay.render(&ParameterList::parse("think"), "hm");
        assert!(html.contains("( hm )"));
        assert!(html.contains("o   ^__^"));
    }

    #[test]
    fn custom_eyes() {
        let html = Cowsay.render(&ParameterList::parse("eyes=xx"), "Moo");
        assert!(html.contains("(xx)"));
    }

    #[test]
    fn unknown_cow_falls_back_to_default() {
        let unknown = Cowsay.render(&ParameterList::parse("cow=nothere"), "Moo");
        let default = Cowsay.render(&ParameterList::default(), "Moo");
        assert_eq!(default, unknown);
    }

    #[test]
    fn tux_template() {
        let html = Cowsay.render(&ParameterList::parse("cow=tux"), "hi");
        assert!(html.contains("|o_o |"));
    }
}
