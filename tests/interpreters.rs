//! End-to-end interpreter behavior through the full parse pipeline.

use remarkup::{parse, IdentityTranslator, MemoryStorage, NodeKind, ParseContext};

fn parse_one(source: &str) -> remarkup::ParserOutput {
    let storage = MemoryStorage::new();
    let ctx = ParseContext {
        path: "p",
        is_final_render: false,
        storage: &storage,
        translator: &IdentityTranslator,
    };
    parse(source, &ctx)
}

#[test]
fn cowsay_block_renders_bubble_and_cow() {
    let output = parse_one("```lang=cowsay\nMoo\n```\n");
    let html = output.to_html(&IdentityTranslator);
    assert!(html.contains("<pre class=\"remarkup-interpreter\">"));
    assert!(html.contains("&lt; Moo &gt;"));
    assert!(html.contains("^__^"));
    assert!(output.diagnostics.is_empty());
}

#[test]
fn cowsay_parameters_pass_through() {
    let output = parse_one("```lang=cowsay, eyes=xx, think\nhm\n```\n");
    let html = output.to_html(&IdentityTranslator);
    assert!(html.contains("( hm )"));
    assert!(html.contains("(xx)"));
}

#[test]
fn figlet_block_renders_banner_text() {
    let output = parse_one("```lang=figlet\nHI\n```\n");
    match &output.token_list[0].kind {
        NodeKind::InterpreterBlock { name, rendered, .. } => {
            assert_eq!("figlet", name);
            assert!(rendered.starts_with("<pre class=\"remarkup-interpreter\">"));
            // Banner glyphs are several rows tall.
            assert!(rendered.matches('\n').count() >= 4);
        }
        other => panic!("expected interpreter block, got {:?}", other),
    }
}

#[test]
fn interpreter_name_is_case_insensitive() {
    let output = parse_one("```lang=CowSay\nMoo\n```\n");
    assert!(matches!(
        output.token_list[0].kind,
        NodeKind::InterpreterBlock { .. }
    ));
}

#[test]
fn unknown_interpreter_degrades_to_code_block() {
    let output = parse_one("```lang=sparkle\ntext\n```\n");
    match &output.token_list[0].kind {
        NodeKind::CodeBlock { lang, content, .. } => {
            assert_eq!(Some("sparkle".to_string()), *lang);
            assert_eq!("text", content);
        }
        other => panic!("expected code block, got {:?}", other),
    }
    assert_eq!(1, output.diagnostics.len());
}

#[test]
fn interpreter_output_is_escaped_html() {
    let output = parse_one("```lang=cowsay\n<script>\n```\n");
    let html = output.to_html(&IdentityTranslator);
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>"));
}

#[test]
fn plain_code_block_is_not_interpreted() {
    let output = parse_one("```lang=rust\nfn main() {}\n```\n");
    assert!(matches!(
        output.token_list[0].kind,
        NodeKind::CodeBlock { .. }
    ));
}
