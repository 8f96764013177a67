//! Table parsing edge cases.

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

fn row_cells(node: &remarkup::RuleNode) -> Vec<String> {
    node.children
        .iter()
        .map(|cell| {
            cell.children
                .iter()
                .map(|n| match &n.kind {
                    NodeKind::Text(t) => t.clone(),
                    other => format!("{:?}", other),
                })
                .collect()
        })
        .collect()
}

#[test]
fn rows_and_cells_split_on_pipes() {
    let output = parse_one("| a | b |\n| c | d |");
    let table = &output.token_list[0];
    assert!(matches!(table.kind, NodeKind::Table));
    assert_eq!(2, table.children.len());
    assert_eq!(vec!["a", "b"], row_cells(&table.children[0]));
    assert_eq!(vec!["c", "d"], row_cells(&table.children[1]));
}

#[test]
fn ragged_rows_keep_their_own_widths() {
    let output = parse_one("| a |\n| b | c | d |");
    let table = &output.token_list[0];
    assert_eq!(1, table.children[0].children.len());
    assert_eq!(3, table.children[1].children.len());
}

#[test]
fn cells_parse_inline_markup() {
    let output = parse_one("| **x** | `y` |");
    let row = &output.token_list[0].children[0];
    assert!(matches!(row.children[0].children[0].kind, NodeKind::Bold));
    assert!(matches!(
        row.children[1].children[0].kind,
        NodeKind::Monospace(_)
    ));
}

#[test]
fn table_ends_at_non_pipe_line() {
    let output = parse_one("| a |\nplain text");
    assert_eq!(2, output.token_list.len());
    assert!(matches!(output.token_list[0].kind, NodeKind::Table));
    assert!(matches!(output.token_list[1].kind, NodeKind::Paragraph));
}

#[test]
fn empty_cells_are_preserved() {
    let output = parse_one("| a |  | c |");
    let row = &output.token_list[0].children[0];
    assert_eq!(3, row.children.len());
    assert!(row.children[1].children.is_empty());
}

#[test]
fn table_html_structure() {
    let html = parse_one("| a | b |").to_html(&IdentityTranslator);
    assert_eq!(
        "<table class=\"remarkup-table\"><tr><td>a</td><td>b</td></tr></table>",
        html
    );
}

#[test]
fn cell_spans_point_into_source() {
    let source = "| alpha | beta |";
    let output = parse_one(source);
    let row = &output.token_list[0].children[0];
    for cell in &row.children {
        for child in &cell.children {
            if let NodeKind::Text(text) = &child.kind {
                let span = child.span;
                assert_eq!(
                    text.as_str(),
                    &source[span.start as usize..span.end as usize]
                );
            }
        }
    }
}
