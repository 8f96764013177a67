use std::fs;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use serde_json::json;

use remarkup::{parse, IdentityTranslator, MemoryStorage, ParseContext};

fn cli() -> Command {
    Command::new("remarkup")
        .about("Parse Remarkup wiki markup and render it in various formats")
        .arg(
            Arg::new("file")
                .required(true)
                .help("Remarkup source file to parse"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["html", "xml", "tree", "markup"])
                .default_value("html")
                .help("Output format"),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .default_value("")
                .help("Wiki path the document lives at"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .help("Report broken document and file references as JSON"),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let file = matches.get_one::<String>("file").unwrap();
    let format = matches.get_one::<String>("format").unwrap();
    let path = matches.get_one::<String>("path").unwrap();

    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("remarkup: cannot read {}: {}", file, err);
            return ExitCode::FAILURE;
        }
    };

    let storage = MemoryStorage::new();
    let translator = IdentityTranslator;
    let ctx = ParseContext {
        path,
        is_final_render: false,
        storage: &storage,
        translator: &translator,
    };
    let output = parse(&source, &ctx);

    match format.as_str() {
        "html" => println!("{}", output.to_html(&translator)),
        "xml" => println!("{}", output.to_xml(path)),
        "markup" => print!("{}", output.to_markup()),
        "tree" => {
            for node in &output.token_list {
                print_node(node, 0);
            }
        }
        _ => unreachable!(),
    }

    for diagnostic in &output.diagnostics {
        eprintln!(
            "warning: {} at offset {}",
            diagnostic.kind.name(),
            diagnostic.offset
        );
    }

    if matches.get_flag("validate") {
        let report = remarkup::validate(&output, path, &storage);
        let broken: serde_json::Map<String, serde_json::Value> = report
            .broken
            .iter()
            .map(|(key, origins)| {
                (
                    key.clone(),
                    json!(origins.iter().collect::<Vec<_>>()),
                )
            })
            .collect();
        let summary = json!({
            "classified": report.classified,
            "valid": report.valid.iter().collect::<Vec<_>>(),
            "broken": broken,
        });
        println!("{}", summary);
        if report.has_broken() {
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn print_node(node: &remarkup::RuleNode, depth: usize) {
    println!(
        "{}{} [{}..{}]",
        "  ".repeat(depth),
        node.kind.name(),
        node.span.start,
        node.span.end
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}
