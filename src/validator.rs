//! Cross-reference audit over parsed documents.
//!
//! The parser records which wiki paths and file ids a document mentions;
//! this module checks each of them against storage and accumulates a
//! report suitable for a maintenance sweep across many documents.

use std::collections::{BTreeMap, BTreeSet};

use crate::node::NodeKind;
use crate::output::ParserOutput;
use crate::storage::Storage;

/// Accumulated classification of every reference seen so far.
///
/// `broken` maps each dangling reference key to the paths of the
/// documents that mention it. File references use the key `F<id>`;
/// document links use their target path.
#[derive(Debug, Default)]
pub struct ReferenceReport {
    pub broken: BTreeMap<String, BTreeSet<String>>,
    pub valid: BTreeSet<String>,
    pub classified: usize,
}

impl ReferenceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_broken(&self) -> bool {
        !self.broken.is_empty()
    }

    fn record(&mut self, origin: &str, key: String, ok: bool) {
        self.classified += 1;
        if ok {
            self.valid.insert(key);
        } else {
            self.broken.entry(key).or_default().insert(origin.to_string());
        }
    }
}

/// Classify every link and file reference in `output`, attributing
/// breakage to `origin_path`.
pub fn validate(output: &ParserOutput, origin_path: &str, storage: &dyn Storage) -> ReferenceReport {
    let mut report = ReferenceReport::new();
    validate_into(output, origin_path, storage, &mut report);
    report
}

/// Like [`validate`], but accumulates into an existing report so one
/// sweep can cover many documents. Each distinct reference is checked
/// once per document even if it appears several times.
pub fn validate_into(
    output: &ParserOutput,
    origin_path: &str,
    storage: &dyn Storage,
    report: &mut ReferenceReport,
) {
    let mut seen = BTreeSet::new();
    for root in &output.token_list {
        root.walk(&mut |node| match &node.kind {
            NodeKind::Link { target, .. } => {
                let key = target.clone();
                if seen.insert(key.clone()) {
                    let ok = is_extern(target) || storage.get_document_by_path(target).is_some();
                    report.record(origin_path, key, ok);
                }
            }
            NodeKind::FileRef { id, .. } => {
                let key = format!("F{}", id);
                if seen.insert(key.clone()) {
                    let ok = if *id < 0 {
                        storage.get_staged_object_by_id(*id).is_some()
                    } else {
                        storage.get_file_by_id(*id).is_some()
                    };
                    report.record(origin_path, key, ok);
                }
            }
            _ => {}
        });
    }
}

fn is_extern(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}
