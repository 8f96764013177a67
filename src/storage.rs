//! External collaborator contracts. The engine only ever reads from
//! storage; document and file persistence live outside this crate.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub token: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
}

pub trait Storage {
    fn get_document_by_path(&self, path: &str) -> Option<Document>;
    fn get_document_by_token(&self, token: &str) -> Option<Document>;
    fn list_documents_under_path(&self, prefix: &str) -> Vec<Document>;
    fn get_file_by_id(&self, id: i64) -> Option<FileRecord>;
    /// Negative file ids reference uncommitted staged objects, looked
    /// up against a separate store.
    fn get_staged_object_by_id(&self, id: i64) -> Option<FileRecord>;
}

/// Opaque localization hook for user-visible marker strings.
pub trait Translator {
    fn translate(&self, key: &str, locale: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str, _locale: &str) -> String {
        key.to_string()
    }
}

/// In-memory storage used by tests and the CLI.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    documents: BTreeMap<String, Document>,
    files: BTreeMap<i64, FileRecord>,
    staged: BTreeMap<i64, FileRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn add_document(&mut self, path: &str, token: &str, title: &str) {
        self.documents.insert(
            path.to_string(),
            Document {
                path: path.to_string(),
                token: token.to_string(),
                title: title.to_string(),
            },
        );
    }

    pub fn add_file(&mut self, id: i64, name: &str) {
        self.files.insert(
            id,
            FileRecord {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn add_staged_object(&mut self, id: i64, name: &str) {
        self.staged.insert(
            id,
            FileRecord {
                id,
                name: name.to_string(),
            },
        );
    }
}

impl Storage for MemoryStorage {
    fn get_document_by_path(&self, path: &str) -> Option<Document> {
        self.documents.get(path).cloned()
    }

    fn get_document_by_token(&self, token: &str) -> Option<Document> {
        self.documents.values().find(|d| d.token == token).cloned()
    }

    fn list_documents_under_path(&self, prefix: &str) -> Vec<Document> {
        self.documents
            .values()
            .filter(|d| d.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn get_file_by_id(&self, id: i64) -> Option<FileRecord> {
        self.files.get(&id).cloned()
    }

    fn get_staged_object_by_id(&self, id: i64) -> Option<FileRecord> {
        self.staged.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_lookups() {
        let mut storage = MemoryStorage::new();
        storage.add_document("guides/intro", "DOC-1", "Intro");
        storage.add_document("guides/advanced", "DOC-2", "Advanced");
        storage.add_file(12, "diagram.png");
        storage.add_staged_object(-3, "draft.png");

        assert!(storage.get_document_by_path("guides/intro").is_some());
        assert!(storage.get_document_by_path("missing").is_none());
        assert_eq!(
            "guides/advanced",
            storage.get_document_by_token("DOC-2").unwrap().path
        );
        assert_eq!(2, storage.list_documents_under_path("guides/").len());
        assert!(storage.get_file_by_id(12).is_some());
        assert!(storage.get_file_by_id(-3).is_none());
        assert!(storage.get_staged_object_by_id(-3).is_some());
    }

    #[test]
    fn identity_translator_passes_keys_through() {
        assert_eq!("Broken Link", IdentityTranslator.translate("Broken Link", "en"));
    }
}
