//! Text-effect interpreters for `lang=<name>` code blocks.
//!
//! Interpreters are registered once, keyed by lower-cased name, and
//! looked up through an immutable process-wide registry. An interpreter
//! is a pure function of its parameter list and content; any expensive
//! state (font tables) is cached per key behind its own lock.

mod cowsay;
mod figlet;

pub use cowsay::Cowsay;
pub use figlet::Figlet;

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub trait Interpreter: Send + Sync {
    /// Lower-cased lookup key.
    fn name(&self) -> &'static str;

    /// Convert `content` to HTML. Never fails: unknown parameter values
    /// fall back to documented defaults.
    fn render(&self, params: &ParameterList, content: &str) -> String;
}

/// Parsed `key=value, key2` directive parameters. Bare keys act as
/// boolean flags. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    entries: Vec<(String, Option<String>)>,
}

impl ParameterList {
    pub fn parse(input: &str) -> Self {
        let mut entries = Vec::new();
        for piece in input.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            match piece.split_once('=') {
                Some((key, value)) => {
                    entries.push((key.trim().to_string(), Some(value.trim().to_string())));
                }
                None => entries.push((piece.to_string(), None)),
            }
        }
        ParameterList { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Registry {
    interpreters: HashMap<String, Box<dyn Interpreter>>,
}

impl Registry {
    fn with_builtins() -> Self {
        let mut registry = Registry {
            interpreters: HashMap::new(),
        };
        registry.register(Box::new(Cowsay));
        registry.register(Box::new(Figlet));
        registry
    }

    fn register(&mut self, interpreter: Box<dyn Interpreter>) {
        self.interpreters
            .insert(interpreter.name().to_string(), interpreter);
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn Interpreter> {
        self.interpreters
            .get(&name.to_ascii_lowercase())
            .map(|b| b.as_ref())
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_builtins);

/// Look up a registered interpreter by name, case-insensitively.
pub fn resolve(name: &str) -> Option<&'static dyn Interpreter> {
    REGISTRY.resolve(name)
}
