use std::fmt;

/// One-time prerequisite lines (imports, helper definitions) keyed by a stable name.
///
/// Providing a key again replaces its line but keeps its original position,
/// so the flushed preamble lists each prerequisite once, in first-use order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    entries: Vec<(String, String)>,
}

impl Definitions {
    pub fn new() -> Self {
        Definitions::default()
    }

    pub fn provide(&mut self, key: impl Into<String>, line: impl Into<String>) {
        let key = key.into();
        let line = line.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = line,
            None => self.entries.push((key, line)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, line)| line.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fold another set in, applying the same last-write-wins rule per key.
    pub fn merge(&mut self, other: Definitions) {
        for (key, line) in other.entries {
            self.provide(key, line);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, l)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A non-fatal finding made while generating a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub block: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}: {}", self.block, self.message)
    }
}

/// State owned by a single generation pass. Never shared between passes.
#[derive(Debug, Default)]
pub struct GenerationContext {
    pub definitions: Definitions,
    pub warnings: Vec<Warning>,
}

impl GenerationContext {
    pub fn new() -> Self {
        GenerationContext::default()
    }

    /// Drop everything accumulated so the context can serve a fresh pass.
    pub fn reset(&mut self) {
        self.definitions.clear();
        self.warnings.clear();
    }

    pub fn warn(&mut self, block: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Warning {
            block: block.into(),
            message: message.into(),
        });
    }
}
