// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// A short typed code, e.g. `"ABC"`.
pub type Code = String;

/// One code and its authored candidates. Order is significant: index-based
/// selection and "first candidate" both refer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub code: Code,
    pub candidates: Vec<String>,
}

impl DictionaryEntry {
    /// Parses one source line: `code cand1 cand2 ...`.
    /// Blank lines and lines with fewer than two tokens yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let code = tokens.next()?;
        let candidates: Vec<String> = tokens.map(str::to_string).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            code: code.to_string(),
            candidates,
        })
    }
}

/// An immutable code → candidates snapshot. Never edited after it is built;
/// a reload produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    entries: HashMap<Code, Vec<String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from the text source format. Malformed lines are
    /// skipped and a repeated code keeps its last definition.
    pub fn parse(source: &str) -> Self {
        source
            .lines()
            .filter_map(DictionaryEntry::parse_line)
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<&[String]> {
        self.entries.get(code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Writes the snapshot in source format, one entry per line, sorted by code.
    pub fn write_source(&self, writer: &mut dyn Write) -> io::Result<()> {
        for code in self.codes() {
            if let Some(candidates) = self.get(code) {
                writeln!(writer, "{} {}", code, candidates.join(" "))?;
            }
        }
        Ok(())
    }
}

impl FromIterator<DictionaryEntry> for Dictionary {
    fn from_iter<I: IntoIterator<Item = DictionaryEntry>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|entry| (entry.code, entry.candidates))
            .collect();
        Self { entries }
    }
}

/// Outcome of resolving a code. `NoMatch` is a normal result, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NoMatch,
    Single(String),
    Multiple(Vec<String>),
}

impl From<Vec<String>> for Resolution {
    fn from(mut candidates: Vec<String>) -> Self {
        match candidates.len() {
            0 => Resolution::NoMatch,
            1 => Resolution::Single(candidates.remove(0)),
            _ => Resolution::Multiple(candidates),
        }
    }
}
