// File: src/core/resolver.rs
use crate::core::types::{Dictionary, Resolution};

/// Shortcodes need at least this many characters, marker included.
const MIN_SHORTCODE_LEN: usize = 4;

/// A trailing marker that picks one ranked candidate of its base code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcodeMarker {
    /// `V`/`v`: second candidate.
    Second,
    /// `R`/`r`: third candidate.
    Third,
}

impl ShortcodeMarker {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'V' => Some(ShortcodeMarker::Second),
            'R' => Some(ShortcodeMarker::Third),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ShortcodeMarker::Second => 1,
            ShortcodeMarker::Third => 2,
        }
    }
}

/// Splits `code` into its base code and trailing marker, if it has the
/// shape of a shortcode.
pub fn split_shortcode(code: &str) -> Option<(&str, ShortcodeMarker)> {
    if code.chars().count() < MIN_SHORTCODE_LEN {
        return None;
    }
    let (idx, last) = code.char_indices().next_back()?;
    let marker = ShortcodeMarker::from_char(last)?;
    Some((&code[..idx], marker))
}

/// Candidates for `code`, in authored order. An exact match always wins; with
/// `vr_mode` an unmatched shortcode falls back to one ranked candidate of its
/// base code. The base code is only ever matched exactly.
pub fn resolve(dictionary: &Dictionary, code: &str, vr_mode: bool) -> Vec<String> {
    if let Some(candidates) = dictionary.get(code) {
        return candidates.to_vec();
    }
    if !vr_mode {
        return Vec::new();
    }

    split_shortcode(code)
        .and_then(|(base, marker)| {
            dictionary
                .get(base)
                .and_then(|candidates| candidates.get(marker.index()))
        })
        .map(|candidate| vec![candidate.clone()])
        .unwrap_or_default()
}

pub fn resolve_outcome(dictionary: &Dictionary, code: &str, vr_mode: bool) -> Resolution {
    Resolution::from(resolve(dictionary, code, vr_mode))
}
