// File: src/core/session.rs
use std::mem;

/// The candidate picker opened when a code has several candidates.
///
/// In preselect mode the first candidate is appended to the output as soon as
/// the session opens; a later pick swaps it out so that exactly one candidate
/// of the session ends up in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionSession {
    #[default]
    Closed,
    Open {
        candidates: Vec<String>,
        pending_text: Option<String>,
    },
}

impl SelectionSession {
    /// Opens a session over `candidates`. Any session already open is dropped
    /// without committing; text it already put in `output` stays there.
    pub fn open(&mut self, candidates: Vec<String>, preselect: bool, output: &mut String) {
        let pending_text = if preselect {
            candidates.first().cloned()
        } else {
            None
        };
        if let Some(text) = &pending_text {
            output.push_str(text);
        }
        *self = SelectionSession::Open {
            candidates,
            pending_text,
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SelectionSession::Open { .. })
    }

    pub fn candidates(&self) -> &[String] {
        match self {
            SelectionSession::Open { candidates, .. } => candidates,
            SelectionSession::Closed => &[],
        }
    }

    pub fn pending_text(&self) -> Option<&str> {
        match self {
            SelectionSession::Open { pending_text, .. } => pending_text.as_deref(),
            SelectionSession::Closed => None,
        }
    }

    /// Commits the candidate at `index` into `output` and closes the session.
    /// An out-of-range index closes the session without touching `output`.
    /// Returns the committed candidate.
    pub fn select(&mut self, index: usize, output: &mut String) -> Option<String> {
        let SelectionSession::Open {
            mut candidates,
            pending_text,
        } = mem::take(self)
        else {
            return None;
        };
        if index >= candidates.len() {
            return None;
        }

        if let Some(pending) = pending_text {
            if output.ends_with(&pending) {
                output.truncate(output.len() - pending.len());
            }
        }
        let chosen = candidates.swap_remove(index);
        output.push_str(&chosen);
        Some(chosen)
    }

    /// Closes the session. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        let was_open = self.is_open();
        *self = SelectionSession::Closed;
        was_open
    }
}
