// File: src/core/engine.rs
use crate::config::EngineConfig;
use crate::core::dictionary::DictionaryStore;
use crate::core::resolver::resolve_outcome;
use crate::core::session::SelectionSession;
use crate::core::types::{Dictionary, Resolution};
use crate::history::HistoryStore;
use serde::Serialize;
use tracing::{debug, warn};

/// Input from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A code to resolve.
    TypedCode(String),
    /// Literal text for the output buffer, e.g. a digit typed while no
    /// selection is open.
    TypedText(String),
    /// Finalize the output buffer: copy it out and record it in history.
    CommitTrigger,
    SelectIndex(usize),
    Cancel,
    ToggleVrMode(bool),
    TogglePreselectMode(bool),
    ClearOutput,
    ClearHistory,
    /// Ask for a history entry to be copied to the clipboard again.
    RecallHistory(usize),
    ReloadDictionary,
}

/// Output to the presentation layer and the clipboard sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    CandidatesReady { candidates: Vec<String> },
    OutputChanged { output: String },
    /// Final text; goes to the clipboard. History is already updated.
    Committed { text: String },
    NoMatch { code: String },
    SessionClosed,
    HistoryChanged { entries: Vec<String> },
    CopyRequested { text: String },
    DictionaryLoaded { entries: usize },
    Warning { message: String },
}

/// Ties the dictionary, the selection session, the output buffer and the
/// history together. Single-threaded: each command runs to completion.
pub struct ImeEngine {
    store: DictionaryStore,
    history: HistoryStore,
    session: SelectionSession,
    output: String,
    vr_mode: bool,
    preselect_mode: bool,
    max_code_len: usize,
}

impl ImeEngine {
    /// Builds an engine over an already-loaded store and history.
    pub fn new(store: DictionaryStore, history: HistoryStore) -> Self {
        Self {
            store,
            history,
            session: SelectionSession::Closed,
            output: String::new(),
            vr_mode: false,
            preselect_mode: false,
            max_code_len: crate::config::DEFAULT_MAX_CODE_LEN,
        }
    }

    /// Loads dictionary and history from the configured paths. Startup never
    /// fails: a dictionary or history that cannot be loaded leaves the engine
    /// with an empty one, reported in the returned warnings.
    pub fn from_config(config: &EngineConfig) -> (Self, Vec<Notification>) {
        let mut startup = Vec::new();
        let mut store = DictionaryStore::new(&config.dictionary_path);
        match store.load() {
            Ok(_) => startup.push(Notification::DictionaryLoaded {
                entries: store.dictionary().len(),
            }),
            Err(e) => {
                warn!(error = %e, "dictionary unavailable, continuing with an empty one");
                startup.push(Notification::Warning {
                    message: e.to_string(),
                });
            }
        }
        let history = HistoryStore::load(&config.history_path).unwrap_or_else(|e| {
            warn!(error = %e, "history unavailable, starting empty");
            startup.push(warning(&e));
            HistoryStore::new(&config.history_path)
        });

        let mut engine = Self::new(store, history);
        engine.vr_mode = config.vr_mode;
        engine.preselect_mode = config.preselect_mode;
        engine.max_code_len = config.max_code_len.max(1);
        (engine, startup)
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub fn history(&self) -> &[String] {
        self.history.entries()
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.store.dictionary()
    }

    pub fn vr_mode(&self) -> bool {
        self.vr_mode
    }

    pub fn preselect_mode(&self) -> bool {
        self.preselect_mode
    }

    /// Writes toggles flipped since launch into `saved`. `launched` is the
    /// effective config the engine started from; anything set only for this
    /// run and never toggled stays out of `saved`.
    pub fn sync_config(&self, launched: &EngineConfig, saved: &mut EngineConfig) {
        if self.vr_mode != launched.vr_mode {
            saved.vr_mode = self.vr_mode;
        }
        if self.preselect_mode != launched.preselect_mode {
            saved.preselect_mode = self.preselect_mode;
        }
    }

    pub fn handle(&mut self, command: Command) -> Vec<Notification> {
        debug!(?command, "handling command");
        let mut events = Vec::new();
        match command {
            Command::TypedCode(code) => self.typed_code(&code, &mut events),
            Command::TypedText(text) => {
                if !text.is_empty() {
                    self.close_session(&mut events);
                    self.output.push_str(&text);
                    events.push(self.output_changed());
                }
            }
            Command::CommitTrigger => self.commit(&mut events),
            Command::SelectIndex(index) => {
                if self.session.is_open() {
                    if self.session.select(index, &mut self.output).is_some() {
                        events.push(self.output_changed());
                    }
                    events.push(Notification::SessionClosed);
                }
            }
            Command::Cancel => self.close_session(&mut events),
            Command::ToggleVrMode(enabled) => self.vr_mode = enabled,
            Command::TogglePreselectMode(enabled) => self.preselect_mode = enabled,
            Command::ClearOutput => {
                self.close_session(&mut events);
                self.output.clear();
                events.push(self.output_changed());
            }
            Command::ClearHistory => {
                if let Err(e) = self.history.clear() {
                    events.push(warning(e));
                }
                events.push(self.history_changed());
            }
            Command::RecallHistory(index) => {
                if let Some(text) = self.history.get(index) {
                    events.push(Notification::CopyRequested {
                        text: text.to_string(),
                    });
                }
            }
            Command::ReloadDictionary => match self.store.load() {
                Ok(_) => events.push(Notification::DictionaryLoaded {
                    entries: self.store.dictionary().len(),
                }),
                Err(e) => events.push(warning(e)),
            },
        }
        events
    }

    fn typed_code(&mut self, code: &str, events: &mut Vec<Notification>) {
        let code: String = code.trim().chars().take(self.max_code_len).collect();
        if code.is_empty() {
            return;
        }
        // A fresh code supersedes whatever selection was pending.
        self.close_session(events);

        match resolve_outcome(self.store.dictionary(), &code, self.vr_mode) {
            Resolution::NoMatch => events.push(Notification::NoMatch { code }),
            Resolution::Single(candidate) => {
                self.output.push_str(&candidate);
                events.push(self.output_changed());
            }
            Resolution::Multiple(candidates) => {
                let before = self.output.len();
                self.session
                    .open(candidates.clone(), self.preselect_mode, &mut self.output);
                if self.output.len() != before {
                    events.push(self.output_changed());
                }
                events.push(Notification::CandidatesReady { candidates });
            }
        }
    }

    fn commit(&mut self, events: &mut Vec<Notification>) {
        self.close_session(events);
        let text = self.output.trim().to_string();
        if text.is_empty() {
            return;
        }

        events.push(Notification::Committed { text: text.clone() });
        match self.history.append(&text) {
            Ok(true) => events.push(self.history_changed()),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "history not saved");
                events.push(warning(e));
                events.push(self.history_changed());
            }
        }
        self.output.clear();
        events.push(self.output_changed());
    }

    fn close_session(&mut self, events: &mut Vec<Notification>) {
        if self.session.cancel() {
            events.push(Notification::SessionClosed);
        }
    }

    fn output_changed(&self) -> Notification {
        Notification::OutputChanged {
            output: self.output.clone(),
        }
    }

    fn history_changed(&self) -> Notification {
        Notification::HistoryChanged {
            entries: self.history.entries().to_vec(),
        }
    }
}

fn warning(error: impl std::fmt::Display) -> Notification {
    Notification::Warning {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine_with(dir: &TempDir, source: &str) -> ImeEngine {
        let mut config = EngineConfig::in_dir(dir.path());
        fs::write(&config.dictionary_path, source).unwrap();
        config.vr_mode = true;
        let (engine, startup) = ImeEngine::from_config(&config);
        assert_eq!(startup, vec![Notification::DictionaryLoaded { entries: 3 }]);
        engine
    }

    fn sample(dir: &TempDir) -> ImeEngine {
        engine_with(dir, "AA 寸\nABC 第一 第二 第三 第四\njou 捐 胡\n")
    }

    #[test]
    fn test_single_candidate_auto_commits_to_output() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);

        let events = engine.handle(Command::TypedCode("AA".into()));

        assert_eq!(
            events,
            vec![Notification::OutputChanged {
                output: "寸".into()
            }]
        );
        assert!(!engine.session().is_open());
    }

    #[test]
    fn test_no_match_is_reported_distinctly() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);

        let events = engine.handle(Command::TypedCode("QQ".into()));

        assert_eq!(events, vec![Notification::NoMatch { code: "QQ".into() }]);
        assert_eq!(engine.output(), "");
    }

    #[test]
    fn test_shortcode_resolves_through_engine() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);

        engine.handle(Command::TypedCode("ABCr".into()));
        assert_eq!(engine.output(), "第三");

        engine.handle(Command::ToggleVrMode(false));
        let events = engine.handle(Command::TypedCode("ABCV".into()));
        assert_eq!(events, vec![Notification::NoMatch { code: "ABCV".into() }]);
    }

    #[test]
    fn test_multiple_candidates_open_session() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);

        let events = engine.handle(Command::TypedCode("jou".into()));

        assert_eq!(
            events,
            vec![Notification::CandidatesReady {
                candidates: vec!["捐".into(), "胡".into()]
            }]
        );
        assert!(engine.session().is_open());

        let events = engine.handle(Command::SelectIndex(1));
        assert_eq!(
            events,
            vec![
                Notification::OutputChanged {
                    output: "胡".into()
                },
                Notification::SessionClosed
            ]
        );
    }

    #[test]
    fn test_preselect_swaps_provisional_candidate() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TogglePreselectMode(true));

        engine.handle(Command::TypedCode("ABC".into()));
        assert_eq!(engine.output(), "第一");

        engine.handle(Command::SelectIndex(2));
        assert_eq!(engine.output(), "第三");
    }

    #[test]
    fn test_new_code_supersedes_open_session() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TogglePreselectMode(true));
        engine.handle(Command::TypedCode("jou".into()));

        let events = engine.handle(Command::TypedCode("AA".into()));

        assert_eq!(events[0], Notification::SessionClosed);
        assert_eq!(engine.output(), "捐寸");
        assert!(engine.handle(Command::SelectIndex(1)).is_empty());
    }

    #[test]
    fn test_long_codes_are_truncated() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);

        engine.handle(Command::TypedCode("  AA  ".into()));
        assert_eq!(engine.output(), "寸");

        let events = engine.handle(Command::TypedCode("ABCDEFGH".into()));
        assert_eq!(
            events,
            vec![Notification::NoMatch {
                code: "ABCDEF".into()
            }]
        );
    }

    #[test]
    fn test_commit_records_history_and_clears_output() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TypedCode("AA".into()));

        let events = engine.handle(Command::CommitTrigger);

        assert_eq!(
            events,
            vec![
                Notification::Committed { text: "寸".into() },
                Notification::HistoryChanged {
                    entries: vec!["寸".into()]
                },
                Notification::OutputChanged { output: "".into() },
            ]
        );
        assert!(engine.handle(Command::CommitTrigger).is_empty());
    }

    #[test]
    fn test_recall_history_requests_copy() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TypedText("hello".into()));
        engine.handle(Command::CommitTrigger);

        assert_eq!(
            engine.handle(Command::RecallHistory(0)),
            vec![Notification::CopyRequested {
                text: "hello".into()
            }]
        );
        assert!(engine.handle(Command::RecallHistory(5)).is_empty());
        assert_eq!(engine.history(), ["hello"]);
    }

    #[test]
    fn test_unloadable_dictionary_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::in_dir(dir.path());
        fs::write(&config.dictionary_path, [0xff, 0xfe, 0xfd]).unwrap();

        let (mut engine, startup) = ImeEngine::from_config(&config);

        assert!(matches!(startup[..], [Notification::Warning { .. }]));
        assert!(engine.dictionary().is_empty());
        assert_eq!(
            engine.handle(Command::TypedCode("AA".into())),
            vec![Notification::NoMatch { code: "AA".into() }]
        );
    }

    #[test]
    fn test_corrupt_history_is_reported_at_startup() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::in_dir(dir.path());
        fs::write(&config.dictionary_path, "AA 寸\n").unwrap();
        fs::write(&config.history_path, "{ not json").unwrap();

        let (mut engine, startup) = ImeEngine::from_config(&config);

        assert_eq!(startup[0], Notification::DictionaryLoaded { entries: 1 });
        assert!(matches!(startup[1], Notification::Warning { ref message } if message.contains("history")));
        assert!(engine.history().is_empty());

        engine.handle(Command::TypedCode("AA".into()));
        engine.handle(Command::CommitTrigger);
        assert_eq!(engine.history(), ["寸"]);
    }

    #[test]
    fn test_cancel_closes_session_and_keeps_output() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TypedCode("AA".into()));
        engine.handle(Command::TypedCode("jou".into()));

        assert_eq!(
            engine.handle(Command::Cancel),
            vec![Notification::SessionClosed]
        );
        assert!(!engine.session().is_open());
        assert_eq!(engine.output(), "寸");
        assert!(engine.handle(Command::Cancel).is_empty());
        assert!(engine.handle(Command::SelectIndex(0)).is_empty());
    }

    #[test]
    fn test_clear_output_closes_session_and_empties_buffer() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TogglePreselectMode(true));
        engine.handle(Command::TypedCode("ABC".into()));
        assert_eq!(engine.output(), "第一");

        let events = engine.handle(Command::ClearOutput);

        assert_eq!(
            events,
            vec![
                Notification::SessionClosed,
                Notification::OutputChanged { output: "".into() },
            ]
        );
        assert!(!engine.session().is_open());
        assert_eq!(engine.output(), "");
    }

    #[test]
    fn test_typed_text_closes_open_session_before_appending() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::TypedCode("jou".into()));

        let events = engine.handle(Command::TypedText("7".into()));

        assert_eq!(
            events,
            vec![
                Notification::SessionClosed,
                Notification::OutputChanged { output: "7".into() },
            ]
        );
        assert!(!engine.session().is_open());
        assert!(engine.handle(Command::TypedText(String::new())).is_empty());
    }

    #[test]
    fn test_sync_config_copies_runtime_toggles() {
        let dir = TempDir::new().unwrap();
        let mut engine = sample(&dir);
        engine.handle(Command::ToggleVrMode(false));
        engine.handle(Command::TogglePreselectMode(true));
        let launched = EngineConfig {
            vr_mode: true,
            ..EngineConfig::in_dir(dir.path())
        };
        let mut saved = EngineConfig::in_dir(dir.path());
        saved.vr_mode = true;

        engine.sync_config(&launched, &mut saved);

        assert!(!saved.vr_mode);
        assert!(saved.preselect_mode);
    }

    #[test]
    fn test_sync_config_ignores_one_off_overrides() {
        let dir = TempDir::new().unwrap();
        let saved_on_disk = EngineConfig::in_dir(dir.path());
        let mut launched = saved_on_disk.clone();
        launched.vr_mode = true;
        launched.dictionary_path = dir.path().join("other.tab");
        fs::write(&launched.dictionary_path, "AA 寸\n").unwrap();
        let (engine, _) = ImeEngine::from_config(&launched);
        let mut saved = saved_on_disk.clone();

        engine.sync_config(&launched, &mut saved);

        assert_eq!(saved, saved_on_disk);
    }
}
