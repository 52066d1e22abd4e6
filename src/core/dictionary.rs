// File: src/core/dictionary.rs
//! The dictionary store: a human-editable source file fronted by a binary
//! cache that is trusted only while it is at least as new as the source.

use crate::core::types::{Dictionary, DictionaryEntry};
use crate::error::{ImeError, Result};
use crate::persistence::{load_bincode, save_bincode, write_atomic};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Bumped whenever `CacheFile` changes shape.
const CACHE_FORMAT_VERSION: u32 = 1;

const CACHE_SUFFIX: &str = ".cache";

const SAMPLE_ENTRIES: &[(&str, &[&str])] = &[
    ("AA", &["寸", "尺", "分"]),
    ("BB", &["公分", "公尺"]),
    ("CC", &["很好", "不錯", "棒"]),
    ("aaa", &["鑫", "龘", "鑆"]),
    ("DD", &["測試"]),
    ("ABC", &["第一", "第二", "第三", "第四"]),
    ("ABCD", &["甲", "乙", "丙", "丁"]),
    ("jou", &["捐", "胡"]),
    ("jouv", &["測試V"]),
];

/// The small dictionary written out when no source file exists yet.
pub fn sample_dictionary() -> Dictionary {
    SAMPLE_ENTRIES
        .iter()
        .map(|(code, candidates)| DictionaryEntry {
            code: code.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        })
        .collect()
}

/// Identity of a source file revision as seen on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStamp {
    modified_secs: u64,
    modified_nanos: u32,
    len: u64,
}

impl SourceStamp {
    pub fn new(modified: SystemTime, len: u64) -> Self {
        let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            modified_secs: since_epoch.as_secs(),
            modified_nanos: since_epoch.subsec_nanos(),
            len,
        }
    }

    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(metadata.modified()?, metadata.len()))
    }

    fn modified(&self) -> (u64, u32) {
        (self.modified_secs, self.modified_nanos)
    }
}

/// A cache built from `recorded` may serve a source now at `live` only if the
/// recorded timestamp is not older than the live one and the size still agrees.
pub fn cache_is_fresh(recorded: SourceStamp, live: SourceStamp) -> bool {
    recorded.modified() >= live.modified() && recorded.len == live.len
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    format_version: u32,
    source: SourceStamp,
    dictionary: Dictionary,
}

/// Which path `DictionaryStore::load` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPath {
    /// No source existed; the sample was written out along with its cache.
    CreatedSample,
    /// The cache was fresh and decoded cleanly.
    Cache,
    /// The source was parsed. `cache_written` is false if refreshing the
    /// cache failed; the parsed snapshot is still used.
    Parsed { cache_written: bool },
}

pub struct DictionaryStore {
    source_path: PathBuf,
    cache_path: PathBuf,
    snapshot: Arc<Dictionary>,
}

impl DictionaryStore {
    /// Creates a store with an empty snapshot. Call [`load`](Self::load) to fill it.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let mut cache_name = source_path.clone().into_os_string();
        cache_name.push(CACHE_SUFFIX);
        Self {
            source_path,
            cache_path: PathBuf::from(cache_name),
            snapshot: Arc::new(Dictionary::new()),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// The current snapshot. Holders keep seeing it unchanged after a reload.
    pub fn snapshot(&self) -> Arc<Dictionary> {
        Arc::clone(&self.snapshot)
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.snapshot
    }

    /// Loads (or reloads) the snapshot, replacing the previous one wholesale.
    /// On error the previous snapshot is kept.
    pub fn load(&mut self) -> Result<LoadPath> {
        let (dictionary, path) = self.read_snapshot()?;
        info!(
            entries = dictionary.len(),
            path = ?path,
            source = %self.source_path.display(),
            "dictionary loaded"
        );
        self.snapshot = Arc::new(dictionary);
        Ok(path)
    }

    fn read_snapshot(&self) -> Result<(Dictionary, LoadPath)> {
        let live = match SourceStamp::of(&self.source_path) {
            Ok(stamp) => stamp,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.create_sample(),
            Err(e) => return Err(ImeError::source_error(&self.source_path, e)),
        };

        match self.read_cache(live) {
            Ok(dictionary) => return Ok((dictionary, LoadPath::Cache)),
            Err(reason) => debug!(%reason, "dictionary cache not used"),
        }

        self.parse_and_cache(live)
    }

    fn read_cache(&self, live: SourceStamp) -> Result<Dictionary> {
        let cache: CacheFile = load_bincode(&self.cache_path)
            .map_err(|e| ImeError::CacheCorruption(e.to_string()))?;
        if cache.format_version != CACHE_FORMAT_VERSION {
            return Err(ImeError::CacheCorruption(format!(
                "format version {} (expected {})",
                cache.format_version, CACHE_FORMAT_VERSION
            )));
        }
        if !cache_is_fresh(cache.source, live) {
            return Err(ImeError::CacheCorruption("stale".to_string()));
        }
        Ok(cache.dictionary)
    }

    fn parse_and_cache(&self, live: SourceStamp) -> Result<(Dictionary, LoadPath)> {
        info!(source = %self.source_path.display(), "parsing dictionary source");
        let text = fs::read_to_string(&self.source_path)
            .map_err(|e| ImeError::source_error(&self.source_path, e))?;
        let dictionary = Dictionary::parse(&text);
        let cache_written = self.write_cache(live, &dictionary);
        Ok((dictionary, LoadPath::Parsed { cache_written }))
    }

    fn create_sample(&self) -> Result<(Dictionary, LoadPath)> {
        let dictionary = sample_dictionary();
        write_atomic(&self.source_path, |writer| dictionary.write_source(writer))
            .map_err(|e| ImeError::source_error(&self.source_path, e))?;
        info!(source = %self.source_path.display(), "created sample dictionary");

        let stamp = SourceStamp::of(&self.source_path)
            .map_err(|e| ImeError::source_error(&self.source_path, e))?;
        self.write_cache(stamp, &dictionary);
        Ok((dictionary, LoadPath::CreatedSample))
    }

    /// Cache write failures are reported but never fatal.
    fn write_cache(&self, source: SourceStamp, dictionary: &Dictionary) -> bool {
        let cache = CacheFile {
            format_version: CACHE_FORMAT_VERSION,
            source,
            dictionary: dictionary.clone(),
        };
        match save_bincode(&cache, &self.cache_path) {
            Ok(()) => true,
            Err(e) => {
                warn!(cache = %self.cache_path.display(), error = %e, "failed to write dictionary cache");
                false
            }
        }
    }
}
