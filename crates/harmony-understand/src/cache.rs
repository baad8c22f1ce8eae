//! Bounded, time-expiring memoization of analysis results.
//!
//! Keyed by a normalized fingerprint of the request. LRU eviction on
//! overflow, expiry check on access, exclusive mutation behind a Mutex.
//! Cache trouble is never allowed to surface: a poisoned lock is reclaimed
//! and the entry recomputed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chord_symbol::Note;
use tracing::debug;

use crate::types::{AnalysisOptions, MultipleInterpretationResult};

pub const DEFAULT_CAPACITY: usize = 500;
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct Entry {
    result: MultipleInterpretationResult,
    inserted: Instant,
    last_used: Instant,
}

pub struct AnalysisCache {
    entries: Mutex<HashMap<String, Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        AnalysisCache::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl AnalysisCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        AnalysisCache {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<MultipleInterpretationResult> {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.inserted.elapsed() <= self.ttl => {
                entry.last_used = Instant::now();
                Some(entry.result.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!(key, "evicted expired cache entry");
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, result: MultipleInterpretationResult) {
        let mut entries = self.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            // Evict the least recently used entry.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
                debug!(key = oldest.as_str(), "evicted LRU cache entry");
            }
        }
        let now = Instant::now();
        entries.insert(
            key,
            Entry {
                result,
                inserted: now,
                last_used: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock leaves entries intact; reclaim and
        // keep serving rather than propagate.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fingerprint of a request: chord symbols with flat-preferred roots,
/// normalized key, and the options that shape the result.
pub fn fingerprint(chords: &[String], options: &AnalysisOptions, with_suggestions: bool) -> String {
    let chords: Vec<String> = chords.iter().map(|c| normalize_symbol(c)).collect();
    let key = options
        .parent_key
        .as_deref()
        .and_then(|k| chord_symbol::Key::parse(k).ok())
        .map(|k| k.normalized().to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{:?}|{:.3}|{}|{}",
        chords.join(" "),
        key,
        options.pedagogical_level,
        options.effective_threshold(),
        options.effective_max_alternatives(),
        with_suggestions,
    )
}

/// Normalize one chord token: trim, fold Unicode accidentals, respell the
/// root (and any slash bass) flat-preferred so enharmonic requests share a
/// cache slot.
fn normalize_symbol(symbol: &str) -> String {
    let trimmed: String = symbol.trim().replace('♯', "#").replace('♭', "b");
    trimmed
        .split('/')
        .map(normalize_root_part)
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_root_part(part: &str) -> String {
    let bytes = part.as_bytes();
    let root_len = if bytes.len() >= 2 && matches!(bytes[1], b'#' | b'b') {
        2
    } else {
        1
    };
    if !part.is_char_boundary(root_len) || part.is_empty() {
        return part.to_string();
    }
    let (root, rest) = part.split_at(root_len);
    match Note::parse(root) {
        Ok(note) => format!("{}{}", Note::from_pitch_class(note.pitch_class()), rest),
        Err(_) => part.to_string(),
    }
}
