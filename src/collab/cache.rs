//! File cache for collaborator answers.
//!
//! One JSON file per answer under `cache_dir`, keyed by a sha256 of
//! `kind:input`. Entries older than the TTL are ignored (and overwritten on
//! the next successful call). Writes go through a temp file + rename so a
//! crashed process never leaves half a JSON behind.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CollaboratorError, TextOrientationAnalyzer, TextOrientationReport};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    kind: String,
    value: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AnswerCache {
    dir: PathBuf,
    ttl: Duration,
}

impl AnswerCache {
    pub fn new(dir: PathBuf, ttl_days: i64) -> Self {
        let _ = fs::create_dir_all(&dir); // best-effort
        Self {
            dir,
            ttl: Duration::days(ttl_days.max(0)),
        }
    }

    pub fn key(kind: &str, input: &str) -> String {
        let mut h = Sha256::new();
        h.update(kind.as_bytes());
        h.update(b":");
        h.update(input.as_bytes());
        h.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Fresh cached answer, if any. Unreadable or expired entries are misses.
    pub fn get<T: DeserializeOwned>(&self, kind: &str, input: &str) -> Option<T> {
        self.get_at(kind, input, Utc::now())
    }

    fn get_at<T: DeserializeOwned>(&self, kind: &str, input: &str, now: DateTime<Utc>) -> Option<T> {
        let raw = fs::read_to_string(self.path(&Self::key(kind, input))).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        if entry.kind != kind || now - entry.cached_at > self.ttl {
            return None;
        }
        serde_json::from_value(entry.value).ok()
    }

    pub fn put<T: Serialize>(&self, kind: &str, input: &str, value: &T) -> io::Result<()> {
        self.put_at(kind, input, value, Utc::now())
    }

    fn put_at<T: Serialize>(&self, kind: &str, input: &str, value: &T, at: DateTime<Utc>) -> io::Result<()> {
        let entry = CacheEntry {
            cached_at: at,
            kind: kind.to_string(),
            value: serde_json::to_value(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        };
        let json = serde_json::to_string(&entry).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::create_dir_all(&self.dir)?;
        let path = self.path(&Self::key(kind, input));
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// Wraps a text analyzer with the answer cache. Only available reports are
/// stored; failures and `available = false` always reach the inner analyzer
/// on the next call.
pub struct CachedTextAnalyzer<A: TextOrientationAnalyzer> {
    inner: A,
    cache: AnswerCache,
}

impl<A: TextOrientationAnalyzer> CachedTextAnalyzer<A> {
    pub fn new(inner: A, cache: AnswerCache) -> Self {
        Self { inner, cache }
    }
}

const TEXT_KIND: &str = "text";

fn text_input(description: &str, characteristics: &str, floor_text: &str) -> String {
    format!("{description}\n--\n{characteristics}\n--\n{floor_text}")
}

#[async_trait]
impl<A: TextOrientationAnalyzer> TextOrientationAnalyzer for CachedTextAnalyzer<A> {
    async fn analyze(
        &self,
        description: &str,
        characteristics: &str,
        floor_text: &str,
    ) -> Result<TextOrientationReport, CollaboratorError> {
        let input = text_input(description, characteristics, floor_text);
        if let Some(hit) = self.cache.get::<TextOrientationReport>(TEXT_KIND, &input) {
            tracing::debug!(target: "exposition", provider = self.inner.name(), "text cache hit");
            return Ok(hit);
        }

        let fresh = self.inner.analyze(description, characteristics, floor_text).await?;
        if fresh.available {
            if let Err(e) = self.cache.put(TEXT_KIND, &input, &fresh) {
                tracing::warn!(target: "exposition", error = %e, "text cache write failed");
            }
        }
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
