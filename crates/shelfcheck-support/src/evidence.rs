//! Evidence recorded while a check runs: step text, request/response bodies
//! and screenshots.

use crate::Result;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Content of one evidence item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceBody {
    Text {
        text: String,
    },
    Bytes {
        mime: String,
        #[serde(serialize_with = "as_base64")]
        data: Vec<u8>,
    },
}

fn as_base64<T, S>(data: &T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data.as_ref()))
}

/// A named piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub name: String,
    pub body: EvidenceBody,
    pub recorded_at: DateTime<Utc>,
}

impl Evidence {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: EvidenceBody::Text { text: text.into() },
            recorded_at: Utc::now(),
        }
    }

    pub fn bytes(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            body: EvidenceBody::Bytes {
                mime: mime.into(),
                data,
            },
            recorded_at: Utc::now(),
        }
    }

    /// Text content, if this is a text item.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            EvidenceBody::Text { text } => Some(text),
            EvidenceBody::Bytes { .. } => None,
        }
    }

    fn extension(&self) -> &'static str {
        match &self.body {
            EvidenceBody::Text { .. } => "txt",
            EvidenceBody::Bytes { mime, .. } => match mime.as_str() {
                "image/png" => "png",
                "image/jpeg" => "jpg",
                "application/json" => "json",
                _ => "bin",
            },
        }
    }

    fn size(&self) -> usize {
        match &self.body {
            EvidenceBody::Text { text } => text.len(),
            EvidenceBody::Bytes { data, .. } => data.len(),
        }
    }
}

/// Destination for evidence produced by a check.
pub trait EvidenceSink: Send + Sync {
    /// Store one evidence item.
    fn record(&self, evidence: Evidence) -> Result<()>;

    fn attach_text(&self, name: &str, text: &str) -> Result<()> {
        self.record(Evidence::text(name, text))
    }

    fn attach_bytes(&self, name: &str, mime: &str, data: Vec<u8>) -> Result<()> {
        self.record(Evidence::bytes(name, mime, data))
    }

    fn attach_screenshot(&self, name: &str, png: Vec<u8>) -> Result<()> {
        self.attach_bytes(name, "image/png", png)
    }

    /// Mark the start of a test case. Recording failures are only logged.
    fn begin_test(&self, name: &str) {
        info!("==== {} ====", name);
        if let Err(e) = self.attach_text("test started", name) {
            debug!("could not record test banner: {}", e);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps evidence in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    items: Mutex<Vec<Evidence>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything recorded so far.
    pub fn items(&self) -> Vec<Evidence> {
        lock(&self.items).clone()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.items).iter().map(|e| e.name.clone()).collect()
    }

    /// Last item recorded under `name`.
    pub fn find(&self, name: &str) -> Option<Evidence> {
        lock(&self.items)
            .iter()
            .rev()
            .find(|e| e.name == name)
            .cloned()
    }

    /// Pretty JSON dump; binary bodies are base64 encoded.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*lock(&self.items))?)
    }
}

impl EvidenceSink for MemorySink {
    fn record(&self, evidence: Evidence) -> Result<()> {
        debug!("evidence: {} ({} bytes)", evidence.name, evidence.size());
        lock(&self.items).push(evidence);
        Ok(())
    }
}

/// Drops everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EvidenceSink for NullSink {
    fn record(&self, evidence: Evidence) -> Result<()> {
        debug!("evidence discarded: {}", evidence.name);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ManifestEntry {
    name: String,
    file: String,
    recorded_at: DateTime<Utc>,
}

/// Writes each item as a numbered file plus an `index.json` manifest.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    counter: AtomicUsize,
    manifest: Mutex<Vec<ManifestEntry>>,
}

impl DirectorySink {
    /// Create the directory if needed and start an empty manifest.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!("Recording evidence to: {}", dir.display());
        Ok(Self {
            dir,
            counter: AtomicUsize::new(0),
            manifest: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

impl EvidenceSink for DirectorySink {
    fn record(&self, evidence: Evidence) -> Result<()> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let file = format!("{:03}-{}.{}", n, slug(&evidence.name), evidence.extension());
        let path = self.dir.join(&file);
        match &evidence.body {
            EvidenceBody::Text { text } => std::fs::write(&path, text)?,
            EvidenceBody::Bytes { data, .. } => std::fs::write(&path, data)?,
        }
        debug!("evidence: {} -> {}", evidence.name, path.display());

        let mut manifest = lock(&self.manifest);
        manifest.push(ManifestEntry {
            name: evidence.name,
            file,
            recorded_at: evidence.recorded_at,
        });
        let index = serde_json::to_string_pretty(&*manifest)?;
        std::fs::write(self.dir.join("index.json"), index)?;
        Ok(())
    }
}
