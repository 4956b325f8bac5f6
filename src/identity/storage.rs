use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Client-side key/value storage for the cached identifier.
///
/// Any operation may fail (privacy modes, quota eviction, unwritable files);
/// callers decide how to degrade.
pub trait IdentityStorage: Send + Sync {
    // ---
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Can be switched into a failing mode to emulate a
/// browser with storage disabled.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    // ---
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    accesses: AtomicUsize,
}

impl MemoryStorage {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        // ---
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of get/set/remove calls made so far, failed ones included.
    pub fn accesses(&self) -> usize {
        // ---
        self.accesses.load(Ordering::SeqCst)
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        // ---
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("storage is unavailable");
        }
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl IdentityStorage for MemoryStorage {
    // ---
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Persistent storage backed by a small JSON object on disk.
///
/// The whole file is rewritten on every change through a sibling temp file
/// and a rename, so a crash never leaves a half-written map behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    // ---
    path: PathBuf,
}

impl FileStorage {
    // ---
    pub fn new(path: impl Into<PathBuf>) -> Self {
        // ---
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        // ---
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        // ---
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt identity store {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read identity store {}", self.path.display())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        // ---
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

impl IdentityStorage for FileStorage {
    // ---
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // ---
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        // ---
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
