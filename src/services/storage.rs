use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use crate::models::Recipient;

/// Recent recipients, most recent first, persisted as one JSON file.
/// Recording an address moves it to the front; the list is capped.
pub struct RecipientStore {
    path: Option<PathBuf>,
    max_entries: usize,
    entries: Mutex<Vec<Recipient>>,
    /// Serializes file writes; the entries lock is never held across I/O
    write_gate: tokio::sync::Mutex<()>,
}

impl RecipientStore {
    /// Loads `<data_dir>/recipients.json` if present. A missing or corrupt
    /// file starts an empty history.
    pub fn open(data_dir: &Path, max_entries: usize) -> Self {
        if let Err(e) = fs::create_dir_all(data_dir) {
            tracing::warn!("cannot create {}: {}", data_dir.display(), e);
        }
        let path = data_dir.join("recipients.json");
        let entries: Vec<Recipient> = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file)).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self::with_entries(Some(path), max_entries, entries)
    }

    /// History kept only for the process lifetime
    pub fn in_memory(max_entries: usize) -> Self {
        Self::with_entries(None, max_entries, Vec::new())
    }

    fn with_entries(path: Option<PathBuf>, max_entries: usize, entries: Vec<Recipient>) -> Self {
        Self {
            path,
            max_entries,
            entries: Mutex::new(entries),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn list(&self) -> Vec<Recipient> {
        self.entries.lock().clone()
    }

    /// Call after a successful send
    pub async fn record(&self, address: &str, label: Option<&str>) -> Vec<Recipient> {
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.retain(|r| !r.matches(address));
            entries.insert(0, Recipient::new(address, label));
            entries.truncate(self.max_entries);
            entries.clone()
        };
        self.persist().await;
        snapshot
    }

    pub async fn remove(&self, address: &str) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|r| !r.matches(address));
            entries.len() != before
        };
        if removed {
            self.persist().await;
        }
        removed
    }

    /// Writes the current list on the blocking pool. The snapshot is taken
    /// under the write gate so the last write always carries the newest list.
    async fn persist(&self) {
        let Some(path) = self.path.clone() else { return };
        let _gate = self.write_gate.lock().await;
        let entries = self.list();
        let count = entries.len();
        let target = path.clone();
        match tokio::task::spawn_blocking(move || write_json(&target, &entries)).await {
            Ok(Ok(())) => tracing::debug!("💾 Saved {} recipients -> {}", count, path.display()),
            Ok(Err(e)) => tracing::warn!("failed to write {}: {}", path.display(), e),
            Err(e) => tracing::warn!("recipient save task failed: {}", e),
        }
    }
}

fn write_json(path: &Path, entries: &[Recipient]) -> std::io::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), entries)?;
    Ok(())
}
