//! Single-file JSON document store.
//!
//! The whole [`Document`] lives in one file. Every mutation reads the full
//! document, changes it in memory and writes it back through a uniquely
//! named sibling temp file that is fsynced and then renamed over the live
//! path, so readers only ever see a complete old or a complete new file.
//!
//! Mutations hold an in-process mutex across the whole read-modify-write,
//! so callers sharing one `JsonStore` never lose each other's updates.
//! Separate processes writing the same file are not coordinated.
//!
//! File layout:
//!
//! ```text
//! { "users": [...], ... }               plaintext (no key configured)
//! fintrack-enc:v1:<base64 token>        encrypted
//! <base64 token>                        encrypted, legacy (read only)
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::{fill_missing, Document, Settings, StructureReport};
use super::error::{Result, StoreError};
use super::record::Record;
use crate::crypto::DataCipher;

/// Marker that starts every encrypted data file.
pub const ENVELOPE_PREFIX: &str = "fintrack-enc:v1:";

/// Temp files younger than this may belong to a write in progress in
/// another process and are left alone by [`JsonStore::initialize`].
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Accept a plaintext file while a key is configured. The next write
    /// encrypts it.
    pub allow_plaintext: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            allow_plaintext: true,
        }
    }
}

/// How the data file is currently stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Plaintext,
    Encrypted,
    /// Bare token without the envelope marker.
    LegacyToken,
}

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    cipher: DataCipher,
    options: StoreOptions,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Creates a store handle. Nothing touches the disk until the first
    /// operation.
    pub fn new(path: impl Into<PathBuf>, cipher: DataCipher) -> Self {
        Self::with_options(path, cipher, StoreOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, cipher: DataCipher, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            cipher,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store handle and initializes the backing file.
    pub fn open(path: impl Into<PathBuf>, cipher: DataCipher, options: StoreOptions) -> Result<Self> {
        let store = Self::with_options(path, cipher, options);
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_enabled()
    }

    /// Creates the data file with an empty document if it does not exist.
    ///
    /// Returns `true` when a new file was written. An existing file is never
    /// touched. Temp files left behind by interrupted writes are removed
    /// once they are older than [`STALE_TEMP_AGE`].
    pub fn initialize(&self) -> Result<bool> {
        let _guard = self.lock();
        self.remove_stale_temp_files();

        match fs::metadata(&self.path) {
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&self.path, e)),
        }

        if !self.cipher.is_enabled() {
            warn!(
                path = %self.path.display(),
                "No encryption key configured, data will be stored in plaintext"
            );
        }

        self.persist(&Document::default())?;
        info!(path = %self.path.display(), "Created data file");
        Ok(true)
    }

    /// Reads and parses the full document.
    pub fn read(&self) -> Result<Document> {
        let value = self.read_value()?;
        serde_json::from_value(value).map_err(|e| {
            StoreError::CorruptData(format!("document does not match the expected layout: {}", e))
        })
    }

    /// Reads the decoded document as untyped JSON.
    pub fn read_value(&self) -> Result<Value> {
        Ok(self.read_raw()?.0)
    }

    /// Reports how the file is currently stored.
    pub fn stored_encoding(&self) -> Result<Encoding> {
        Ok(self.read_raw()?.1)
    }

    /// Replaces the whole document.
    pub fn write(&self, doc: &Document) -> Result<()> {
        let _guard = self.lock();
        self.persist(doc)
    }

    /// Read-modify-write under the store lock.
    ///
    /// The closure returns `Ok(None)` to signal that nothing changed, in
    /// which case nothing is written. An error aborts without writing.
    pub fn try_update_document<T, E>(
        &self,
        f: impl FnOnce(&mut Document) -> std::result::Result<Option<T>, E>,
    ) -> std::result::Result<Option<T>, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock();
        let mut doc = self.read()?;
        let outcome = f(&mut doc)?;
        if outcome.is_some() {
            self.persist(&doc)?;
        }
        Ok(outcome)
    }

    /// Infallible-closure form of [`JsonStore::try_update_document`].
    pub fn update_document<T>(&self, f: impl FnOnce(&mut Document) -> Option<T>) -> Result<Option<T>> {
        self.try_update_document(|doc| Ok::<_, StoreError>(f(doc)))
    }

    /// Returns the collection for `R`, empty if the file has none.
    pub fn get_table<R: Record>(&self) -> Result<Vec<R>> {
        let mut doc = self.read()?;
        Ok(std::mem::take(R::collection_mut(&mut doc)))
    }

    /// Replaces the whole collection for `R`.
    pub fn update_table<R: Record>(&self, items: Vec<R>) -> Result<()> {
        self.update_document(|doc| {
            *R::collection_mut(doc) = items;
            Some(())
        })?;
        debug!(table = %R::TABLE, "Replaced table");
        Ok(())
    }

    /// Appends a record and returns it unchanged.
    pub fn add_item<R: Record>(&self, item: R) -> Result<R> {
        self.update_document(|doc| {
            R::collection_mut(doc).push(item.clone());
            Some(())
        })?;
        debug!(table = %R::TABLE, id = item.id(), "Added record");
        Ok(item)
    }

    /// Applies `patch` to the record with `id`. Returns `None` and writes
    /// nothing when no such record exists.
    pub fn update_item<R: Record>(&self, id: &str, patch: R::Patch) -> Result<Option<R>> {
        let updated = self.update_document(|doc| {
            let record = R::collection_mut(doc).iter_mut().find(|r| r.id() == id)?;
            record.apply_patch(patch);
            Some(record.clone())
        })?;
        if updated.is_some() {
            debug!(table = %R::TABLE, id, "Updated record");
        }
        Ok(updated)
    }

    /// Removes the first record with `id` and returns it.
    pub fn delete_item<R: Record>(&self, id: &str) -> Result<Option<R>> {
        let removed = self.update_document(|doc| {
            let items = R::collection_mut(doc);
            let index = items.iter().position(|r| r.id() == id)?;
            Some(items.remove(index))
        })?;
        if removed.is_some() {
            debug!(table = %R::TABLE, id, "Deleted record");
        }
        Ok(removed)
    }

    pub fn find_by_id<R: Record>(&self, id: &str) -> Result<Option<R>> {
        self.find_one(|r: &R| r.id() == id)
    }

    pub fn find_one<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> Result<Option<R>> {
        let doc = self.read()?;
        Ok(R::collection(&doc).iter().find(|&r| predicate(r)).cloned())
    }

    pub fn find_all<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> Result<Vec<R>> {
        let doc = self.read()?;
        Ok(R::collection(&doc)
            .iter()
            .filter(|&r| predicate(r))
            .cloned()
            .collect())
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.read()?.settings)
    }

    /// Merges `patch` into the settings key by key. A `null` value removes
    /// the key. Returns the resulting settings.
    pub fn update_settings(&self, patch: Settings) -> Result<Settings> {
        let settings = self.update_document(|doc| {
            for (key, value) in patch {
                if value.is_null() {
                    doc.settings.remove(&key);
                } else {
                    doc.settings.insert(key, value);
                }
            }
            Some(doc.settings.clone())
        })?;
        Ok(settings.unwrap_or_default())
    }

    /// Reports which collections are present in the file as stored.
    pub fn check_structure(&self) -> Result<StructureReport> {
        StructureReport::inspect(&self.read_value()?)
    }

    /// Adds missing collections without touching anything else. Writes only
    /// when something was missing.
    pub fn repair_structure(&self) -> Result<StructureReport> {
        let _guard = self.lock();
        let mut root = self.read_value()?;
        let added = fill_missing(&mut root)?;

        if !added.is_empty() {
            self.persist(&root)?;
            info!(tables = ?added, "Added missing collections to data file");
        }

        let mut report = StructureReport::inspect(&root)?;
        report.repaired = !added.is_empty();
        Ok(report)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_raw(&self) -> Result<(Value, Encoding)> {
        let bytes = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| StoreError::CorruptData("data file is not valid UTF-8".into()))?;
        self.decode(&text)
    }

    fn decode(&self, text: &str) -> Result<(Value, Encoding)> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::CorruptData("data file is empty".into()));
        }

        if let Some(token) = text.strip_prefix(ENVELOPE_PREFIX) {
            let value = self.decrypt_json(token)?;
            return Ok((value, Encoding::Encrypted));
        }

        match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                if self.cipher.is_enabled() {
                    if !self.options.allow_plaintext {
                        return Err(StoreError::CorruptData(
                            "data file is plaintext but encryption is configured".into(),
                        ));
                    }
                    warn!(
                        path = %self.path.display(),
                        "Data file is plaintext while encryption is configured, it will be encrypted on the next write"
                    );
                }
                Ok((value, Encoding::Plaintext))
            }
            Err(e) if !self.cipher.is_enabled() => Err(StoreError::CorruptData(format!(
                "data file is not valid JSON: {}",
                e
            ))),
            Err(_) => {
                let value = self.decrypt_json(text)?;
                Ok((value, Encoding::LegacyToken))
            }
        }
    }

    fn decrypt_json(&self, token: &str) -> Result<Value> {
        let plaintext = self.cipher.decrypt(token)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| StoreError::CorruptData(format!("decrypted payload is not JSON: {}", e)))
    }

    fn encode<T: Serialize>(&self, doc: &T) -> Result<String> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::CorruptData(format!("failed to serialize document: {}", e)))?;
        if !self.cipher.is_enabled() {
            return Ok(json);
        }
        let token = self.cipher.encrypt(json.as_bytes())?;
        Ok(format!("{}{}", ENVELOPE_PREFIX, token))
    }

    /// Writes the encoded document to the live path. Caller holds the lock.
    fn persist<T: Serialize>(&self, doc: &T) -> Result<()> {
        let temp_path = self.stage(doc)?;
        self.commit(&temp_path)
    }

    /// Writes and fsyncs a fresh temp file next to the live file.
    fn stage<T: Serialize>(&self, doc: &T) -> Result<PathBuf> {
        let contents = self.encode(doc)?;

        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, contents.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::io(&temp_path, e));
        }
        Ok(temp_path)
    }

    /// Atomically replaces the live file with a staged temp file.
    fn commit(&self, temp_path: &Path) -> Result<()> {
        if let Err(e) = fs::rename(temp_path, &self.path) {
            let _ = fs::remove_file(temp_path);
            return Err(StoreError::io(&self.path, e));
        }
        Ok(())
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn temp_path(&self) -> PathBuf {
        let name = format!("{}.{}.tmp", self.file_name(), Uuid::new_v4().simple());
        self.path.with_file_name(name)
    }

    fn remove_stale_temp_files(&self) {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        let prefix = format!("{}.", self.file_name());
        let now = SystemTime::now();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) || !name.ends_with(".tmp") {
                continue;
            }

            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age >= STALE_TEMP_AGE) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => debug!(file = %name, "Removed stale temp file"),
                    Err(e) => warn!(file = %name, error = %e, "Failed to remove stale temp file"),
                }
            }
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
