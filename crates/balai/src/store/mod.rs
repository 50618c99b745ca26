//! Flat-file storage for balai.
//!
//! Each collection lives in its own JSON file holding an array of records.
//! Every read parses the whole file and every write replaces it, so there is
//! no index and no partial update. A per-collection lock serializes
//! read-modify-write cycles within the process, and writes land through a
//! temporary file plus rename so a crash never leaves half a collection.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::model::{Complaint, NewsItem, Timestamped};

/// The two collections the site keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    /// Published news items.
    News,
    /// Citizen complaints.
    Complaints,
}

impl CollectionName {
    /// Every collection, in bootstrap order.
    pub const ALL: [Self; 2] = [Self::News, Self::Complaints];

    /// File name of the collection inside the data directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::News => "news.json",
            Self::Complaints => "complaints.json",
        }
    }

    /// Short name used in logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Complaints => "complaints",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One JSON-array file of records of type `T`.
pub struct Collection<T> {
    name: CollectionName,
    path: PathBuf,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    fn new(name: CollectionName, data_dir: &Path) -> Self {
        Self {
            name,
            path: data_dir.join(name.file_name()),
            lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    /// Path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an empty array if it does not exist.
    ///
    /// Returns `true` if the file was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn ensure(&self) -> Result<bool> {
        let _guard = self.guard()?;
        if self.path.exists() {
            return Ok(false);
        }
        self.write_unlocked(&[])?;
        info!("Initialized empty {} collection at {}", self.name, self.path.display());
        Ok(true)
    }

    /// Load every record in file order.
    ///
    /// A missing file reads as an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptCollection`] if the file is not a JSON array of
    /// records, or [`Error::Io`] if it cannot be read.
    pub fn read(&self) -> Result<Vec<T>> {
        let _guard = self.guard()?;
        self.read_unlocked()
    }

    /// Replace the whole collection with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file replacement fails.
    pub fn write(&self, records: &[T]) -> Result<()> {
        let _guard = self.guard()?;
        self.write_unlocked(records)
    }

    /// Read, modify and write back the collection under its lock.
    ///
    /// `f` gets the full record list. Returning `None` means nothing changed:
    /// the file is left alone and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the collection fails.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Option<R>) -> Result<Option<R>> {
        let _guard = self.guard()?;
        let mut records = self.read_unlocked()?;
        let Some(outcome) = f(&mut records) else {
            return Ok(None);
        };
        self.write_unlocked(&records)?;
        Ok(Some(outcome))
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| Error::LockPoisoned {
            name: self.name.as_str(),
        })
    }

    fn read_unlocked(&self) -> Result<Vec<T>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} collection file missing, reading as empty", self.name);
                return Ok(Vec::new());
            }
            Err(err) => return Err(Error::Io(err)),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text).map_err(|source| {
            error!(
                "Collection file {} could not be parsed: {}",
                self.path.display(),
                source
            );
            Error::CorruptCollection {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn write_unlocked(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, json).map_err(|source| Error::CollectionWrite {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| Error::CollectionWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// The site's data directory: one news and one complaints collection.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    news: Collection<NewsItem>,
    complaints: Collection<Complaint>,
}

impl Store {
    /// Point a store at `data_dir` without touching the file system.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            news: Collection::new(CollectionName::News, &data_dir),
            complaints: Collection::new(CollectionName::Complaints, &data_dir),
            data_dir,
        }
    }

    /// Open a store, creating the data directory and empty collection files
    /// if they are missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or files cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(data_dir);
        store.ensure_collections()?;
        Ok(store)
    }

    /// Create the data directory and any missing collection file. Existing
    /// files are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be created.
    pub fn ensure_collections(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).map_err(|source| Error::DirectoryCreate {
                path: self.data_dir.clone(),
                source,
            })?;
        }
        self.news.ensure()?;
        self.complaints.ensure()?;
        Ok(())
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The news collection.
    #[must_use]
    pub fn news(&self) -> &Collection<NewsItem> {
        &self.news
    }

    /// The complaints collection.
    #[must_use]
    pub fn complaints(&self) -> &Collection<Complaint> {
        &self.complaints
    }

    /// Summarize both collections.
    ///
    /// # Errors
    ///
    /// Returns an error if either collection cannot be read.
    pub fn stats(&self) -> Result<StoreStats> {
        let news = self.news.read()?;
        let complaints = self.complaints.read()?;

        let mut complaints_by_status = BTreeMap::new();
        for complaint in &complaints {
            *complaints_by_status
                .entry(complaint.status.clone())
                .or_insert(0) += 1;
        }

        Ok(StoreStats {
            data_dir: self.data_dir.clone(),
            news_count: news.len(),
            complaint_count: complaints.len(),
            complaints_by_status,
            newest_news: newest(&news),
            newest_complaint: newest(&complaints),
        })
    }
}

fn newest<T: Timestamped>(records: &[T]) -> Option<DateTime<Utc>> {
    records.iter().filter_map(Timestamped::created_at).max()
}

/// Statistics about the stored collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Directory holding the collection files.
    pub data_dir: PathBuf,
    /// Number of news items.
    pub news_count: usize,
    /// Number of complaints.
    pub complaint_count: usize,
    /// Complaint counts keyed by status.
    pub complaints_by_status: BTreeMap<String, usize>,
    /// Creation time of the newest news item.
    pub newest_news: Option<DateTime<Utc>>,
    /// Creation time of the newest complaint.
    pub newest_complaint: Option<DateTime<Utc>>,
}
