use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;

use super::{
    blocking_events, sort_by_start, EventStore, Insertion, ListFilter, StoreResult, WindowQuery,
};
use crate::checker::ResourceScope;
use crate::error::StoreError;
use crate::event::{CommittedEvent, EventId, EventStatus};

/// Event store persisted as a JSON array in a single file.
///
/// Every operation re-reads the file. Readers hold a shared advisory lock on
/// a sidecar `<file>.lock`, writers an exclusive one for the whole
/// read-validate-write cycle, so separate processes pointed at the same file
/// cannot double-book. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<CommittedEvent>) -> StoreResult<T> + Send + 'static,
    {
        let store = self.clone();
        run_blocking(move || {
            let lock = store.open_lock()?;
            FileExt::lock_shared(&lock)?;
            let events = read_events(&store.path)?;
            op(events)
        })
        .await
    }

    async fn write<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<CommittedEvent>) -> StoreResult<(T, bool)> + Send + 'static,
    {
        let store = self.clone();
        run_blocking(move || {
            let lock = store.open_lock()?;
            FileExt::lock_exclusive(&lock)?;
            let mut events = read_events(&store.path)?;
            let (outcome, dirty) = op(&mut events)?;
            if dirty {
                write_events(&store.path, &events)?;
            }
            Ok(outcome)
        })
        .await
    }

    fn open_lock(&self) -> StoreResult<File> {
        if let Some(parent) = self.lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?)
    }
}

async fn run_blocking<T, F>(f: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("store worker failed: {}", e)))?
}

fn read_events(path: &Path) -> StoreResult<Vec<CommittedEvent>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))
}

fn write_events(path: &Path, events: &[CommittedEvent]) -> StoreResult<()> {
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let json = serde_json::to_string_pretty(events)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl EventStore for JsonFileStore {
    async fn candidates(&self, query: &WindowQuery) -> StoreResult<Vec<CommittedEvent>> {
        let query = query.clone();
        self.read(move |events| {
            let mut found: Vec<CommittedEvent> =
                events.into_iter().filter(|e| query.matches(e)).collect();
            sort_by_start(&mut found);
            Ok(found)
        })
        .await
    }

    async fn insert_if_clear(
        &self,
        event: CommittedEvent,
        scope: ResourceScope,
    ) -> StoreResult<Insertion> {
        self.write(move |events| {
            let blocking = blocking_events(events.iter(), &event, scope);
            if !blocking.is_empty() {
                return Ok((Insertion::Rejected(blocking), false));
            }
            events.push(event.clone());
            Ok((Insertion::Inserted(event), true))
        })
        .await
    }

    async fn get(&self, id: &EventId) -> StoreResult<Option<CommittedEvent>> {
        let id = id.clone();
        self.read(move |events| Ok(events.into_iter().find(|e| e.id == id)))
            .await
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<CommittedEvent>> {
        let filter = filter.clone();
        self.read(move |events| {
            let mut found: Vec<CommittedEvent> =
                events.into_iter().filter(|e| filter.matches(e)).collect();
            sort_by_start(&mut found);
            Ok(found)
        })
        .await
    }

    async fn cancel(&self, id: &EventId) -> StoreResult<CommittedEvent> {
        let id = id.clone();
        self.write(move |events| {
            let event = events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if event.status == EventStatus::Cancelled {
                return Ok((event.clone(), false));
            }
            event.status = EventStatus::Cancelled;
            event.updated_at = Utc::now();
            Ok((event.clone(), true))
        })
        .await
    }
}
