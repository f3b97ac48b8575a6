use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::MarkStore;
use crate::error::{JudgeError, Result};
use crate::marks::{
    EditRequest, EditRequestStatus, Event, MarkRecord, NewEditRequest, NewMarkRecord,
    PerformanceTier, Student,
};

const STATE_VERSION: u32 = 1;

/// Get the default local store path (<config dir>/judge-desk/marks.json)
pub fn get_store_path() -> PathBuf {
    crate::config::get_config_dir().join("marks.json")
}

/// Everything the local store keeps, serialized as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub marks: Vec<MarkRecord>,
    #[serde(default)]
    pub edit_requests: Vec<EditRequest>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            students: Vec::new(),
            events: Vec::new(),
            marks: Vec::new(),
            edit_requests: Vec::new(),
        }
    }

    /// Load state from a JSON file; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let file = File::open(path)?;
        let state: StoreState = serde_json::from_reader(file)?;

        if state.version != STATE_VERSION {
            return Err(JudgeError::Store(format!(
                "unsupported store version {} in {}",
                state.version,
                path.display()
            )));
        }

        Ok(state)
    }

    /// Write state atomically so the file is never left half-written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = AtomicWriteFile::open(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.commit()?;
        Ok(())
    }

    fn latest_request(&self, mark_id: &str) -> Option<&EditRequest> {
        self.edit_requests
            .iter()
            .filter(|request| request.mark_id == mark_id)
            .max_by_key(|request| request.created_at)
    }
}

/// Mark store backed by a local JSON file, or by memory alone.
pub struct FileStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let state = StoreState::load(path)?;
        debug!(
            path = %path.display(),
            marks = state.marks.len(),
            requests = state.edit_requests.len(),
            "opened local store"
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self::with_state(StoreState::new())
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            path: None,
            state: Mutex::new(state),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        match &self.path {
            Some(path) => state.save(path),
            None => Ok(()),
        }
    }

    /// Apply a change and persist it, keeping memory unchanged if the write fails.
    fn mutate<T>(&self, change: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }
}

impl MarkStore for FileStore {
    async fn fetch_mark_record(
        &self,
        student_id: &str,
        event_id: &str,
        tier: PerformanceTier,
    ) -> Result<Option<MarkRecord>> {
        let state = self.lock();
        Ok(state
            .marks
            .iter()
            .find(|mark| {
                mark.student_id == student_id && mark.event_id == event_id && mark.tier == tier
            })
            .cloned())
    }

    async fn fetch_tier_records(&self, tier: PerformanceTier) -> Result<Vec<MarkRecord>> {
        let state = self.lock();
        Ok(state
            .marks
            .iter()
            .filter(|mark| mark.tier == tier)
            .cloned()
            .collect())
    }

    async fn save_mark_record(&self, payload: &NewMarkRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.mutate(|state| {
            state
                .marks
                .push(MarkRecord::from_new(id.clone(), payload.clone()));
            Ok(())
        })?;
        Ok(id)
    }

    async fn update_mark_record(&self, mark_id: &str, payload: &NewMarkRecord) -> Result<()> {
        self.mutate(|state| {
            let mark = state
                .marks
                .iter_mut()
                .find(|mark| mark.id == mark_id)
                .ok_or_else(|| JudgeError::NotFound(format!("mark record {}", mark_id)))?;
            *mark = MarkRecord::from_new(mark_id.to_string(), payload.clone());
            Ok(())
        })
    }

    async fn fetch_edit_request(&self, mark_id: &str) -> Result<Option<EditRequest>> {
        Ok(self.lock().latest_request(mark_id).cloned())
    }

    async fn create_edit_request(&self, payload: &NewEditRequest) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.mutate(|state| {
            state
                .edit_requests
                .push(EditRequest::from_new(id.clone(), payload.clone()));
            Ok(())
        })?;
        Ok(id)
    }

    async fn update_edit_request_status(
        &self,
        request_id: &str,
        status: EditRequestStatus,
    ) -> Result<()> {
        self.mutate(|state| {
            let request = state
                .edit_requests
                .iter_mut()
                .find(|request| request.id == request_id)
                .ok_or_else(|| JudgeError::NotFound(format!("edit request {}", request_id)))?;
            request.status = status;
            request.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    async fn list_edit_requests(
        &self,
        status: Option<EditRequestStatus>,
    ) -> Result<Vec<EditRequest>> {
        let state = self.lock();
        Ok(state
            .edit_requests
            .iter()
            .filter(|request| status.map_or(true, |wanted| request.status == wanted))
            .cloned()
            .collect())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(self.lock().students.clone())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(self.lock().events.clone())
    }
}
