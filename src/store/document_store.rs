use std::{path::Path, time::Duration};

use tracing::{debug, error, info};

use crate::utils::clock::Clock;

use super::{
    backend::DocumentBackend,
    entities::{next_id, Checkin, Document, FileRecord, NewCheckin, NewTask, Task, User},
    error::{RegisterError, StoreError},
    registration::{FileRegistrar, DEFAULT_REGISTRATION_DELAY},
    repository::CheckinRepository,
};

/// Key the document is stored under.
pub const DOCUMENT_KEY: &str = "checkinApp";

pub const DEFAULT_USER_ID: &str = "user1";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Author of every check-in created through the store.
    pub user_id: String,
    pub registration_delay: Duration,
    /// Upper bound for a single file registration. `None` waits indefinitely.
    pub registration_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.into(),
            registration_delay: DEFAULT_REGISTRATION_DELAY,
            registration_timeout: None,
        }
    }
}

/// The main realization of [CheckinRepository]. All state lives in one [Document]; every
/// mutation reads the whole document, changes one collection and writes the whole document
/// back. Concurrent writers aren't isolated from each other, the last write wins.
pub struct DocumentStore<B: DocumentBackend> {
    backend: B,
    user_id: String,
    registrar: FileRegistrar,
    clock: Box<dyn Clock>,
}

impl<B: DocumentBackend> DocumentStore<B> {
    pub fn new(backend: B, config: StoreConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            user_id: config.user_id,
            registrar: FileRegistrar::new(config.registration_delay, config.registration_timeout),
            clock,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the full document. Missing and unparsable documents are errors, the store never
    /// substitutes an empty document for them.
    pub async fn document(&self) -> Result<Document, StoreError> {
        let Some(raw) = self.backend.get(DOCUMENT_KEY).await? else {
            error!("Document {DOCUMENT_KEY} is missing");
            return Err(StoreError::Missing);
        };
        serde_json::from_str(&raw).map_err(|e| {
            error!("Document {DOCUMENT_KEY} can't be parsed: {e}");
            StoreError::Corrupt(e)
        })
    }

    /// Overwrites the full document.
    pub async fn save_document(&self, document: &Document) -> Result<(), StoreError> {
        let raw = serde_json::to_string(document).map_err(|e| StoreError::Backend(e.into()))?;
        self.backend.set(DOCUMENT_KEY, raw).await?;
        debug!(
            "Saved document with {} tasks and {} check-ins",
            document.tasks.len(),
            document.checkins.len()
        );
        Ok(())
    }
}

impl<B: DocumentBackend> CheckinRepository for DocumentStore<B> {
    async fn initialize(&self) -> Result<(), StoreError> {
        if self.backend.get(DOCUMENT_KEY).await?.is_some() {
            debug!("Document already present, skipping seeding");
            return Ok(());
        }
        info!("Seeding new document");
        self.save_document(&Document::seed(self.clock.time())).await
    }

    fn local_user_id(&self) -> &str {
        &self.user_id
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.document().await?.tasks)
    }

    async fn add_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut document = self.document().await?;
        let now = self.clock.time();
        let task = Task {
            id: next_id(now, document.tasks.iter().map(|v| v.id.as_str())),
            title: task.title,
            description: task.description,
            deadline: task.deadline,
            max_participants: task.max_participants,
            created_at: now,
        };
        document.tasks.push(task.clone());
        self.save_document(&document).await?;
        info!("Added task {} \"{}\"", task.id, task.title);
        Ok(task)
    }

    async fn list_checkins(&self) -> Result<Vec<Checkin>, StoreError> {
        Ok(self.document().await?.checkins)
    }

    async fn add_checkin(&self, checkin: NewCheckin) -> Result<Checkin, StoreError> {
        let mut document = self.document().await?;
        let now = self.clock.time();
        let checkin = Checkin {
            id: next_id(now, document.checkins.iter().map(|v| v.id.as_str())),
            task_id: checkin.task_id,
            task_title: checkin.task_title,
            files: checkin.files,
            notes: checkin.notes,
            created_at: now,
            user_id: self.user_id.clone(),
        };
        document.checkins.push(checkin.clone());
        self.save_document(&document).await?;
        info!("Added check-in {} for task {}", checkin.id, checkin.task_id);
        Ok(checkin)
    }

    async fn list_checkins_for_user(&self, user_id: &str) -> Result<Vec<Checkin>, StoreError> {
        let mut checkins = self.list_checkins().await?;
        checkins.retain(|v| v.user_id == user_id);
        Ok(checkins)
    }

    async fn list_checkins_for_others(&self) -> Result<Vec<Checkin>, StoreError> {
        let mut checkins = self.list_checkins().await?;
        checkins.retain(|v| v.user_id != self.user_id);
        Ok(checkins)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.document().await?.users)
    }

    async fn register_file(&self, path: &Path) -> Result<FileRecord, RegisterError> {
        self.registrar.register(self.clock.as_ref(), path).await
    }
}
