use std::{future::Future, path::Path};

use super::{
    entities::{Checkin, FileRecord, NewCheckin, NewTask, Task, User},
    error::{RegisterError, StoreError},
};

/// Interface for abstracting storage of tasks and check-ins. Callers only see entity level
/// operations, so the whole-document layout of
/// [DocumentStore](super::document_store::DocumentStore) can be replaced with per-entity storage
/// without touching them.
pub trait CheckinRepository {
    /// Prepares storage for use. Must be safe to call on every start and must never overwrite
    /// existing data.
    fn initialize(&self) -> impl Future<Output = Result<(), StoreError>>;

    /// Identity every locally created check-in is attributed to.
    fn local_user_id(&self) -> &str;

    /// Tasks in the order they were published.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>>;

    fn add_task(&self, task: NewTask) -> impl Future<Output = Result<Task, StoreError>>;

    fn list_checkins(&self) -> impl Future<Output = Result<Vec<Checkin>, StoreError>>;

    fn add_checkin(
        &self,
        checkin: NewCheckin,
    ) -> impl Future<Output = Result<Checkin, StoreError>>;

    fn list_checkins_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Checkin>, StoreError>>;

    /// Check-ins of everyone except the local user.
    fn list_checkins_for_others(&self) -> impl Future<Output = Result<Vec<Checkin>, StoreError>>;

    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, StoreError>>;

    /// Turns a local file into a [FileRecord] that can be attached to a check-in.
    fn register_file(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<FileRecord, RegisterError>>;
}
