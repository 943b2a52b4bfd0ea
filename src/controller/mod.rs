//! Session orchestration. [Controller] holds transient state (selected task, visible view,
//! last timer frame), validates user commands, forwards them to a
//! [CheckinRepository] and re-renders views after every mutation.

pub mod error;
pub mod forms;
pub mod render;

use std::path::PathBuf;

use error::{CommandError, ValidationError};
use forms::PublishForm;
use futures::{stream, StreamExt, TryStreamExt};
use render::{render_history, render_others, render_tasks, render_timer, RenderedViews};
use tracing::{debug, info, warn};

use crate::{
    store::{
        entities::{Checkin, NewCheckin, Task},
        error::StoreError,
        repository::CheckinRepository,
    },
    timer::machine::TimerFrame,
    utils::clock::Clock,
};

/// Sections of the application. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Timer,
    Checkin,
    Publish,
    Others,
}

pub struct Controller<R: CheckinRepository> {
    repository: R,
    view: View,
    selected_task: Option<Task>,
    timer_frame: TimerFrame,
    rendered: RenderedViews,
    clock: Box<dyn Clock>,
}

impl<R: CheckinRepository> Controller<R> {
    pub fn new(repository: R, timer_frame: TimerFrame, clock: Box<dyn Clock>) -> Self {
        Self {
            repository,
            view: View::default(),
            selected_task: None,
            timer_frame,
            rendered: RenderedViews::default(),
            clock,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Prepares storage and draws every view.
    pub async fn open(&mut self) -> Result<&RenderedViews, CommandError> {
        self.repository.initialize().await?;
        Ok(self.refresh().await?)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn switch_view(&mut self, view: View) {
        debug!("Switching view {:?} -> {view:?}", self.view);
        self.view = view;
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task.as_ref()
    }

    /// Selects a task, replacing any previous selection.
    pub async fn select_task(&mut self, task_id: &str) -> Result<&Task, CommandError> {
        let tasks = self.repository.list_tasks().await?;
        let task = tasks
            .iter()
            .find(|v| v.id == task_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownTask(task_id.into()))?;
        debug!("Selected task {}", task.id);
        self.rendered.tasks = render_tasks(&tasks, Some(task.id.as_str()));
        Ok(self.selected_task.insert(task))
    }

    pub fn clear_selection(&mut self) {
        self.selected_task = None;
    }

    pub async fn publish_task(&mut self, form: PublishForm) -> Result<Task, CommandError> {
        let task = form
            .validate(self.clock.time())
            .inspect_err(|e| warn!("Rejected task: {e}"))?;
        let task = self.repository.add_task(task).await?;
        info!("Published task {}", task.id);
        self.refresh().await?;
        Ok(task)
    }

    /// Registers `files` one by one and records a check-in for the selected task. The selection
    /// is cleared afterwards.
    pub async fn submit_checkin(
        &mut self,
        files: &[PathBuf],
        notes: String,
    ) -> Result<Checkin, CommandError> {
        let Some(task) = self.selected_task.as_ref() else {
            warn!("Rejected check-in without a task");
            return Err(ValidationError::NoTaskSelected.into());
        };
        if files.is_empty() {
            warn!("Rejected check-in without files");
            return Err(ValidationError::NoFiles.into());
        }

        let repository = &self.repository;
        let records = stream::iter(files)
            .then(|path| repository.register_file(path))
            .try_collect::<Vec<_>>()
            .await?;

        let checkin = self
            .repository
            .add_checkin(NewCheckin {
                task_id: task.id.clone(),
                task_title: task.title.clone(),
                files: records,
                notes,
            })
            .await?;
        info!("Checked in {} with {} files", checkin.task_id, checkin.files.len());

        self.clear_selection();
        self.refresh().await?;
        Ok(checkin)
    }

    /// Records the latest timer state for the timer view.
    pub fn apply_timer_frame(&mut self, frame: TimerFrame) -> &RenderedViews {
        (self.rendered.timer_display, self.rendered.timer_status) = render_timer(&frame);
        self.timer_frame = frame;
        &self.rendered
    }

    /// Re-reads the store and redraws task list, history and others' feed.
    pub async fn refresh(&mut self) -> Result<&RenderedViews, StoreError> {
        let tasks = self.repository.list_tasks().await?;
        let history = self
            .repository
            .list_checkins_for_user(self.repository.local_user_id())
            .await?;
        let others = self.repository.list_checkins_for_others().await?;
        let users = self.repository.list_users().await?;

        let selected = self.selected_task.as_ref().map(|v| v.id.as_str());
        let (timer_display, timer_status) = render_timer(&self.timer_frame);
        self.rendered = RenderedViews {
            tasks: render_tasks(&tasks, selected),
            history: render_history(&history),
            others: render_others(&others, &users),
            timer_display,
            timer_status,
        };
        Ok(&self.rendered)
    }

    pub fn rendered(&self) -> &RenderedViews {
        &self.rendered
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::{tempdir, TempDir};

    use crate::{
        store::{
            backend::{FileBackend, MockDocumentBackend},
            document_store::{DocumentStore, StoreConfig, DOCUMENT_KEY},
            entities::Document,
            repository::CheckinRepository,
        },
        timer::machine::PomodoroTimer,
        utils::clock::TestClock,
    };

    use super::{
        error::{CommandError, ValidationError},
        forms::PublishForm,
        render::{NO_HISTORY, NO_OTHERS},
        Controller, View,
    };

    fn publish_form(title: &str) -> PublishForm {
        PublishForm {
            title: title.into(),
            description: "30m/day".into(),
            deadline: "2025-01-01T00:00:00Z".into(),
            max_participants: 10,
        }
    }

    fn config() -> StoreConfig {
        StoreConfig {
            registration_delay: std::time::Duration::ZERO,
            ..Default::default()
        }
    }

    async fn open_controller(
        dir: &TempDir,
    ) -> Result<Controller<DocumentStore<FileBackend>>> {
        let store = DocumentStore::new(
            FileBackend::new(dir.path().join("data"))?,
            config(),
            Box::new(TestClock::default()),
        );
        let mut controller = Controller::new(
            store,
            PomodoroTimer::default().frame(),
            Box::new(TestClock::default()),
        );
        controller.open().await?;
        Ok(controller)
    }

    fn proof_file(dir: &TempDir, name: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, "proof")?;
        Ok(path)
    }

    #[tokio::test]
    async fn test_open_renders_seed() -> Result<()> {
        let dir = tempdir()?;
        let controller = open_controller(&dir).await?;
        let rendered = controller.rendered();

        assert_eq!(rendered.tasks.len(), 2);
        assert_eq!(rendered.history, vec![NO_HISTORY.to_string()]);
        assert_eq!(rendered.others, vec![NO_OTHERS.to_string()]);
        assert_eq!(rendered.timer_display, "25:00");
        assert_eq!(rendered.timer_status, "Ready");
        assert_eq!(controller.view(), View::Timer);
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_adds_task_and_rerenders() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;

        let task = controller.publish_task(publish_form("Read")).await?;

        let tasks = controller.repository().list_tasks().await?;
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2].title, "Read");
        assert_eq!(tasks[2], task);
        assert_eq!(controller.rendered().tasks.len(), 3);
        assert!(controller.rendered().tasks[2].contains("Read"));
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_without_title_writes_nothing() -> Result<()> {
        let seed = serde_json::to_string(&Document::seed(TestClock::default().now))?;
        let mut backend = MockDocumentBackend::new();
        backend
            .expect_get()
            .returning(move |_| Ok(Some(seed.clone())));
        backend.expect_set().never();

        let store = DocumentStore::new(backend, config(), Box::new(TestClock::default()));
        let mut controller = Controller::new(
            store,
            PomodoroTimer::default().frame(),
            Box::new(TestClock::default()),
        );
        controller.open().await?;

        let result = controller.publish_task(publish_form("")).await;
        assert!(matches!(
            result,
            Err(CommandError::Validation(ValidationError::MissingTitle))
        ));
        assert_eq!(controller.repository().list_tasks().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_checkin_requires_selection_and_files() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;
        let file = proof_file(&dir, "proof.png")?;

        let result = controller.submit_checkin(&[file], String::new()).await;
        assert!(matches!(
            result,
            Err(CommandError::Validation(ValidationError::NoTaskSelected))
        ));

        controller.select_task("1").await?;
        let result = controller.submit_checkin(&[], String::new()).await;
        assert!(matches!(
            result,
            Err(CommandError::Validation(ValidationError::NoFiles))
        ));

        assert!(controller.repository().list_checkins().await?.is_empty());
        assert_eq!(controller.selected_task().map(|v| v.id.as_str()), Some("1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_task_selection() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;
        controller.select_task("2").await?;

        let result = controller.select_task("404").await;
        assert!(matches!(
            result,
            Err(CommandError::Validation(ValidationError::UnknownTask(_)))
        ));
        assert_eq!(controller.selected_task().map(|v| v.id.as_str()), Some("2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_is_exclusive() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;

        controller.select_task("1").await?;
        controller.select_task("2").await?;

        let marked = controller
            .rendered()
            .tasks
            .iter()
            .filter(|v| v.starts_with('*'))
            .count();
        assert_eq!(marked, 1);
        assert_eq!(controller.selected_task().map(|v| v.id.as_str()), Some("2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_selection() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;

        controller.select_task("1").await?;
        controller.clear_selection();
        assert!(controller.selected_task().is_none());

        let result = controller
            .submit_checkin(&[proof_file(&dir, "page.jpg")?], String::new())
            .await;
        assert!(matches!(
            result,
            Err(CommandError::Validation(ValidationError::NoTaskSelected))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkin_flow() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;
        let files = vec![proof_file(&dir, "page.jpg")?, proof_file(&dir, "notes.txt")?];

        controller.select_task("1").await?;
        let checkin = controller
            .submit_checkin(&files, "chapter 3".into())
            .await?;

        assert_eq!(checkin.task_id, "1");
        assert_eq!(checkin.task_title, "Daily reading");
        assert_eq!(checkin.user_id, "user1");
        assert_eq!(
            checkin.files.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            vec!["page.jpg", "notes.txt"]
        );
        assert_eq!(checkin.files[0].mime_type, "image/jpeg");
        assert!(controller.selected_task().is_none());

        let repository = controller.repository();
        assert_eq!(
            repository
                .list_checkins_for_user(repository.local_user_id())
                .await?,
            vec![checkin]
        );
        assert!(repository.list_checkins_for_others().await?.is_empty());

        let rendered = controller.rendered();
        assert_eq!(rendered.history.len(), 1);
        assert!(rendered.history[0].contains("page.jpg, notes.txt"));
        assert_eq!(rendered.others, vec![NO_OTHERS.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_registration_writes_nothing() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;
        controller.select_task("1").await?;

        let result = controller
            .submit_checkin(&[dir.path().join("missing.png")], String::new())
            .await;
        assert!(matches!(result, Err(CommandError::Register(_))));
        assert!(result.is_err_and(|e| e.is_recoverable()));
        assert!(controller.repository().list_checkins().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_storage_is_fatal() -> Result<()> {
        use crate::store::backend::DocumentBackend;

        let dir = tempdir()?;
        let backend = FileBackend::new(dir.path().to_path_buf())?;
        backend.set(DOCUMENT_KEY, "[]".into()).await?;

        let store = DocumentStore::new(backend, config(), Box::new(TestClock::default()));
        let mut controller = Controller::new(
            store,
            PomodoroTimer::default().frame(),
            Box::new(TestClock::default()),
        );
        let result = controller.open().await;
        assert!(result.is_err_and(|e| !e.is_recoverable()));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_switching() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;
        controller.switch_view(View::Others);
        assert_eq!(controller.view(), View::Others);
        controller.switch_view(View::Publish);
        assert_eq!(controller.view(), View::Publish);
        Ok(())
    }

    #[tokio::test]
    async fn test_timer_frame_updates_view() -> Result<()> {
        let dir = tempdir()?;
        let mut controller = open_controller(&dir).await?;

        let mut timer = PomodoroTimer::default();
        timer.start();
        timer.tick();
        let rendered = controller.apply_timer_frame(timer.frame());
        assert_eq!(rendered.timer_display, "24:59");
        assert_eq!(rendered.timer_status, "Focusing...");

        // Store refreshes keep the timer view.
        controller.refresh().await?;
        assert_eq!(controller.rendered().timer_display, "24:59");
        Ok(())
    }
}
