//! Task entity, its representation and store queries.

use super::{contains_ignore_case, merge_field, required};
use crate::entity::{Entity, EntityKind};
use crate::error::Result;
use crate::mapper::Mapper;
use crate::page::{Page, PageRequest};
use crate::repository::{Audited, FieldValue, InMemoryStore, Sortable, Store};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority given to tasks created without one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Whether a task is still within its schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    OnTime,
    Late,
}

impl TaskStatus {
    /// Declaration order, used when sorting by status.
    pub fn ordinal(&self) -> i64 {
        match self {
            TaskStatus::OnTime => 0,
            TaskStatus::Late => 1,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::OnTime => write!(f, "ON_TIME"),
            TaskStatus::Late => write!(f, "LATE"),
        }
    }
}

/// Stored task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Option<u64>,
    pub title: String,
    pub description: String,
    pub task_status: TaskStatus,
    pub is_completed: bool,
    /// 1 (lowest) to 9 (highest).
    pub priority: i32,
    /// Written once, on first save.
    pub task_date_creation: Option<NaiveDateTime>,
    pub task_date_finished: Option<NaiveDateTime>,
    pub log_date_created: Option<DateTime<Utc>>,
    pub log_last_updated: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Task {
            id: None,
            title: title.into(),
            description: description.into(),
            task_status: TaskStatus::default(),
            is_completed: false,
            priority: DEFAULT_PRIORITY,
            task_date_creation: None,
            task_date_finished: None,
            log_date_created: None,
            log_last_updated: None,
        }
    }

    /// Title or description contains `needle_lower` (already lower-cased).
    pub fn matches_filter(&self, needle_lower: &str) -> bool {
        contains_ignore_case(&self.title, needle_lower)
            || contains_ignore_case(&self.description, needle_lower)
    }
}

impl Entity for Task {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn kind() -> EntityKind {
        EntityKind::Task
    }

    fn on_create(&mut self) {
        if self.task_date_creation.is_none() {
            self.task_date_creation = Some(Local::now().naive_local());
        }
    }
}

impl Sortable for Task {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "title" => FieldValue::from(self.title.as_str()),
            "description" => FieldValue::from(self.description.as_str()),
            "taskStatus" => FieldValue::Int(self.task_status.ordinal()),
            "isCompleted" => FieldValue::Bool(self.is_completed),
            "priority" => FieldValue::Int(i64::from(self.priority)),
            "taskDateCreation" => FieldValue::from(self.task_date_creation),
            "taskDateFinished" => FieldValue::from(self.task_date_finished),
            _ => return None,
        };
        Some(value)
    }
}

impl Audited for Task {
    fn audit(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        if let Some(previous) = previous {
            // Creation columns are not updatable.
            self.task_date_creation = previous.task_date_creation.or(self.task_date_creation);
            self.log_date_created = previous.log_date_created;
        }
        self.log_date_created = self.log_date_created.or(Some(now));
        self.log_last_updated = Some(now);
    }
}

/// API-facing shape of a task.
///
/// Every field is optional so the same type serves creation, full
/// replacement and partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_status: Option<TaskStatus>,
    pub is_completed: Option<bool>,
    pub priority: Option<i32>,
    pub task_date_creation: Option<NaiveDateTime>,
    pub task_date_finished: Option<NaiveDateTime>,
}

impl TaskDto {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        TaskDto {
            title: Some(title.into()),
            description: Some(description.into()),
            ..TaskDto::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Converts between [`Task`] and [`TaskDto`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskMapper;

impl Mapper<Task, TaskDto> for TaskMapper {
    fn to_representation(&self, task: &Task) -> Result<TaskDto> {
        Ok(TaskDto {
            id: task.id,
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            task_status: Some(task.task_status),
            is_completed: Some(task.is_completed),
            priority: Some(task.priority),
            task_date_creation: task.task_date_creation,
            task_date_finished: task.task_date_finished,
        })
    }

    fn to_entity(&self, dto: &TaskDto) -> Result<Task> {
        Ok(Task {
            id: dto.id,
            title: required(&dto.title, "title")?,
            description: required(&dto.description, "description")?,
            task_status: dto.task_status.unwrap_or_default(),
            is_completed: dto.is_completed.unwrap_or(false),
            priority: dto.priority.unwrap_or(DEFAULT_PRIORITY),
            task_date_creation: dto.task_date_creation,
            task_date_finished: dto.task_date_finished,
            log_date_created: None,
            log_last_updated: None,
        })
    }

    /// Identifier, creation date and audit stamps are never merged.
    fn merge_into(&self, dto: &TaskDto, task: &mut Task) -> Result<()> {
        merge_field(&mut task.title, &dto.title);
        merge_field(&mut task.description, &dto.description);
        merge_field(&mut task.task_status, &dto.task_status);
        merge_field(&mut task.is_completed, &dto.is_completed);
        merge_field(&mut task.priority, &dto.priority);
        if dto.task_date_finished.is_some() {
            task.task_date_finished = dto.task_date_finished;
        }
        Ok(())
    }
}

/// Task-specific queries on top of the generic store.
#[allow(async_fn_in_trait)]
pub trait TaskStore: Store<Task> {
    /// Title or description contains `text`, ignoring case.
    async fn find_by_filter(&self, text: &str) -> Result<Vec<Task>>;

    /// Paged variant of [`TaskStore::find_by_filter`].
    async fn find_by_filter_paged(&self, text: &str, request: PageRequest) -> Result<Page<Task>>;

    /// Title contains `text`, ignoring case.
    async fn find_by_title_containing(&self, text: &str) -> Result<Vec<Task>>;

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>>;

    async fn find_by_completion(&self, completed: bool) -> Result<Vec<Task>>;
}

impl TaskStore for InMemoryStore<Task> {
    async fn find_by_filter(&self, text: &str) -> Result<Vec<Task>> {
        let needle = text.to_lowercase();
        self.find_matching(|t| t.matches_filter(&needle))
    }

    async fn find_by_filter_paged(&self, text: &str, request: PageRequest) -> Result<Page<Task>> {
        let needle = text.to_lowercase();
        let matching = self.find_matching(|t| t.matches_filter(&needle))?;
        Ok(Page::from_all(matching, request))
    }

    async fn find_by_title_containing(&self, text: &str) -> Result<Vec<Task>> {
        let needle = text.to_lowercase();
        self.find_matching(|t| contains_ignore_case(&t.title, &needle))
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.find_matching(|t| t.task_status == status)
    }

    async fn find_by_completion(&self, completed: bool) -> Result<Vec<Task>> {
        self.find_matching(|t| t.is_completed == completed)
    }
}
