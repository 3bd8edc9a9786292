//! Task queries and single-field writes on top of the generic service.

use super::GenericEntityService;
use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::model::{Task, TaskDto, TaskMapper, TaskStatus, TaskStore};
use crate::page::{Page, PageRequest};
use chrono::NaiveDateTime;

/// Message used when a finish date precedes the creation date.
pub const TASK_DATE_FINISHED_BEFORE_CREATION: &str = "TASK_DATE_FINISHED_BEFORE_CREATION";

/// Entity service for tasks.
pub type TaskService<S, B> = GenericEntityService<Task, TaskDto, S, TaskMapper, B>;

impl<S, B> GenericEntityService<Task, TaskDto, S, TaskMapper, B>
where
    S: TaskStore,
    B: CacheBackend,
{
    /// Tasks whose title or description contains `text`, ignoring case.
    pub async fn get_by_filter(&self, text: &str) -> Result<Vec<TaskDto>> {
        let key = CacheKeyBuilder::for_lookup("filter", &text);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_filter(text).await?;
            self.represent_all(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn get_by_filter_paged(
        &self,
        text: &str,
        request: PageRequest,
    ) -> Result<Page<TaskDto>> {
        let (page, size) = (request.page().to_string(), request.size().to_string());
        let key = CacheKeyBuilder::build_composite(&["filter_paged", text, &page, &size]);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_filter_paged(text, request).await?;
            self.represent_page(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn get_by_title_containing(&self, text: &str) -> Result<Vec<TaskDto>> {
        let key = CacheKeyBuilder::for_lookup("title", &text);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_title_containing(text).await?;
            self.represent_all(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn get_by_status(&self, status: TaskStatus) -> Result<Vec<TaskDto>> {
        let key = CacheKeyBuilder::for_lookup("status", &status);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_status(status).await?;
            self.represent_all(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn get_by_completion(&self, completed: bool) -> Result<Vec<TaskDto>> {
        let key = CacheKeyBuilder::for_lookup("completed", &completed);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_completion(completed).await?;
            self.represent_all(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn update_status(&self, id: &u64, status: TaskStatus) -> Result<TaskDto> {
        self.modify(id, |task| {
            task.task_status = status;
            Ok(())
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn update_is_completed(&self, id: &u64, completed: bool) -> Result<TaskDto> {
        self.modify(id, |task| {
            task.is_completed = completed;
            Ok(())
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn mark_as_completed(&self, id: &u64) -> Result<TaskDto> {
        self.update_is_completed(id, true).await
    }

    /// Set the finish date.
    ///
    /// # Errors
    /// `BadRequest` if `finished` is earlier than the task's creation date.
    pub async fn update_date_finished(
        &self,
        id: &u64,
        finished: NaiveDateTime,
    ) -> Result<TaskDto> {
        self.modify(id, |task| {
            if task.task_date_creation.is_some_and(|created| finished < created) {
                return Err(Error::BadRequest(
                    TASK_DATE_FINISHED_BEFORE_CREATION.to_string(),
                ));
            }
            task.task_date_finished = Some(finished);
            Ok(())
        })
        .await
        .map_err(Error::at_service_boundary)
    }
}
