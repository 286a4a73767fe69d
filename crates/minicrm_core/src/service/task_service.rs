//! Task use-case service.
//!
//! # Invariants
//! - `due_date` is mandatory; a draft without one fails validation.
//! - A referenced customer must exist at validation time; the link is
//!   reported as a field-keyed message, not an integrity failure.

use crate::model::field::FieldId;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{TaskListQuery, TaskRecord, TaskRepository};
use crate::repo::{RepoError, RepoResult};
use crate::validation::{FieldPlan, Validator};
use log::info;
use std::collections::BTreeMap;
use uuid::Uuid;

const TITLE_MAX_CHARS: usize = 255;

/// Input for task create/update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    /// Due date in epoch milliseconds. Required.
    pub due_date: Option<i64>,
    pub completed: bool,
    pub customer_id: Option<Uuid>,
    /// Submitted custom values keyed by field definition id.
    pub custom_fields: BTreeMap<FieldId, String>,
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    owner_id: Uuid,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service acting on behalf of one owning user.
    pub fn new(repo: R, owner_id: Uuid) -> Self {
        Self { repo, owner_id }
    }

    /// Creates a task with its submitted custom values.
    pub fn create(&mut self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        let due_date = self.validate(draft)?;

        let task = self.build_task(Uuid::new_v4(), due_date, draft);
        let values = super::stored_values(&draft.custom_fields);
        let id = self.repo.create_task(&task, &values)?;

        info!("event=task_create module=service status=ok task={id}");
        self.read_back(id, "created task missing on read-back")
    }

    /// Replaces an existing task and upserts its submitted values.
    pub fn update(&mut self, id: TaskId, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        let due_date = self.validate(draft)?;

        let task = self.build_task(id, due_date, draft);
        let values = super::stored_values(&draft.custom_fields);
        self.repo.update_task(&task, &values)?;

        self.read_back(id, "updated task missing on read-back")
    }

    /// Gets one task with its attached custom values.
    pub fn get(&self, id: TaskId) -> RepoResult<TaskRecord> {
        self.repo
            .get_task(id)?
            .ok_or(RepoError::NotFound { entity: "task", id })
    }

    /// Lists tasks ordered by due date, optionally scoped to one customer.
    pub fn list(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(query)
    }

    /// Marks a task as completed.
    pub fn complete(&mut self, id: TaskId) -> RepoResult<TaskRecord> {
        self.repo.complete_task(id)?;
        info!("event=task_complete module=service status=ok task={id}");
        self.read_back(id, "completed task missing on read-back")
    }

    /// Hard-deletes a task and its custom values.
    pub fn delete(&mut self, id: TaskId) -> RepoResult<()> {
        self.repo.delete_task(id)
    }

    fn validate(&self, draft: &TaskDraft) -> RepoResult<i64> {
        let mut validator = Validator::new();
        validator.require_text("title", &draft.title, TITLE_MAX_CHARS);

        if draft.due_date.is_none() {
            validator.push("due_date", "due_date is required");
        }

        if let Some(customer_id) = draft.customer_id {
            if !self.repo.customer_exists(customer_id)? {
                validator.push("customer_id", "customer does not exist");
            }
        }

        let definitions = self.repo.field_definitions()?;
        FieldPlan::from_definitions(&definitions).check(&draft.custom_fields, &mut validator);

        validator.finish().map_err(RepoError::Validation)?;
        // Safe: a missing due date was rejected above.
        Ok(draft.due_date.unwrap_or_default())
    }

    fn build_task(&self, id: TaskId, due_date: i64, draft: &TaskDraft) -> Task {
        Task {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            due_date,
            completed: draft.completed,
            owner_id: self.owner_id,
            customer_id: draft.customer_id,
        }
    }

    fn read_back(&self, id: TaskId, context: &str) -> RepoResult<TaskRecord> {
        self.repo
            .get_task(id)?
            .ok_or_else(|| RepoError::InvalidData(context.to_string()))
    }
}
