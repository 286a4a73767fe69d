//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `tasks` plus custom-value attachment in one transaction.
//! - Due-date ordered listing with optional customer scope.
//!
//! # Invariants
//! - Task lists are sorted by `due_date ASC, uuid ASC`.
//! - Deleting a task removes its custom values in the same transaction.

use crate::model::field::{EntityKind, EntityRef, FieldDefinition, FieldId};
use crate::model::task::{Task, TaskId};
use crate::repo::field_repo::{
    delete_values_for_entity, list_definitions_for, load_values_for_entity, upsert_value,
    CustomValueRecord,
};
use crate::repo::{bool_to_int, int_to_bool, normalize_limit, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeMap;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    due_date,
    completed,
    owner_id,
    customer_uuid
FROM tasks";

/// Read model for task detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task: Task,
    pub custom_values: Vec<CustomValueRecord>,
}

/// Query options for task lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Restrict to tasks linked to one customer.
    pub customer: Option<Uuid>,
    /// Page size. Defaults to 15, clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task use-cases.
pub trait TaskRepository {
    /// Current field definitions scoped to tasks, fetched fresh per request.
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>>;
    /// Whether the referenced customer row exists.
    fn customer_exists(&self, id: Uuid) -> RepoResult<bool>;
    fn create_task(
        &mut self,
        task: &Task,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<TaskId>;
    fn update_task(
        &mut self,
        task: &Task,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskRecord>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Marks a task completed. Idempotent.
    fn complete_task(&mut self, id: TaskId) -> RepoResult<()>;
    fn delete_task(&mut self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>> {
        list_definitions_for(self.conn, Some(EntityKind::Task))
    }

    fn customer_exists(&self, id: Uuid) -> RepoResult<bool> {
        customer_row_exists(self.conn, id)
    }

    fn create_task(
        &mut self,
        task: &Task,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<TaskId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                description,
                due_date,
                completed,
                owner_id,
                customer_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.due_date,
                bool_to_int(task.completed),
                task.owner_id.to_string(),
                task.customer_id.map(|id| id.to_string()),
            ],
        )?;

        for (field_id, value) in values {
            upsert_value(&tx, *field_id, EntityRef::Task(task.id), value.as_deref())?;
        }

        tx.commit()?;
        Ok(task.id)
    }

    fn update_task(
        &mut self,
        task: &Task,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                completed = ?4,
                customer_uuid = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.due_date,
                bool_to_int(task.completed),
                task.customer_id.map(|id| id.to_string()),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task.id,
            });
        }

        for (field_id, value) in values {
            upsert_value(&tx, *field_id, EntityRef::Task(task.id), value.as_deref())?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            let custom_values = load_values_for_entity(self.conn, EntityRef::Task(id))?;
            return Ok(Some(TaskRecord {
                task,
                custom_values,
            }));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(customer) = query.customer {
            sql.push_str(" AND customer_uuid = ?");
            bind_values.push(Value::Text(customer.to_string()));
        }

        sql.push_str(" ORDER BY due_date ASC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn complete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                completed = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        delete_values_for_entity(&tx, EntityRef::Task(id))?;
        let changed = tx.execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }

        tx.commit()?;
        Ok(())
    }
}

/// Shared existence probe for customer references.
pub(crate) fn customer_row_exists(conn: &Connection, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("owner_id")?;
    let customer_id = match row.get::<_, Option<String>>("customer_uuid")? {
        Some(value) => Some(parse_uuid(&value, "tasks.customer_uuid")?),
        None => None,
    };

    Ok(Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        completed: int_to_bool(row.get("completed")?, "tasks.completed")?,
        owner_id: parse_uuid(&owner_text, "tasks.owner_id")?,
        customer_id,
    })
}
