//! Task domain model.
//!
//! # Invariants
//! - `due_date` is always set; tasks without a due date are rejected at
//!   validation time.
//! - `customer_id` is optional; when the linked customer is removed the
//!   task survives with the link cleared.

use crate::model::customer::CustomerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task record.
pub type TaskId = Uuid;

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Due date in epoch milliseconds.
    pub due_date: i64,
    pub completed: bool,
    /// Id of the user who owns this record.
    pub owner_id: Uuid,
    /// Optional customer this task relates to.
    pub customer_id: Option<CustomerId>,
}

impl Task {
    /// Creates an open task with a generated id.
    pub fn new(title: impl Into<String>, due_date: i64, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            due_date,
            completed: false,
            owner_id,
            customer_id: None,
        }
    }
}
