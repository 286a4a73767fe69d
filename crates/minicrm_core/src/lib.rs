//! Core domain logic for the minicrm backend.
//! This crate is the single source of truth for business invariants; the
//! HTTP/presentation layer lives outside and only calls the services here.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityId, ActivityType};
pub use model::customer::{Customer, CustomerId};
pub use model::field::{
    parse_select_options, EntityKind, EntityRef, FieldDefinition, FieldId, FieldType, FieldValue,
};
pub use model::task::{Task, TaskId};
pub use repo::activity_repo::{
    ActivityListQuery, ActivityRecord, ActivityRepository, SqliteActivityRepository,
};
pub use repo::customer_repo::{
    CustomerListQuery, CustomerRecord, CustomerRepository, SqliteCustomerRepository,
};
pub use repo::field_repo::{CustomValueRecord, FieldRepository, SqliteFieldRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRecord, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::activity_service::{ActivityDraft, ActivityService};
pub use service::customer_service::{CustomerDraft, CustomerService};
pub use service::field_service::{FieldDefinitionDraft, FieldService};
pub use service::task_service::{TaskDraft, TaskService};
pub use validation::{FieldPlan, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
