//! Domain model for CRM records.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep entity shapes independent of storage and presentation concerns.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Custom-field extension points are expressed through `EntityRef`, never
//!   through raw `(entity_type, entity_id)` string pairs.

pub mod activity;
pub mod customer;
pub mod field;
pub mod task;
