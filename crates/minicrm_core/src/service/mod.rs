//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and repository calls into use-case level APIs.
//! - Keep hosting layers (HTTP, CLI) decoupled from storage details.
//!
//! # Invariants
//! - Every create/update re-reads the live field definitions and builds a
//!   fresh validation plan; nothing about the dynamic schema is cached.
//! - Services never bypass repository validation/persistence contracts.

use crate::model::field::FieldId;
use std::collections::BTreeMap;

pub mod activity_service;
pub mod customer_service;
pub mod field_service;
pub mod task_service;

/// Converts submitted custom-field text into stored form.
///
/// Blank submissions become NULL so an optional field cleared on a form
/// overwrites the previous value instead of keeping it.
pub(crate) fn stored_values(
    submitted: &BTreeMap<FieldId, String>,
) -> BTreeMap<FieldId, Option<String>> {
    submitted
        .iter()
        .map(|(field_id, value)| {
            let trimmed = value.trim();
            let stored = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
            (*field_id, stored)
        })
        .collect()
}
