//! Customer domain model.
//!
//! # Invariants
//! - `email`, when present, is unique across all customers.
//! - `segment` and `lifecycle_stage` are intentionally free-form strings;
//!   the UI offers suggestions but the core does not enforce an enum.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a customer record.
pub type CustomerId = Uuid;

/// Canonical customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    /// Profile links, stored as a JSON array in the `social_links` column.
    pub social_links: Option<Vec<String>>,
    pub notes: Option<String>,
    /// Free-form segmentation tag, e.g. `prospect` or `partner`.
    pub segment: Option<String>,
    /// Free-form lifecycle tag, e.g. `lead` or `churned`.
    pub lifecycle_stage: Option<String>,
    /// Id of the user who owns this record. Users live outside this crate.
    pub owner_id: Uuid,
}

impl Customer {
    /// Creates a customer with a generated id and all optional fields empty.
    pub fn new(name: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
            organization: None,
            job_title: None,
            social_links: None,
            notes: None,
            segment: None,
            lifecycle_stage: None,
            owner_id,
        }
    }
}
