//! Activity domain model.
//!
//! # Invariants
//! - Every activity belongs to exactly one customer and is removed with it.
//! - `kind` is a closed enum; free-form activity types are not accepted.

use crate::model::customer::CustomerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an activity record.
pub type ActivityId = Uuid;

/// Kind of customer interaction being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
}

impl ActivityType {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "call" => Some(Self::Call),
            "email" => Some(Self::Email),
            "meeting" => Some(Self::Meeting),
            _ => None,
        }
    }
}

/// One logged interaction with a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub customer_id: CustomerId,
    /// Id of the user who logged this activity.
    pub owner_id: Uuid,
    /// Serialized as `type` to match the storage schema.
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// When the interaction happened, in epoch milliseconds.
    pub activity_date: i64,
    pub notes: Option<String>,
}

impl Activity {
    /// Creates an activity with a generated id and no notes.
    pub fn new(
        customer_id: CustomerId,
        kind: ActivityType,
        activity_date: i64,
        owner_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            owner_id,
            kind,
            activity_date,
            notes: None,
        }
    }
}
