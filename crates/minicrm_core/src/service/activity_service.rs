//! Activity use-case service.
//!
//! # Invariants
//! - Every activity is logged against an existing customer.
//! - `kind` is typed; the hosting layer parses form input through
//!   `ActivityType::parse` before building a draft.

use crate::model::activity::{Activity, ActivityId, ActivityType};
use crate::model::customer::CustomerId;
use crate::model::field::FieldId;
use crate::repo::activity_repo::{ActivityListQuery, ActivityRecord, ActivityRepository};
use crate::repo::{RepoError, RepoResult};
use crate::validation::{FieldPlan, Validator};
use log::info;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Input for logging or editing an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub customer_id: CustomerId,
    pub kind: ActivityType,
    /// When the interaction happened, in epoch milliseconds.
    pub activity_date: i64,
    pub notes: Option<String>,
    /// Submitted custom values keyed by field definition id.
    pub custom_fields: BTreeMap<FieldId, String>,
}

/// Activity service facade over repository implementations.
pub struct ActivityService<R: ActivityRepository> {
    repo: R,
    owner_id: Uuid,
}

impl<R: ActivityRepository> ActivityService<R> {
    /// Creates a service acting on behalf of one owning user.
    pub fn new(repo: R, owner_id: Uuid) -> Self {
        Self { repo, owner_id }
    }

    /// Logs one activity with its submitted custom values.
    pub fn log(&mut self, draft: &ActivityDraft) -> RepoResult<ActivityRecord> {
        self.validate(draft)?;

        let activity = self.build_activity(Uuid::new_v4(), draft);
        let values = super::stored_values(&draft.custom_fields);
        let id = self.repo.create_activity(&activity, &values)?;

        info!(
            "event=activity_log module=service status=ok activity={id} customer={}",
            draft.customer_id
        );
        self.read_back(id, "logged activity missing on read-back")
    }

    /// Replaces an existing activity and upserts its submitted values.
    pub fn update(&mut self, id: ActivityId, draft: &ActivityDraft) -> RepoResult<ActivityRecord> {
        self.validate(draft)?;

        let activity = self.build_activity(id, draft);
        let values = super::stored_values(&draft.custom_fields);
        self.repo.update_activity(&activity, &values)?;

        self.read_back(id, "updated activity missing on read-back")
    }

    /// Gets one activity with its attached custom values.
    pub fn get(&self, id: ActivityId) -> RepoResult<ActivityRecord> {
        self.repo.get_activity(id)?.ok_or(RepoError::NotFound {
            entity: "activity",
            id,
        })
    }

    /// Lists one customer's activities, newest interaction first.
    pub fn list(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>> {
        self.repo.list_activities(query)
    }

    /// Hard-deletes an activity and its custom values.
    pub fn delete(&mut self, id: ActivityId) -> RepoResult<()> {
        self.repo.delete_activity(id)
    }

    fn validate(&self, draft: &ActivityDraft) -> RepoResult<()> {
        let mut validator = Validator::new();

        if !self.repo.customer_exists(draft.customer_id)? {
            validator.push("customer_id", "customer does not exist");
        }

        let definitions = self.repo.field_definitions()?;
        FieldPlan::from_definitions(&definitions).check(&draft.custom_fields, &mut validator);

        validator.finish().map_err(RepoError::Validation)
    }

    fn build_activity(&self, id: ActivityId, draft: &ActivityDraft) -> Activity {
        Activity {
            id,
            customer_id: draft.customer_id,
            owner_id: self.owner_id,
            kind: draft.kind,
            activity_date: draft.activity_date,
            notes: draft.notes.clone(),
        }
    }

    fn read_back(&self, id: ActivityId, context: &str) -> RepoResult<ActivityRecord> {
        self.repo
            .get_activity(id)?
            .ok_or_else(|| RepoError::InvalidData(context.to_string()))
    }
}
