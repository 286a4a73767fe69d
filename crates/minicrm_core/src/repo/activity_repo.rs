//! Activity repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `activities` plus custom-value attachment in one
//!   transaction.
//! - Customer-scoped listing, newest interaction first.
//!
//! # Invariants
//! - Activity lists are sorted by `activity_date DESC, uuid ASC`.
//! - Deleting an activity removes its custom values in the same
//!   transaction.

use crate::model::activity::{Activity, ActivityId, ActivityType};
use crate::model::customer::CustomerId;
use crate::model::field::{EntityKind, EntityRef, FieldDefinition, FieldId};
use crate::repo::field_repo::{
    delete_values_for_entity, list_definitions_for, load_values_for_entity, upsert_value,
    CustomValueRecord,
};
use crate::repo::task_repo::customer_row_exists;
use crate::repo::{normalize_limit, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeMap;

const ACTIVITY_SELECT_SQL: &str = "SELECT
    uuid,
    customer_uuid,
    owner_id,
    type,
    activity_date,
    notes
FROM activities";

/// Read model for activity detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub activity: Activity,
    pub custom_values: Vec<CustomValueRecord>,
}

/// Query options for the per-customer activity timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityListQuery {
    /// Customer whose timeline is requested.
    pub customer: CustomerId,
    /// Page size. Defaults to 15, clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for activity use-cases.
pub trait ActivityRepository {
    /// Current field definitions scoped to activities, fetched fresh per
    /// request.
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>>;
    /// Whether the referenced customer row exists.
    fn customer_exists(&self, id: CustomerId) -> RepoResult<bool>;
    fn create_activity(
        &mut self,
        activity: &Activity,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<ActivityId>;
    fn update_activity(
        &mut self,
        activity: &Activity,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<ActivityRecord>>;
    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>>;
    fn delete_activity(&mut self, id: ActivityId) -> RepoResult<()>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>> {
        list_definitions_for(self.conn, Some(EntityKind::Activity))
    }

    fn customer_exists(&self, id: CustomerId) -> RepoResult<bool> {
        customer_row_exists(self.conn, id)
    }

    fn create_activity(
        &mut self,
        activity: &Activity,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<ActivityId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO activities (
                uuid,
                customer_uuid,
                owner_id,
                type,
                activity_date,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                activity.id.to_string(),
                activity.customer_id.to_string(),
                activity.owner_id.to_string(),
                activity.kind.as_db_str(),
                activity.activity_date,
                activity.notes.as_deref(),
            ],
        )?;

        for (field_id, value) in values {
            upsert_value(
                &tx,
                *field_id,
                EntityRef::Activity(activity.id),
                value.as_deref(),
            )?;
        }

        tx.commit()?;
        Ok(activity.id)
    }

    fn update_activity(
        &mut self,
        activity: &Activity,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE activities
             SET
                customer_uuid = ?1,
                type = ?2,
                activity_date = ?3,
                notes = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                activity.customer_id.to_string(),
                activity.kind.as_db_str(),
                activity.activity_date,
                activity.notes.as_deref(),
                activity.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "activity",
                id: activity.id,
            });
        }

        for (field_id, value) in values {
            upsert_value(
                &tx,
                *field_id,
                EntityRef::Activity(activity.id),
                value.as_deref(),
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<ActivityRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let activity = parse_activity_row(row)?;
            let custom_values = load_values_for_entity(self.conn, EntityRef::Activity(id))?;
            return Ok(Some(ActivityRecord {
                activity,
                custom_values,
            }));
        }
        Ok(None)
    }

    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>> {
        let mut sql =
            format!("{ACTIVITY_SELECT_SQL} WHERE customer_uuid = ? ORDER BY activity_date DESC, uuid ASC LIMIT ?");
        let mut bind_values: Vec<Value> = vec![
            Value::Text(query.customer.to_string()),
            Value::Integer(i64::from(normalize_limit(query.limit))),
        ];
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn delete_activity(&mut self, id: ActivityId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        delete_values_for_entity(&tx, EntityRef::Activity(id))?;
        let changed = tx.execute("DELETE FROM activities WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "activity",
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let uuid_text: String = row.get("uuid")?;
    let customer_text: String = row.get("customer_uuid")?;
    let owner_text: String = row.get("owner_id")?;

    let type_text: String = row.get("type")?;
    let kind = ActivityType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid activity type `{type_text}` in activities.type"
        ))
    })?;

    Ok(Activity {
        id: parse_uuid(&uuid_text, "activities.uuid")?,
        customer_id: parse_uuid(&customer_text, "activities.customer_uuid")?,
        owner_id: parse_uuid(&owner_text, "activities.owner_id")?,
        kind,
        activity_date: row.get("activity_date")?,
        notes: row.get("notes")?,
    })
}

