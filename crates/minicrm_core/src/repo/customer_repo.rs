//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `customers` plus custom-value attachment in one transaction.
//! - Supply the live Customer field definitions the service layer needs for
//!   per-request validation.
//!
//! # Invariants
//! - Create/update persist the entity row and its value upserts atomically;
//!   an unknown field id rolls back the whole write.
//! - Deleting a customer removes its own values and the values of its
//!   cascade-deleted activities in the same transaction.

use crate::model::customer::{Customer, CustomerId};
use crate::model::field::{EntityKind, EntityRef, FieldDefinition, FieldId};
use crate::repo::field_repo::{
    delete_values_for_entity, list_definitions_for, load_values_for_entity, upsert_value,
    CustomValueRecord,
};
use crate::repo::{normalize_limit, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeMap;

const CUSTOMER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    email,
    phone,
    organization,
    job_title,
    social_links,
    notes,
    segment,
    lifecycle_stage,
    owner_id
FROM customers";

/// Read model for customer detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub customer: Customer,
    /// Attached custom values in field creation order.
    pub custom_values: Vec<CustomValueRecord>,
}

/// Query options for customer lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerListQuery {
    /// Optional exact-match segment filter.
    pub segment: Option<String>,
    /// Page size. Defaults to 15, clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for customer use-cases.
pub trait CustomerRepository {
    /// Current field definitions scoped to customers, fetched fresh per
    /// request.
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>>;
    /// Whether `email` is already taken by a customer other than `exclude`.
    fn email_in_use(&self, email: &str, exclude: Option<CustomerId>) -> RepoResult<bool>;
    /// Persists one customer and its submitted values atomically.
    fn create_customer(
        &mut self,
        customer: &Customer,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<CustomerId>;
    /// Replaces an existing customer row and upserts submitted values.
    fn update_customer(
        &mut self,
        customer: &Customer,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()>;
    /// Gets one customer with its attached values.
    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<CustomerRecord>>;
    /// Lists customers, newest first.
    fn list_customers(&self, query: &CustomerListQuery) -> RepoResult<Vec<Customer>>;
    /// Hard-deletes a customer and everything it exclusively owns.
    fn delete_customer(&mut self, id: CustomerId) -> RepoResult<()>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn field_definitions(&self) -> RepoResult<Vec<FieldDefinition>> {
        list_definitions_for(self.conn, Some(EntityKind::Customer))
    }

    fn email_in_use(&self, email: &str, exclude: Option<CustomerId>) -> RepoResult<bool> {
        let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM customers
                WHERE email = ?1
                  AND uuid != ?2
            );",
            params![email, exclude],
            |row| row.get(0),
        )?;
        Ok(taken == 1)
    }

    fn create_customer(
        &mut self,
        customer: &Customer,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<CustomerId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO customers (
                uuid,
                name,
                email,
                phone,
                organization,
                job_title,
                social_links,
                notes,
                segment,
                lifecycle_stage,
                owner_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                customer.id.to_string(),
                customer.name.as_str(),
                customer.email.as_deref(),
                customer.phone.as_deref(),
                customer.organization.as_deref(),
                customer.job_title.as_deref(),
                encode_social_links(customer.social_links.as_deref())?,
                customer.notes.as_deref(),
                customer.segment.as_deref(),
                customer.lifecycle_stage.as_deref(),
                customer.owner_id.to_string(),
            ],
        )?;

        for (field_id, value) in values {
            upsert_value(&tx, *field_id, EntityRef::Customer(customer.id), value.as_deref())?;
        }

        tx.commit()?;
        Ok(customer.id)
    }

    fn update_customer(
        &mut self,
        customer: &Customer,
        values: &BTreeMap<FieldId, Option<String>>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE customers
             SET
                name = ?1,
                email = ?2,
                phone = ?3,
                organization = ?4,
                job_title = ?5,
                social_links = ?6,
                notes = ?7,
                segment = ?8,
                lifecycle_stage = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?10;",
            params![
                customer.name.as_str(),
                customer.email.as_deref(),
                customer.phone.as_deref(),
                customer.organization.as_deref(),
                customer.job_title.as_deref(),
                encode_social_links(customer.social_links.as_deref())?,
                customer.notes.as_deref(),
                customer.segment.as_deref(),
                customer.lifecycle_stage.as_deref(),
                customer.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "customer",
                id: customer.id,
            });
        }

        for (field_id, value) in values {
            upsert_value(&tx, *field_id, EntityRef::Customer(customer.id), value.as_deref())?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<CustomerRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let customer = parse_customer_row(row)?;
            let custom_values = load_values_for_entity(self.conn, EntityRef::Customer(id))?;
            return Ok(Some(CustomerRecord {
                customer,
                custom_values,
            }));
        }
        Ok(None)
    }

    fn list_customers(&self, query: &CustomerListQuery) -> RepoResult<Vec<Customer>> {
        let mut sql = format!("{CUSTOMER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(segment) = query.segment.as_ref() {
            sql.push_str(" AND segment = ?");
            bind_values.push(Value::Text(segment.clone()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }
        Ok(customers)
    }

    fn delete_customer(&mut self, id: CustomerId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Activities cascade away with the customer row; clear their values
        // first so nothing orphaned survives the foreign-key cascade.
        tx.execute(
            "DELETE FROM custom_field_values
             WHERE entity_type = 'Activity'
               AND entity_uuid IN (
                   SELECT uuid FROM activities WHERE customer_uuid = ?1
               );",
            [id.to_string()],
        )?;
        delete_values_for_entity(&tx, EntityRef::Customer(id))?;

        let changed = tx.execute("DELETE FROM customers WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "customer",
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }
}

fn encode_social_links(links: Option<&[String]>) -> RepoResult<Option<String>> {
    links
        .map(|links| {
            serde_json::to_string(links)
                .map_err(|err| RepoError::InvalidData(format!("unencodable social links: {err}")))
        })
        .transpose()
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("owner_id")?;

    let social_links = match row.get::<_, Option<String>>("social_links")? {
        Some(json) => Some(serde_json::from_str::<Vec<String>>(&json).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid social links json in customers.social_links: {json}"
            ))
        })?),
        None => None,
    };

    Ok(Customer {
        id: parse_uuid(&uuid_text, "customers.uuid")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        organization: row.get("organization")?,
        job_title: row.get("job_title")?,
        social_links,
        notes: row.get("notes")?,
        segment: row.get("segment")?,
        lifecycle_stage: row.get("lifecycle_stage")?,
        owner_id: parse_uuid(&owner_text, "customers.owner_id")?,
    })
}
