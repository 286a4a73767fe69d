//! Field definition store and value store, SQLite implementation.
//!
//! # Responsibility
//! - CRUD for admin-defined `FieldDefinition` rows, scoped by entity kind.
//! - Upsert-by-key persistence for `FieldValue` rows, shared with the
//!   entity repositories through crate-internal helpers.
//!
//! # Invariants
//! - Write paths call `FieldDefinition::validate()` before SQL mutations.
//! - At most one value row exists per `(field, entity)` key; the composite
//!   unique index plus `ON CONFLICT DO UPDATE` makes the upsert atomic.
//! - Deleting a definition cascades to its values via foreign key; no
//!   application-level loop is involved.

use crate::model::field::{EntityKind, EntityRef, FieldDefinition, FieldId, FieldType};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const FIELD_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    type,
    entity_type,
    options,
    required
FROM custom_fields";

/// Read model for one attached custom value, joined with its field name for
/// display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomValueRecord {
    pub field_id: FieldId,
    pub field_name: String,
    pub value: Option<String>,
}

/// Repository interface for field definition administration.
pub trait FieldRepository {
    /// Lists definitions, optionally scoped to one entity kind, in creation
    /// order.
    fn list_definitions(&self, kind: Option<EntityKind>) -> RepoResult<Vec<FieldDefinition>>;
    /// Gets one definition by id.
    fn get_definition(&self, id: FieldId) -> RepoResult<Option<FieldDefinition>>;
    /// Creates one definition and returns its id.
    fn create_definition(&self, definition: &FieldDefinition) -> RepoResult<FieldId>;
    /// Replaces an existing definition.
    fn update_definition(&self, definition: &FieldDefinition) -> RepoResult<()>;
    /// Deletes a definition; dependent values go with it.
    fn delete_definition(&self, id: FieldId) -> RepoResult<()>;
}

/// SQLite-backed field definition repository.
pub struct SqliteFieldRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFieldRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FieldRepository for SqliteFieldRepository<'_> {
    fn list_definitions(&self, kind: Option<EntityKind>) -> RepoResult<Vec<FieldDefinition>> {
        list_definitions_for(self.conn, kind)
    }

    fn get_definition(&self, id: FieldId) -> RepoResult<Option<FieldDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FIELD_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_definition_row(row)?));
        }
        Ok(None)
    }

    fn create_definition(&self, definition: &FieldDefinition) -> RepoResult<FieldId> {
        definition.validate()?;

        self.conn.execute(
            "INSERT INTO custom_fields (uuid, name, type, entity_type, options, required)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                definition.id.to_string(),
                definition.name.as_str(),
                definition.field_type.as_db_str(),
                definition.entity_kind.as_db_str(),
                encode_options(definition.options.as_deref())?,
                i64::from(definition.required),
            ],
        )?;

        Ok(definition.id)
    }

    fn update_definition(&self, definition: &FieldDefinition) -> RepoResult<()> {
        definition.validate()?;

        let changed = self.conn.execute(
            "UPDATE custom_fields
             SET
                name = ?1,
                type = ?2,
                entity_type = ?3,
                options = ?4,
                required = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                definition.name.as_str(),
                definition.field_type.as_db_str(),
                definition.entity_kind.as_db_str(),
                encode_options(definition.options.as_deref())?,
                i64::from(definition.required),
                definition.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "field definition",
                id: definition.id,
            });
        }

        Ok(())
    }

    fn delete_definition(&self, id: FieldId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM custom_fields WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "field definition",
                id,
            });
        }

        Ok(())
    }
}

/// Lists definitions for one kind (or all), in creation order.
///
/// Shared with the entity repositories, which need the current definition
/// list to drive per-request validation.
pub(crate) fn list_definitions_for(
    conn: &Connection,
    kind: Option<EntityKind>,
) -> RepoResult<Vec<FieldDefinition>> {
    let mut sql = FIELD_SELECT_SQL.to_string();
    let mut bind: Vec<String> = Vec::new();

    if let Some(kind) = kind {
        sql.push_str(" WHERE entity_type = ?1");
        bind.push(kind.as_db_str().to_string());
    }
    sql.push_str(" ORDER BY created_at ASC, uuid ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(bind))?;
    let mut definitions = Vec::new();
    while let Some(row) = rows.next()? {
        definitions.push(parse_definition_row(row)?);
    }
    Ok(definitions)
}

/// Inserts or overwrites one value row keyed on `(field, entity)`.
///
/// An unknown `field_id` violates the foreign key and surfaces as
/// `RepoError::Integrity`.
pub(crate) fn upsert_value(
    conn: &Connection,
    field_id: FieldId,
    entity: EntityRef,
    value: Option<&str>,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO custom_field_values (uuid, custom_field_uuid, entity_type, entity_uuid, value)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (custom_field_uuid, entity_type, entity_uuid)
         DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            Uuid::new_v4().to_string(),
            field_id.to_string(),
            entity.kind().as_db_str(),
            entity.id().to_string(),
            value,
        ],
    )?;
    Ok(())
}

/// Loads all values attached to one entity, joined with field names, in
/// field creation order.
pub(crate) fn load_values_for_entity(
    conn: &Connection,
    entity: EntityRef,
) -> RepoResult<Vec<CustomValueRecord>> {
    let mut stmt = conn.prepare(
        "SELECT v.custom_field_uuid, f.name, v.value
         FROM custom_field_values v
         INNER JOIN custom_fields f ON f.uuid = v.custom_field_uuid
         WHERE v.entity_type = ?1
           AND v.entity_uuid = ?2
         ORDER BY f.created_at ASC, f.uuid ASC;",
    )?;
    let mut rows = stmt.query(params![
        entity.kind().as_db_str(),
        entity.id().to_string()
    ])?;

    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let field_uuid: String = row.get(0)?;
        values.push(CustomValueRecord {
            field_id: parse_uuid(&field_uuid, "custom_field_values.custom_field_uuid")?,
            field_name: row.get(1)?,
            value: row.get(2)?,
        });
    }
    Ok(values)
}

/// Removes every value owned by one entity. Called inside entity delete
/// transactions so values never outlive their owner.
pub(crate) fn delete_values_for_entity(conn: &Connection, entity: EntityRef) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM custom_field_values
         WHERE entity_type = ?1
           AND entity_uuid = ?2;",
        params![entity.kind().as_db_str(), entity.id().to_string()],
    )?;
    Ok(())
}

fn encode_options(options: Option<&[String]>) -> RepoResult<Option<String>> {
    options
        .map(|options| {
            serde_json::to_string(options)
                .map_err(|err| RepoError::InvalidData(format!("unencodable options: {err}")))
        })
        .transpose()
}

fn parse_definition_row(row: &Row<'_>) -> RepoResult<FieldDefinition> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "custom_fields.uuid")?;

    let type_text: String = row.get("type")?;
    let field_type = FieldType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid field type `{type_text}` in custom_fields.type"))
    })?;

    let kind_text: String = row.get("entity_type")?;
    let entity_kind = EntityKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid entity kind `{kind_text}` in custom_fields.entity_type"
        ))
    })?;

    let options = match row.get::<_, Option<String>>("options")? {
        Some(json) => Some(serde_json::from_str::<Vec<String>>(&json).map_err(|_| {
            RepoError::InvalidData(format!("invalid options json in custom_fields.options: {json}"))
        })?),
        None => None,
    };

    Ok(FieldDefinition {
        id,
        name: row.get("name")?,
        field_type,
        entity_kind,
        options,
        required: row.get::<_, i64>("required")? != 0,
    })
}
