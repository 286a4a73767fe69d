//! Custom-field domain model.
//!
//! # Responsibility
//! - Define admin-authored field definitions and their typed value records.
//! - Provide the `EntityRef` tagged reference used to attach values to
//!   concrete entity rows.
//! - Normalize raw select-option input into the stored option list.
//!
//! # Invariants
//! - `FieldDefinition::options` is `Some` with at least one entry exactly
//!   when `field_type == FieldType::Select`, and `None` otherwise.
//! - `EntityRef` is the only way core code names an owning entity; the
//!   string pair form exists only inside the SQLite repositories.

use crate::model::activity::ActivityId;
use crate::model::customer::CustomerId;
use crate::model::task::TaskId;
use crate::validation::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FIELD_NAME_MAX_CHARS: usize = 255;

/// Stable identifier for one field definition.
pub type FieldId = Uuid;

/// Fixed set of entity kinds that may carry custom fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Task,
    Activity,
}

impl EntityKind {
    /// Storage tag for this kind, matching the `entity_type` column.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Task => "Task",
            Self::Activity => "Activity",
        }
    }

    /// Parses a storage/form tag back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Customer" => Some(Self::Customer),
            "Task" => Some(Self::Task),
            "Activity" => Some(Self::Activity),
            _ => None,
        }
    }
}

/// Declared value shape of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
}

impl FieldType {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select => "select",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "select" => Some(Self::Select),
            _ => None,
        }
    }
}

/// Tagged reference to one concrete entity row.
///
/// Replaces the storage-level polymorphic `(entity_type, entity_id)` pair
/// with an explicit variant, so callers cannot combine a kind tag with an
/// id of a different kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Customer(CustomerId),
    Task(TaskId),
    Activity(ActivityId),
}

impl EntityRef {
    /// The kind tag of the referenced entity.
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Customer(_) => EntityKind::Customer,
            Self::Task(_) => EntityKind::Task,
            Self::Activity(_) => EntityKind::Activity,
        }
    }

    /// The raw row id of the referenced entity.
    pub fn id(self) -> Uuid {
        match self {
            Self::Customer(id) | Self::Task(id) | Self::Activity(id) => id,
        }
    }

    /// Rebuilds a reference from its stored `(kind, id)` parts.
    pub fn from_parts(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::Customer => Self::Customer(id),
            EntityKind::Task => Self::Task(id),
            EntityKind::Activity => Self::Activity(id),
        }
    }
}

/// Admin-authored schema for one configurable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Stable definition id, also the key used in request payloads.
    pub id: FieldId,
    /// Display label shown on forms.
    pub name: String,
    /// Declared value shape, serialized as `type` to match the schema.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Entity kind this field applies to.
    pub entity_kind: EntityKind,
    /// Choice list. `Some` and non-empty only for `FieldType::Select`.
    pub options: Option<Vec<String>>,
    /// Whether a value must be submitted on entity create/update.
    pub required: bool,
}

impl FieldDefinition {
    /// Creates a definition with a generated id.
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        entity_kind: EntityKind,
        required: bool,
        options: Option<Vec<String>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            field_type,
            entity_kind,
            options,
            required,
        }
    }

    /// Checks the name and the select/options invariant.
    ///
    /// Repositories call this before every write so the invariant holds even
    /// for definitions constructed outside `FieldService`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator.require_text("name", &self.name, FIELD_NAME_MAX_CHARS);

        match (self.field_type, &self.options) {
            (FieldType::Select, Some(options)) if options.is_empty() => {
                validator.push("options", "select fields need at least one option");
            }
            (FieldType::Select, None) => {
                validator.push("options", "select fields need at least one option");
            }
            (FieldType::Select, Some(_)) => {}
            (_, Some(_)) => {
                validator.push("options", "options are only allowed on select fields");
            }
            (_, None) => {}
        }

        validator.finish()
    }
}

/// One stored attribute value attached to one entity instance.
///
/// `value` is free-text regardless of the declared field type; numeric and
/// date semantics are interpretation-only at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: Uuid,
    pub field_id: FieldId,
    pub entity: EntityRef,
    pub value: Option<String>,
}

/// Parses a comma-separated option string into the stored option list.
///
/// Entries are trimmed, empties dropped and duplicates removed while
/// preserving first-occurrence order. Returns `None` when nothing usable
/// remains.
pub fn parse_select_options(raw: &str) -> Option<Vec<String>> {
    let mut seen = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() || seen.iter().any(|existing| existing == trimmed) {
            continue;
        }
        seen.push(trimmed.to_string());
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_select_options, EntityKind, EntityRef, FieldType};
    use uuid::Uuid;

    #[test]
    fn parse_select_options_trims_and_keeps_order() {
        assert_eq!(
            parse_select_options("a, b ,c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn parse_select_options_drops_empties_and_duplicates() {
        assert_eq!(
            parse_select_options(" , red, ,red,blue"),
            Some(vec!["red".to_string(), "blue".to_string()])
        );
        assert_eq!(parse_select_options("  ,, "), None);
        assert_eq!(parse_select_options(""), None);
    }

    #[test]
    fn entity_ref_round_trips_through_parts() {
        let id = Uuid::new_v4();
        let entity = EntityRef::Task(id);
        assert_eq!(entity.kind(), EntityKind::Task);
        assert_eq!(entity.id(), id);
        assert_eq!(EntityRef::from_parts(entity.kind(), entity.id()), entity);
    }

    #[test]
    fn field_type_db_round_trip() {
        for kind in [
            FieldType::Text,
            FieldType::Number,
            FieldType::Date,
            FieldType::Select,
        ] {
            assert_eq!(FieldType::parse(kind.as_db_str()), Some(kind));
        }
        assert_eq!(FieldType::parse("checkbox"), None);
    }
}
