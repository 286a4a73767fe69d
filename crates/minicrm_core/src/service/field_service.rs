//! Field definition administration service.
//!
//! # Responsibility
//! - Parse and normalize admin form input into `FieldDefinition` records.
//! - Apply the select/options rule: comma-separated input becomes the
//!   stored option list for select fields, NULL for every other type.
//!
//! # Invariants
//! - Definition changes take effect on the next entity request; nothing in
//!   this crate caches the definition list.
//! - Deleting a definition deletes its values through the storage cascade.

use crate::model::field::{
    parse_select_options, EntityKind, FieldDefinition, FieldId, FieldType,
};
use crate::repo::field_repo::FieldRepository;
use crate::repo::{RepoError, RepoResult};
use crate::validation::Validator;
use log::info;

/// Raw admin form input for one field definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefinitionDraft {
    pub name: String,
    /// One of `text | number | date | select`.
    pub field_type: String,
    /// One of `Customer | Task | Activity`.
    pub entity_kind: String,
    pub required: bool,
    /// Comma-separated options; only meaningful for select fields.
    pub raw_options: Option<String>,
}

/// Admin service for the field definition store.
pub struct FieldService<R: FieldRepository> {
    repo: R,
}

impl<R: FieldRepository> FieldService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists definitions, optionally scoped to one entity kind.
    pub fn list(&self, kind: Option<EntityKind>) -> RepoResult<Vec<FieldDefinition>> {
        self.repo.list_definitions(kind)
    }

    /// Gets one definition by id.
    pub fn get(&self, id: FieldId) -> RepoResult<FieldDefinition> {
        self.repo.get_definition(id)?.ok_or(RepoError::NotFound {
            entity: "field definition",
            id,
        })
    }

    /// Creates a definition from raw form input.
    pub fn create(&self, draft: &FieldDefinitionDraft) -> RepoResult<FieldDefinition> {
        let (field_type, entity_kind, options) = self.parse_draft(draft)?;

        let definition = FieldDefinition::new(
            draft.name.trim(),
            field_type,
            entity_kind,
            draft.required,
            options,
        );
        let id = self.repo.create_definition(&definition)?;

        info!(
            "event=field_definition_create module=service status=ok field={id} entity_type={}",
            entity_kind.as_db_str()
        );
        Ok(definition)
    }

    /// Replaces an existing definition with re-normalized form input.
    pub fn update(&self, id: FieldId, draft: &FieldDefinitionDraft) -> RepoResult<FieldDefinition> {
        let (field_type, entity_kind, options) = self.parse_draft(draft)?;

        let definition = FieldDefinition {
            id,
            name: draft.name.trim().to_string(),
            field_type,
            entity_kind,
            options,
            required: draft.required,
        };
        self.repo.update_definition(&definition)?;

        info!("event=field_definition_update module=service status=ok field={id}");
        Ok(definition)
    }

    /// Deletes a definition; its values disappear with it.
    pub fn delete(&self, id: FieldId) -> RepoResult<()> {
        self.repo.delete_definition(id)?;
        info!("event=field_definition_delete module=service status=ok field={id}");
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn parse_draft(
        &self,
        draft: &FieldDefinitionDraft,
    ) -> RepoResult<(FieldType, EntityKind, Option<Vec<String>>)> {
        let mut validator = Validator::new();
        validator.require_text("name", &draft.name, 255);

        let field_type = FieldType::parse(draft.field_type.trim());
        if field_type.is_none() {
            validator.push("type", "type must be one of: text, number, date, select");
        }

        let entity_kind = EntityKind::parse(draft.entity_kind.trim());
        if entity_kind.is_none() {
            validator.push(
                "entity_type",
                "entity_type must be one of: Customer, Task, Activity",
            );
        }

        // Non-select types ignore submitted options entirely.
        let options = match field_type {
            Some(FieldType::Select) => {
                let parsed = draft
                    .raw_options
                    .as_deref()
                    .and_then(parse_select_options);
                if parsed.is_none() {
                    validator.push("options", "select fields need at least one option");
                }
                parsed
            }
            _ => None,
        };

        validator.finish().map_err(RepoError::Validation)?;

        // Safe: both parses were checked above.
        Ok((
            field_type.unwrap_or(FieldType::Text),
            entity_kind.unwrap_or(EntityKind::Customer),
            options,
        ))
    }
}
