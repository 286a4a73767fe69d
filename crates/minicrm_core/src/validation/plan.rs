//! Per-request validation plan for custom fields.
//!
//! # Responsibility
//! - Turn the live field-definition list into the rule set applied to one
//!   entity create/update request.
//! - Check required-ness and declared value shape per submitted entry.
//!
//! # Invariants
//! - A plan is built fresh for every request; definitions added or removed
//!   by an administrator affect the next request, never a cached plan.
//! - Rule keys use the `custom_fields.<field_id>` namespace.
//! - Entries with no matching rule are left for the value store to reject;
//!   the plan itself never fails on unknown keys.

use crate::model::field::{FieldDefinition, FieldId, FieldType};
use crate::validation::{is_date_like, is_numeric, Validator};
use std::collections::BTreeMap;

/// Value-shape check derived from a definition's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ValueCheck {
    /// Free text, anything goes.
    Any,
    /// Must parse as a number.
    Number,
    /// Must look like a calendar date.
    Date,
    /// Must be one of the configured options.
    OneOf(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldRule {
    field_id: FieldId,
    key: String,
    name: String,
    required: bool,
    check: ValueCheck,
}

/// Rule set applied to the `custom_fields` map of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPlan {
    rules: Vec<FieldRule>,
}

impl FieldPlan {
    /// Builds the plan from the current definition list.
    pub fn from_definitions(definitions: &[FieldDefinition]) -> Self {
        let rules = definitions
            .iter()
            .map(|definition| FieldRule {
                field_id: definition.id,
                key: format!("custom_fields.{}", definition.id),
                name: definition.name.clone(),
                required: definition.required,
                check: match definition.field_type {
                    FieldType::Text => ValueCheck::Any,
                    FieldType::Number => ValueCheck::Number,
                    FieldType::Date => ValueCheck::Date,
                    FieldType::Select => {
                        ValueCheck::OneOf(definition.options.clone().unwrap_or_default())
                    }
                },
            })
            .collect();
        Self { rules }
    }

    /// Number of rules in this plan.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule to the submitted map, recording messages into
    /// `validator`.
    ///
    /// Blank submissions count as absent: required fields reject them,
    /// optional fields pass them through (stored as NULL later).
    pub fn check(&self, submitted: &BTreeMap<FieldId, String>, validator: &mut Validator) {
        for rule in &self.rules {
            let value = submitted
                .get(&rule.field_id)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty());

            match value {
                None => {
                    if rule.required {
                        validator.push(&rule.key, format!("{} is required", rule.name));
                    }
                }
                Some(value) => match &rule.check {
                    ValueCheck::Any => {}
                    ValueCheck::Number => {
                        if !is_numeric(value) {
                            validator.push(&rule.key, format!("{} must be a number", rule.name));
                        }
                    }
                    ValueCheck::Date => {
                        if !is_date_like(value) {
                            validator.push(&rule.key, format!("{} must be a date", rule.name));
                        }
                    }
                    ValueCheck::OneOf(options) => {
                        if !options.iter().any(|option| option == value) {
                            validator.push(
                                &rule.key,
                                format!("{} must be one of: {}", rule.name, options.join(", ")),
                            );
                        }
                    }
                },
            }
        }
    }
}
