//! Customer use-case service.
//!
//! # Responsibility
//! - Validate customer drafts: static field rules plus the dynamic
//!   custom-field plan built from live definitions.
//! - Delegate persistence to the customer repository.
//!
//! # Invariants
//! - The validation plan is rebuilt from the definition store on every
//!   create/update call; definition changes apply to the next request.
//! - Email uniqueness is checked app-side for a field-keyed message; the
//!   partial unique index remains the storage backstop.

use crate::model::customer::{Customer, CustomerId};
use crate::model::field::FieldId;
use crate::repo::customer_repo::{CustomerListQuery, CustomerRecord, CustomerRepository};
use crate::repo::{RepoError, RepoResult};
use crate::validation::{FieldPlan, Validator};
use log::info;
use std::collections::BTreeMap;
use uuid::Uuid;

const NAME_MAX_CHARS: usize = 255;
const PHONE_MAX_CHARS: usize = 50;
const TAG_MAX_CHARS: usize = 100;

/// Input for customer create/update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub social_links: Option<Vec<String>>,
    pub notes: Option<String>,
    pub segment: Option<String>,
    pub lifecycle_stage: Option<String>,
    /// Submitted custom values keyed by field definition id.
    pub custom_fields: BTreeMap<FieldId, String>,
}

/// Customer service facade over repository implementations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
    owner_id: Uuid,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service acting on behalf of one owning user.
    pub fn new(repo: R, owner_id: Uuid) -> Self {
        Self { repo, owner_id }
    }

    /// Creates a customer with its submitted custom values.
    pub fn create(&mut self, draft: &CustomerDraft) -> RepoResult<CustomerRecord> {
        self.validate(draft, None)?;

        let customer = self.build_customer(Uuid::new_v4(), draft);
        let values = super::stored_values(&draft.custom_fields);
        let id = self.repo.create_customer(&customer, &values)?;

        info!("event=customer_create module=service status=ok customer={id}");
        self.read_back(id, "created customer missing on read-back")
    }

    /// Replaces an existing customer and upserts its submitted values.
    pub fn update(&mut self, id: CustomerId, draft: &CustomerDraft) -> RepoResult<CustomerRecord> {
        self.validate(draft, Some(id))?;

        let customer = self.build_customer(id, draft);
        let values = super::stored_values(&draft.custom_fields);
        self.repo.update_customer(&customer, &values)?;

        info!("event=customer_update module=service status=ok customer={id}");
        self.read_back(id, "updated customer missing on read-back")
    }

    /// Gets one customer with its attached custom values.
    pub fn get(&self, id: CustomerId) -> RepoResult<CustomerRecord> {
        self.repo.get_customer(id)?.ok_or(RepoError::NotFound {
            entity: "customer",
            id,
        })
    }

    /// Lists customers, newest first.
    pub fn list(&self, query: &CustomerListQuery) -> RepoResult<Vec<Customer>> {
        self.repo.list_customers(query)
    }

    /// Hard-deletes a customer together with its values and activities.
    pub fn delete(&mut self, id: CustomerId) -> RepoResult<()> {
        self.repo.delete_customer(id)?;
        info!("event=customer_delete module=service status=ok customer={id}");
        Ok(())
    }

    fn validate(&self, draft: &CustomerDraft, existing: Option<CustomerId>) -> RepoResult<()> {
        let mut validator = Validator::new();
        validator.require_text("name", &draft.name, NAME_MAX_CHARS);
        validator.optional_email("email", draft.email.as_deref());
        validator.optional_text("phone", draft.phone.as_deref(), PHONE_MAX_CHARS);
        validator.optional_text("organization", draft.organization.as_deref(), NAME_MAX_CHARS);
        validator.optional_text("job_title", draft.job_title.as_deref(), NAME_MAX_CHARS);
        validator.optional_text("segment", draft.segment.as_deref(), TAG_MAX_CHARS);
        validator.optional_text(
            "lifecycle_stage",
            draft.lifecycle_stage.as_deref(),
            TAG_MAX_CHARS,
        );

        if let Some(email) = draft.email.as_deref() {
            if self.repo.email_in_use(email, existing)? {
                validator.push("email", "email is already in use");
            }
        }

        let definitions = self.repo.field_definitions()?;
        FieldPlan::from_definitions(&definitions).check(&draft.custom_fields, &mut validator);

        validator.finish().map_err(RepoError::Validation)
    }

    fn build_customer(&self, id: CustomerId, draft: &CustomerDraft) -> Customer {
        Customer {
            id,
            name: draft.name.trim().to_string(),
            email: draft.email.as_deref().map(|value| value.trim().to_string()),
            phone: draft.phone.clone(),
            organization: draft.organization.clone(),
            job_title: draft.job_title.clone(),
            social_links: draft.social_links.clone(),
            notes: draft.notes.clone(),
            segment: draft.segment.clone(),
            lifecycle_stage: draft.lifecycle_stage.clone(),
            owner_id: self.owner_id,
        }
    }

    fn read_back(&self, id: CustomerId, context: &str) -> RepoResult<CustomerRecord> {
        self.repo
            .get_customer(id)?
            .ok_or_else(|| RepoError::InvalidData(context.to_string()))
    }
}
