//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `minicrm_core` linkage.
//! - Exercise the full stack once (migrations, customer create, list)
//!   against an in-memory database.

use minicrm_core::db::open_db_in_memory;
use minicrm_core::{
    CustomerDraft, CustomerListQuery, CustomerService, SqliteCustomerRepository,
};
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("minicrm_core version={}", minicrm_core::core_version());

    let mut conn = open_db_in_memory()?;
    let repo = SqliteCustomerRepository::new(&mut conn);
    let mut service = CustomerService::new(repo, Uuid::new_v4());

    let draft = CustomerDraft {
        name: "Smoke Test Customer".to_string(),
        email: Some("smoke@example.com".to_string()),
        ..CustomerDraft::default()
    };
    let created = service.create(&draft)?;
    println!("created customer id={}", created.customer.id);

    let listed = service.list(&CustomerListQuery::default())?;
    println!("customers listed={}", listed.len());

    Ok(())
}
