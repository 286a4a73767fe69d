use minicrm_core::db::open_db_in_memory;
use minicrm_core::{
    CustomerDraft, CustomerService, EntityKind, FieldDefinitionDraft, FieldService, FieldType,
    RepoError, SqliteCustomerRepository, SqliteFieldRepository,
};
use rusqlite::Connection;
use std::collections::BTreeMap;
use uuid::Uuid;

fn field_draft(name: &str, field_type: &str, entity_kind: &str) -> FieldDefinitionDraft {
    FieldDefinitionDraft {
        name: name.to_string(),
        field_type: field_type.to_string(),
        entity_kind: entity_kind.to_string(),
        required: false,
        raw_options: None,
    }
}

#[test]
fn non_select_fields_store_null_options_regardless_of_input() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    for field_type in ["text", "number", "date"] {
        let created = service
            .create(&FieldDefinitionDraft {
                raw_options: Some("a,b,c".to_string()),
                ..field_draft("Ignored Options", field_type, "Customer")
            })
            .unwrap();
        assert_eq!(created.options, None);

        let stored: Option<String> = conn
            .query_row(
                "SELECT options FROM custom_fields WHERE uuid = ?1;",
                [created.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, None);
    }
}

#[test]
fn select_options_are_trimmed_deduplicated_and_ordered() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    let created = service
        .create(&FieldDefinitionDraft {
            raw_options: Some("a, b ,c".to_string()),
            ..field_draft("Tier", "select", "Customer")
        })
        .unwrap();
    assert_eq!(
        created.options,
        Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
    );

    let reloaded = service.get(created.id).unwrap();
    assert_eq!(reloaded.options, created.options);
    assert_eq!(reloaded.field_type, FieldType::Select);
}

#[test]
fn select_without_usable_options_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    for raw_options in [None, Some(" , , ".to_string())] {
        let err = service
            .create(&FieldDefinitionDraft {
                raw_options,
                ..field_draft("Empty Select", "select", "Customer")
            })
            .unwrap_err();
        match err {
            RepoError::Validation(validation) => assert!(validation.has_key("options")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn unknown_type_or_entity_kind_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    let err = service
        .create(&field_draft("Bad", "checkbox", "Invoice"))
        .unwrap_err();
    match err {
        RepoError::Validation(validation) => {
            assert!(validation.has_key("type"));
            assert!(validation.has_key("entity_type"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_renormalizes_options_and_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    let created = service
        .create(&FieldDefinitionDraft {
            raw_options: Some("red,green".to_string()),
            ..field_draft("Color", "select", "Task")
        })
        .unwrap();

    // Switching to text wipes the options even though the form resubmits.
    let updated = service
        .update(
            created.id,
            &FieldDefinitionDraft {
                raw_options: Some("red,green".to_string()),
                ..field_draft("Color", "text", "Task")
            },
        )
        .unwrap();
    assert_eq!(updated.options, None);
    assert_eq!(updated.field_type, FieldType::Text);

    let missing = Uuid::new_v4();
    let err = service
        .update(missing, &field_draft("Ghost", "text", "Task"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id, .. } if id == missing));
}

#[test]
fn list_is_scoped_by_entity_kind_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    let first = service
        .create(&field_draft("First", "text", "Customer"))
        .unwrap();
    let second = service
        .create(&field_draft("Second", "number", "Customer"))
        .unwrap();
    service.create(&field_draft("Other", "text", "Task")).unwrap();

    // Creation-order listing needs distinct created_at values; the default
    // is second-resolution for rows inserted in the same tick.
    conn.execute(
        "UPDATE custom_fields SET created_at = 1000 WHERE uuid = ?1;",
        [first.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE custom_fields SET created_at = 2000 WHERE uuid = ?1;",
        [second.id.to_string()],
    )
    .unwrap();

    let customer_fields = service.list(Some(EntityKind::Customer)).unwrap();
    assert_eq!(customer_fields.len(), 2);
    assert_eq!(customer_fields[0].id, first.id);
    assert_eq!(customer_fields[1].id, second.id);

    let all_fields = service.list(None).unwrap();
    assert_eq!(all_fields.len(), 3);
}

#[test]
fn deleting_a_definition_cascades_its_values() {
    let mut conn = open_db_in_memory().unwrap();

    let field_id = {
        let service = FieldService::new(SqliteFieldRepository::new(&conn));
        service
            .create(&FieldDefinitionDraft {
                required: false,
                ..field_draft("Budget", "number", "Customer")
            })
            .unwrap()
            .id
    };

    let customer_id = {
        let repo = SqliteCustomerRepository::new(&mut conn);
        let mut service = CustomerService::new(repo, Uuid::new_v4());
        service
            .create(&CustomerDraft {
                name: "Valued".to_string(),
                custom_fields: BTreeMap::from([(field_id, "500".to_string())]),
                ..CustomerDraft::default()
            })
            .unwrap()
            .customer
            .id
    };
    assert_eq!(count_values(&conn), 1);

    {
        let service = FieldService::new(SqliteFieldRepository::new(&conn));
        service.delete(field_id).unwrap();
    }

    // No orphaned values, and the owning entity is untouched.
    assert_eq!(count_values(&conn), 0);
    let repo = SqliteCustomerRepository::new(&mut conn);
    let service = CustomerService::new(repo, Uuid::new_v4());
    assert!(service.get(customer_id).unwrap().custom_values.is_empty());
}

#[test]
fn delete_unknown_definition_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = FieldService::new(SqliteFieldRepository::new(&conn));

    let err = service.delete(Uuid::new_v4()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "field definition",
            ..
        }
    ));
}

fn count_values(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM custom_field_values;", [], |row| {
        row.get(0)
    })
    .unwrap()
}
