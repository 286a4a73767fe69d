use minicrm_core::db::open_db_in_memory;
use minicrm_core::{
    ActivityDraft, ActivityListQuery, ActivityService, ActivityType, CustomerDraft,
    CustomerService, RepoError, SqliteActivityRepository, SqliteCustomerRepository,
};
use uuid::Uuid;

fn create_customer(conn: &mut rusqlite::Connection, owner: Uuid) -> Uuid {
    let repo = SqliteCustomerRepository::new(conn);
    let mut service = CustomerService::new(repo, owner);
    service
        .create(&CustomerDraft {
            name: "Activity Target".to_string(),
            ..CustomerDraft::default()
        })
        .unwrap()
        .customer
        .id
}

fn activity_draft(customer_id: Uuid, kind: ActivityType, date: i64) -> ActivityDraft {
    ActivityDraft {
        customer_id,
        kind,
        activity_date: date,
        notes: None,
        custom_fields: Default::default(),
    }
}

#[test]
fn log_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner);

    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, owner);

    let created = service
        .log(&ActivityDraft {
            notes: Some("intro call, went well".to_string()),
            ..activity_draft(customer_id, ActivityType::Call, 1_700_000_000_000)
        })
        .unwrap();

    let loaded = service.get(created.activity.id).unwrap();
    assert_eq!(loaded.activity.kind, ActivityType::Call);
    assert_eq!(loaded.activity.customer_id, customer_id);
    assert_eq!(loaded.activity.notes.as_deref(), Some("intro call, went well"));
    assert_eq!(loaded.activity.owner_id, owner);
}

#[test]
fn log_rejects_unknown_customer() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, Uuid::new_v4());

    let err = service
        .log(&activity_draft(Uuid::new_v4(), ActivityType::Email, 1_000))
        .unwrap_err();
    match err {
        RepoError::Validation(validation) => {
            assert!(validation.has_key("customer_id"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn every_activity_kind_round_trips() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner);

    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, owner);

    for kind in [ActivityType::Call, ActivityType::Email, ActivityType::Meeting] {
        let created = service.log(&activity_draft(customer_id, kind, 1_000)).unwrap();
        assert_eq!(service.get(created.activity.id).unwrap().activity.kind, kind);
    }
}

#[test]
fn list_is_scoped_to_customer_and_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_a = create_customer(&mut conn, owner);
    let customer_b = create_customer(&mut conn, owner);

    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, owner);

    let older = service
        .log(&activity_draft(customer_a, ActivityType::Call, 1_000))
        .unwrap();
    let newer = service
        .log(&activity_draft(customer_a, ActivityType::Meeting, 2_000))
        .unwrap();
    service
        .log(&activity_draft(customer_b, ActivityType::Email, 3_000))
        .unwrap();

    let timeline = service
        .list(&ActivityListQuery {
            customer: customer_a,
            limit: None,
            offset: 0,
        })
        .unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].id, newer.activity.id);
    assert_eq!(timeline[1].id, older.activity.id);
}

#[test]
fn update_changes_kind_and_date() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner);

    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, owner);

    let created = service
        .log(&activity_draft(customer_id, ActivityType::Call, 1_000))
        .unwrap();
    let updated = service
        .update(
            created.activity.id,
            &activity_draft(customer_id, ActivityType::Meeting, 5_000),
        )
        .unwrap();

    assert_eq!(updated.activity.kind, ActivityType::Meeting);
    assert_eq!(updated.activity.activity_date, 5_000);
}

#[test]
fn delete_removes_activity() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner);

    let repo = SqliteActivityRepository::new(&mut conn);
    let mut service = ActivityService::new(repo, owner);

    let created = service
        .log(&activity_draft(customer_id, ActivityType::Email, 1_000))
        .unwrap();
    service.delete(created.activity.id).unwrap();

    let err = service.get(created.activity.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "activity", .. }));
}
