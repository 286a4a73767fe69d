use minicrm_core::db::open_db_in_memory;
use minicrm_core::{
    CustomerDraft, CustomerService, RepoError, SqliteCustomerRepository, SqliteTaskRepository,
    TaskDraft, TaskListQuery, TaskService,
};
use uuid::Uuid;

fn task_draft(title: &str, due_date: i64) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        due_date: Some(due_date),
        ..TaskDraft::default()
    }
}

fn create_customer(conn: &mut rusqlite::Connection, owner: Uuid, name: &str) -> Uuid {
    let repo = SqliteCustomerRepository::new(conn);
    let mut service = CustomerService::new(repo, owner);
    service
        .create(&CustomerDraft {
            name: name.to_string(),
            ..CustomerDraft::default()
        })
        .unwrap()
        .customer
        .id
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, owner);

    let created = service
        .create(&TaskDraft {
            description: Some("send the proposal".to_string()),
            ..task_draft("send proposal", 1_800_000_000_000)
        })
        .unwrap();

    let loaded = service.get(created.task.id).unwrap();
    assert_eq!(loaded.task.title, "send proposal");
    assert_eq!(loaded.task.due_date, 1_800_000_000_000);
    assert!(!loaded.task.completed);
    assert_eq!(loaded.task.owner_id, owner);
}

#[test]
fn create_requires_title_and_due_date() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, Uuid::new_v4());

    let err = service
        .create(&TaskDraft {
            title: " ".to_string(),
            due_date: None,
            ..TaskDraft::default()
        })
        .unwrap_err();
    match err {
        RepoError::Validation(validation) => {
            assert!(validation.has_key("title"));
            assert!(validation.has_key("due_date"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_rejects_unknown_customer_reference() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, Uuid::new_v4());

    let err = service
        .create(&TaskDraft {
            customer_id: Some(Uuid::new_v4()),
            ..task_draft("orphan", 1_800_000_000_000)
        })
        .unwrap_err();
    match err {
        RepoError::Validation(validation) => {
            assert_eq!(
                validation.message_for("customer_id"),
                Some("customer does not exist")
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_orders_by_due_date_and_filters_by_customer() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner, "Filter Target");

    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, owner);

    let late = service
        .create(&TaskDraft {
            customer_id: Some(customer_id),
            ..task_draft("late", 3_000)
        })
        .unwrap();
    let early = service
        .create(&TaskDraft {
            customer_id: Some(customer_id),
            ..task_draft("early", 1_000)
        })
        .unwrap();
    service.create(&task_draft("unlinked", 2_000)).unwrap();

    let scoped = service
        .list(&TaskListQuery {
            customer: Some(customer_id),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(scoped.len(), 2);
    assert_eq!(scoped[0].id, early.task.id);
    assert_eq!(scoped[1].id, late.task.id);

    let all = service.list(&TaskListQuery::default()).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn complete_marks_task_and_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, Uuid::new_v4());

    let created = service.create(&task_draft("finish me", 1_000)).unwrap();

    let completed = service.complete(created.task.id).unwrap();
    assert!(completed.task.completed);

    let completed_again = service.complete(created.task.id).unwrap();
    assert!(completed_again.task.completed);
}

#[test]
fn complete_unknown_task_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, Uuid::new_v4());

    let missing = Uuid::new_v4();
    let err = service.complete(missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "task", id } if id == missing));
}

#[test]
fn update_moves_due_date_and_link() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let customer_id = create_customer(&mut conn, owner, "Linked Later");

    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, owner);
    let created = service.create(&task_draft("movable", 1_000)).unwrap();

    let updated = service
        .update(
            created.task.id,
            &TaskDraft {
                customer_id: Some(customer_id),
                ..task_draft("movable", 9_000)
            },
        )
        .unwrap();
    assert_eq!(updated.task.due_date, 9_000);
    assert_eq!(updated.task.customer_id, Some(customer_id));
}

#[test]
fn delete_removes_task() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&mut conn);
    let mut service = TaskService::new(repo, Uuid::new_v4());

    let created = service.create(&task_draft("temp", 1_000)).unwrap();
    service.delete(created.task.id).unwrap();

    let err = service.get(created.task.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}
