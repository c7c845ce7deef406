use std::sync::Arc;

use bson::oid::ObjectId;
use parking_lot::Mutex;
use sitedesk_db::models::{Expense, LedgerEntry, NotificationKind, UserRole};
use sitedesk_services::dao::base::DaoError;
use sitedesk_services::notify::{
    AccountAction, ChangeAction, ChangeEvent, DispatchError, FallbackStyle, LedgerEvent,
    NotificationDispatcher, ProjectChange,
};
use tracing::warn;

use crate::fixtures::{self, memory::MemoryDirectory, memory::MemoryRepo};

struct Scene {
    repo: Arc<MemoryRepo>,
    dispatcher: NotificationDispatcher,
    admin_id: ObjectId,
    project_id: ObjectId,
}

/// One admin-owned project plus an acting member known by auth id.
fn owned_project_scene() -> Scene {
    let admin_id = ObjectId::new();
    let actor_id = ObjectId::new();
    let project_id = ObjectId::new();

    let directory = Arc::new(
        MemoryDirectory::default()
            .with_users(vec![
                fixtures::user(admin_id, "Ana Petrova", None, UserRole::Admin),
                fixtures::user(actor_id, "Uri Levin", Some("auth0|uri"), UserRole::Member),
            ])
            .with_projects(vec![fixtures::project(
                project_id,
                "Riverside House",
                Some(admin_id),
            )]),
    );
    let repo = Arc::new(MemoryRepo::new());
    let dispatcher = fixtures::dispatcher(repo.clone(), directory, FallbackStyle::Sentinel);

    Scene {
        repo,
        dispatcher,
        admin_id,
        project_id,
    }
}

#[tokio::test]
async fn expense_event_notifies_the_project_admin() {
    let scene = owned_project_scene();

    let row = scene
        .dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Added,
            LedgerEvent {
                entry: LedgerEntry::Expense,
                amount: 500.0,
                category: "Cement".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(row.recipient_id, scene.admin_id);
    assert_eq!(row.kind, NotificationKind::ExpenseAdded);
    assert_eq!(row.title, "Expense Added");
    assert_eq!(row.subject_id, Some(scene.project_id));
    assert!(!row.is_read);
    assert_eq!(
        row.message,
        "Uri Levin added an expense of 500 in Cement on Riverside House"
    );
    assert_eq!(row.payload.get_f64("amount").unwrap(), 500.0);
    assert_eq!(row.payload.get_str("category").unwrap(), "Cement");

    let stored = scene.repo.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, row.id);
}

#[tokio::test]
async fn income_events_pick_the_income_kinds() {
    let scene = owned_project_scene();

    let row = scene
        .dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Updated,
            LedgerEvent {
                entry: LedgerEntry::Income,
                amount: 1250.5,
                category: "Client Payment".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(row.kind, NotificationKind::IncomeUpdated);
    assert!(row.message.contains("updated an income of 1250.5"));
}

#[tokio::test]
async fn phase_and_material_events_describe_the_item() {
    let scene = owned_project_scene();

    let phase = scene
        .dispatcher
        .dispatch_phase_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Added,
            "Foundation",
        )
        .await
        .unwrap();
    assert_eq!(phase.kind, NotificationKind::PhaseAdded);
    assert_eq!(
        phase.message,
        "Uri Levin added the phase \"Foundation\" on Riverside House"
    );

    let material = scene
        .dispatcher
        .dispatch_material_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Deleted,
            "Rebar",
            40.0,
            "tons",
        )
        .await
        .unwrap();
    assert_eq!(material.kind, NotificationKind::MaterialDeleted);
    assert_eq!(
        material.message,
        "Uri Levin deleted material \"Rebar\" (40 tons) on Riverside House"
    );
}

#[tokio::test]
async fn project_update_lists_changed_fields() {
    let scene = owned_project_scene();

    let row = scene
        .dispatcher
        .dispatch_project_event(
            "auth0|uri",
            scene.project_id,
            ProjectChange::Updated,
            &["name".to_string(), "address".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(row.kind, NotificationKind::ProjectUpdated);
    assert_eq!(
        row.message,
        "Uri Levin updated name, address on Riverside House"
    );
}

#[tokio::test]
async fn ownerless_project_persists_nothing() {
    let project_id = ObjectId::new();
    let directory = Arc::new(
        MemoryDirectory::default()
            .with_projects(vec![fixtures::project(project_id, "Orphan Site", None)]),
    );
    let repo = Arc::new(MemoryRepo::new());
    let dispatcher = fixtures::dispatcher(repo.clone(), directory, FallbackStyle::Sentinel);

    let err = dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            project_id,
            ChangeAction::Added,
            LedgerEvent {
                entry: LedgerEntry::Expense,
                amount: 10.0,
                category: "Misc".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RecipientNotFound { .. }));

    let err = dispatcher
        .dispatch_phase_event("auth0|uri", project_id, ChangeAction::Added, "Roofing")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RecipientNotFound { .. }));

    let err = dispatcher
        .dispatch_material_event("auth0|uri", project_id, ChangeAction::Added, "Sand", 1.0, "m3")
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RecipientNotFound { .. }));

    let err = dispatcher
        .dispatch_project_event("auth0|uri", project_id, ProjectChange::Created, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RecipientNotFound { .. }));

    assert!(repo.stored().is_empty());
}

#[tokio::test]
async fn unknown_actor_degrades_to_the_fallback_name() {
    let admin_id = ObjectId::new();
    let project_id = ObjectId::new();
    let directory = Arc::new(MemoryDirectory::default().with_projects(vec![fixtures::project(
        project_id,
        "Riverside House",
        Some(admin_id),
    )]));
    let repo = Arc::new(MemoryRepo::new());
    let dispatcher = fixtures::dispatcher(repo, directory, FallbackStyle::Sentinel);

    let row = dispatcher
        .dispatch_expense_event(
            "auth0|ghost",
            project_id,
            ChangeAction::Added,
            LedgerEvent {
                entry: LedgerEntry::Expense,
                amount: 99.0,
                category: "Tools".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(row.message.starts_with("Unknown User added"));
}

#[tokio::test]
async fn failed_insert_surfaces_and_persists_nothing() {
    let scene = owned_project_scene();
    scene.repo.set_fail_writes(true);

    let err = scene
        .dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Added,
            LedgerEvent {
                entry: LedgerEntry::Expense,
                amount: 500.0,
                category: "Cement".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Persistence(_)));
    assert!(scene.repo.stored().is_empty());
}

#[tokio::test]
async fn account_events_are_addressed_explicitly() {
    let scene = owned_project_scene();

    let row = scene
        .dispatcher
        .dispatch_user_event(scene.admin_id, "auth0|uri", AccountAction::Joined)
        .await
        .unwrap();

    assert_eq!(row.recipient_id, scene.admin_id);
    assert_eq!(row.kind, NotificationKind::UserJoined);
    assert_eq!(row.subject_id, None);
    assert_eq!(row.message, "Uri Levin joined the workspace");
}

/// Mirrors the ledger route glue: lookup scoped to the path's project,
/// primary write, then a best-effort dispatch that is logged rather
/// than propagated.
async fn update_expense_amount(
    ledger: &Mutex<Vec<Expense>>,
    dispatcher: &NotificationDispatcher,
    project_id: ObjectId,
    expense_id: ObjectId,
    amount: f64,
) -> Result<Expense, DaoError> {
    let updated = {
        let mut rows = ledger.lock();
        let row = rows
            .iter_mut()
            .find(|e| e.id == Some(expense_id) && e.project_id == project_id)
            .ok_or(DaoError::NotFound)?;
        row.amount = amount;
        row.clone()
    };

    if let Err(e) = dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            project_id,
            ChangeAction::Updated,
            LedgerEvent {
                entry: updated.entry,
                amount: updated.amount,
                category: updated.category.clone(),
            },
        )
        .await
    {
        warn!(%project_id, %e, "expense notification failed");
    }
    Ok(updated)
}

#[tokio::test]
async fn failed_dispatch_does_not_fail_the_primary_write() {
    let scene = owned_project_scene();
    let row = fixtures::expense(scene.project_id, 100.0);
    let id = row.id.unwrap();
    let ledger = Mutex::new(vec![row]);

    scene.repo.set_fail_writes(true);
    let updated = update_expense_amount(&ledger, &scene.dispatcher, scene.project_id, id, 750.0)
        .await
        .unwrap();

    // The ledger write stuck even though nothing was notified.
    assert_eq!(updated.amount, 750.0);
    assert_eq!(ledger.lock()[0].amount, 750.0);
    assert!(scene.repo.stored().is_empty());
}

#[tokio::test]
async fn cross_project_update_is_rejected_before_dispatch() {
    let scene = owned_project_scene();
    let foreign = fixtures::expense(ObjectId::new(), 100.0);
    let id = foreign.id.unwrap();
    let ledger = Mutex::new(vec![foreign]);

    let err = update_expense_amount(&ledger, &scene.dispatcher, scene.project_id, id, 750.0)
        .await
        .unwrap_err();

    assert!(matches!(err, DaoError::NotFound));
    assert_eq!(ledger.lock()[0].amount, 100.0);
    assert!(scene.repo.stored().is_empty());
}

#[tokio::test]
async fn dispatch_fans_out_to_live_subscribers() {
    let scene = owned_project_scene();
    let mut subscription = scene.repo.hub().subscribe(scene.admin_id);

    let row = scene
        .dispatcher
        .dispatch_expense_event(
            "auth0|uri",
            scene.project_id,
            ChangeAction::Added,
            LedgerEvent {
                entry: LedgerEntry::Expense,
                amount: 500.0,
                category: "Cement".to_string(),
            },
        )
        .await
        .unwrap();

    match subscription.recv().await.unwrap() {
        ChangeEvent::Inserted(delivered) => assert_eq!(delivered.id, row.id),
        other => panic!("expected insert event, got {other:?}"),
    }
}
