use std::sync::Arc;

use super::*;
use crate::storage::MemoryRepository;

struct Fixture {
    store: RecordStore,
    workflows: Arc<MemoryRepository<Workflow>>,
    records: Arc<MemoryRepository<WorkflowRecord>>,
}

fn fixture() -> Fixture {
    let workflows = Arc::new(MemoryRepository::<Workflow>::new());
    let records = Arc::new(MemoryRepository::<WorkflowRecord>::new());
    let repos = Repositories {
        workflows: workflows.clone(),
        records: records.clone(),
        revisions: Arc::new(MemoryRepository::<ApplicationRevision>::new()),
    };
    Fixture {
        store: RecordStore::new(repos),
        workflows,
        records,
    }
}

async fn seed_workflow(store: &RecordStore, app: &str, name: &str, records: usize) {
    store
        .add_workflow(&mut Workflow {
            name: name.to_string(),
            env_name: "prod".to_string(),
            app_primary_key: app.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    for i in 0..records {
        store
            .add_record(&mut WorkflowRecord {
                app_primary_key: app.to_string(),
                workflow_name: name.to_string(),
                name: format!("{}-v{}", name, i),
                revision_primary_key: format!("v{}", i),
                ..Default::default()
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_delete_workflow_removes_records_then_workflow() {
    let f = fixture();
    seed_workflow(&f.store, "shop", "deploy", 3).await;
    seed_workflow(&f.store, "shop", "hotfix", 1).await;

    let report = f.store.delete_workflow("shop", "deploy").await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.deleted.len(), 4);
    assert_eq!(report.deleted.last().unwrap(), "shop/deploy");
    assert_eq!(f.records.stored_count().await, 1);
    assert_eq!(f.workflows.stored_count().await, 1);
}

#[tokio::test]
async fn test_delete_workflow_continues_past_failed_record() {
    let f = fixture();
    seed_workflow(&f.store, "shop", "deploy", 3).await;
    f.records.fail_delete_for("shop/deploy/deploy-v1").await;

    let report = f.store.delete_workflow("shop", "deploy").await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "shop/deploy/deploy-v1");
    assert_eq!(f.records.stored_count().await, 1);
    assert!(f.store.get_workflow("shop", "deploy").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_workflow_survives_record_listing_failure() {
    let f = fixture();
    seed_workflow(&f.store, "shop", "deploy", 2).await;
    f.records.set_fail_on_list(true).await;

    let report = f.store.delete_workflow("shop", "deploy").await.unwrap();

    assert_eq!(report.deleted, vec!["shop/deploy".to_string()]);
    assert_eq!(f.records.stored_count().await, 2);
}

#[tokio::test]
async fn test_delete_missing_workflow_is_not_found() {
    let f = fixture();
    let err = f.store.delete_workflow("shop", "absent").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_workflows_by_app_cascades_each() {
    let f = fixture();
    seed_workflow(&f.store, "shop", "deploy", 2).await;
    seed_workflow(&f.store, "shop", "hotfix", 1).await;
    seed_workflow(&f.store, "blog", "deploy", 1).await;

    let report = f.store.delete_workflows_by_app("shop").await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.deleted.len(), 5);
    assert_eq!(f.workflows.stored_count().await, 1);
    assert_eq!(f.records.stored_count().await, 1);
}

#[tokio::test]
async fn test_delete_workflows_by_app_without_workflows() {
    let f = fixture();
    let report = f.store.delete_workflows_by_app("shop").await.unwrap();
    assert!(report.deleted.is_empty());
}

#[tokio::test]
async fn test_list_revisions_with_status() {
    let f = fixture();
    for (version, status) in [
        ("v1", RecordStatus::Running),
        ("v2", RecordStatus::Complete),
    ] {
        f.store
            .add_revision(&mut ApplicationRevision {
                app_primary_key: "shop".to_string(),
                version: version.to_string(),
                status,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let complete = f
        .store
        .list_revisions_with_status("shop", RecordStatus::Complete, &ListOptions::default())
        .await
        .unwrap();
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].version, "v2");
}
