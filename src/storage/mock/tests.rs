use crate::model::entity::{INDEX_APP_PRIMARY_KEY, INDEX_DEFAULT};
use crate::model::Workflow;

use super::*;

fn workflow(app: &str, name: &str, default: Option<bool>) -> Workflow {
    Workflow {
        name: name.to_string(),
        env_name: "prod".to_string(),
        app_primary_key: app.to_string(),
        default,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_add_and_get_stamps_timestamps() {
    let repo = MemoryRepository::<Workflow>::new();
    let mut wf = workflow("shop", "deploy", None);

    repo.add(&mut wf).await.unwrap();
    assert!(!is_unset(&wf.base.create_time));

    let stored = repo.get("shop/deploy").await.unwrap();
    assert_eq!(stored.name, "deploy");
    assert_eq!(stored.base.create_time, wf.base.create_time);
}

#[tokio::test]
async fn test_add_duplicate_is_rejected() {
    let repo = MemoryRepository::<Workflow>::new();
    repo.add(&mut workflow("shop", "deploy", None)).await.unwrap();

    let err = repo
        .add(&mut workflow("shop", "deploy", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }));
}

#[tokio::test]
async fn test_missing_entity_is_not_found() {
    let repo = MemoryRepository::<Workflow>::new();
    assert!(repo.get("shop/absent").await.unwrap_err().is_not_found());
    assert!(repo.delete("shop/absent").await.unwrap_err().is_not_found());
    assert!(repo
        .put(&mut workflow("shop", "absent", None))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_put_keeps_create_time() {
    let repo = MemoryRepository::<Workflow>::new();
    let mut wf = workflow("shop", "deploy", None);
    repo.add(&mut wf).await.unwrap();
    let created = wf.base.create_time;

    let mut update = workflow("shop", "deploy", Some(true));
    repo.put(&mut update).await.unwrap();

    let stored = repo.get("shop/deploy").await.unwrap();
    assert_eq!(stored.base.create_time, created);
    assert_eq!(stored.default, Some(true));
}

#[tokio::test]
async fn test_list_filters_in_insertion_order() {
    let repo = MemoryRepository::<Workflow>::new();
    repo.add(&mut workflow("shop", "b", Some(true))).await.unwrap();
    repo.add(&mut workflow("shop", "a", Some(true))).await.unwrap();
    repo.add(&mut workflow("shop", "c", Some(false))).await.unwrap();
    repo.add(&mut workflow("blog", "d", Some(true))).await.unwrap();

    let mut filter = Index::new();
    filter.insert(INDEX_APP_PRIMARY_KEY, "shop".to_string());
    filter.insert(INDEX_DEFAULT, "true".to_string());

    let listed = repo.list(&filter, &ListOptions::default()).await.unwrap();
    let names: Vec<_> = listed.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);

    assert_eq!(repo.count(&filter, None).await.unwrap(), 2);
}

#[tokio::test]
async fn test_injected_delete_failure_is_per_key() {
    let repo = MemoryRepository::<Workflow>::new();
    repo.add(&mut workflow("shop", "a", None)).await.unwrap();
    repo.add(&mut workflow("shop", "b", None)).await.unwrap();
    repo.fail_delete_for("shop/a").await;

    assert!(matches!(
        repo.delete("shop/a").await,
        Err(StorageError::Unavailable(_))
    ));
    repo.delete("shop/b").await.unwrap();
    assert_eq!(repo.stored_count().await, 1);
}

#[tokio::test]
async fn test_injected_put_and_delete_failures_leave_store_unchanged() {
    let repo = MemoryRepository::<Workflow>::new();
    repo.add(&mut workflow("shop", "deploy", None)).await.unwrap();

    repo.set_fail_on_put(true).await;
    assert!(matches!(
        repo.put(&mut workflow("shop", "deploy", Some(true))).await,
        Err(StorageError::Unavailable(_))
    ));
    repo.set_fail_on_put(false).await;
    assert_eq!(repo.get("shop/deploy").await.unwrap().default, None);

    repo.set_fail_on_delete(true).await;
    assert!(matches!(
        repo.delete("shop/deploy").await,
        Err(StorageError::Unavailable(_))
    ));
    repo.set_fail_on_delete(false).await;
    assert_eq!(repo.stored_count().await, 1);
    repo.delete("shop/deploy").await.unwrap();
    assert_eq!(repo.stored_count().await, 0);
}
