use std::sync::Arc;

use anyhow::Result;
use sqlx::types::Uuid;

use tapfolio_runtime::{
    CardAdmission, CardLifecycle, CardPatch, CardProfile, CardServiceError, CardStore,
    IdentityHints, MemoryCardStore,
};

fn profile(first: &str, last: &str) -> CardProfile {
    CardProfile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..CardProfile::default()
    }
}

fn services() -> (
    Arc<MemoryCardStore>,
    CardAdmission<MemoryCardStore>,
    CardLifecycle<MemoryCardStore>,
) {
    let store = Arc::new(MemoryCardStore::new());
    (
        store.clone(),
        CardAdmission::new(store.clone()),
        CardLifecycle::new(store),
    )
}

#[tokio::test]
async fn patch_touches_only_provided_fields() -> Result<()> {
    let (_store, admission, lifecycle) = services();
    let mut initial = profile("Jane", "Doe");
    initial.organization = Some("Acme".to_string());
    let admitted = admission
        .create_card("user-1", &IdentityHints::default(), initial)
        .await?;

    let patch = CardPatch {
        title: Some("Engineer".to_string()),
        ..CardPatch::default()
    };
    let updated = lifecycle
        .update_card(admitted.card_id, "user-1", patch)
        .await?;

    assert_eq!(updated.title.as_deref(), Some("Engineer"));
    assert_eq!(updated.first_name, "Jane");
    assert_eq!(updated.organization.as_deref(), Some("Acme"));
    // Editing the profile never moves the published URL.
    assert_eq!(updated.slug, admitted.slug);

    Ok(())
}

#[tokio::test]
async fn foreign_caller_cannot_mutate_or_delete() -> Result<()> {
    let (store, admission, lifecycle) = services();
    let admitted = admission
        .create_card("user-1", &IdentityHints::default(), profile("Jane", "Doe"))
        .await?;

    let patch = CardPatch {
        first_name: Some("Mallory".to_string()),
        ..CardPatch::default()
    };
    let err = lifecycle
        .update_card(admitted.card_id, "user-2", patch)
        .await
        .unwrap_err();
    assert!(matches!(err, CardServiceError::PermissionDenied));

    let err = lifecycle
        .delete_card(admitted.card_id, "user-2")
        .await
        .unwrap_err();
    assert!(matches!(err, CardServiceError::PermissionDenied));

    // Card and true owner's usage are untouched.
    let card = store.get_card(admitted.card_id).await?.expect("card exists");
    assert_eq!(card.first_name, "Jane");
    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 1);

    Ok(())
}

#[tokio::test]
async fn unpublishing_hides_the_card_without_freeing_quota() -> Result<()> {
    let (store, admission, lifecycle) = services();
    let admitted = admission
        .create_card("user-1", &IdentityHints::default(), profile("Jane", "Doe"))
        .await?;

    assert_eq!(lifecycle.resolve_slug(&admitted.slug).await?.id, admitted.card_id);

    lifecycle
        .set_active(admitted.card_id, "user-1", false)
        .await?;
    let err = lifecycle.resolve_slug(&admitted.slug).await.unwrap_err();
    assert!(matches!(err, CardServiceError::NotFound { .. }));

    // Unpublished is not deleted: the card still counts against the quota
    // and keeps its slug.
    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 1);
    assert!(store.slug_exists(&admitted.slug).await?);

    lifecycle
        .set_active(admitted.card_id, "user-1", true)
        .await?;
    assert_eq!(lifecycle.resolve_slug(&admitted.slug).await?.id, admitted.card_id);

    Ok(())
}

#[tokio::test]
async fn double_delete_reports_not_found_and_usage_stays_floored() -> Result<()> {
    let (store, admission, lifecycle) = services();
    let admitted = admission
        .create_card("user-1", &IdentityHints::default(), profile("Jane", "Doe"))
        .await?;

    lifecycle.delete_card(admitted.card_id, "user-1").await?;
    let err = lifecycle
        .delete_card(admitted.card_id, "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, CardServiceError::NotFound { .. }));

    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 0);

    Ok(())
}

#[tokio::test]
async fn missing_card_reads_as_not_found() -> Result<()> {
    let (_store, _admission, lifecycle) = services();

    let err = lifecycle
        .update_card(Uuid::new_v4(), "user-1", CardPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CardServiceError::NotFound { .. }));

    let err = lifecycle.resolve_slug("no-such-slug").await.unwrap_err();
    assert!(matches!(err, CardServiceError::NotFound { .. }));

    Ok(())
}
