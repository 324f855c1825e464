use std::sync::Arc;

use anyhow::Result;

use tapfolio_runtime::{
    CardAdmission, CardLifecycle, CardProfile, CardServiceError, CardStore, IdentityHints,
    MemoryCardStore, PlanTier,
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

async fn assert_usage_matches_live_cards(store: &MemoryCardStore, user_id: &str) {
    let account = store
        .get_account(user_id)
        .await
        .unwrap()
        .expect("account exists");
    let live = store.cards_by_owner(user_id).await.unwrap().len() as i64;
    assert_eq!(
        account.cards_created, live,
        "cards_created diverged from the live card count"
    );
}

#[tokio::test]
async fn quota_boundary_allows_two_then_rejects() -> Result<()> {
    let (store, admission, lifecycle) = services();
    let hints = IdentityHints::default();

    let first = admission
        .create_card("user-1", &hints, profile("Jane", "Doe"))
        .await?;
    admission
        .create_card("user-1", &hints, profile("Jane", "Smith"))
        .await?;

    let err = admission
        .create_card("user-1", &hints, profile("Jane", "Miller"))
        .await
        .unwrap_err();
    match err {
        CardServiceError::QuotaExceeded { plan, limit, used } => {
            assert_eq!(plan, PlanTier::Free);
            assert_eq!(limit, 2);
            assert_eq!(used, 2);
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
    assert_usage_matches_live_cards(&store, "user-1").await;

    // Freeing a slot re-opens admission.
    lifecycle.delete_card(first.card_id, "user-1").await?;
    admission
        .create_card("user-1", &hints, profile("Jane", "Again"))
        .await?;
    assert_usage_matches_live_cards(&store, "user-1").await;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_admit_exactly_one() -> Result<()> {
    let (store, admission, _lifecycle) = services();
    store.update_plan_limits(1, 999).await?;

    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let admission = admission.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            admission
                .create_card("user-1", &IdentityHints::default(), profile("Jane", "Doe"))
                .await
        }));
    }

    let mut successes = 0;
    let mut quota_failures = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => successes += 1,
            Err(CardServiceError::QuotaExceeded { .. }) => quota_failures += 1,
            Err(other) => panic!("expected success or QuotaExceeded, got {other:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(quota_failures, 1);

    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 1);
    assert_eq!(store.cards_by_owner("user-1").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn usage_counter_tracks_creates_and_deletes() -> Result<()> {
    let (store, admission, lifecycle) = services();
    let hints = IdentityHints::default();

    let a = admission
        .create_card("user-1", &hints, profile("Ada", "Lovelace"))
        .await?;
    assert_usage_matches_live_cards(&store, "user-1").await;

    let b = admission
        .create_card("user-1", &hints, profile("Grace", "Hopper"))
        .await?;
    assert_usage_matches_live_cards(&store, "user-1").await;

    // Failed attempt leaves no trace.
    assert!(admission
        .create_card("user-1", &hints, profile("Edsger", "Dijkstra"))
        .await
        .is_err());
    assert_usage_matches_live_cards(&store, "user-1").await;

    lifecycle.delete_card(a.card_id, "user-1").await?;
    assert_usage_matches_live_cards(&store, "user-1").await;

    lifecycle.delete_card(b.card_id, "user-1").await?;
    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 0);

    Ok(())
}

#[tokio::test]
async fn colliding_names_get_distinct_slugs() -> Result<()> {
    let (_store, admission, _lifecycle) = services();
    let hints = IdentityHints::default();

    let first = admission
        .create_card("user-1", &hints, profile("Jane", "Doe"))
        .await?;
    let second = admission
        .create_card("user-2", &hints, profile("Jane", "Doe"))
        .await?;

    assert_eq!(first.slug, "jane-doe");
    assert_ne!(second.slug, first.slug);
    assert!(second.slug.starts_with("jane-doe-"));

    Ok(())
}

#[tokio::test]
async fn client_proposed_slug_is_sanitized_and_disambiguated() -> Result<()> {
    let (_store, admission, _lifecycle) = services();
    let hints = IdentityHints::default();

    let mut wanted = profile("Jane", "Doe");
    wanted.slug = Some("My Card!".to_string());
    let first = admission.create_card("user-1", &hints, wanted.clone()).await?;
    assert_eq!(first.slug, "my-card");

    let second = admission.create_card("user-2", &hints, wanted).await?;
    assert!(second.slug.starts_with("my-card-"));

    Ok(())
}

#[tokio::test]
async fn accounts_survive_repeated_ensure() -> Result<()> {
    let (store, admission, _lifecycle) = services();
    let hints = IdentityHints {
        display_name: Some("Jane".to_string()),
        ..IdentityHints::default()
    };

    admission
        .create_card("user-1", &hints, profile("Jane", "Doe"))
        .await?;

    // A later ensure must not reset the usage counter.
    let account = store.ensure_account("user-1", &hints).await?;
    assert_eq!(account.cards_created, 1);
    assert_eq!(account.display_name, "Jane");

    Ok(())
}
