use std::sync::Arc;

use anyhow::Result;
use sqlx::types::Uuid;

use tapfolio_runtime::{
    ActivityKind, CardAdmission, CardLifecycle, CardProfile, CardServiceError, IdentityHints,
    MemoryCardStore, StatsCounter,
};

fn services() -> (
    CardAdmission<MemoryCardStore>,
    CardLifecycle<MemoryCardStore>,
    StatsCounter<MemoryCardStore>,
) {
    let store = Arc::new(MemoryCardStore::new());
    (
        CardAdmission::new(store.clone()),
        CardLifecycle::new(store.clone()),
        StatsCounter::new(store),
    )
}

async fn one_card(admission: &CardAdmission<MemoryCardStore>) -> Result<Uuid> {
    let admitted = admission
        .create_card(
            "user-1",
            &IdentityHints::default(),
            CardProfile {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                ..CardProfile::default()
            },
        )
        .await?;
    Ok(admitted.card_id)
}

#[tokio::test]
async fn fresh_card_starts_at_zero() -> Result<()> {
    let (admission, _lifecycle, stats) = services();
    let card_id = one_card(&admission).await?;

    let snapshot = stats.get_stats(card_id).await?;
    assert_eq!(snapshot.views, 0);
    assert_eq!(snapshot.downloads, 0);
    assert_eq!(snapshot.shares, 0);
    assert_eq!(snapshot.last_viewed, None);

    Ok(())
}

#[tokio::test]
async fn counters_increment_independently() -> Result<()> {
    let (admission, _lifecycle, stats) = services();
    let card_id = one_card(&admission).await?;

    stats.record_activity(card_id, ActivityKind::View).await?;
    stats.record_activity(card_id, ActivityKind::View).await?;
    stats
        .record_activity(card_id, ActivityKind::Download)
        .await?;

    let snapshot = stats.get_stats(card_id).await?;
    assert_eq!(snapshot.views, 2);
    assert_eq!(snapshot.downloads, 1);
    assert_eq!(snapshot.shares, 0);
    assert!(snapshot.last_viewed.is_some());

    Ok(())
}

#[tokio::test]
async fn only_views_touch_last_viewed() -> Result<()> {
    let (admission, _lifecycle, stats) = services();
    let card_id = one_card(&admission).await?;

    stats
        .record_activity(card_id, ActivityKind::Download)
        .await?;
    stats.record_activity(card_id, ActivityKind::Share).await?;

    let snapshot = stats.get_stats(card_id).await?;
    assert_eq!(snapshot.downloads, 1);
    assert_eq!(snapshot.shares, 1);
    assert_eq!(snapshot.last_viewed, None);

    Ok(())
}

#[tokio::test]
async fn unknown_card_reads_zero_but_rejects_recordings() -> Result<()> {
    let (_admission, _lifecycle, stats) = services();
    let missing = Uuid::new_v4();

    let snapshot = stats.get_stats(missing).await?;
    assert_eq!(snapshot.views, 0);
    assert_eq!(snapshot.last_viewed, None);

    let err = stats
        .record_activity(missing, ActivityKind::View)
        .await
        .unwrap_err();
    assert!(matches!(err, CardServiceError::NotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn stats_are_cleaned_up_with_the_card() -> Result<()> {
    let (admission, lifecycle, stats) = services();
    let card_id = one_card(&admission).await?;

    stats.record_activity(card_id, ActivityKind::View).await?;
    lifecycle.delete_card(card_id, "user-1").await?;

    // All-zero once the card and its counters are gone.
    let snapshot = stats.get_stats(card_id).await?;
    assert_eq!(snapshot.views, 0);

    Ok(())
}
