//! Scrape orchestration against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use codehound_common::{PlatformError, ScrapeError, ScrapeSettings, StoreError};
use codehound_scout::pipeline::orchestrator::ScrapeOrchestrator;
use codehound_scout::testing::{channel, video, MockPromoStore, MockVideoSource};

const SPONSORED: &str = "Avec le code: ABCD1234 profitez de -20% sur NordVPN";
const TWO_CODES: &str = "Partenariat ! code: NORD2025 et coupon: SURF1234";
const PLAIN: &str = "Aujourd'hui on parle de Rust et de compilateurs.";

fn settings() -> ScrapeSettings {
    ScrapeSettings {
        channel_video_limit: 20,
        sweep_video_limit: 10,
        channel_delay: Duration::ZERO,
    }
}

fn orchestrator(source: &Arc<MockVideoSource>, store: &Arc<MockPromoStore>) -> ScrapeOrchestrator {
    ScrapeOrchestrator::new(source.clone(), store.clone(), settings())
}

// ---------------------------------------------------------------------------
// Single channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn channel_scrape_persists_codes_and_marks_videos() {
    let source = Arc::new(MockVideoSource::new().on_channel(
        "yt-c1",
        vec![video("v1", SPONSORED), video("v2", TWO_CODES), video("v3", PLAIN)],
    ));
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Underscore_")));

    let stats = orchestrator(&source, &store)
        .scrape_channel("c1")
        .await
        .unwrap();

    assert_eq!(stats.videos_found, 3);
    assert_eq!(stats.videos_processed, 3);
    assert_eq!(stats.videos_skipped, 0);
    assert_eq!(stats.codes_detected, 3);

    let codes = store.codes();
    assert_eq!(codes.len(), 3);
    assert!(codes.iter().all(|c| c.is_active && c.channel_id == "c1"));
    assert!(codes
        .iter()
        .all(|c| c.description.as_deref().is_some_and(|d| d.starts_with("Confidence: "))));
    assert!(store.videos().iter().all(|v| v.has_been_scraped));
    assert!(store.channel("c1").unwrap().last_scraped_at.is_some());
}

#[tokio::test]
async fn second_run_detects_nothing_new() {
    let source = Arc::new(
        MockVideoSource::new().on_channel("yt-c1", vec![video("v1", SPONSORED), video("v2", TWO_CODES)]),
    );
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Underscore_")));
    let orchestrator = orchestrator(&source, &store);

    let first = orchestrator.scrape_channel("c1").await.unwrap();
    let second = orchestrator.scrape_channel("c1").await.unwrap();

    assert_eq!(first.codes_detected, 3);
    assert_eq!(second.codes_detected, 0);
    assert_eq!(second.videos_processed, 0);
    assert_eq!(second.videos_skipped, 2);
    assert_eq!(store.codes().len(), 3);
    assert_eq!(store.videos().len(), 2);
    assert!(store.videos().iter().all(|v| v.has_been_scraped));
}

#[tokio::test]
async fn channel_without_videos_is_a_noop() {
    let source = Arc::new(MockVideoSource::new());
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Quiet")));

    let stats = orchestrator(&source, &store)
        .scrape_channel("c1")
        .await
        .unwrap();

    assert_eq!(stats.videos_found, 0);
    assert_eq!(stats.videos_processed, 0);
    assert_eq!(stats.codes_detected, 0);
    assert!(source.metadata_batches().is_empty());
    assert_eq!(store.checkpoint_count("c1"), 0);
}

#[tokio::test]
async fn checkpoint_is_stamped_once_after_the_video_loop() {
    let source = Arc::new(MockVideoSource::new().on_channel(
        "yt-c1",
        vec![video("v1", PLAIN), video("v2", PLAIN), video("v3", SPONSORED)],
    ));
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Underscore_")));

    orchestrator(&source, &store)
        .scrape_channel("c1")
        .await
        .unwrap();

    assert_eq!(store.checkpoint_count("c1"), 1);
}

#[tokio::test]
async fn failed_commit_leaves_video_unclaimed_and_retry_does_not_duplicate() {
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c1", vec![video("v1", TWO_CODES)]));
    let store = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "Underscore_"))
            .fail_next_commit(StoreError::Query("serialization failure".into())),
    );
    let orchestrator = orchestrator(&source, &store);

    let err = orchestrator.scrape_channel("c1").await.unwrap_err();
    assert!(matches!(err, ScrapeError::Store(StoreError::Query(_))));
    assert!(store.codes().is_empty());
    assert!(!store.video("v1").unwrap().has_been_scraped);

    let retry = orchestrator.scrape_channel("c1").await.unwrap();
    assert_eq!(retry.codes_detected, 2);
    assert_eq!(store.codes().len(), 2);
    assert!(store.video("v1").unwrap().has_been_scraped);
}

#[tokio::test]
async fn unknown_channel_is_reported() {
    let source = Arc::new(MockVideoSource::new());
    let store = Arc::new(MockPromoStore::new());

    let err = orchestrator(&source, &store)
        .scrape_channel("missing")
        .await
        .unwrap_err();

    assert_eq!(err, ScrapeError::ChannelNotFound("missing".to_string()));
}

#[tokio::test]
async fn on_demand_limit_bounds_the_video_list() {
    let videos = (0..30).map(|i| video(&format!("v{i}"), PLAIN)).collect();
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c1", videos));
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Busy")));

    let stats = orchestrator(&source, &store)
        .scrape_channel("c1")
        .await
        .unwrap();

    assert_eq!(stats.videos_found, 20);
    assert_eq!(store.videos().len(), 20);
}

#[tokio::test]
async fn metadata_is_fetched_in_batches_of_fifty() {
    let videos = (0..120).map(|i| video(&format!("v{i}"), PLAIN)).collect();
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c1", videos));
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Archive")));

    let stats = orchestrator(&source, &store)
        .process_channel(&channel("c1", "Archive"), 120)
        .await
        .unwrap();

    assert_eq!(stats.videos_processed, 120);
    assert_eq!(source.metadata_batches(), vec![50, 50, 20]);
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_channel_does_not_abort_the_sweep() {
    let source = Arc::new(
        MockVideoSource::new()
            .on_channel("yt-c1", vec![video("a1", SPONSORED)])
            .on_channel("yt-c2", vec![video("b1", SPONSORED)])
            .on_channel("yt-c3", vec![video("x1", TWO_CODES)]),
    );
    let store = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "Alpha"))
            .with_channel(channel("c2", "Bravo"))
            .with_channel(channel("c3", "Charlie"))
            .fail_on_channel("c2", StoreError::Query("constraint violation".into())),
    );

    let sweep = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap();

    assert_eq!(sweep.channels_processed, 3);
    assert_eq!(sweep.channels_succeeded, 2);
    assert_eq!(sweep.channels_failed, 1);
    assert_eq!(sweep.errors.len(), 1);
    assert!(sweep.errors[0].starts_with("Bravo: "), "got {:?}", sweep.errors);
    assert_eq!(sweep.codes_detected, 3);
    assert_eq!(store.codes_for_channel("c3"), 2);
    assert_eq!(store.checkpoint_count("c3"), 1);
}

#[tokio::test]
async fn platform_rejection_is_isolated_to_its_channel() {
    let source = Arc::new(
        MockVideoSource::new()
            .failing_channel(
                "yt-c1",
                PlatformError::Rejected {
                    status: 404,
                    message: "channel gone".into(),
                },
            )
            .on_channel("yt-c2", vec![video("b1", SPONSORED)]),
    );
    let store = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "Gone"))
            .with_channel(channel("c2", "Alive")),
    );

    let sweep = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap();

    assert_eq!(sweep.channels_failed, 1);
    assert_eq!(sweep.channels_succeeded, 1);
    assert_eq!(sweep.codes_detected, 1);
}

#[tokio::test]
async fn rejected_credentials_abort_the_sweep() {
    let source = Arc::new(
        MockVideoSource::new()
            .failing_channel("yt-c1", PlatformError::Unauthorized("bad key".into()))
            .on_channel("yt-c2", vec![video("b1", SPONSORED)]),
    );
    let store = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "First"))
            .with_channel(channel("c2", "Second")),
    );

    let err = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(store.codes().is_empty());
}

#[tokio::test]
async fn unreachable_store_is_fatal() {
    let source = Arc::new(MockVideoSource::new());
    let store = Arc::new(MockPromoStore::new().unavailable());

    let err = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn sweep_without_active_channels_returns_empty_stats() {
    let mut inactive = channel("c1", "Paused");
    inactive.is_active = false;
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c1", vec![video("v1", SPONSORED)]));
    let store = Arc::new(MockPromoStore::new().with_channel(inactive));

    let sweep = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap();

    assert_eq!(sweep.channels_processed, 0);
    assert!(sweep.errors.is_empty());
    assert!(store.codes().is_empty());
}

#[tokio::test]
async fn empty_channel_counts_as_a_successful_sweep_step() {
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c2", vec![video("b1", SPONSORED)]));
    let store = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "Quiet"))
            .with_channel(channel("c2", "Busy")),
    );

    let sweep = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap();

    assert_eq!(sweep.channels_processed, 2);
    assert_eq!(sweep.channels_succeeded, 2);
    assert_eq!(sweep.channels_failed, 0);
    assert_eq!(sweep.codes_detected, 1);
    assert_eq!(store.checkpoint_count("c1"), 0);
    assert_eq!(store.checkpoint_count("c2"), 1);
}

#[tokio::test(start_paused = true)]
async fn delay_is_applied_between_channels_only() {
    let source = Arc::new(MockVideoSource::new());
    let three = Arc::new(
        MockPromoStore::new()
            .with_channel(channel("c1", "One"))
            .with_channel(channel("c2", "Two"))
            .with_channel(channel("c3", "Three")),
    );
    let one = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Solo")));
    let throttled = |store: &Arc<MockPromoStore>| {
        ScrapeOrchestrator::new(
            source.clone(),
            store.clone(),
            ScrapeSettings {
                channel_delay: Duration::from_secs(1),
                ..settings()
            },
        )
    };

    let start = Instant::now();
    throttled(&one).sweep_active_channels().await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(500));

    let start = Instant::now();
    throttled(&three).sweep_active_channels().await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "got {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "got {elapsed:?}");
}

#[tokio::test]
async fn sweep_uses_the_sweep_video_limit() {
    let videos = (0..15).map(|i| video(&format!("v{i}"), PLAIN)).collect();
    let source = Arc::new(MockVideoSource::new().on_channel("yt-c1", videos));
    let store = Arc::new(MockPromoStore::new().with_channel(channel("c1", "Busy")));

    let sweep = orchestrator(&source, &store)
        .sweep_active_channels()
        .await
        .unwrap();

    assert_eq!(sweep.videos_processed, 10);
}
