use anyhow::Result;
use intervals_core::storage::SnapshotStorage;
use intervals_core::{RunnerConfig, Store, TimerSpec};
use intervals_runner::{TimerEventType, TimerRunner, use_dialog};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

fn workout() -> Result<Store> {
    let mut store = Store::new();
    store.create_timer(&TimerSpec::from_seconds(3).with_name("Crunches"))?;
    store.create_timer(&"Squat=2sx2".parse::<TimerSpec>()?)?;
    store.create_preset(Some("Squat".to_string()), 5)?;
    Ok(store)
}

#[tokio::test(start_paused = true)]
async fn test_workout_runs_in_background() -> Result<()> {
    let store = workout()?.into_shared();
    let runner = Arc::new(TimerRunner::new(store.clone(), RunnerConfig::default()));
    let mut rx = runner.subscribe();

    let (finished_tx, finished_rx) = watch::channel(false);
    let dialog = use_dialog(finished_rx);

    let watcher = tokio::spawn(async move {
        let mut ticks = 0;
        while let Ok(event) = rx.recv().await {
            match event.event_type {
                TimerEventType::Tick { .. } => ticks += 1,
                TimerEventType::SequenceFinished => {
                    finished_tx.send(true).ok();
                    break;
                }
                _ => {}
            }
        }
        ticks
    });

    runner.start(1).await?;
    assert_eq!(store.read().await.active_timer().map(|t| t.id), Some(1));
    assert!(!dialog.is_open());

    // 3s for Crunches, two 2s rounds of Squat
    sleep(Duration::from_millis(7500)).await;

    let ticks = watcher.await?;
    // Each run of a timer ticks once less than its length; the last tick completes it
    assert_eq!(ticks, 2 + 1 + 1);

    let mut open = dialog.subscribe();
    if !*open.borrow_and_update() {
        open.changed().await?;
    }
    assert!(dialog.is_open());

    let store = store.read().await;
    assert!(store.active_timer().is_none());
    assert!(store.timers().iter().all(|t| t.is_done));
    assert_eq!(store.repeat_status(2)?, 2);
    assert!(runner.current().await.is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stopped_workout_snapshot_resumes_progress() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());

    let store = workout()?.into_shared();
    let runner = Arc::new(TimerRunner::new(store.clone(), RunnerConfig::default()));

    runner.start(1).await?;
    sleep(Duration::from_millis(1500)).await;
    runner.stop().await?;
    storage.save(&*store.read().await)?;

    let restored = storage.load()?.expect("snapshot was saved");
    assert_eq!(restored.timer(1).map(|t| t.current_value), Some(2));
    assert_eq!(restored.timer_formatted_value(1)?, "00:00:02");
    assert!(restored.active_timer().is_none());

    // Picks up where it stopped instead of starting over
    let runner = TimerRunner::new(
        restored.into_shared(),
        RunnerConfig {
            auto_advance: false,
            ..RunnerConfig::default()
        },
    );
    let mut rx = runner.subscribe();
    runner.run(1).await?;

    let mut ticks = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event.event_type, TimerEventType::Tick { .. }) {
            ticks += 1;
        }
    }
    assert_eq!(ticks, 1);
    assert!(runner.store().read().await.timer(2).is_some_and(|t| !t.is_done));

    Ok(())
}
