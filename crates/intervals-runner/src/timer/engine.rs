use intervals_core::models::RunnerConfig;
use intervals_core::{SharedStore, Store, utils};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;

use super::events::{TimerEvent, TimerEventType};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("A timer sequence is already running")]
    AlreadyRunning,

    #[error("No timer is running")]
    NotRunning,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Core error: {0}")]
    Core(#[from] intervals_core::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

/// Outcome of one tick applied to the store
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Timer is paused; nothing changed
    Idle,
    Ticked { remaining: u64, progress: f64 },
    /// A round ran out and the timer was reset for the next one
    RoundCompleted { round: u32, of: u32 },
    /// Timer is done and inactive; `next` is the timer to run after it
    Completed { next: Option<u32> },
}

/// Advance timer `id` by one tick.
///
/// The countdown never goes below zero: a timer that reaches zero is either
/// reset for its next round or marked done on the same tick.
pub fn step(store: &mut Store, id: u32, auto_advance: bool) -> Result<Step> {
    let timer = store
        .timer(id)
        .ok_or(intervals_core::Error::TimerNotFound(id))?;
    if !timer.is_active {
        return Ok(Step::Idle);
    }

    if !timer.is_finished() {
        store.tick_timer(id)?;
    }

    let timer = store
        .timer(id)
        .ok_or(intervals_core::Error::TimerNotFound(id))?;
    if !timer.is_finished() {
        return Ok(Step::Ticked {
            remaining: timer.current_value,
            progress: timer.progress(),
        });
    }

    if timer.has_rounds_left() {
        let round = timer.repeat_counter;
        let of = timer.repeat.unwrap_or(round);
        store.increase_repeat_counter(id)?;
        store.reset_timer(id)?;
        return Ok(Step::RoundCompleted { round, of });
    }

    store.set_done_status(id, true)?;
    store.toggle_timer(id)?;

    let next = if auto_advance {
        store.next_timer(id)?.map(|timer| timer.id)
    } else {
        None
    };

    Ok(Step::Completed { next })
}

/// Make `id` the only active timer, ready to count from the top if it
/// already ran out. Returns the duration and round it starts with.
pub fn begin(store: &mut Store, id: u32) -> Result<(u64, u32)> {
    let timer = store
        .timer(id)
        .ok_or(intervals_core::Error::TimerNotFound(id))?;
    let rerun = timer.is_done || timer.is_finished();
    let fresh = timer.repeat_counter == 0;

    if rerun {
        store.reset_timer(id)?;
    }
    if rerun || fresh {
        store.reset_repeat_counter(id)?;
    }
    store.activate_exclusive(id)?;

    let timer = store
        .timer(id)
        .ok_or(intervals_core::Error::TimerNotFound(id))?;
    Ok((timer.current_value, timer.repeat_counter))
}

/// Counts the active timer down, one tick loop at a time
pub struct TimerRunner {
    store: SharedStore,
    config: RunnerConfig,
    event_tx: broadcast::Sender<TimerEvent>,
    current: Arc<RwLock<Option<u32>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    /// Bumped by `stop`; every live tick loop holds a receiver
    stop_tx: watch::Sender<u64>,
}

impl TimerRunner {
    pub fn new(store: SharedStore, config: RunnerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        let (stop_tx, _) = watch::channel(0);

        Self {
            store,
            config,
            event_tx,
            current: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
            stop_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Id of the timer the loop is working on, paused or not
    pub async fn current(&self) -> Option<u32> {
        *self.current.read().await
    }

    fn emit(&self, event: TimerEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn activate(&self, id: u32) -> Result<()> {
        let (seconds, round) = {
            let mut store = self.store.write().await;
            begin(&mut store, id)?
        };
        *self.current.write().await = Some(id);

        tracing::info!("Timer {} started ({}s, round {})", id, seconds, round);
        self.emit(TimerEvent::started(id, seconds, round));
        Ok(())
    }

    async fn ensure_idle(&self, task: &Option<JoinHandle<()>>) -> Result<()> {
        let looping = task.as_ref().is_some_and(|handle| !handle.is_finished());
        if looping || self.current().await.is_some() {
            return Err(RunnerError::AlreadyRunning);
        }
        Ok(())
    }

    /// Start `id` and count it down in a background task
    pub async fn start(self: &Arc<Self>, id: u32) -> Result<()> {
        let mut task = self.task.lock().await;
        self.ensure_idle(&task).await?;
        let stop_rx = self.stop_tx.subscribe();
        self.activate(id).await?;

        let runner = self.clone();
        *task = Some(tokio::spawn(async move {
            if let Err(e) = runner.drive(id, stop_rx).await {
                tracing::error!("Timer loop for {} ended: {}", id, e);
            }
        }));

        Ok(())
    }

    /// Start `id` and count down on the caller's task until the sequence ends
    pub async fn run(&self, id: u32) -> Result<()> {
        {
            let task = self.task.lock().await;
            self.ensure_idle(&task).await?;
        }
        let stop_rx = self.stop_tx.subscribe();
        self.activate(id).await?;
        self.drive(id, stop_rx).await
    }

    async fn drive(&self, id: u32, stop_rx: watch::Receiver<u64>) -> Result<()> {
        let result = self.tick_loop(id, stop_rx).await;
        if result.is_err() {
            *self.current.write().await = None;
        }
        result
    }

    async fn tick_loop(&self, mut id: u32, mut stop_rx: watch::Receiver<u64>) -> Result<()> {
        loop {
            tokio::select! {
                _ = utils::delay(self.config.tick_interval_ms) => {}
                _ = stop_rx.changed() => {
                    return self.halt(id).await;
                }
            }

            let step = {
                let mut store = self.store.write().await;
                step(&mut store, id, self.config.auto_advance)?
            };

            match step {
                Step::Idle => continue,
                Step::Ticked {
                    remaining,
                    progress,
                } => {
                    tracing::debug!("Timer {} tick, {}s left", id, remaining);
                    self.emit(TimerEvent::tick(id, remaining, progress));
                }
                Step::RoundCompleted { round, of } => {
                    tracing::info!("Timer {} finished round {} of {}", id, round, of);
                    self.emit(TimerEvent::round_completed(id, round, of));
                }
                Step::Completed { next } => {
                    tracing::info!("Timer {} completed", id);
                    self.emit(TimerEvent::new(TimerEventType::Completed, id));

                    let Some(next_id) = next else {
                        *self.current.write().await = None;
                        self.emit(TimerEvent::new(TimerEventType::SequenceFinished, id));
                        return Ok(());
                    };

                    self.emit(TimerEvent::new(TimerEventType::Advanced { next_id }, id));
                    self.activate(next_id).await?;
                    id = next_id;
                }
            }
        }
    }

    pub async fn pause(&self) -> Result<()> {
        let id = self.current().await.ok_or(RunnerError::NotRunning)?;

        let mut store = self.store.write().await;
        let timer = store
            .timer(id)
            .ok_or(intervals_core::Error::TimerNotFound(id))?;
        if !timer.is_active {
            return Err(RunnerError::InvalidOperation(
                "Timer is not running".to_string(),
            ));
        }
        let remaining = timer.current_value;
        store.toggle_timer(id)?;
        drop(store);

        self.emit(TimerEvent::new(
            TimerEventType::Paused {
                remaining_seconds: remaining,
            },
            id,
        ));
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        let id = self.current().await.ok_or(RunnerError::NotRunning)?;

        let mut store = self.store.write().await;
        let timer = store
            .timer(id)
            .ok_or(intervals_core::Error::TimerNotFound(id))?;
        if timer.is_active {
            return Err(RunnerError::InvalidOperation(
                "Timer is not paused".to_string(),
            ));
        }
        store.activate_exclusive(id)?;
        drop(store);

        self.emit(TimerEvent::new(TimerEventType::Resumed, id));
        Ok(())
    }

    /// End the loop, whether spawned by `start` or driven by `run`, and
    /// deactivate the current timer, keeping its progress. Returns once the
    /// loop has exited.
    pub async fn stop(&self) -> Result<()> {
        let id = self.current().await.ok_or(RunnerError::NotRunning)?;
        let handle = self.task.lock().await.take();

        if self.stop_tx.receiver_count() == 0 {
            // The loop is gone (its `run` future was dropped) but left the timer behind
            self.halt(id).await?;
        } else {
            self.stop_tx.send_modify(|stops| *stops += 1);
            self.stop_tx.closed().await;
        }

        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }

    async fn halt(&self, id: u32) -> Result<()> {
        let mut store = self.store.write().await;
        if store.timer(id).is_some_and(|timer| timer.is_active) {
            store.toggle_timer(id)?;
        }
        drop(store);
        *self.current.write().await = None;

        tracing::info!("Timer {} stopped", id);
        self.emit(TimerEvent::new(TimerEventType::Stopped, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervals_core::TimerSpec;
    use tokio::time::{Duration, sleep};

    fn store_with(specs: &[TimerSpec]) -> Store {
        let mut store = Store::new();
        for spec in specs {
            store.create_timer(spec).unwrap();
        }
        store
    }

    fn config(auto_advance: bool) -> RunnerConfig {
        RunnerConfig {
            auto_advance,
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_step_idle_when_inactive() {
        let mut store = store_with(&[TimerSpec::from_seconds(3)]);
        assert_eq!(step(&mut store, 1, true).unwrap(), Step::Idle);
        assert_eq!(store.timer(1).unwrap().current_value, 3);
    }

    #[test]
    fn test_step_counts_down_and_completes() {
        let mut store = store_with(&[TimerSpec::from_seconds(2), TimerSpec::from_seconds(4)]);
        begin(&mut store, 1).unwrap();

        assert_eq!(
            step(&mut store, 1, true).unwrap(),
            Step::Ticked {
                remaining: 1,
                progress: 50.0
            }
        );
        assert_eq!(
            step(&mut store, 1, true).unwrap(),
            Step::Completed { next: Some(2) }
        );

        let timer = store.timer(1).unwrap();
        assert!(timer.is_done);
        assert!(!timer.is_active);
        assert_eq!(timer.current_value, 0);
    }

    #[test]
    fn test_step_without_advance() {
        let mut store = store_with(&[TimerSpec::from_seconds(1), TimerSpec::from_seconds(1)]);
        begin(&mut store, 1).unwrap();
        assert_eq!(
            step(&mut store, 1, false).unwrap(),
            Step::Completed { next: None }
        );
    }

    #[test]
    fn test_step_repeats_rounds() {
        let mut store = store_with(&[TimerSpec::from_seconds(1).with_repeat(2)]);
        let (_, round) = begin(&mut store, 1).unwrap();
        assert_eq!(round, 1);

        assert_eq!(
            step(&mut store, 1, true).unwrap(),
            Step::RoundCompleted { round: 1, of: 2 }
        );
        let timer = store.timer(1).unwrap();
        assert_eq!(timer.current_value, 1);
        assert_eq!(timer.repeat_counter, 2);
        assert!(timer.is_active);

        assert_eq!(
            step(&mut store, 1, true).unwrap(),
            Step::Completed { next: None }
        );
    }

    #[test]
    fn test_step_zero_length_timer_completes_at_once() {
        let mut store = store_with(&[TimerSpec::from_seconds(0)]);
        begin(&mut store, 1).unwrap();
        assert_eq!(
            step(&mut store, 1, true).unwrap(),
            Step::Completed { next: None }
        );
    }

    #[test]
    fn test_begin_reruns_done_timer() {
        let mut store = store_with(&[TimerSpec::from_seconds(1).with_repeat(3)]);
        begin(&mut store, 1).unwrap();
        for _ in 0..3 {
            step(&mut store, 1, true).unwrap();
        }
        assert!(store.timer(1).unwrap().is_done);

        let (seconds, round) = begin(&mut store, 1).unwrap();
        assert_eq!(seconds, 1);
        assert_eq!(round, 1);
        assert!(!store.timer(1).unwrap().is_done);
    }

    #[test]
    fn test_begin_deactivates_others() {
        let mut store = store_with(&[TimerSpec::from_seconds(5), TimerSpec::from_seconds(5)]);
        store.toggle_timer(1).unwrap();

        begin(&mut store, 2).unwrap();
        assert_eq!(store.active_timer().map(|t| t.id), Some(2));
        assert!(!store.timer(1).unwrap().is_active);
    }

    #[test]
    fn test_step_unknown_timer() {
        let mut store = Store::new();
        assert!(matches!(
            step(&mut store, 4, true),
            Err(RunnerError::Core(intervals_core::Error::TimerNotFound(4)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_end_emits_events() {
        let store = store_with(&[
            TimerSpec::from_seconds(2),
            TimerSpec::from_seconds(1).with_repeat(2),
        ])
        .into_shared();
        let runner = TimerRunner::new(store.clone(), config(true));
        let mut rx = runner.subscribe();

        runner.run(1).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push((event.timer_id, event.event_type));
        }

        assert_eq!(
            kinds,
            vec![
                (1, TimerEventType::Started { seconds: 2, round: 1 }),
                (
                    1,
                    TimerEventType::Tick {
                        remaining_seconds: 1,
                        progress: 50.0
                    }
                ),
                (1, TimerEventType::Completed),
                (1, TimerEventType::Advanced { next_id: 2 }),
                (2, TimerEventType::Started { seconds: 1, round: 1 }),
                (2, TimerEventType::RoundCompleted { round: 1, of: 2 }),
                (2, TimerEventType::Completed),
                (2, TimerEventType::SequenceFinished),
            ]
        );

        let store = store.read().await;
        assert!(store.timers().iter().all(|t| t.is_done && !t.is_active));
        assert!(runner.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_countdown() {
        let store = store_with(&[TimerSpec::from_seconds(10)]).into_shared();
        let runner = Arc::new(TimerRunner::new(store.clone(), config(true)));

        runner.start(1).await.unwrap();
        sleep(Duration::from_millis(3500)).await;
        assert_eq!(store.read().await.timer(1).unwrap().current_value, 7);

        runner.pause().await.unwrap();
        assert!(runner.pause().await.is_err());
        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.read().await.timer(1).unwrap().current_value, 7);

        runner.resume().await.unwrap();
        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.read().await.timer(1).unwrap().current_value, 5);

        runner.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let store = store_with(&[TimerSpec::from_seconds(30)]).into_shared();
        let runner = Arc::new(TimerRunner::new(store, config(true)));

        runner.start(1).await.unwrap();
        assert!(matches!(
            runner.start(1).await,
            Err(RunnerError::AlreadyRunning)
        ));
        assert!(matches!(runner.run(1).await, Err(RunnerError::AlreadyRunning)));

        runner.stop().await.unwrap();
        assert!(matches!(runner.stop().await, Err(RunnerError::NotRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_progress() {
        let store = store_with(&[TimerSpec::from_seconds(30)]).into_shared();
        let runner = Arc::new(TimerRunner::new(store.clone(), config(true)));
        let mut rx = runner.subscribe();

        runner.start(1).await.unwrap();
        sleep(Duration::from_millis(2500)).await;
        runner.stop().await.unwrap();

        let timer = store.read().await.timer(1).unwrap().clone();
        assert_eq!(timer.current_value, 28);
        assert!(!timer.is_active);
        assert!(!timer.is_done);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(last.is_some_and(|event| event.event_type == TimerEventType::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_inline_run() {
        let store = store_with(&[TimerSpec::from_seconds(30)]).into_shared();
        let runner = Arc::new(TimerRunner::new(store.clone(), config(true)));

        let looping = runner.clone();
        let handle = tokio::spawn(async move { looping.run(1).await });
        sleep(Duration::from_millis(2500)).await;

        runner.stop().await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run returns after stop")
            .unwrap();
        assert!(result.is_ok());

        assert!(runner.current().await.is_none());
        let timer = store.read().await.timer(1).unwrap().clone();
        assert_eq!(timer.current_value, 28);
        assert!(!timer.is_active);

        runner.start(1).await.unwrap();
        runner.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_run_is_dropped() {
        let store = store_with(&[TimerSpec::from_seconds(30)]).into_shared();
        let runner = TimerRunner::new(store.clone(), config(true));
        let mut rx = runner.subscribe();

        let cut = tokio::time::timeout(Duration::from_millis(2500), runner.run(1)).await;
        assert!(cut.is_err());
        assert_eq!(store.read().await.active_timer().map(|t| t.id), Some(1));

        runner.stop().await.unwrap();
        assert!(runner.current().await.is_none());
        assert!(store.read().await.active_timer().is_none());
        assert_eq!(store.read().await.timer(1).unwrap().current_value, 28);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(last.is_some_and(|event| event.event_type == TimerEventType::Stopped));
    }

    #[tokio::test]
    async fn test_pause_without_run() {
        let runner = TimerRunner::new(Store::new().into_shared(), RunnerConfig::default());
        assert!(matches!(runner.pause().await, Err(RunnerError::NotRunning)));
        assert!(matches!(runner.resume().await, Err(RunnerError::NotRunning)));
    }
}
