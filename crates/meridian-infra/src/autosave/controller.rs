//! Debounced, change-detecting auto-save controller.
//!
//! Feed a controller the current form value on every edit; after a quiet
//! period it persists the trailing value through the supplied callback and
//! publishes its status over a watch channel for the UI's "Saving... /
//! Saved" badge.

use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

/// Save lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

/// Observable controller state.
#[derive(Debug, Clone)]
pub struct SaveState {
    pub status: SaveStatus,
    pub last_saved: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SaveState {
    fn initial() -> Self {
        Self {
            status: SaveStatus::Idle,
            last_saved: None,
            error: None,
        }
    }
}

/// Auto-save errors. A callback returning `Ok(false)` is normalized into
/// [`AutosaveError::Rejected`] so failure hooks always receive a real error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AutosaveError {
    #[error("save callback reported failure")]
    Rejected,

    #[error("save failed: {0}")]
    Failed(String),
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last qualifying change before a save fires.
    pub debounce: Duration,
    /// Whether data changes schedule saves at all. Manual saves stay
    /// available while disabled.
    pub enabled: bool,
    /// How long the `Saved` status is displayed before returning to `Idle`.
    pub saved_display: Duration,
    /// How long the `Error` status is displayed before returning to `Idle`.
    pub error_display: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            enabled: true,
            saved_display: Duration::from_millis(2000),
            error_display: Duration::from_millis(5000),
        }
    }
}

/// Future returned by a save callback. `Ok(true)` means persisted,
/// `Ok(false)` means the backend refused the write.
pub type SaveFuture = Pin<Box<dyn Future<Output = Result<bool, AutosaveError>> + Send>>;

type SaveFn<T> = Arc<dyn Fn(T) -> SaveFuture + Send + Sync>;

/// Optional per-attempt hooks.
pub struct AutosaveHooks<T> {
    pub on_success: Option<Arc<dyn Fn(&T) + Send + Sync>>,
    pub on_error: Option<Arc<dyn Fn(&AutosaveError) + Send + Sync>>,
}

impl<T> Default for AutosaveHooks<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

enum Command<T> {
    Update(T),
    ManualSave,
    SetEnabled(bool),
}

/// Handle to a running auto-save worker.
///
/// The worker serializes each incoming value and compares it to the snapshot
/// of the last persisted one; the first value observed becomes the baseline
/// and never triggers a save. Saves themselves run inline on the worker task,
/// so two saves can never overlap - commands arriving mid-save queue up and
/// are handled once the save completes.
///
/// Dropping the last handle shuts the worker down; a pending debounce is
/// discarded and no hook fires afterwards.
#[derive(Clone)]
pub struct AutosaveController<T> {
    tx: mpsc::Sender<Command<T>>,
    state_rx: watch::Receiver<SaveState>,
}

impl<T> AutosaveController<T>
where
    T: Serialize + Clone + Send + 'static,
{
    /// Spawn a worker persisting through `on_save`.
    pub fn spawn<F>(config: AutosaveConfig, on_save: F) -> Self
    where
        F: Fn(T) -> SaveFuture + Send + Sync + 'static,
    {
        Self::spawn_with_hooks(config, on_save, AutosaveHooks::default())
    }

    /// Spawn a worker with success/failure hooks.
    pub fn spawn_with_hooks<F>(config: AutosaveConfig, on_save: F, hooks: AutosaveHooks<T>) -> Self
    where
        F: Fn(T) -> SaveFuture + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(SaveState::initial());

        let worker = Worker {
            enabled: config.enabled,
            config,
            on_save: Arc::new(on_save) as SaveFn<T>,
            hooks,
            rx,
            state_tx,
            baseline: None,
            latest: None,
            save_deadline: None,
            display_deadline: None,
        };
        tokio::spawn(worker.run());

        Self { tx, state_rx }
    }

    /// Report the current form value. The first call sets the baseline;
    /// later calls schedule a debounced save when the value changed.
    pub async fn update(&self, value: T) {
        let _ = self.tx.send(Command::Update(value)).await;
    }

    /// Cancel any pending debounce and persist the latest value now.
    pub async fn manual_save(&self) {
        let _ = self.tx.send(Command::ManualSave).await;
    }

    /// Toggle automatic saving. Disabling drops any pending debounce.
    pub async fn set_enabled(&self, enabled: bool) {
        let _ = self.tx.send(Command::SetEnabled(enabled)).await;
    }

    /// Snapshot of the current save state.
    pub fn state(&self) -> SaveState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state_rx.clone()
    }
}

struct Worker<T> {
    config: AutosaveConfig,
    enabled: bool,
    on_save: SaveFn<T>,
    hooks: AutosaveHooks<T>,
    rx: mpsc::Receiver<Command<T>>,
    state_tx: watch::Sender<SaveState>,
    /// Serialized snapshot of the last persisted (or initially observed) value.
    baseline: Option<String>,
    /// Most recent observed value and its serialization.
    latest: Option<(T, String)>,
    save_deadline: Option<Instant>,
    display_deadline: Option<Instant>,
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending::<()>().await,
    }
}

impl<T> Worker<T>
where
    T: Serialize + Clone + Send + 'static,
{
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    None => break,
                    Some(Command::Update(value)) => self.observe(value),
                    Some(Command::ManualSave) => {
                        self.save_deadline = None;
                        self.save_latest().await;
                    }
                    Some(Command::SetEnabled(enabled)) => {
                        self.enabled = enabled;
                        if !enabled {
                            self.save_deadline = None;
                        }
                    }
                },
                _ = sleep_opt(self.save_deadline) => {
                    self.save_deadline = None;
                    self.save_latest().await;
                }
                _ = sleep_opt(self.display_deadline) => {
                    self.display_deadline = None;
                    self.publish(SaveStatus::Idle, None);
                }
            }
        }
    }

    fn observe(&mut self, value: T) {
        let serialized = match serde_json::to_string(&value) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Auto-save value failed to serialize; ignoring");
                return;
            }
        };

        match &self.baseline {
            // First observed value is the baseline and is never saved.
            None => {
                self.baseline = Some(serialized.clone());
                self.latest = Some((value, serialized));
            }
            // Identical to the persisted snapshot: a complete no-op.
            Some(baseline) if *baseline == serialized => {}
            Some(_) => {
                self.latest = Some((value, serialized));
                if self.enabled {
                    self.save_deadline = Some(Instant::now() + self.config.debounce);
                }
            }
        }
    }

    async fn save_latest(&mut self) {
        let Some((value, serialized)) = self.latest.clone() else {
            return;
        };

        self.display_deadline = None;
        self.publish(SaveStatus::Saving, None);

        match (self.on_save)(value.clone()).await {
            Ok(true) => {
                self.baseline = Some(serialized);
                self.state_tx.send_replace(SaveState {
                    status: SaveStatus::Saved,
                    last_saved: Some(Utc::now()),
                    error: None,
                });
                if let Some(hook) = &self.hooks.on_success {
                    hook(&value);
                }
                self.display_deadline = Some(Instant::now() + self.config.saved_display);
            }
            Ok(false) => self.record_failure(AutosaveError::Rejected),
            Err(e) => self.record_failure(e),
        }
    }

    fn record_failure(&mut self, error: AutosaveError) {
        tracing::warn!(error = %error, "Auto-save attempt failed");
        self.publish(SaveStatus::Error, Some(error.to_string()));
        if let Some(hook) = &self.hooks.on_error {
            hook(&error);
        }
        self.display_deadline = Some(Instant::now() + self.config.error_display);
    }

    /// Publish a state transition, carrying `last_saved` forward.
    ///
    /// The previous state is read before sending: holding a watch borrow
    /// across `send_replace` would deadlock.
    fn publish(&self, status: SaveStatus, error: Option<String>) {
        let last_saved = self.state_tx.borrow().last_saved;
        self.state_tx.send_replace(SaveState {
            status,
            last_saved,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_millis(50);

    fn test_config() -> AutosaveConfig {
        AutosaveConfig {
            debounce: DEBOUNCE,
            enabled: true,
            saved_display: Duration::from_millis(80),
            error_display: Duration::from_millis(80),
        }
    }

    struct Recorder {
        calls: AtomicUsize,
        payloads: Mutex<Vec<Value>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn saving_controller(
        config: AutosaveConfig,
        recorder: Arc<Recorder>,
        outcome: Result<bool, AutosaveError>,
    ) -> AutosaveController<Value> {
        AutosaveController::spawn(config, move |value: Value| {
            let recorder = recorder.clone();
            let outcome = outcome.clone();
            Box::pin(async move {
                recorder.calls.fetch_add(1, Ordering::SeqCst);
                recorder.payloads.lock().unwrap().push(value);
                outcome
            }) as Pin<Box<dyn Future<Output = Result<bool, AutosaveError>> + Send>>
        })
    }

    #[tokio::test]
    async fn saves_once_after_quiescence() {
        let recorder = Recorder::new();
        let ctl = saving_controller(test_config(), recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(DEBOUNCE / 2).await;
        assert_eq!(recorder.count(), 0);

        sleep(DEBOUNCE * 2).await;
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.payloads.lock().unwrap()[0], json!({"a": 2}));

        let state = ctl.state();
        assert!(state.last_saved.is_some());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn status_walks_saving_saved_idle() {
        // The callback yields so the subscriber observes the Saving state
        // before the save resolves.
        let ctl = AutosaveController::spawn(test_config(), |_: Value| {
            Box::pin(async {
                sleep(Duration::from_millis(20)).await;
                Ok(true)
            }) as Pin<Box<dyn Future<Output = Result<bool, AutosaveError>> + Send>>
        });
        let mut rx = ctl.subscribe();

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;

        let mut seen = vec![rx.borrow().status];
        while seen.last() != Some(&SaveStatus::Saved) {
            rx.changed().await.unwrap();
            seen.push(rx.borrow().status);
        }
        assert_eq!(seen, [SaveStatus::Idle, SaveStatus::Saving, SaveStatus::Saved]);

        // Saved is a display state; it relaxes back to Idle.
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, SaveStatus::Idle);
        assert!(rx.borrow().last_saved.is_some());
    }

    #[tokio::test]
    async fn rapid_changes_coalesce_into_one_save() {
        let recorder = Recorder::new();
        let ctl = saving_controller(test_config(), recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(Duration::from_millis(10)).await;
        ctl.update(json!({"a": 3})).await;

        sleep(DEBOUNCE * 3).await;
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.payloads.lock().unwrap()[0], json!({"a": 3}));
    }

    #[tokio::test]
    async fn first_value_is_baseline_and_never_saves() {
        let recorder = Recorder::new();
        let ctl = saving_controller(test_config(), recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        sleep(DEBOUNCE * 3).await;
        assert_eq!(recorder.count(), 0);
        assert_eq!(ctl.state().status, SaveStatus::Idle);
    }

    #[tokio::test]
    async fn identical_values_are_a_no_op() {
        let recorder = Recorder::new();
        let ctl = saving_controller(test_config(), recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 1})).await;

        sleep(DEBOUNCE * 3).await;
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn rejected_save_surfaces_error_then_relaxes() {
        let recorder = Recorder::new();
        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let errors_hook = errors.clone();

        let rec = recorder.clone();
        let ctl = AutosaveController::spawn_with_hooks(
            test_config(),
            move |value: Value| {
                let rec = rec.clone();
                Box::pin(async move {
                    rec.calls.fetch_add(1, Ordering::SeqCst);
                    rec.payloads.lock().unwrap().push(value);
                    Ok(false)
                }) as Pin<Box<dyn Future<Output = Result<bool, AutosaveError>> + Send>>
            },
            AutosaveHooks {
                on_success: None,
                on_error: Some(Arc::new(move |e: &AutosaveError| {
                    errors_hook.lock().unwrap().push(e.to_string());
                })),
            },
        );

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(DEBOUNCE * 2).await;

        assert_eq!(recorder.count(), 1);
        let state = ctl.state();
        assert_eq!(state.status, SaveStatus::Error);
        assert_eq!(
            state.error.as_deref(),
            Some("save callback reported failure")
        );
        assert_eq!(errors.lock().unwrap().len(), 1);

        // Error is a display state too.
        sleep(Duration::from_millis(120)).await;
        assert_eq!(ctl.state().status, SaveStatus::Idle);
    }

    #[tokio::test]
    async fn failed_save_does_not_block_the_next_change() {
        let recorder = Recorder::new();
        let ctl = saving_controller(
            test_config(),
            recorder.clone(),
            Err(AutosaveError::Failed("boom".into())),
        );

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(DEBOUNCE * 2).await;
        assert_eq!(recorder.count(), 1);
        assert_eq!(ctl.state().error.as_deref(), Some("save failed: boom"));

        // A failed value is not adopted as baseline, so any further change
        // reschedules normally.
        ctl.update(json!({"a": 3})).await;
        sleep(DEBOUNCE * 2).await;
        assert_eq!(recorder.count(), 2);
    }

    #[tokio::test]
    async fn manual_save_cancels_pending_timer() {
        let recorder = Recorder::new();
        let ctl = saving_controller(test_config(), recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        ctl.manual_save().await;
        sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.count(), 1);

        // The debounce timer was cancelled, not merely outrun.
        sleep(DEBOUNCE * 3).await;
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.payloads.lock().unwrap()[0], json!({"a": 2}));
    }

    #[tokio::test]
    async fn disabled_suppresses_automatic_saves_only() {
        let recorder = Recorder::new();
        let config = AutosaveConfig {
            enabled: false,
            ..test_config()
        };
        let ctl = saving_controller(config, recorder.clone(), Ok(true));

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(DEBOUNCE * 3).await;
        assert_eq!(recorder.count(), 0);

        // Manual saves stay available while disabled.
        ctl.manual_save().await;
        sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.count(), 1);
    }

    #[tokio::test]
    async fn success_hook_sees_the_persisted_value() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_hook = seen.clone();

        let ctl = AutosaveController::spawn_with_hooks(
            test_config(),
            |_: Value| {
                Box::pin(async { Ok(true) })
                    as Pin<Box<dyn Future<Output = Result<bool, AutosaveError>> + Send>>
            },
            AutosaveHooks {
                on_success: Some(Arc::new(move |v: &Value| {
                    seen_hook.lock().unwrap().push(v.clone());
                })),
                on_error: None,
            },
        );

        ctl.update(json!({"a": 1})).await;
        ctl.update(json!({"a": 2})).await;
        sleep(DEBOUNCE * 2).await;

        assert_eq!(seen.lock().unwrap().as_slice(), &[json!({"a": 2})]);
    }
}
