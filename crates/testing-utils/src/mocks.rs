//! Test doubles for the transfer port and the migration executor
//!
//! Both doubles are scripted: a sequence of behaviors is consumed one call at a
//! time and the last behavior repeats once the sequence is exhausted.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use migrator_core::{
    CommandOutput, MigrationExecutor, MirrorTransport, TransferOperation, TransferRequest,
};
use migrator_domain::MigrationTask;
use migrator_errors::{MigratorError, MigratorResult};

/// Tracks how many calls are in flight and the high-water mark
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max_observed(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

/// What a fake transport call does
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Exit code 0
    Succeed,
    /// Non-zero exit with the given stderr
    Fail { exit_code: i32, stderr: String },
    /// Never returns
    Hang,
    /// The port itself errors (e.g. the binary cannot be spawned)
    PortError(String),
}

impl FakeBehavior {
    pub fn fail(stderr: &str) -> Self {
        Self::Fail {
            exit_code: 128,
            stderr: stderr.to_string(),
        }
    }
}

/// A recorded call against the fake transport
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: TransferOperation,
    pub url: String,
    pub local_path: Option<PathBuf>,
    pub environment: HashMap<String, String>,
    pub options: serde_json::Map<String, serde_json::Value>,
}

struct FakeRule {
    operation: TransferOperation,
    url_fragment: String,
    behaviors: VecDeque<FakeBehavior>,
}

/// Mock implementation of MirrorTransport for testing
///
/// Calls that match no rule succeed. `mirror_fetch` creates the requested local
/// path so workspace cleanup can be observed.
#[derive(Clone, Default)]
pub struct FakeTransport {
    rules: Arc<Mutex<Vec<FakeRule>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Duration,
    tracker: Arc<ConcurrencyTracker>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script the behaviors of `operation` calls whose URL contains `url_fragment`
    pub fn on(self, operation: TransferOperation, url_fragment: &str, behaviors: Vec<FakeBehavior>) -> Self {
        self.rules.lock().unwrap().push(FakeRule {
            operation,
            url_fragment: url_fragment.to_string(),
            behaviors: behaviors.into(),
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, operation: TransferOperation) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    pub fn tracker(&self) -> Arc<ConcurrencyTracker> {
        Arc::clone(&self.tracker)
    }

    fn next_behavior(&self, operation: TransferOperation, url: &str) -> FakeBehavior {
        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if rule.operation == operation && url.contains(&rule.url_fragment) {
                return if rule.behaviors.len() > 1 {
                    rule.behaviors.pop_front().unwrap()
                } else {
                    rule.behaviors.front().cloned().unwrap_or(FakeBehavior::Succeed)
                };
            }
        }
        FakeBehavior::Succeed
    }

    async fn handle(
        &self,
        operation: TransferOperation,
        request: &TransferRequest,
    ) -> MigratorResult<CommandOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            url: request.url.clone(),
            local_path: request.local_path.clone(),
            environment: request.environment.clone(),
            options: request.options.clone(),
        });

        self.tracker.enter();
        let _guard = TrackerGuard(&self.tracker);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.next_behavior(operation, &request.url) {
            FakeBehavior::Succeed => {
                if operation == TransferOperation::MirrorFetch {
                    if let Some(path) = &request.local_path {
                        std::fs::create_dir_all(path)?;
                        std::fs::write(path.join("HEAD"), "ref: refs/heads/main\n")?;
                    }
                }
                Ok(CommandOutput::success())
            }
            FakeBehavior::Fail { exit_code, stderr } => Ok(CommandOutput::failure(exit_code, stderr)),
            FakeBehavior::Hang => std::future::pending::<MigratorResult<CommandOutput>>().await,
            FakeBehavior::PortError(message) => Err(MigratorError::unexpected(message)),
        }
    }
}

struct TrackerGuard<'a>(&'a ConcurrencyTracker);

impl Drop for TrackerGuard<'_> {
    fn drop(&mut self) {
        self.0.exit();
    }
}

#[async_trait]
impl MirrorTransport for FakeTransport {
    async fn mirror_fetch(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.handle(TransferOperation::MirrorFetch, request).await
    }

    async fn mirror_push(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.handle(TransferOperation::MirrorPush, request).await
    }

    async fn remote_probe(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.handle(TransferOperation::RemoteProbe, request).await
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// What a scripted execution does
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Succeed,
    Fail(String),
    Timeout,
    Panic,
}

/// Execution window of one call, for overlap assertions
#[derive(Debug, Clone)]
pub struct ExecutionWindow {
    pub name: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Mock implementation of MigrationExecutor for testing
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    scripts: Arc<Mutex<HashMap<String, VecDeque<ScriptedOutcome>>>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    windows: Arc<Mutex<Vec<ExecutionWindow>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    delay: Duration,
    tracker: Arc<ConcurrencyTracker>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script the outcomes for the task named `name`; unscripted tasks succeed
    pub fn script(self, name: &str, outcomes: Vec<ScriptedOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), outcomes.into());
        self
    }

    /// Override the execution delay for one task
    pub fn delay_for(self, name: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(name.to_string(), delay);
        self
    }

    pub fn attempts(&self, name: &str) -> u32 {
        self.attempts.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }

    pub fn windows(&self) -> Vec<ExecutionWindow> {
        self.windows.lock().unwrap().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.tracker.max_observed()
    }

    fn next_outcome(&self, name: &str) -> ScriptedOutcome {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(ScriptedOutcome::Succeed),
            None => ScriptedOutcome::Succeed,
        }
    }
}

#[async_trait]
impl MigrationExecutor for ScriptedExecutor {
    async fn execute(&self, task: &MigrationTask) -> MigratorResult<()> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(task.name.clone())
            .or_insert(0) += 1;
        let outcome = self.next_outcome(&task.name);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&task.name)
            .copied()
            .unwrap_or(self.delay);

        self.tracker.enter();
        let started = Instant::now();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let finished = Instant::now();
        self.tracker.exit();
        self.windows.lock().unwrap().push(ExecutionWindow {
            name: task.name.clone(),
            started,
            finished,
        });

        match outcome {
            ScriptedOutcome::Succeed => Ok(()),
            ScriptedOutcome::Fail(message) => Err(MigratorError::transfer("mirror-fetch", message)),
            ScriptedOutcome::Timeout => Err(MigratorError::timeout("mirror-fetch", 300)),
            ScriptedOutcome::Panic => panic!("scripted panic for {}", task.name),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
