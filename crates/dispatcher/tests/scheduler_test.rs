use std::sync::{Arc, Mutex};
use std::time::Duration;

use migrator_dispatcher::BatchScheduler;
use migrator_domain::BatchSettings;
use migrator_testing_utils::{numbered_tasks, ScriptedExecutor, ScriptedOutcome};

fn settings(max_concurrent: usize) -> BatchSettings {
    BatchSettings {
        max_concurrent,
        retry_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn no_progress(_: usize, _: usize) {}

#[tokio::test]
async fn test_all_tasks_succeed() {
    let executor = ScriptedExecutor::new();
    let scheduler = BatchScheduler::new(Arc::new(executor.clone()));

    let (result, failed) = scheduler
        .run_first_pass(&numbered_tasks(5), &settings(3), &no_progress)
        .await;

    assert_eq!(result.total(), 5);
    assert_eq!(result.success(), 5);
    assert_eq!(result.failed(), 0);
    assert!(failed.is_empty());
    assert!(result.is_consistent());
    assert_eq!(result.details().len(), 5);
    assert!(result.details().iter().all(|d| !d.retry && d.attempt == 1));
    assert_eq!(executor.total_attempts(), 5);
}

#[tokio::test]
async fn test_failures_are_collected_with_first_attempt() {
    let executor = ScriptedExecutor::new()
        .script("repo-2", vec![ScriptedOutcome::Fail("fatal: not found".into())])
        .script("repo-4", vec![ScriptedOutcome::Timeout]);
    let scheduler = BatchScheduler::new(Arc::new(executor));

    let (result, failed) = scheduler
        .run_first_pass(&numbered_tasks(4), &settings(2), &no_progress)
        .await;

    assert_eq!(result.success(), 2);
    assert_eq!(result.failed(), 2);
    let mut names = result.failed_names().to_vec();
    names.sort();
    assert_eq!(names, vec!["repo-2".to_string(), "repo-4".to_string()]);
    assert!(failed.iter().all(|f| f.attempt == 1));
    assert_eq!(failed.len(), 2);

    let detail = result.detail("repo-2").unwrap();
    assert!(!detail.success);
    assert!(detail.error.as_deref().unwrap().contains("fatal: not found"));
    assert!(result
        .detail("repo-4")
        .unwrap()
        .error
        .as_deref()
        .unwrap()
        .contains("超过时间限制"));
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let executor = ScriptedExecutor::new().with_delay(Duration::from_millis(30));
    let scheduler = BatchScheduler::new(Arc::new(executor.clone()));

    let (result, _) = scheduler
        .run_first_pass(&numbered_tasks(10), &settings(3), &no_progress)
        .await;

    assert_eq!(result.success(), 10);
    assert!(executor.max_concurrency() <= 3);
    assert!(executor.max_concurrency() >= 2);
}

#[tokio::test]
async fn test_single_slot_serializes_execution() {
    let executor = ScriptedExecutor::new().with_delay(Duration::from_millis(10));
    let scheduler = BatchScheduler::new(Arc::new(executor.clone()));

    scheduler
        .run_first_pass(&numbered_tasks(4), &settings(1), &no_progress)
        .await;

    let mut windows = executor.windows();
    windows.sort_by_key(|w| w.started);
    for pair in windows.windows(2) {
        assert!(pair[0].finished <= pair[1].started);
    }
    assert_eq!(executor.max_concurrency(), 1);
}

#[tokio::test]
async fn test_progress_reported_once_per_task_in_order() {
    let executor = ScriptedExecutor::new()
        .with_delay(Duration::from_millis(5))
        .script("repo-3", vec![ScriptedOutcome::Fail("boom".into())]);
    let scheduler = BatchScheduler::new(Arc::new(executor));
    let calls = Mutex::new(Vec::new());
    let on_progress = |done: usize, total: usize| calls.lock().unwrap().push((done, total));

    scheduler
        .run_first_pass(&numbered_tasks(6), &settings(3), &on_progress)
        .await;

    let calls = calls.into_inner().unwrap();
    let expected: Vec<(usize, usize)> = (1..=6).map(|i| (i, 6)).collect();
    assert_eq!(calls, expected);
}

#[tokio::test]
async fn test_results_drained_in_completion_order() {
    let executor = ScriptedExecutor::new()
        .delay_for("repo-1", Duration::from_millis(150))
        .delay_for("repo-2", Duration::from_millis(10));
    let scheduler = BatchScheduler::new(Arc::new(executor));

    let (result, _) = scheduler
        .run_first_pass(&numbered_tasks(2), &settings(2), &no_progress)
        .await;

    let order: Vec<&str> = result.details().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(order, vec!["repo-2", "repo-1"]);
}

#[tokio::test]
async fn test_panicking_task_counted_as_failure() {
    let executor = ScriptedExecutor::new().script("repo-2", vec![ScriptedOutcome::Panic]);
    let scheduler = BatchScheduler::new(Arc::new(executor));

    let (result, failed) = scheduler
        .run_first_pass(&numbered_tasks(3), &settings(2), &no_progress)
        .await;

    assert_eq!(result.success(), 2);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.failed_names(), ["repo-2".to_string()]);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].task.name, "repo-2");
    assert!(result
        .detail("repo-2")
        .unwrap()
        .error
        .as_deref()
        .unwrap()
        .contains("panic"));
}

#[tokio::test]
async fn test_empty_batch() {
    let scheduler = BatchScheduler::new(Arc::new(ScriptedExecutor::new()));
    let (result, failed) = scheduler
        .run_first_pass(&[], &settings(3), &no_progress)
        .await;

    assert_eq!(result.total(), 0);
    assert!(result.is_success());
    assert!(failed.is_empty());
}
