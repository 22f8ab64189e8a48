use super::*;
use crate::error::ObservationError;
use crate::test_helpers::{ScriptedTransport, sample_results, snapshot};
use std::sync::Mutex;
use std::time::Duration;

fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_attempts,
        request_timeout: None,
    }
}

fn orchestrator(
    transport: ScriptedTransport,
    poll: PollConfig,
) -> (
    PollingOrchestrator<ScriptedTransport>,
    Arc<ScriptedTransport>,
) {
    let transport = Arc::new(transport);
    (
        PollingOrchestrator::new(transport.clone(), poll, RetryConfig::default()),
        transport,
    )
}

fn gateway_error() -> Error {
    Error::Transport {
        status: 503,
        detail: "busy".to_string(),
    }
}

#[tokio::test]
async fn run_completes_and_fetches_results() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::Pending, 0, "排队中"))
        .push_status(snapshot("t1", TaskState::OcrProcessing, 20, "OCR识别中"))
        .push_status(snapshot("t1", TaskState::OcrProcessing, 20, "OCR识别中"))
        .push_status(snapshot("t1", TaskState::Analyzing, 60, "分析中"))
        .push_status(snapshot("t1", TaskState::Completed, 100, "处理完成"))
        .with_results(sample_results("t1", "1月: 4200万元"));
    let (orchestrator, transport) = orchestrator(transport, fast_poll(150));

    let seen = Mutex::new(Vec::new());
    let results = orchestrator
        .run(TaskId::from("t1"), |task: &Task| {
            seen.lock().unwrap().push((task.status, task.progress))
        })
        .await
        .unwrap();

    assert_eq!(results.ocr.text, "1月: 4200万元");
    assert_eq!(transport.status_calls(), 5);
    assert_eq!(transport.results_calls(), 1);
    // The duplicate OCR snapshot is not re-emitted
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![
            (TaskState::Pending, 0),
            (TaskState::OcrProcessing, 20),
            (TaskState::Analyzing, 60),
            (TaskState::Completed, 100),
        ]
    );
}

#[tokio::test]
async fn observed_progress_never_decreases() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::OcrProcessing, 40, "a"))
        .push_status(snapshot("t1", TaskState::OcrProcessing, 10, "b"))
        .push_status(snapshot("t1", TaskState::Analyzing, 30, "c"))
        .push_status(snapshot("t1", TaskState::Completed, 100, "d"));
    let (orchestrator, _transport) = orchestrator(transport, fast_poll(10));

    let mut progress = Vec::new();
    orchestrator
        .run(TaskId::from("t1"), |task: &Task| progress.push(task.progress))
        .await
        .unwrap();

    assert_eq!(progress, vec![40, 40, 40, 100]);
}

#[tokio::test]
async fn server_error_becomes_job_error() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::OcrProcessing, 20, "OCR识别中"))
        .push_status(snapshot("t1", TaskState::Error, 0, "OCR处理失败: 无法识别"));
    let (orchestrator, transport) = orchestrator(transport, fast_poll(10));

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    match err {
        Error::Job { message } => assert_eq!(message, "OCR处理失败: 无法识别"),
        other => panic!("expected job error, got {other:?}"),
    }
    assert_eq!(transport.results_calls(), 0);
}

#[tokio::test]
async fn never_terminal_times_out_after_budget() {
    let transport =
        ScriptedTransport::new().push_status(snapshot("t1", TaskState::Analyzing, 50, "分析中"));
    let (orchestrator, transport) = orchestrator(transport, fast_poll(7));

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 7 }), "got {err:?}");
    assert_eq!(transport.status_calls(), 7);
}

#[tokio::test]
async fn poll_failure_surfaces_immediately_by_default() {
    let transport = ScriptedTransport::new()
        .push_error(gateway_error())
        .push_status(snapshot("t1", TaskState::Completed, 100, "done"));
    let (orchestrator, transport) = orchestrator(transport, fast_poll(10));

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(503));
    assert_eq!(transport.status_calls(), 1);
}

#[tokio::test]
async fn retry_budget_absorbs_gateway_errors() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .push_error(gateway_error())
            .push_status(snapshot("t1", TaskState::Completed, 100, "done")),
    );
    let retry = RetryConfig {
        max_attempts: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    let orchestrator = PollingOrchestrator::new(transport.clone(), fast_poll(3), retry);

    orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap();
    assert_eq!(transport.status_calls(), 2);
}

#[tokio::test]
async fn cancelled_before_start_issues_no_poll() {
    let (orchestrator, transport) = orchestrator(ScriptedTransport::new(), fast_poll(10));
    orchestrator.cancel();

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.status_calls(), 0);
}

#[tokio::test]
async fn in_flight_response_after_cancel_is_discarded() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::Analyzing, 70, "分析中"))
        .with_status_delay(Duration::from_millis(100));
    let (orchestrator, _transport) = orchestrator(transport, fast_poll(10));

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let mut machine = TaskStatusMachine::new(TaskId::from("t1"));
    let mut calls = 0;
    let err = orchestrator
        .run_machine(&mut machine, &mut |_: &Task| calls += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(calls, 0);
    assert_eq!(machine.current().status, TaskState::Pending);
    assert_eq!(machine.current().progress, 0);
}

#[tokio::test]
async fn cancel_interrupts_the_poll_interval() {
    let transport =
        ScriptedTransport::new().push_status(snapshot("t1", TaskState::Analyzing, 50, "分析中"));
    let poll = PollConfig {
        interval: Duration::from_secs(60),
        ..fast_poll(10)
    };
    let (orchestrator, transport) = orchestrator(transport, poll);

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run(TaskId::from("t1"), |_: &Task| {}),
    )
    .await
    .expect("cancellation must interrupt the sleep")
    .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.status_calls(), 1);
}

#[tokio::test]
async fn stuck_request_hits_request_timeout() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::Analyzing, 50, "分析中"))
        .with_status_delay(Duration::from_millis(500));
    let poll = PollConfig {
        request_timeout: Some(Duration::from_millis(20)),
        ..fast_poll(10)
    };
    let (orchestrator, _transport) = orchestrator(transport, poll);

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RequestTimeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn stale_snapshot_after_completion_is_rejected() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::OcrProcessing, 20, "OCR识别中"))
        .push_status(snapshot("t1", TaskState::Visualizing, 80, "生成报告"))
        .push_status(snapshot("t1", TaskState::Completed, 100, "处理完成"))
        .push_status(snapshot("t1", TaskState::Analyzing, 60, "分析中"));
    let (orchestrator, transport) = orchestrator(transport, fast_poll(10));

    let mut machine = TaskStatusMachine::new(TaskId::from("t1"));
    orchestrator
        .run_machine(&mut machine, &mut |_: &Task| {})
        .await
        .unwrap();
    assert_eq!(transport.status_calls(), 3);

    // A fourth, out-of-order response for the same task
    let err = orchestrator
        .run_machine(&mut machine, &mut |_: &Task| {})
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            Error::Observation(ObservationError::TerminalRegression {
                from: TaskState::Completed,
                to: TaskState::Analyzing,
                ..
            })
        ),
        "got {err:?}"
    );
    assert_eq!(machine.current().status, TaskState::Completed);
}

#[tokio::test]
async fn independent_runs_do_not_share_state() {
    let a = ScriptedTransport::new()
        .push_status(snapshot("a", TaskState::Completed, 100, "done"))
        .with_results(sample_results("a", "A"));
    let b = ScriptedTransport::new()
        .push_status(snapshot("b", TaskState::Analyzing, 40, "分析中"))
        .push_status(snapshot("b", TaskState::Completed, 100, "done"))
        .with_results(sample_results("b", "B"));
    let (first, _) = orchestrator(a, fast_poll(5));
    let (second, _) = orchestrator(b, fast_poll(5));

    let (ra, rb) = tokio::join!(
        first.run(TaskId::from("a"), |_: &Task| {}),
        second.run(TaskId::from("b"), |_: &Task| {}),
    );

    assert_eq!(ra.unwrap().ocr.text, "A");
    assert_eq!(rb.unwrap().ocr.text, "B");
}

#[tokio::test]
async fn results_failure_is_surfaced() {
    let transport = ScriptedTransport::new()
        .push_status(snapshot("t1", TaskState::Completed, 100, "处理完成"))
        .fail_results(Error::Transport {
            status: 400,
            detail: "任务尚未完成".to_string(),
        });
    let (orchestrator, transport) = orchestrator(transport, fast_poll(3));

    let err = orchestrator
        .run(TaskId::from("t1"), |_: &Task| {})
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert_eq!(transport.results_calls(), 1);
}
