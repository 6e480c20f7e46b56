//! Polling behaviour of the generic task driver.

mod common;

use common::ScriptedTransport;
use edgepress::{
    CancellationToken, ConversionTask, EdgePressError, JobKind, PollOptions, TaskClient,
    TaskRecord, TaskStatus,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TASK_PATH: &str = "/api/v1/launcher/conversion-tasks/c-1";

fn conversion(status: &str) -> Value {
    json!({
        "task_id": "c-1",
        "model_id": "m-1",
        "status": status,
        "target_framework": "tensorrt",
        "target_device": { "device_name": "Jetson-Nano", "software_version": "4.6" }
    })
}

fn task(status: &str) -> ConversionTask {
    serde_json::from_value(conversion(status)).unwrap()
}

fn client(transport: &Arc<ScriptedTransport>) -> TaskClient<ConversionTask> {
    TaskClient::new(transport.clone(), JobKind::CONVERSION)
}

#[tokio::test(start_paused = true)]
async fn test_poll_follows_lifecycle_with_one_fetch_per_status() {
    let transport = Arc::new(ScriptedTransport::new().replies(
        "GET",
        TASK_PATH,
        vec![conversion("IN_QUEUE"), conversion("IN_PROGRESS"), conversion("FINISHED")],
    ));

    let done = client(&transport)
        .poll_until_terminal(task("IN_QUEUE"), &PollOptions::new())
        .await
        .unwrap();

    assert_eq!(done.status(), TaskStatus::Finished);
    assert_eq!(transport.count(&format!("GET {}", TASK_PATH)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poll_times_out_with_last_status() {
    let transport =
        Arc::new(ScriptedTransport::new().reply("GET", TASK_PATH, conversion("IN_PROGRESS")));
    let options = PollOptions::new()
        .with_interval(Duration::from_secs(1))
        .with_timeout(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    let err = client(&transport)
        .poll_until_terminal(task("IN_QUEUE"), &options)
        .await
        .unwrap_err();

    match err {
        EdgePressError::Timeout {
            last_status,
            elapsed,
        } => {
            assert_eq!(last_status, TaskStatus::InProgress);
            assert!(elapsed >= Duration::from_secs(2));
            assert!(elapsed < Duration::from_secs(3));
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(transport.count(&format!("GET {}", TASK_PATH)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_bounds_a_slow_status_read() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply("GET", TASK_PATH, conversion("IN_PROGRESS"))
            .slow_get(Duration::from_secs(10)),
    );
    let options = PollOptions::new().with_timeout(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    let err = client(&transport)
        .poll_until_terminal(task("IN_QUEUE"), &options)
        .await
        .unwrap_err();

    match err {
        EdgePressError::Timeout {
            last_status,
            elapsed,
        } => {
            assert_eq!(last_status, TaskStatus::InQueue);
            assert!(elapsed >= Duration::from_secs(2));
            assert!(elapsed < Duration::from_secs(3));
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_fetch_on_terminal_task_is_idempotent() {
    let transport = Arc::new(ScriptedTransport::new());
    let failed = task("ERROR");

    let again = client(&transport).fetch(&failed).await.unwrap();

    assert_eq!(again, failed);
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_server_side_error_is_returned_in_band() {
    let mut failed = conversion("ERROR");
    failed["error"] = json!({ "code": "UNSUPPORTED_OP", "message": "Op Einsum is not supported" });
    let transport = Arc::new(ScriptedTransport::new().replies(
        "GET",
        TASK_PATH,
        vec![conversion("IN_PROGRESS"), failed],
    ));

    let done = client(&transport)
        .poll_until_terminal(task("IN_QUEUE"), &PollOptions::new())
        .await
        .unwrap();

    assert_eq!(done.status(), TaskStatus::Error);
    assert!(!done.is_finished());
    let detail = done.error_detail().unwrap();
    assert_eq!(detail.code.as_deref(), Some("UNSUPPORTED_OP"));
}

#[tokio::test]
async fn test_cancelled_token_stops_polling_without_fetching() {
    let transport =
        Arc::new(ScriptedTransport::new().reply("GET", TASK_PATH, conversion("IN_PROGRESS")));
    let token = CancellationToken::new();
    token.cancel();

    let err = client(&transport)
        .poll_until_terminal(
            task("IN_PROGRESS"),
            &PollOptions::new().with_cancellation(token),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EdgePressError::PollingCancelled {
            last_status: TaskStatus::InProgress
        }
    ));
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_mid_poll_stops_after_current_read() {
    let transport =
        Arc::new(ScriptedTransport::new().reply("GET", TASK_PATH, conversion("IN_PROGRESS")));
    let token = CancellationToken::new();
    let options = PollOptions::new()
        .with_interval(Duration::from_secs(1))
        .with_cancellation(token.clone());

    let tasks = client(&transport);
    let poll = tokio::spawn(async move { tasks.poll_until_terminal(task("IN_QUEUE"), &options).await });

    tokio::time::sleep(Duration::from_millis(2500)).await;
    token.cancel();
    let err = poll.await.unwrap().unwrap_err();

    assert!(matches!(err, EdgePressError::PollingCancelled { .. }));
    assert_eq!(transport.count(&format!("GET {}", TASK_PATH)), 3);
}

#[tokio::test]
async fn test_illegal_transition_still_returns_server_record() {
    let transport =
        Arc::new(ScriptedTransport::new().reply("GET", TASK_PATH, conversion("IN_QUEUE")));

    let fresh = client(&transport).fetch(&task("IN_PROGRESS")).await.unwrap();

    assert_eq!(fresh.status(), TaskStatus::InQueue);
}

#[tokio::test]
async fn test_fetch_failure_propagates_as_fetch_error() {
    let transport =
        Arc::new(ScriptedTransport::new().fail("GET", TASK_PATH, 404, "Task not found"));

    let err = client(&transport)
        .poll_until_terminal(task("IN_QUEUE"), &PollOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EdgePressError::Fetch { ref message, status_code: Some(404) } if message == "Task not found"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_submit_and_wait_posts_once() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply("POST", "/api/v1/launcher/conversion-tasks", conversion("IN_QUEUE"))
            .reply("GET", TASK_PATH, conversion("FINISHED")),
    );

    let done = client(&transport)
        .submit_and_wait(&json!({ "model_id": "m-1" }), &PollOptions::new())
        .await
        .unwrap();

    assert!(done.is_finished());
    assert_eq!(
        transport.call_lines(),
        vec![
            "POST /api/v1/launcher/conversion-tasks".to_string(),
            format!("GET {}", TASK_PATH),
        ]
    );
}

#[tokio::test]
async fn test_submission_rejection_is_submission_error() {
    let transport = Arc::new(ScriptedTransport::new().fail(
        "POST",
        "/api/v1/launcher/conversion-tasks",
        400,
        "Invalid device for model",
    ));

    let err = client(&transport)
        .submit(&json!({ "model_id": "m-1" }))
        .await
        .unwrap_err();

    assert!(matches!(err, EdgePressError::Submission { status_code: Some(400), .. }));
}
