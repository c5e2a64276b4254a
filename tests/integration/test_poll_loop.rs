//! End-to-end poll loop tests against local fakes of both remote APIs.
//!
//! Each test runs real HTTP through `PracticumClient` and `TelegramNotifier`.

mod fake_server;

use std::time::Duration;

use axum::http::StatusCode;
use fake_server::{FakeApis, STATUSES_PATH};
use homework_poller::{
    Credentials, ErrorKind, IterationOutcome, PollCursor, PollLoop, PracticumClient, Settings,
    TelegramNotifier, ERROR_MESSAGE_PREFIX,
};
use serde_json::json;

const PRACTICUM_TOKEN: &str = "y0_practicum";
const TELEGRAM_TOKEN: &str = "123456:telegram";
const CHAT_ID: &str = "4242";
const START: i64 = 500;

type Loop = PollLoop<PracticumClient, TelegramNotifier>;

async fn start() -> (FakeApis, Loop) {
    let apis = FakeApis::default();
    let addr = apis.spawn().await;

    let settings = Settings {
        endpoint: format!("http://{addr}{STATUSES_PATH}"),
        telegram_api_url: format!("http://{addr}"),
        request_timeout_secs: Some(5),
        ..Settings::default()
    };
    let credentials = Credentials {
        practicum_token: PRACTICUM_TOKEN.to_string(),
        telegram_token: TELEGRAM_TOKEN.to_string(),
        telegram_chat_id: CHAT_ID.to_string(),
    };

    let source = PracticumClient::from_config(&settings, &credentials).expect("client");
    let notifier = TelegramNotifier::from_config(&settings, &credentials);
    let poll_loop = PollLoop::new(
        source,
        notifier,
        PollCursor::from_timestamp(START),
        Duration::from_millis(10),
    );
    (apis, poll_loop)
}

#[tokio::test]
async fn approved_homework_is_announced_and_cursor_advances() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses_json(&json!({
        "homeworks": [{"homework_name": "hw1", "status": "approved"}],
        "current_date": 1000
    }));

    let outcome = poll_loop.run_iteration().await;

    let expected = "Изменился статус проверки работы \"hw1\". \
                    Работа проверена: ревьюеру всё понравилось. Ура!";
    assert_eq!(
        outcome,
        IterationOutcome::Notified {
            message: expected.to_string()
        }
    );
    assert_eq!(poll_loop.cursor().as_i64(), 1000);

    let requests = apis.statuses_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("OAuth y0_practicum")
    );
    assert_eq!(requests[0].from_date.as_deref(), Some("500"));

    let sent = apis.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bot, format!("bot{TELEGRAM_TOKEN}"));
    assert_eq!(sent[0].chat_id, CHAT_ID);
    assert_eq!(sent[0].text, expected);
}

#[tokio::test]
async fn unexpected_record_fields_do_not_stall_the_loop() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses_json(&json!({
        "homeworks": [
            {"homework_name": "hw2", "status": "approved", "id": "a1b2"},
            {"homework_name": "hw1", "status": "rejected", "reviewer_comment": {"text": "x"}}
        ],
        "current_date": 1000
    }));

    let outcome = poll_loop.run_iteration().await;

    assert!(
        matches!(outcome, IterationOutcome::Notified { .. }),
        "got: {outcome:?}"
    );
    assert_eq!(poll_loop.cursor().as_i64(), 1000);
    let sent = apis.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("\"hw2\""), "got: {}", sent[0].text);
}

#[tokio::test]
async fn next_request_uses_advanced_cursor() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses_json(&json!({"homeworks": [], "current_date": 1000}));
    apis.push_statuses_json(&json!({"homeworks": [], "current_date": 1600}));

    assert_eq!(poll_loop.run_iteration().await, IterationOutcome::NoUpdates);
    assert_eq!(poll_loop.run_iteration().await, IterationOutcome::NoUpdates);

    let from_dates: Vec<_> = apis
        .statuses_requests()
        .into_iter()
        .map(|r| r.from_date)
        .collect();
    assert_eq!(
        from_dates,
        vec![Some("500".to_string()), Some("1000".to_string())]
    );
    assert_eq!(poll_loop.cursor().as_i64(), 1600);
    assert!(apis.sent_messages().is_empty());
}

#[tokio::test]
async fn server_error_is_reported_once() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    apis.push_statuses(StatusCode::INTERNAL_SERVER_ERROR, "boom");

    let first = poll_loop.run_iteration().await;
    let second = poll_loop.run_iteration().await;

    let IterationOutcome::Failed {
        kind,
        message,
        reported,
    } = first
    else {
        panic!("Expected failure, got: {first:?}");
    };
    assert_eq!(kind, ErrorKind::Protocol);
    assert!(reported);
    assert!(message.starts_with(ERROR_MESSAGE_PREFIX));
    assert!(message.contains("HTTP 500"), "got: {message}");
    assert!(message.contains("from_date=500"), "got: {message}");

    assert!(
        matches!(second, IterationOutcome::Failed { reported: false, .. }),
        "Expected deduplicated failure, got: {second:?}"
    );

    let sent = apis.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, message);
    assert_eq!(poll_loop.cursor().as_i64(), START);
}

#[tokio::test]
async fn api_fault_in_ok_response_is_protocol_error() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses_json(&json!({
        "code": "not_authenticated",
        "message": "Учетные данные не были предоставлены."
    }));

    let outcome = poll_loop.run_iteration().await;

    assert!(
        matches!(&outcome, IterationOutcome::Failed { kind: ErrorKind::Protocol, message, .. }
            if message.contains("not_authenticated")),
        "got: {outcome:?}"
    );
    assert_eq!(poll_loop.cursor().as_i64(), START);
}

#[tokio::test]
async fn non_json_body_is_protocol_error() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses(StatusCode::OK, "<html>maintenance</html>");

    let outcome = poll_loop.run_iteration().await;

    assert!(
        matches!(
            outcome,
            IterationOutcome::Failed {
                kind: ErrorKind::Protocol,
                reported: true,
                ..
            }
        ),
        "got: {outcome:?}"
    );
}

#[tokio::test]
async fn missing_current_date_keeps_cursor_then_recovers() {
    let (apis, mut poll_loop) = start().await;
    apis.push_statuses_json(&json!({"homeworks": []}));
    apis.push_statuses_json(&json!({
        "homeworks": [{"homework_name": "hw2", "status": "rejected"}],
        "current_date": 2000
    }));

    let first = poll_loop.run_iteration().await;
    assert!(
        matches!(
            first,
            IterationOutcome::Failed {
                kind: ErrorKind::MissingField,
                ..
            }
        ),
        "got: {first:?}"
    );
    assert_eq!(poll_loop.cursor().as_i64(), START);

    let second = poll_loop.run_iteration().await;
    assert!(matches!(second, IterationOutcome::Notified { .. }));
    assert_eq!(poll_loop.cursor().as_i64(), 2000);
    assert_eq!(poll_loop.state().consecutive_failures, 0);

    let sent = apis.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].text.contains("current_date"));
    assert_eq!(
        sent[1].text,
        "Изменился статус проверки работы \"hw2\". Работа проверена: у ревьюера есть замечания."
    );
}

#[tokio::test]
async fn rejected_delivery_still_advances_cursor() {
    let (apis, mut poll_loop) = start().await;
    apis.fail_telegram(
        StatusCode::BAD_REQUEST,
        json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})
            .to_string(),
    );
    apis.push_statuses_json(&json!({
        "homeworks": [{"homework_name": "hw1", "status": "reviewing"}],
        "current_date": 1200
    }));

    let outcome = poll_loop.run_iteration().await;

    assert!(
        matches!(
            outcome,
            IterationOutcome::Failed {
                kind: ErrorKind::Delivery,
                reported: false,
                ..
            }
        ),
        "got: {outcome:?}"
    );
    assert_eq!(poll_loop.cursor().as_i64(), 1200);
    assert!(apis.sent_messages().is_empty());
}
