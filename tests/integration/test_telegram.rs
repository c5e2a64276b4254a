//! Bot API client tests against a local fake server.

mod fake_server;

use axum::http::StatusCode;
use fake_server::FakeApis;
use homework_poller::{ErrorKind, Notifier, PollerError, TelegramNotifier};
use homework_telegram::{TelegramBot, TelegramError};
use serde_json::json;

const TOKEN: &str = "987:secret";

async fn bot() -> (FakeApis, TelegramBot) {
    let apis = FakeApis::default();
    let addr = apis.spawn().await;
    let bot = TelegramBot::new(TOKEN).with_api_url(format!("http://{addr}/"));
    (apis, bot)
}

#[tokio::test]
async fn get_me_returns_bot_identity() {
    let (_apis, bot) = bot().await;

    let me = bot.get_me().await.expect("getMe should succeed");

    assert_eq!(me.id, 777);
    assert!(me.is_bot);
    assert_eq!(me.first_name, "Homework Bot");
    assert_eq!(me.username.as_deref(), Some("987_secret_username"));
}

#[tokio::test]
async fn send_message_posts_chat_and_text() {
    let (apis, bot) = bot().await;

    let message = bot
        .send_message("-100500", "Работа взята на проверку ревьюером.")
        .await
        .expect("sendMessage should succeed");

    assert_eq!(message.message_id, 1);
    assert_eq!(message.chat.id, -100_500);
    assert_eq!(
        message.text.as_deref(),
        Some("Работа взята на проверку ревьюером.")
    );

    let sent = apis.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bot, "bot987:secret");
    assert_eq!(sent[0].chat_id, "-100500");
}

#[tokio::test]
async fn api_rejection_is_reported_with_description() {
    let (apis, bot) = bot().await;
    apis.fail_telegram(
        StatusCode::BAD_REQUEST,
        json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})
            .to_string(),
    );

    let err = bot.send_message("1", "hello").await.unwrap_err();

    assert!(
        matches!(&err, TelegramError::Api { code: 400, description }
            if description == "Bad Request: chat not found"),
        "Expected Api error, got: {err:?}"
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn non_json_reply_is_decode_error() {
    let (apis, bot) = bot().await;
    apis.fail_telegram(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");

    let err = bot.get_me().await.unwrap_err();

    assert!(
        matches!(err, TelegramError::Decode { status: 502, .. }),
        "Expected Decode error, got: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn notifier_wraps_rejection_as_delivery_error() {
    let (apis, bot) = bot().await;
    apis.fail_telegram(
        StatusCode::FORBIDDEN,
        json!({"ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"})
            .to_string(),
    );
    let notifier = TelegramNotifier::new(bot, "1");

    let err = notifier.notify("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Delivery);
    assert!(matches!(
        err,
        PollerError::Delivery(TelegramError::Api { code: 403, .. })
    ));
    assert!(!err.to_string().contains("secret"));
}
