//! Tests for the conversation log controller.

use super::*;
use crate::completion::SYSTEM_PREAMBLE;
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

fn offline_client() -> Arc<CompletionClient> {
    Arc::new(CompletionClient::new().with_base_url("http://127.0.0.1:9").with_api_key("sk"))
}

#[test]
fn starts_with_greeting_and_suggestions() {
    let log = ConversationLog::new(offline_client());

    assert_eq!(log.messages().len(), 1);
    assert_eq!(log.messages()[0].role, Role::Assistant);
    assert_eq!(log.messages()[0].content, GREETING);
    assert_eq!(log.suggestions().len(), 6);
    assert!(!log.is_loading());
}

#[tokio::test]
async fn blank_text_is_ignored() {
    let mut log = ConversationLog::new(offline_client());

    assert!(!log.send("").await);
    assert!(!log.send("   ").await);

    assert_eq!(log.messages().len(), 1);
    assert!(!log.is_loading());
}

#[test]
fn begin_appends_user_turn_and_sets_loading() {
    let mut log = ConversationLog::new(offline_client());

    let turn = log.begin("  What is umami?  ").unwrap();

    assert!(log.is_loading());
    assert_eq!(log.messages().len(), 2);
    assert_eq!(log.messages()[1].content, "What is umami?");
    assert_eq!(
        turn.context,
        vec![
            ChatMessage::new(Role::Assistant, GREETING),
            ChatMessage::new(Role::User, "What is umami?"),
        ]
    );
    assert!(log.suggestions().is_empty());
}

#[test]
fn send_is_disabled_while_loading() {
    let mut log = ConversationLog::new(offline_client());
    log.begin("first").unwrap();

    assert!(!log.can_send("second"));
    assert!(log.begin("second").is_none());
    assert_eq!(log.messages().len(), 2);
}

#[test]
fn fallback_reply_is_part_of_later_context() {
    let mut log = ConversationLog::new(offline_client());
    log.begin("one").unwrap();
    log.complete(Err(EatMateError::Network("down".to_string())));

    let turn = log.begin("two").unwrap();
    let roles: Vec<Role> = turn.context.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant, Role::User]);
}

#[test]
fn failure_appends_fallback_reply() {
    let mut log = ConversationLog::new(offline_client());
    log.begin("hello").unwrap();

    assert!(log.complete(Err(EatMateError::Api { status: 500, message: "oops".to_string() })));

    let last = log.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, FALLBACK_REPLY);
    assert!(!log.is_loading());
}

#[test]
fn message_ids_strictly_increase() {
    let mut log = ConversationLog::new(offline_client());
    for text in ["a", "b", "c"] {
        log.begin(text).unwrap();
        log.complete(Ok("ok".to_string()));
    }

    let ids: Vec<i64> = log.messages().iter().map(|m| m.id.parse().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn ids_bump_within_one_millisecond() {
    let mut ids = MessageIds::default();
    let now = Utc::now();

    let first: i64 = ids.next(now).parse().unwrap();
    let second: i64 = ids.next(now).parse().unwrap();
    assert_eq!(second, first + 1);
}

#[test]
fn scroll_anchor_follows_newest_message() {
    let mut log = ConversationLog::new(offline_client());
    let greeting_id = log.scroll_anchor().unwrap().to_string();

    log.begin("hi").unwrap();
    let anchor = log.scroll_anchor().unwrap();
    assert_ne!(anchor, greeting_id);
    assert_eq!(anchor, log.messages()[1].id);
}

#[test]
fn reply_after_teardown_is_dropped() {
    let mut log = ConversationLog::new(offline_client());
    log.begin("hi").unwrap();
    log.teardown();

    assert!(!log.complete(Ok("late".to_string())));
    assert_eq!(log.messages().len(), 2);
}

#[tokio::test]
async fn send_forwards_full_log_and_appends_reply() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Json(json!({
            "model": "gpt-4o",
            "max_tokens": 500,
            "messages": [
                {"role": "system", "content": SYSTEM_PREAMBLE},
                {"role": "assistant", "content": GREETING},
                {"role": "user", "content": "How do I boil an egg?"}
            ]
        })))
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": "Simmer it for 9 minutes."}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let client = Arc::new(CompletionClient::new().with_base_url(&server.url()).with_api_key("sk"));
    let mut log = ConversationLog::new(client);

    assert!(log.send("How do I boil an egg?").await);

    mock.assert_async().await;
    let tail: Vec<(Role, &str)> = log.messages()[1..]
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        tail,
        vec![
            (Role::User, "How do I boil an egg?"),
            (Role::Assistant, "Simmer it for 9 minutes."),
        ]
    );
    assert!(!log.is_loading());
}

#[tokio::test]
async fn unreachable_service_yields_apology() {
    let mut log = ConversationLog::new(offline_client());

    assert!(log.send("Any tips for risotto?").await);

    assert_eq!(log.messages().len(), 3);
    assert_eq!(log.messages()[2].content, FALLBACK_REPLY);
    assert!(!log.is_loading());
}
