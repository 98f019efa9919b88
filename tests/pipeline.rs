//! End-to-end send scenarios: settings, pipeline, responder and storage wired
//! together the way an application shell would.

use std::sync::Arc;
use std::time::Duration;

use parley::config::CHAT_STORAGE_KEY;
use parley::{
    ChatSession, ConversationStore, Database, KeyValueStore, MemoryStore, Message,
    RemoteResponder, Role, SettingKey, SettingsService,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session_on(store: Arc<dyn KeyValueStore>) -> ChatSession {
    parley::init_logging();
    let settings = SettingsService::load(store.clone()).await;
    let conversation = ConversationStore::load(store).await;
    let responder = RemoteResponder::new().with_fallback_delay(Duration::ZERO);
    ChatSession::new(conversation, settings, Arc::new(responder))
}

fn summary(messages: &[Message]) -> Vec<(Role, String)> {
    messages.iter().map(|m| (m.role, m.text.clone())).collect()
}

#[tokio::test]
async fn test_no_endpoint_echoes() {
    let session = session_on(Arc::new(MemoryStore::new())).await;

    assert!(session.send_message("hello").await);

    assert_eq!(
        summary(&session.messages()),
        vec![
            (Role::User, "hello".to_string()),
            (Role::Assistant, "Echo: hello".to_string()),
        ]
    );
    assert!(!session.is_typing());
}

#[tokio::test]
async fn test_remote_reply_without_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi there"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_on(Arc::new(MemoryStore::new())).await;
    session
        .update_setting(SettingKey::EndpointUrl, Some(server.uri().as_str()))
        .await
        .unwrap();
    session
        .update_setting(SettingKey::ContextEnabled, Some("false"))
        .await
        .unwrap();

    session.send_message("hello").await;

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "hi there");
    assert_eq!(messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_context_mode_sends_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"messages": [{"role": "user", "content": "hello"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "with context"})))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set("backend_url", &server.uri()).await.unwrap();

    let session = session_on(store).await;
    assert!(session.settings().context_enabled);

    session.send_message("hello").await;
    assert_eq!(session.messages()[1].text, "with context");
}

#[tokio::test]
async fn test_network_failure_echoes() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let session = session_on(Arc::new(MemoryStore::new())).await;
    session
        .update_setting(SettingKey::EndpointUrl, Some(uri.as_str()))
        .await
        .unwrap();

    assert!(session.send_message("hello").await);
    assert_eq!(session.messages()[1].text, "Echo: hello");
    assert!(!session.is_typing());
}

#[tokio::test]
async fn test_conversation_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("parley.db");

    let before = {
        let db: Arc<dyn KeyValueStore> = Arc::new(Database::open(&db_path).unwrap());
        let session = session_on(db).await;
        session.send_message("first").await;
        session.send_message("second").await;
        session.conversation().flush().await;
        session.messages()
    };
    assert_eq!(before.len(), 4);

    let db: Arc<dyn KeyValueStore> = Arc::new(Database::open(&db_path).unwrap());
    let raw = db.get(CHAT_STORAGE_KEY).await.unwrap().unwrap();
    let persisted: Vec<Message> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, before);

    let session = session_on(db).await;
    assert_eq!(session.messages(), before);

    session.send_message("third").await;
    let after = session.messages();
    assert_eq!(after.len(), 6);
    assert!(after.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_settings_persist_across_sessions() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let session = session_on(store.clone()).await;
    session
        .update_setting(SettingKey::ContextWindowSize, Some("99"))
        .await
        .unwrap();
    session
        .update_setting(SettingKey::Theme, Some("dark"))
        .await
        .unwrap();

    let reopened = session_on(store).await;
    let settings = reopened.settings();
    assert_eq!(settings.context_window_size, 30);
    assert!(settings.theme.is_dark());
}
