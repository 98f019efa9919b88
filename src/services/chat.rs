use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, watch, Mutex, OwnedMutexGuard};

use super::conversation::ConversationStore;
use super::settings::SettingsService;
use super::store::KeyValueStore;
use crate::models::{Message, Role, SettingKey, Settings};
use crate::providers::{RemoteResponder, Responder};

const EVENT_CAPACITY: usize = 64;

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A send was accepted; the input box should be emptied.
    ClearInput,
    MessageAppended(Message),
    /// A reply landed; the view should scroll to the newest message.
    ScrollToLatest,
    SettingsChanged(Settings),
}

struct Inner {
    conversation: ConversationStore,
    settings: SettingsService,
    responder: Arc<dyn Responder>,
    typing: watch::Sender<bool>,
    events: broadcast::Sender<ChatEvent>,
    // Sends queue here in arrival order; one exchange runs at a time.
    send_lock: Arc<Mutex<()>>,
}

/// Drives a user message through the conversation, the responder and back.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

/// Clears the typing indicator when a send finishes, however it finishes.
struct TypingGuard<'a>(&'a watch::Sender<bool>);

impl<'a> TypingGuard<'a> {
    fn start(typing: &'a watch::Sender<bool>) -> Self {
        typing.send_replace(true);
        Self(typing)
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl ChatSession {
    /// Load settings and history from `store` and talk to the configured
    /// endpoint over HTTP.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = SettingsService::load(store.clone()).await;
        let conversation = ConversationStore::load(store).await;
        Self::new(conversation, settings, Arc::new(RemoteResponder::new()))
    }

    pub fn new(
        conversation: ConversationStore,
        settings: SettingsService,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let (typing, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                conversation,
                settings,
                responder,
                typing,
                events,
                send_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Send user text and wait for the reply to be appended.
    ///
    /// Returns `false` without touching any state when the text is blank.
    /// Sends take their turn in call order. Once a send has its turn, the
    /// exchange runs to completion even if the returned future is dropped.
    pub async fn send_message(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        self.emit(ChatEvent::ClearInput);

        let turn = self.inner.send_lock.clone().lock_owned().await;
        let session = self.clone();
        let text = text.to_string();
        let handle = tokio::spawn(async move { session.exchange(text, turn).await });

        if let Err(e) = handle.await {
            tracing::error!("Send task failed: {}", e);
        }
        true
    }

    async fn exchange(&self, text: String, _turn: OwnedMutexGuard<()>) {
        let inner = &self.inner;

        let user_msg = inner.conversation.new_message(Role::User, text.clone());
        self.append(user_msg);

        let reply = {
            let _typing = TypingGuard::start(&inner.typing);
            let snapshot = inner.conversation.messages();
            let settings = inner.settings.current();
            let reply = inner.responder.get_reply(&snapshot, &text, &settings).await;

            let assistant_msg = inner.conversation.new_message(Role::Assistant, reply);
            self.append(assistant_msg.clone());
            assistant_msg
        };

        tracing::debug!("Reply {} appended", reply.id);
        self.emit(ChatEvent::ScrollToLatest);
    }

    fn append(&self, message: Message) {
        self.inner.conversation.append(message.clone());
        self.emit(ChatEvent::MessageAppended(message));
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Persist a setting change and make it visible to the next send.
    pub async fn update_setting(&self, key: SettingKey, value: Option<&str>) -> Result<Settings> {
        let result = self.inner.settings.set(key, value).await;
        // The snapshot changes even when the write fails.
        self.emit(ChatEvent::SettingsChanged(self.inner.settings.current()));
        result
    }

    /// Re-read settings from storage, e.g. after another component wrote them.
    pub async fn reload_settings(&self) -> Settings {
        let settings = self.inner.settings.reload().await;
        self.emit(ChatEvent::SettingsChanged(settings.clone()));
        settings
    }

    pub fn clear_conversation(&self) {
        self.inner.conversation.clear();
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.conversation.messages()
    }

    pub fn subscribe_messages(&self) -> watch::Receiver<Vec<Message>> {
        self.inner.conversation.subscribe()
    }

    pub fn is_typing(&self) -> bool {
        *self.inner.typing.borrow()
    }

    pub fn subscribe_typing(&self) -> watch::Receiver<bool> {
        self.inner.typing.subscribe()
    }

    pub fn settings(&self) -> Settings {
        self.inner.settings.current()
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.inner.settings.subscribe()
    }

    pub fn settings_service(&self) -> &SettingsService {
        &self.inner.settings
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.inner.conversation
    }

    pub fn events(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }
}
