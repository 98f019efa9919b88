use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::task::TaskTracker;

use super::store::KeyValueStore;
use crate::config::CHAT_STORAGE_KEY;
use crate::models::{Message, MessageIds, Role};

enum PersistJob {
    Write(String),
    Flush(oneshot::Sender<()>),
}

/// Ordered message log, persisted as a whole after every mutation.
///
/// The in-memory log is authoritative. Each mutation queues one serialized
/// snapshot for a single background writer, so writes reach the store in
/// mutation order and a failed write is repaired by the next one.
#[derive(Clone)]
pub struct ConversationStore {
    log: Arc<watch::Sender<Vec<Message>>>,
    ids: Arc<MessageIds>,
    writer: mpsc::UnboundedSender<PersistJob>,
    tracker: TaskTracker,
}

impl ConversationStore {
    /// Load the persisted log. Missing or unreadable data yields an empty
    /// conversation. Must be called from within a Tokio runtime.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let messages = match store.get(CHAT_STORAGE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Message>>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable conversation log: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read conversation log: {}", e);
                Vec::new()
            }
        };

        let ids = MessageIds::new();
        for msg in &messages {
            ids.observe(&msg.id);
        }

        let (writer, rx) = mpsc::unbounded_channel();
        let tracker = TaskTracker::new();
        tracker.spawn(run_writer(store, rx));
        tracker.close();

        let (log, _) = watch::channel(messages);

        Self {
            log: Arc::new(log),
            ids: Arc::new(ids),
            writer,
            tracker,
        }
    }

    /// Build a message with a fresh id. Does not append it.
    pub fn new_message(&self, role: Role, text: impl Into<String>) -> Message {
        Message::new(&self.ids, role, text)
    }

    pub fn append(&self, message: Message) {
        self.ids.observe(&message.id);
        self.mutate(|log| log.push(message));
    }

    /// Replace the whole log, e.g. on reset or import.
    pub fn replace(&self, messages: Vec<Message>) {
        for msg in &messages {
            self.ids.observe(&msg.id);
        }
        self.mutate(|log| *log = messages);
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    pub fn messages(&self) -> Vec<Message> {
        self.log.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.log.subscribe()
    }

    /// Wait until every snapshot queued so far has been written (or failed).
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.writer.send(PersistJob::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Drain pending writes and wait for the writer to finish.
    ///
    /// The writer stops once every clone of this store has been dropped.
    pub async fn close(self) {
        let tracker = self.tracker.clone();
        drop(self);
        tracker.wait().await;
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<Message>)) {
        // Queue while the log is still locked so writes follow mutation order.
        self.log.send_modify(|log| {
            f(log);
            match serde_json::to_string(log) {
                Ok(json) => {
                    if self.writer.send(PersistJob::Write(json)).is_err() {
                        tracing::warn!(
                            "Conversation writer has stopped; change kept in memory only"
                        );
                    }
                }
                Err(e) => tracing::error!("Failed to serialize conversation: {}", e),
            }
        });
    }
}

async fn run_writer(store: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<PersistJob>) {
    while let Some(job) = rx.recv().await {
        match job {
            PersistJob::Write(json) => {
                if let Err(e) = store.set(CHAT_STORAGE_KEY, &json).await {
                    tracing::warn!("Failed to persist conversation: {}", e);
                }
            }
            PersistJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
