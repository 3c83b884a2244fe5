//! Conversation controller: owns the active conversation and mediates
//! between UI events and the remote backend.
//!
//! Network calls run on spawned tasks and report back through a oneshot
//! channel; the UI loop drains completions each tick with [`ConversationController::poll`].
//! At most one request is in flight at a time — overlapping operations are
//! rejected, not queued. Every request captures the sequence counter and
//! conversation id at issue time; completions that no longer match are
//! discarded without touching state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::backend::{BackendError, ChatBackend, ChatReply, MessageRecord};
use crate::conversation::{
    generate_conversation_id, ChatHistory, ChatMessage, ConversationId, Feedback, MessageId,
    Sender,
};

/// A network operation that has been issued but not yet applied.
struct PendingRequest {
    seq: u64,
    conversation_id: ConversationId,
    rx: oneshot::Receiver<Outcome>,
}

/// Completion of a backend call, applied on the UI loop.
enum Outcome {
    Loaded {
        target: ConversationId,
        result: Result<Vec<MessageRecord>, BackendError>,
    },
    Sent {
        local_id: MessageId,
        result: Result<ChatReply, BackendError>,
    },
    Cleared(Result<ConversationId, BackendError>),
    Feedback {
        target: MessageId,
        feedback: Feedback,
        result: Result<(), BackendError>,
    },
    SystemUpdated(Result<(), BackendError>),
    Exported(Result<PathBuf, BackendError>),
}

pub struct ConversationController {
    backend: Arc<dyn ChatBackend>,
    draft: String,
    history: ChatHistory,
    chat_active: bool,
    loading: bool,
    conversation_id: ConversationId,
    system_message: String,
    show_system_panel: bool,
    export_dir: PathBuf,
    seq: u64,
    pending: Option<PendingRequest>,
    status: Option<String>,
    session_conversations: Vec<ConversationId>,
}

impl ConversationController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        system_message: String,
        export_dir: PathBuf,
    ) -> Self {
        let conversation_id = generate_conversation_id();
        Self {
            backend,
            draft: String::new(),
            history: ChatHistory::new(),
            chat_active: true,
            loading: false,
            conversation_id: conversation_id.clone(),
            system_message,
            show_system_panel: false,
            export_dir,
            seq: 0,
            pending: None,
            status: None,
            session_conversations: vec![conversation_id],
        }
    }

    /// Fetch the full message list for `id` and make it the active
    /// conversation. The previous transcript is replaced, never merged.
    pub fn load_conversation(&mut self, id: ConversationId) {
        if self.request_in_flight("load") {
            return;
        }
        self.loading = true;
        let backend = Arc::clone(&self.backend);
        let target = id.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend.conversation_messages(&id).await;
                let _ = tx.send(Outcome::Loaded { target, result });
            });
        });
    }

    /// Send the current draft. Whitespace-only drafts are a no-op. The
    /// user message is appended optimistically before the round-trip; on
    /// failure it stays visible, marked failed.
    pub fn send_message(&mut self) {
        if self.draft.trim().is_empty() {
            return;
        }
        if self.request_in_flight("send") {
            return;
        }
        let local_id = self.history.push_user(self.draft.clone());
        self.loading = true;
        let backend = Arc::clone(&self.backend);
        let conversation_id = self.conversation_id.clone();
        let message = self.draft.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend.send_chat(&conversation_id, &message).await;
                let _ = tx.send(Outcome::Sent { local_id, result });
            });
        });
    }

    /// Ask the backend to delete the current conversation's messages. On
    /// success the server picks the id to continue under.
    pub fn clear_conversation(&mut self) {
        if self.request_in_flight("clear") {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let conversation_id = self.conversation_id.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend.clear_conversation(&conversation_id).await;
                let _ = tx.send(Outcome::Cleared(result));
            });
        });
    }

    /// Abandon the current conversation locally: fresh id, empty
    /// transcript, no network call. Any in-flight response is discarded.
    pub fn start_new_conversation(&mut self) {
        self.pending = None;
        self.seq += 1;
        self.loading = false;
        self.conversation_id = generate_conversation_id();
        self.session_conversations.push(self.conversation_id.clone());
        self.history.clear();
        self.chat_active = true;
        info!(conversation = %self.conversation_id, "started new conversation");
    }

    /// Rate a message. Requires a server-assigned id; messages the backend
    /// never acknowledged cannot carry feedback. Feedback is immutable
    /// once set.
    pub fn send_feedback(&mut self, target: MessageId, is_positive: bool) {
        let Some(message) = self.history.get(target) else {
            return;
        };
        if message.feedback.is_some() {
            debug!("feedback already recorded for this message");
            return;
        }
        let Some(server_id) = target.server_id() else {
            error!("feedback not sent: {}", BackendError::MissingMessageId);
            return;
        };
        if self.request_in_flight("feedback") {
            return;
        }
        let feedback = if is_positive {
            Feedback::Positive
        } else {
            Feedback::Negative
        };
        let backend = Arc::clone(&self.backend);
        let conversation_id = self.conversation_id.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend
                    .send_feedback(&conversation_id, server_id, is_positive)
                    .await;
                let _ = tx.send(Outcome::Feedback {
                    target,
                    feedback,
                    result,
                });
            });
        });
    }

    /// Push the edited system prompt to the backend; the edit panel closes
    /// only once the backend accepts it.
    pub fn update_system_message(&mut self) {
        if self.request_in_flight("system update") {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let conversation_id = self.conversation_id.clone();
        let system_message = self.system_message.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend
                    .update_system_message(&conversation_id, &system_message)
                    .await;
                let _ = tx.send(Outcome::SystemUpdated(result));
            });
        });
    }

    /// Download the transcript to `conversation_{id}.txt` in the export
    /// directory.
    pub fn export_conversation(&mut self) {
        if self.request_in_flight("export") {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let conversation_id = self.conversation_id.clone();
        let dest = self.export_dir.clone();
        self.issue(move |tx| {
            tokio::spawn(async move {
                let result = backend.export_conversation(&conversation_id, &dest).await;
                let _ = tx.send(Outcome::Exported(result));
            });
        });
    }

    /// Drain a finished request, if any. Called once per UI tick.
    pub fn poll(&mut self) {
        let outcome = match self.pending.as_mut() {
            None => return,
            Some(pending) => match pending.rx.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::error::TryRecvError::Empty) => return,
                Err(oneshot::error::TryRecvError::Closed) => {
                    error!("request task dropped without reporting");
                    self.pending = None;
                    self.loading = false;
                    return;
                }
            },
        };
        if let Some(request) = self.pending.take() {
            self.apply(request, outcome);
        }
    }

    /// Await the in-flight request and apply its completion. Test hook —
    /// the TUI uses `poll` instead.
    #[cfg(test)]
    pub async fn settle(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            match (&mut pending.rx).await {
                Ok(outcome) => self.apply(pending, outcome),
                Err(_) => self.loading = false,
            }
        }
    }

    fn issue(&mut self, spawn: impl FnOnce(oneshot::Sender<Outcome>)) {
        self.seq += 1;
        let (tx, rx) = oneshot::channel();
        spawn(tx);
        self.pending = Some(PendingRequest {
            seq: self.seq,
            conversation_id: self.conversation_id.clone(),
            rx,
        });
    }

    fn request_in_flight(&self, operation: &str) -> bool {
        if self.pending.is_some() {
            debug!(operation, "rejected: another request is in flight");
            true
        } else {
            false
        }
    }

    fn apply(&mut self, request: PendingRequest, outcome: Outcome) {
        self.loading = false;
        if request.seq != self.seq {
            debug!(seq = request.seq, "discarding stale completion");
            return;
        }

        match outcome {
            Outcome::Loaded { target, result } => match result {
                Ok(records) => {
                    let messages = records
                        .into_iter()
                        .map(|record| {
                            let id = record
                                .id
                                .map(MessageId::Server)
                                .unwrap_or_else(MessageId::fresh_local);
                            ChatMessage::loaded(Sender::from_role(&record.role), record.content, id)
                        })
                        .collect();
                    self.history.replace(messages);
                    self.conversation_id = target;
                    self.chat_active = true;
                }
                Err(err) => error!("error loading conversation: {err}"),
            },
            Outcome::Sent { local_id, result } => {
                if request.conversation_id != self.conversation_id {
                    debug!("discarding reply for a conversation no longer active");
                    return;
                }
                match result {
                    Ok(reply) => {
                        self.history.confirm(local_id);
                        let id = reply
                            .message_id
                            .map(MessageId::Server)
                            .unwrap_or_else(MessageId::fresh_local);
                        self.history.push_ai(reply.response, id);
                        self.draft.clear();
                    }
                    Err(err) => {
                        self.history.fail(local_id);
                        error!("error sending message: {err}");
                    }
                }
            }
            Outcome::Cleared(result) => match result {
                Ok(new_id) => {
                    if !self.session_conversations.contains(&new_id) {
                        self.session_conversations.push(new_id.clone());
                    }
                    self.conversation_id = new_id;
                    self.history.clear();
                }
                Err(err) => error!("error clearing conversation: {err}"),
            },
            Outcome::Feedback {
                target,
                feedback,
                result,
            } => match result {
                Ok(()) => {
                    self.history.set_feedback(target, feedback);
                }
                Err(err) => error!("error sending feedback: {err}"),
            },
            Outcome::SystemUpdated(result) => match result {
                Ok(()) => self.show_system_panel = false,
                Err(err) => error!("error updating system message: {err}"),
            },
            Outcome::Exported(result) => match result {
                Ok(path) => {
                    info!(path = %path.display(), "transcript exported");
                    self.status = Some(format!("Exported to {}", path.display()));
                }
                Err(err) => error!("error exporting conversation: {err}"),
            },
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: String) {
        self.draft = draft;
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a request is in flight. New operations are rejected while
    /// this is true.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_chat_active(&self) -> bool {
        self.chat_active
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    pub fn set_system_message(&mut self, system_message: String) {
        self.system_message = system_message;
    }

    pub fn show_system_panel(&self) -> bool {
        self.show_system_panel
    }

    pub fn toggle_system_panel(&mut self) {
        self.show_system_panel = !self.show_system_panel;
    }

    pub fn close_system_panel(&mut self) {
        self.show_system_panel = false;
    }

    /// Conversation ids created locally this session, newest last. The
    /// picker merges these with the backend's listing.
    pub fn session_conversations(&self) -> &[ConversationId] {
        &self.session_conversations
    }

    /// One-line status for the UI, consumed on read.
    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatReply, ConversationSummary, MessageRecord};
    use crate::conversation::DeliveryStatus;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Chat(String, String),
        Clear(String),
        Feedback(String, i64, bool),
        System(String, String),
        Export(String),
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<Call>>,
        fail_all: AtomicBool,
        load_returns: Mutex<Vec<MessageRecord>>,
        clear_returns: Mutex<Option<String>>,
    }

    impl FakeBackend {
        fn failing() -> Self {
            let backend = Self::default();
            backend.fail_all.store(true, Ordering::SeqCst);
            backend
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self) -> Result<(), BackendError> {
            if self.fail_all.load(Ordering::SeqCst) {
                Err(BackendError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn conversation_messages(
            &self,
            id: &str,
        ) -> Result<Vec<MessageRecord>, BackendError> {
            self.calls.lock().unwrap().push(Call::Load(id.to_string()));
            self.check()?;
            Ok(self.load_returns.lock().unwrap().clone())
        }

        async fn send_chat(&self, id: &str, message: &str) -> Result<ChatReply, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Chat(id.to_string(), message.to_string()));
            self.check()?;
            Ok(ChatReply {
                response: format!("re: {message}"),
                message_id: Some(101),
            })
        }

        async fn clear_conversation(&self, id: &str) -> Result<ConversationId, BackendError> {
            self.calls.lock().unwrap().push(Call::Clear(id.to_string()));
            self.check()?;
            Ok(self
                .clear_returns
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "cleared-id".to_string()))
        }

        async fn send_feedback(
            &self,
            id: &str,
            message_id: i64,
            is_positive: bool,
        ) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Feedback(id.to_string(), message_id, is_positive));
            self.check()
        }

        async fn update_system_message(
            &self,
            id: &str,
            system_message: &str,
        ) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::System(id.to_string(), system_message.to_string()));
            self.check()
        }

        async fn export_conversation(
            &self,
            id: &str,
            dest_dir: &Path,
        ) -> Result<PathBuf, BackendError> {
            self.calls.lock().unwrap().push(Call::Export(id.to_string()));
            self.check()?;
            Ok(dest_dir.join(format!("conversation_{id}.txt")))
        }

        async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, BackendError> {
            self.check()?;
            Ok(Vec::new())
        }
    }

    fn controller(backend: Arc<FakeBackend>) -> ConversationController {
        ConversationController::new(
            backend,
            "You are a useful AI assistant.".to_string(),
            PathBuf::from("."),
        )
    }

    #[tokio::test]
    async fn whitespace_draft_is_a_noop() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("   \n".to_string());
        ctrl.send_message();
        ctrl.settle().await;
        assert!(ctrl.history().is_empty());
        assert!(backend.calls().is_empty());
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn successful_send_appends_user_then_ai() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();

        // Optimistic append happens before the round-trip completes.
        assert!(ctrl.is_loading());
        assert_eq!(ctrl.history().len(), 1);
        assert_eq!(ctrl.history().last().unwrap().status, DeliveryStatus::Pending);

        ctrl.settle().await;
        let messages: Vec<_> = ctrl.history().iter().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].status, DeliveryStatus::Confirmed);
        assert_eq!(messages[1].text, "re: hello");
        assert_eq!(messages[1].id, MessageId::Server(101));
        assert!(ctrl.draft().is_empty());
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn failed_send_marks_the_optimistic_message() {
        let backend = Arc::new(FakeBackend::failing());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;

        assert_eq!(ctrl.history().len(), 1);
        let message = ctrl.history().last().unwrap();
        assert_eq!(message.status, DeliveryStatus::Failed);
        assert_eq!(message.sender, Sender::User);
        assert!(!ctrl.is_loading());
        // The draft is only cleared on success.
        assert_eq!(ctrl.draft(), "hello");
    }

    #[tokio::test]
    async fn load_replaces_history_and_switches_id() {
        let backend = Arc::new(FakeBackend::default());
        *backend.load_returns.lock().unwrap() = vec![
            MessageRecord {
                role: "user".to_string(),
                content: "earlier".to_string(),
                id: Some(1),
            },
            MessageRecord {
                role: "ai".to_string(),
                content: "indeed".to_string(),
                id: Some(2),
            },
        ];
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;
        assert_eq!(ctrl.history().len(), 2);

        ctrl.load_conversation("99".to_string());
        assert!(ctrl.is_loading());
        ctrl.settle().await;

        assert_eq!(ctrl.conversation_id(), "99");
        let messages: Vec<_> = ctrl.history().iter().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "earlier");
        assert_eq!(messages[0].id, MessageId::Server(1));
        assert_eq!(messages[1].sender, Sender::Ai);
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn load_failure_is_swallowed() {
        let backend = Arc::new(FakeBackend::failing());
        let mut ctrl = controller(Arc::clone(&backend));
        let original_id = ctrl.conversation_id().clone();
        ctrl.load_conversation("99".to_string());
        ctrl.settle().await;
        assert_eq!(ctrl.conversation_id(), &original_id);
        assert!(ctrl.history().is_empty());
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn clear_adopts_the_server_returned_id() {
        let backend = Arc::new(FakeBackend::default());
        *backend.clear_returns.lock().unwrap() = Some("brand-new".to_string());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;

        ctrl.clear_conversation();
        ctrl.settle().await;

        assert!(ctrl.history().is_empty());
        assert_eq!(ctrl.conversation_id(), "brand-new");
        assert!(ctrl
            .session_conversations()
            .contains(&"brand-new".to_string()));
    }

    #[tokio::test]
    async fn clear_failure_leaves_state_untouched() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;
        let id = ctrl.conversation_id().clone();

        backend.fail_all.store(true, Ordering::SeqCst);
        ctrl.clear_conversation();
        ctrl.settle().await;

        assert_eq!(ctrl.history().len(), 2);
        assert_eq!(ctrl.conversation_id(), &id);
    }

    #[tokio::test]
    async fn start_new_conversation_is_purely_local() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;
        let calls_before = backend.calls().len();
        let old_id = ctrl.conversation_id().clone();

        ctrl.start_new_conversation();

        assert!(ctrl.history().is_empty());
        assert_ne!(ctrl.conversation_id(), &old_id);
        assert_eq!(backend.calls().len(), calls_before);
        assert_eq!(ctrl.session_conversations().len(), 2);
    }

    #[tokio::test]
    async fn in_flight_reply_is_discarded_after_starting_new_conversation() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();

        ctrl.start_new_conversation();
        ctrl.settle().await;

        assert!(ctrl.history().is_empty());
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn feedback_without_server_id_sends_nothing() {
        let backend = Arc::new(FakeBackend::failing());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;

        // The failed optimistic message only has a local id.
        let local_id = ctrl.history().last().unwrap().id;
        assert!(local_id.server_id().is_none());

        ctrl.send_feedback(local_id, true);
        ctrl.settle().await;

        assert!(ctrl.history().last().unwrap().feedback.is_none());
        let feedback_calls: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Feedback(..)))
            .collect();
        assert!(feedback_calls.is_empty());
    }

    #[tokio::test]
    async fn feedback_is_sent_once_and_recorded() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("hello".to_string());
        ctrl.send_message();
        ctrl.settle().await;

        let ai_id = ctrl.history().last().unwrap().id;
        assert_eq!(ai_id, MessageId::Server(101));

        ctrl.send_feedback(ai_id, true);
        ctrl.settle().await;
        assert_eq!(
            ctrl.history().get(ai_id).unwrap().feedback,
            Some(Feedback::Positive)
        );

        // Feedback is immutable: a second attempt never reaches the wire.
        ctrl.send_feedback(ai_id, false);
        ctrl.settle().await;
        assert_eq!(
            ctrl.history().get(ai_id).unwrap().feedback,
            Some(Feedback::Positive)
        );
        let feedback_calls: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Feedback(..)))
            .collect();
        assert_eq!(
            feedback_calls,
            vec![Call::Feedback(ctrl.conversation_id().clone(), 101, true)]
        );
    }

    #[tokio::test]
    async fn overlapping_send_is_rejected() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.set_draft("one".to_string());
        ctrl.send_message();

        ctrl.set_draft("two".to_string());
        ctrl.send_message();

        // Only the first message was appended and sent.
        assert_eq!(ctrl.history().len(), 1);
        ctrl.settle().await;
        let chat_calls: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Chat(..)))
            .collect();
        assert_eq!(chat_calls.len(), 1);
    }

    #[tokio::test]
    async fn system_update_closes_panel_on_success() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.toggle_system_panel();
        ctrl.set_system_message("Be terse.".to_string());
        ctrl.update_system_message();
        ctrl.settle().await;

        assert!(!ctrl.show_system_panel());
        assert_eq!(
            backend.calls(),
            vec![Call::System(
                ctrl.conversation_id().clone(),
                "Be terse.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn system_update_failure_keeps_panel_open() {
        let backend = Arc::new(FakeBackend::failing());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.toggle_system_panel();
        ctrl.update_system_message();
        ctrl.settle().await;
        assert!(ctrl.show_system_panel());
    }

    #[tokio::test]
    async fn export_reports_the_written_path() {
        let backend = Arc::new(FakeBackend::default());
        let mut ctrl = controller(Arc::clone(&backend));
        ctrl.export_conversation();
        ctrl.settle().await;

        let id = ctrl.conversation_id().clone();
        assert_eq!(backend.calls(), vec![Call::Export(id.clone())]);
        let status = ctrl.take_status().unwrap();
        assert!(status.contains(&format!("conversation_{id}.txt")));
        assert!(ctrl.take_status().is_none());
    }
}
