use crate::actor::{spawn_actor_with_shutdown, Addr};
use crate::format::render_text;
use crate::pipeline::{FactChecker, TurnOutcome};
use crate::session::{SessionActor, SessionMsg};
use anyhow::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use veracity_common::{ConversationTurn, FactCheckResult};

pub const HELP_TEXT: &str = "Fact-Checking Bot Commands:

- Send any claim to fact-check
- Share a URL to analyze
- Type 'clear' to reset conversation
- Type 'help' to see this message

Example:
\"Does drinking lemon water cure cancer?\"
\"https://example.com/article\"";

/// A chat with no message for this long loses its session and history.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub const CLEARED_TEXT: &str = "Conversation cleared! Send me a new claim to fact-check.";

/// Reply for text transports: rendered text plus the structured verdict, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub result: Option<FactCheckResult>,
}

impl ChatReply {
    fn text(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            result: None,
        }
    }
}

/// Chat id → session actor. Sessions are spawned on first use and stop after
/// [`SESSION_IDLE_TIMEOUT`] without a message, on `clear`, or on `shutdown`.
/// Stopped entries are swept before a new session is spawned.
#[derive(Clone)]
pub struct ChatSessions {
    sessions: Arc<DashMap<String, Addr<SessionActor>>>,
    checker: Arc<FactChecker>,
    mailbox: usize,
    idle: Duration,
    shutdown: CancellationToken,
}

impl ChatSessions {
    pub fn new(checker: Arc<FactChecker>, mailbox: usize, shutdown: CancellationToken) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            checker,
            mailbox: mailbox.max(1),
            idle: SESSION_IDLE_TIMEOUT,
            shutdown,
        }
    }

    /// Applies to sessions spawned from now on.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    pub fn checker(&self) -> &Arc<FactChecker> {
        &self.checker
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|e| !e.value().is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose actor has stopped. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, addr| !addr.is_closed());
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "session.pruned");
        }
        removed
    }

    fn live(&self, chat_id: &str) -> Option<Addr<SessionActor>> {
        self.sessions
            .get(chat_id)
            .filter(|addr| !addr.is_closed())
            .map(|addr| addr.clone())
    }

    fn session(&self, chat_id: &str) -> Addr<SessionActor> {
        if let Some(addr) = self.live(chat_id) {
            return addr;
        }
        // No shard lock may be held while sweeping.
        self.prune();
        let mut entry = self
            .sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| self.spawn(chat_id));
        if entry.is_closed() {
            *entry = self.spawn(chat_id);
        }
        entry.clone()
    }

    fn spawn(&self, chat_id: &str) -> Addr<SessionActor> {
        tracing::info!(chat_id, "session.spawned");
        let actor =
            SessionActor::new(chat_id, Arc::clone(&self.checker)).with_idle_timeout(self.idle);
        spawn_actor_with_shutdown(actor, self.mailbox, Some(self.shutdown.child_token())).addr
    }

    /// Ask the chat's session, respawning once if it expired between lookup
    /// and delivery.
    async fn ask<R>(
        &self,
        chat_id: &str,
        make: impl Fn(oneshot::Sender<R>) -> SessionMsg,
    ) -> Result<R> {
        let addr = self.session(chat_id);
        match addr.ask(&make).await {
            Err(e) if addr.is_closed() && !self.shutdown.is_cancelled() => {
                tracing::debug!(chat_id, error = %e, "session.expired.retry");
                self.session(chat_id).ask(make).await
            }
            other => other,
        }
    }

    /// Fact-check `message` with the chat's history, appending on success.
    pub async fn converse(&self, chat_id: &str, message: &str) -> Result<TurnOutcome> {
        self.ask(chat_id, |reply| SessionMsg::Converse {
            message: message.to_string(),
            reply,
        })
        .await
    }

    /// Forget the chat. Its actor stops once the in-flight turns drain.
    pub async fn clear(&self, chat_id: &str) -> Result<()> {
        let Some((_, addr)) = self.sessions.remove(chat_id) else {
            return Ok(());
        };
        // A session that already stopped has nothing left to clear.
        if let Err(e) = addr.ask(|reply| SessionMsg::Clear { reply }).await {
            tracing::debug!(chat_id, error = %e, "session.clear.stopped");
        }
        Ok(())
    }

    pub async fn history(&self, chat_id: &str) -> Result<Vec<ConversationTurn>> {
        let Some(addr) = self.live(chat_id) else {
            return Ok(Vec::new());
        };
        match addr.ask(|reply| SessionMsg::Snapshot { reply }).await {
            Err(_) if addr.is_closed() && !self.shutdown.is_cancelled() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Bot contract: `help` and `clear` are commands, anything else is a claim.
    pub async fn handle_text(&self, chat_id: &str, text: &str) -> Result<ChatReply> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("help") {
            return Ok(ChatReply::text(HELP_TEXT));
        }
        if trimmed.eq_ignore_ascii_case("clear") {
            self.clear(chat_id).await?;
            return Ok(ChatReply::text(CLEARED_TEXT));
        }
        let outcome = self.converse(chat_id, trimmed).await?;
        Ok(ChatReply {
            reply: render_text(&outcome.reply),
            result: outcome.reply.as_result().cloned(),
        })
    }

    /// Stop every session actor.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.sessions.clear();
    }
}
