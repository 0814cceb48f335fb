//! One actor per chat. The actor is the only writer of its history, so turns
//! for a chat are applied in mailbox order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use veracity_common::{AgentReply, ConversationHistory, ConversationTurn};

use crate::actor::{Actor, Context};
use crate::pipeline::{FactChecker, TurnOutcome};

pub enum SessionMsg {
    Converse {
        message: String,
        reply: oneshot::Sender<TurnOutcome>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<ConversationTurn>>,
    },
}

pub struct SessionActor {
    chat_id: String,
    checker: Arc<FactChecker>,
    history: ConversationHistory,
    idle: Option<Duration>,
}

impl SessionActor {
    pub fn new(chat_id: impl Into<String>, checker: Arc<FactChecker>) -> Self {
        let capacity = checker.settings().history_limit();
        Self {
            chat_id: chat_id.into(),
            checker,
            history: ConversationHistory::with_capacity(capacity),
            idle: None,
        }
    }

    /// Stop the actor, dropping its history, after `idle` without a message.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle = Some(idle);
        self
    }
}

#[async_trait::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            SessionMsg::Converse { message, reply } => {
                let outcome = self.checker.converse(&message, self.history.turns()).await;
                // Failed turns leave the history untouched.
                if let AgentReply::Verdict(result) = &outcome.reply {
                    self.history.push_exchange(message, result.history_text());
                    tracing::debug!(
                        chat_id = %self.chat_id,
                        turns = self.history.len(),
                        "session.turn.appended"
                    );
                }
                if reply.send(outcome).is_err() {
                    tracing::debug!(chat_id = %self.chat_id, "session.reply.dropped");
                }
            }
            SessionMsg::Clear { reply } => {
                self.history.clear();
                tracing::info!(chat_id = %self.chat_id, "session.cleared");
                let _ = reply.send(());
            }
            SessionMsg::Snapshot { reply } => {
                let _ = reply.send(self.history.to_vec());
            }
        }
        Ok(())
    }

    fn idle_timeout(&self) -> Option<Duration> {
        self.idle
    }
}
