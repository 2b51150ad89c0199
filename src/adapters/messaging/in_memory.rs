//! Recording channel for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::registration::Choice;
use crate::ports::{ChannelError, MessagingChannel};

#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text {
        user_id: UserId,
        text: String,
    },
    Choices {
        user_id: UserId,
        body: String,
        choices: Vec<Choice>,
    },
}

impl SentMessage {
    /// The text or menu body.
    pub fn body(&self) -> &str {
        match self {
            SentMessage::Text { text, .. } => text,
            SentMessage::Choices { body, .. } => body,
        }
    }

    pub fn choice_ids(&self) -> Vec<&str> {
        match self {
            SentMessage::Text { .. } => Vec::new(),
            SentMessage::Choices { choices, .. } => choices.iter().map(|c| c.id.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail until reset.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    pub async fn last(&self) -> Option<SentMessage> {
        self.sent.read().await.last().cloned()
    }

    /// Drains recorded messages.
    pub async fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.write().await)
    }

    fn check(&self) -> Result<(), ChannelError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable("channel disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingChannel for InMemoryChannel {
    async fn send_text(&self, user_id: &UserId, text: &str) -> Result<(), ChannelError> {
        self.check()?;
        self.sent.write().await.push(SentMessage::Text {
            user_id: user_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_choices(
        &self,
        user_id: &UserId,
        body: &str,
        choices: &[Choice],
    ) -> Result<(), ChannelError> {
        self.check()?;
        self.sent.write().await.push(SentMessage::Choices {
            user_id: user_id.clone(),
            body: body.to_string(),
            choices: choices.to_vec(),
        });
        Ok(())
    }
}
