//! Messaging Channel Port - outbound messages to the user.
//!
//! The engine asks for text or for a set of choices; rendering choices as
//! buttons or lists is the adapter's business.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::registration::Choice;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel unavailable: {0}")]
    Unavailable(String),

    #[error("Message rejected by channel: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send_text(&self, user_id: &UserId, text: &str) -> Result<(), ChannelError>;

    async fn send_choices(
        &self,
        user_id: &UserId,
        body: &str,
        choices: &[Choice],
    ) -> Result<(), ChannelError>;
}
