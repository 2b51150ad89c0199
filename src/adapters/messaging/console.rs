//! Channel that prints messages to stdout, for the console harness.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::registration::Choice;
use crate::ports::{ChannelError, MessagingChannel};

pub struct ConsoleChannel {
    out: Mutex<Stdout>,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }

    async fn write(&self, text: &str) -> Result<(), ChannelError> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a menu as numbered lines with the choice id to type.
pub(crate) fn render_choices(body: &str, choices: &[Choice]) -> String {
    let mut rendered = format!("{}\n", body);
    for (i, choice) in choices.iter().enumerate() {
        rendered.push_str(&format!("  {}. {} [{}]\n", i + 1, choice.title, choice.id));
    }
    rendered
}

#[async_trait]
impl MessagingChannel for ConsoleChannel {
    async fn send_text(&self, _user_id: &UserId, text: &str) -> Result<(), ChannelError> {
        self.write(&format!("< {}\n", text)).await
    }

    async fn send_choices(
        &self,
        _user_id: &UserId,
        body: &str,
        choices: &[Choice],
    ) -> Result<(), ChannelError> {
        self.write(&format!("< {}", render_choices(body, choices))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_render_with_ids() {
        let rendered = render_choices(
            "Anything else?",
            &[
                Choice::new("registration_edit", "Edit"),
                Choice::new("registration_delete", "Delete"),
            ],
        );
        assert_eq!(
            rendered,
            "Anything else?\n  1. Edit [registration_edit]\n  2. Delete [registration_delete]\n"
        );
    }
}
