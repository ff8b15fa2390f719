//! Test doubles.
//!
//! [`RecordingTransport`] captures everything the engine renders so tests
//! can assert on screens, buttons, and payloads without a chat network.

use std::collections::VecDeque;

use greengrocer_core::{ChatId, ImageRef};

use crate::transport::{ChatTransport, Keyboard, MessageRef, TransportError};

/// How a recorded message left the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentKind {
    /// A fresh text message.
    Text,
    /// A fresh photo message.
    Photo(ImageRef),
    /// An in-place edit of an earlier message.
    Edit(MessageRef),
}

/// One captured outbound message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Destination chat.
    pub chat: ChatId,
    /// How it was delivered.
    pub kind: SentKind,
    /// Text or caption.
    pub text: String,
    /// Attached keyboard, if any.
    pub keyboard: Option<Keyboard>,
}

/// A [`ChatTransport`] that records instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Everything sent or edited, in order.
    pub outbox: Vec<SentMessage>,
    next_id: i64,
    edit_errors: VecDeque<TransportError>,
    failing_chat: Option<ChatId>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send and edit into `chat` fail, for testing that the
    /// engine survives delivery failures.
    pub fn fail_chat(&mut self, chat: ChatId) {
        self.failing_chat = Some(chat);
    }

    /// Queue an error for the next edit call.
    pub fn queue_edit_error(&mut self, error: TransportError) {
        self.edit_errors.push_back(error);
    }

    /// The most recent outbound message.
    #[must_use]
    pub fn last(&self) -> Option<&SentMessage> {
        self.outbox.last()
    }

    /// Text of the most recent outbound message, empty when none.
    #[must_use]
    pub fn last_text(&self) -> &str {
        self.last().map_or("", |m| m.text.as_str())
    }

    /// Payload of the first button whose label contains `label`, searching
    /// the most recent keyboard-bearing message.
    #[must_use]
    pub fn find_payload(&self, label: &str) -> Option<String> {
        let keyboard = self.outbox.iter().rev().find_map(|m| m.keyboard.as_ref())?;
        keyboard
            .rows
            .iter()
            .flatten()
            .find(|b| b.label.contains(label))
            .map(|b| b.payload.clone())
    }

    /// All texts sent to one chat, in order.
    #[must_use]
    pub fn texts_for(&self, chat: ChatId) -> Vec<&str> {
        self.outbox
            .iter()
            .filter(|m| m.chat == chat)
            .map(|m| m.text.as_str())
            .collect()
    }

    fn record(&mut self, message: SentMessage) -> MessageRef {
        self.next_id += 1;
        self.outbox.push(message);
        MessageRef(self.next_id)
    }
}

impl ChatTransport for RecordingTransport {
    fn send(
        &mut self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        if self.failing_chat == Some(chat) {
            return Err(TransportError::Other("injected send failure".to_owned()));
        }
        Ok(self.record(SentMessage {
            chat,
            kind: SentKind::Text,
            text: text.to_owned(),
            keyboard: keyboard.cloned(),
        }))
    }

    fn send_photo(
        &mut self,
        chat: ChatId,
        image: &ImageRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        if self.failing_chat == Some(chat) {
            return Err(TransportError::Other("injected send failure".to_owned()));
        }
        Ok(self.record(SentMessage {
            chat,
            kind: SentKind::Photo(image.clone()),
            text: caption.to_owned(),
            keyboard: keyboard.cloned(),
        }))
    }

    fn edit(
        &mut self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        if let Some(error) = self.edit_errors.pop_front() {
            return Err(error);
        }
        if self.failing_chat == Some(chat) {
            return Err(TransportError::Other("injected edit failure".to_owned()));
        }
        self.record(SentMessage {
            chat,
            kind: SentKind::Edit(message),
            text: text.to_owned(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sends_in_order() {
        let mut transport = RecordingTransport::new();
        let chat = ChatId::new(1);
        transport.send(chat, "first", None).unwrap();
        transport.send(chat, "second", None).unwrap();
        assert_eq!(transport.texts_for(chat), vec!["first", "second"]);
        assert_eq!(transport.last_text(), "second");
    }

    #[test]
    fn test_queued_edit_error_fires_once() {
        let mut transport = RecordingTransport::new();
        let chat = ChatId::new(1);
        let message = transport.send(chat, "screen", None).unwrap();
        transport.queue_edit_error(TransportError::ContentUnchanged);
        assert!(matches!(
            transport.edit(chat, message, "screen", None),
            Err(TransportError::ContentUnchanged)
        ));
        assert!(transport.edit(chat, message, "screen 2", None).is_ok());
    }

    #[test]
    fn test_failing_chat_rejects_sends() {
        let mut transport = RecordingTransport::new();
        let bad = ChatId::new(99);
        transport.fail_chat(bad);
        assert!(transport.send(bad, "nope", None).is_err());
        assert!(transport.send(ChatId::new(1), "fine", None).is_ok());
    }
}
