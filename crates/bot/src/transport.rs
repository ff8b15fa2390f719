//! Chat transport abstraction.
//!
//! The engine never talks to a chat network directly; it renders screens
//! through the [`ChatTransport`] trait and receives [`Event`]s from
//! whatever delivery mechanism the deployment wires up. Implementations
//! are expected to be cheap to call from the single sequential event loop.

use greengrocer_core::{ChatId, ImageRef, UserId};

/// Errors a transport implementation can report.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// An edit would leave the message byte-identical. Chat networks
    /// reject these; the engine treats them as benign.
    #[error("message content unchanged")]
    ContentUnchanged,
    /// The message being edited no longer exists.
    #[error("message not found")]
    MessageNotFound,
    /// Any other delivery failure.
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether this error can be silently ignored after an edit.
    #[must_use]
    pub const fn is_content_unchanged(&self) -> bool {
        matches!(self, Self::ContentUnchanged)
    }
}

/// Reference to a message the bot has sent, used for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i64);

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Callback payload delivered back when pressed.
    pub payload: String,
}

impl Button {
    /// Create a button.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// An inline keyboard: rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, top to bottom.
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Create an empty keyboard.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Append a row of buttons.
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Append a row containing a single button.
    #[must_use]
    pub fn button(self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.row(vec![Button::new(label, payload)])
    }
}

/// Incoming event from the chat network.
#[derive(Debug, Clone)]
pub enum Event {
    /// A slash command, e.g. `/start`.
    Command {
        /// Sender.
        user: UserId,
        /// Conversation the command arrived in.
        chat: ChatId,
        /// Command name without the leading slash.
        name: String,
        /// Sender's username, when the network exposes one.
        username: Option<String>,
    },
    /// An inline-button press.
    Callback {
        /// Presser.
        user: UserId,
        /// Conversation the button lives in.
        chat: ChatId,
        /// The message carrying the keyboard, for in-place edits.
        message: MessageRef,
        /// Raw callback payload.
        payload: String,
        /// Presser's username, when the network exposes one.
        username: Option<String>,
    },
    /// A plain text message.
    Text {
        /// Sender.
        user: UserId,
        /// Conversation.
        chat: ChatId,
        /// Message text.
        text: String,
    },
    /// A photo message.
    Photo {
        /// Sender.
        user: UserId,
        /// Conversation.
        chat: ChatId,
        /// Transport handle for the uploaded image.
        image: ImageRef,
    },
    /// A shared contact card.
    Contact {
        /// Sender.
        user: UserId,
        /// Conversation.
        chat: ChatId,
        /// Free-form phone text from the card.
        phone_text: String,
    },
}

impl Event {
    /// The user who produced the event.
    #[must_use]
    pub const fn user(&self) -> UserId {
        match self {
            Self::Command { user, .. }
            | Self::Callback { user, .. }
            | Self::Text { user, .. }
            | Self::Photo { user, .. }
            | Self::Contact { user, .. } => *user,
        }
    }

    /// The conversation the event belongs to.
    #[must_use]
    pub const fn chat(&self) -> ChatId {
        match self {
            Self::Command { chat, .. }
            | Self::Callback { chat, .. }
            | Self::Text { chat, .. }
            | Self::Photo { chat, .. }
            | Self::Contact { chat, .. } => *chat,
        }
    }
}

/// Outbound side of the chat network.
///
/// The engine sends new messages when the user typed something and edits
/// in place when the user pressed an inline button.
pub trait ChatTransport {
    /// Send a text message, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the network rejects the send.
    fn send(
        &mut self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Send a photo with a caption, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the network rejects the send.
    fn send_photo(
        &mut self,
        chat: ChatId,
        image: &ImageRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Edit a previously sent message in place.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ContentUnchanged` when the edit is a
    /// no-op, or another variant when the network rejects the edit.
    fn edit(
        &mut self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;
}
