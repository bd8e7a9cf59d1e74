// Compose and reply buffers with their local validation

use thiserror::Error;

use crate::models::MessageId;

/// Failures detected before any gateway call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    EmptyField(&'static str),

    #[error("Reply text is empty")]
    EmptyReply,

    #[error("No message with id {0}")]
    UnknownMessage(MessageId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeForm {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Last send failure, kept until the next attempt replaces it
    pub send_error: Option<String>,
}

impl ComposeForm {
    pub fn set(&mut self, to: &str, subject: &str, body: &str) {
        self.to = to.to_string();
        self.subject = subject.to_string();
        self.body = body.to_string();
    }

    /// All three fields must be non-empty after trimming. The address format
    /// is the form layer's business.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [("to", &self.to), ("subject", &self.subject), ("body", &self.body)];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(name));
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = ComposeForm::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyDraft {
    pub target: Option<MessageId>,
    pub text: String,
    pub error: Option<String>,
}

impl ReplyDraft {
    pub fn set(&mut self, target: MessageId, text: &str) {
        self.target = Some(target);
        self.text = text.to_string();
    }

    pub fn clear(&mut self) {
        *self = ReplyDraft::default();
    }
}
