//! Email dispatcher interface.

use super::CollaboratorError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The email operations steps may wrap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Sends a templated message.
    async fn send_templated(
        &self,
        to: &str,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<MessageId, CollaboratorError>;

    /// Sends a pre-built MIME message.
    async fn send_raw(&self, mime: &[u8]) -> Result<MessageId, CollaboratorError>;
}

/// A message accepted by [`RecordingEmailDispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentEmail {
    /// A templated send.
    Templated {
        /// Recipient.
        to: String,
        /// Template name.
        template: String,
        /// Template data.
        data: serde_json::Value,
    },
    /// A raw MIME send.
    Raw {
        /// The MIME bytes.
        mime: Vec<u8>,
    },
}

/// A dispatcher that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingEmailDispatcher {
    sent: RwLock<Vec<(MessageId, SentEmail)>>,
    reject_with: Option<String>,
}

impl RecordingEmailDispatcher {
    /// Creates a dispatcher that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher that rejects every message.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            reject_with: Some(reason.into()),
        }
    }

    /// Returns accepted messages in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.read().iter().map(|(_, email)| email.clone()).collect()
    }

    fn accept(&self, email: SentEmail) -> Result<MessageId, CollaboratorError> {
        if let Some(reason) = &self.reject_with {
            return Err(CollaboratorError::Rejected(reason.clone()));
        }
        let id = MessageId(Uuid::new_v4().to_string());
        self.sent.write().push((id.clone(), email));
        Ok(id)
    }
}

#[async_trait]
impl EmailDispatcher for RecordingEmailDispatcher {
    async fn send_templated(
        &self,
        to: &str,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<MessageId, CollaboratorError> {
        self.accept(SentEmail::Templated {
            to: to.to_string(),
            template: template.to_string(),
            data: data.clone(),
        })
    }

    async fn send_raw(&self, mime: &[u8]) -> Result<MessageId, CollaboratorError> {
        self.accept(SentEmail::Raw {
            mime: mime.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_messages() {
        let dispatcher = RecordingEmailDispatcher::new();
        let first = dispatcher
            .send_templated("ops@example.com", "welcome", &json!({"name": "Acme"}))
            .await
            .unwrap();
        let second = dispatcher.send_raw(b"MIME-Version: 1.0").await.unwrap();

        assert_ne!(first, second);
        let sent = dispatcher.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], SentEmail::Templated { template, .. } if template == "welcome"));
    }

    #[tokio::test]
    async fn test_rejecting_dispatcher() {
        let dispatcher = RecordingEmailDispatcher::rejecting("mailbox full");
        let err = dispatcher.send_raw(b"x").await.unwrap_err();

        assert_eq!(err.to_string(), "rejected: mailbox full");
        assert!(dispatcher.sent().is_empty());
    }
}
