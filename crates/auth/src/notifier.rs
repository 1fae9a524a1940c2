//! Out-of-band delivery of verification proofs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_database::Role;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationMessage {
    pub email: String,
    pub role: Role,
    /// Signed verification proof to embed in the link.
    pub token: String,
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    async fn send(&self, message: VerificationMessage) -> Result<(), NotifierError>;
}

/// Send on a background task. Failures are logged and never reach the caller.
pub fn dispatch(
    notifier: Arc<dyn VerificationNotifier>,
    message: VerificationMessage,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let email = message.email.clone();
        let role = message.role;
        match notifier.send(message).await {
            Ok(()) => debug!(%email, %role, "verification message delivered"),
            Err(error) => {
                warn!(%email, %role, error = %error, "verification message delivery failed")
            }
        }
    })
}

/// Used when mail delivery is disabled.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl VerificationNotifier for LogNotifier {
    async fn send(&self, message: VerificationMessage) -> Result<(), NotifierError> {
        info!(
            email = %message.email,
            role = %message.role,
            "mail delivery disabled; verification message not sent"
        );
        Ok(())
    }
}

/// Keeps every message in memory. Intended for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<VerificationMessage>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records messages but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<VerificationMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.messages().len()
    }

    /// Poll until at least `expected` messages arrived or `timeout` elapsed.
    pub async fn wait_for(&self, expected: usize, timeout: Duration) -> Vec<VerificationMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let messages = self.messages();
            if messages.len() >= expected || tokio::time::Instant::now() >= deadline {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl VerificationNotifier for RecordingNotifier {
    async fn send(&self, message: VerificationMessage) -> Result<(), NotifierError> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
        if self.fail {
            return Err(NotifierError::Delivery("recording notifier set to fail".into()));
        }
        Ok(())
    }
}
