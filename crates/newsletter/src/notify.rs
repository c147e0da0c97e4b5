//! Outbound email rendering and queueing.
//!
//! Emails are rendered from Askama templates and handed to an [`EmailQueue`].
//! The queue only transports messages; actual delivery is the job of whatever
//! consumes the queue. The default backend just logs, the `sqs` feature adds
//! a queue backed by SQS.

use askama::Template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content type for HTML mail bodies.
pub const CONTENT_TYPE_HTML: &str = "text/html";

/// Subject line for the confirmation email sent to new subscribers.
pub const SUBJECT_SUBSCRIPTION_CONFIRMATION: &str = "Subscription Confirmation";

/// Subject line for the admin notice sent when a reader unsubscribes.
pub const SUBJECT_READER_UNSUBSCRIBED: &str = "Reader Unsubscribed";

/// Errors that can occur while rendering or queueing email.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The email template could not be rendered.
    #[error("Failed to render email template: {0}")]
    Render(#[from] askama::Error),
    /// The message could not be handed to the queue.
    #[error("Failed to enqueue email: {0}")]
    Enqueue(String),
}

/// One outbound email, serialized as JSON when placed on a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub content_type: String,
}

impl EmailMessage {
    /// Build an HTML email for a single recipient.
    pub fn html(
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: vec![to.into()],
            from: from.into(),
            subject: subject.into(),
            body: body.into(),
            content_type: CONTENT_TYPE_HTML.to_string(),
        }
    }
}

/// Destination for outbound email messages.
#[async_trait]
pub trait EmailQueue: Send + Sync {
    /// Hand a message to the queue for delivery. Returns the queue's message
    /// id for correlation in logs.
    async fn enqueue(&self, message: &EmailMessage) -> Result<String, NotifyError>;
}

/// Confirmation email sent to a new subscriber.
#[derive(Template)]
#[template(path = "email/subscription_confirmation.html")]
pub struct SubscriptionConfirmationEmail<'a> {
    pub website_domain: &'a str,
    pub api_domain: &'a str,
    pub subscription_id: String,
    pub email_address: &'a str,
}

/// Admin notice sent when a reader unsubscribes.
#[derive(Template)]
#[template(path = "email/reader_unsubscribed.html")]
pub struct ReaderUnsubscribedEmail<'a> {
    pub email_address: &'a str,
}

/// Queue that logs messages instead of delivering them.
///
/// Used when no queue backend feature is enabled, so local development works
/// without AWS credentials.
pub struct LogEmailQueue;

#[async_trait]
impl EmailQueue for LogEmailQueue {
    async fn enqueue(&self, message: &EmailMessage) -> Result<String, NotifyError> {
        let message_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            %message_id,
            to = ?message.to,
            subject = %message.subject,
            "Email queue disabled, logging message instead"
        );
        Ok(message_id)
    }
}

#[cfg(feature = "sqs")]
pub use sqs_queue::SqsEmailQueue;

#[cfg(feature = "sqs")]
mod sqs_queue {
    use super::*;

    /// Queue backed by SQS. A downstream worker consumes the queue and sends
    /// the actual email.
    pub struct SqsEmailQueue {
        client: aws_sdk_sqs::Client,
        queue_url: String,
    }

    impl SqsEmailQueue {
        /// Create a new queue for the given SQS queue URL.
        pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
            Self {
                client,
                queue_url: queue_url.into(),
            }
        }
    }

    #[async_trait]
    impl EmailQueue for SqsEmailQueue {
        async fn enqueue(&self, message: &EmailMessage) -> Result<String, NotifyError> {
            let body = serde_json::to_string(message)
                .map_err(|err| NotifyError::Enqueue(err.to_string()))?;

            let output = self
                .client
                .send_message()
                .queue_url(&self.queue_url)
                .message_body(body)
                .send()
                .await
                .map_err(|err| NotifyError::Enqueue(err.to_string()))?;

            Ok(output.message_id().unwrap_or_default().to_string())
        }
    }
}

/// Queue that records messages for assertions in tests.
#[cfg(test)]
pub(crate) struct RecordingQueue {
    sender: tokio::sync::mpsc::UnboundedSender<EmailMessage>,
}

#[cfg(test)]
impl RecordingQueue {
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedReceiver<EmailMessage>,
    ) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[cfg(test)]
#[async_trait]
impl EmailQueue for RecordingQueue {
    async fn enqueue(&self, message: &EmailMessage) -> Result<String, NotifyError> {
        self.sender
            .send(message.clone())
            .map_err(|err| NotifyError::Enqueue(err.to_string()))?;
        Ok(uuid::Uuid::new_v4().to_string())
    }
}
