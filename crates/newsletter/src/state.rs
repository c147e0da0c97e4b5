//! Application state shared across request handlers.
//!
//! The state carries trait objects for storage and challenge verification,
//! assembled by feature-gated factory functions. Construction also wires the
//! change feed into the background notifier so committed writes turn into
//! outbound email.

use std::sync::Arc;

use tokio::sync::broadcast;

use newsletter_core::feed::ChangeFeed;
use newsletter_core::storage::ItemStore;

use crate::challenge::{AllowAllVerifier, ChallengeVerifier, RecaptchaVerifier};
use crate::config::Config;
use crate::notifier::spawn_notifier;
use crate::notify::EmailQueue;
use crate::storage::ChangeFeedStore;

/// Shared application state.
///
/// This is cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Item store (wrapped in the change feed decorator).
    pub store: Arc<dyn ItemStore>,
    /// Challenge verifier for subscribe requests.
    pub challenge: Arc<dyn ChallengeVerifier>,
    /// Shutdown signal sender for background tasks.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    fn build(store: Arc<dyn ItemStore>, challenge: Arc<dyn ChallengeVerifier>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            store,
            challenge,
            shutdown_tx,
        }
    }

    /// Wraps a backend store in the change feed, spawns the notifier and
    /// assembles the state around it.
    async fn with_store<S>(inner: Arc<S>, config: &Config) -> Result<Self, anyhow::Error>
    where
        S: ItemStore + 'static,
    {
        let feed_store = ChangeFeedStore::new(inner);
        let records = feed_store.subscribe();
        let store: Arc<dyn ItemStore> = Arc::new(feed_store);

        let challenge = build_challenge(config)?;
        let email_queue = build_email_queue(config).await?;

        let state = Self::build(store.clone(), challenge);
        spawn_notifier(
            records,
            store,
            email_queue,
            config.clone(),
            state.subscribe_shutdown(),
        );

        Ok(state)
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal background tasks to shut down.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Picks the challenge verifier for the configured secret.
fn build_challenge(config: &Config) -> Result<Arc<dyn ChallengeVerifier>, anyhow::Error> {
    if config.recaptcha_secret.is_empty() {
        tracing::warn!("RECAPTCHA_SECRET is not set, accepting every subscribe request");
        return Ok(Arc::new(AllowAllVerifier));
    }

    Ok(Arc::new(RecaptchaVerifier::new(
        config.recaptcha_secret.clone(),
    )?))
}

#[cfg(feature = "sqs")]
async fn build_email_queue(config: &Config) -> Result<Arc<dyn EmailQueue>, anyhow::Error> {
    use crate::notify::SqsEmailQueue;

    anyhow::ensure!(
        !config.email_queue_url.is_empty(),
        "EMAIL_QUEUE_URL must be set when the sqs feature is enabled"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_sqs::Client::new(&aws_config);

    Ok(Arc::new(SqsEmailQueue::new(
        client,
        config.email_queue_url.clone(),
    )))
}

#[cfg(not(feature = "sqs"))]
async fn build_email_queue(_config: &Config) -> Result<Arc<dyn EmailQueue>, anyhow::Error> {
    use crate::notify::LogEmailQueue;

    Ok(Arc::new(LogEmailQueue))
}

// ============================================================================
// Factory functions for the storage backends
// ============================================================================

#[cfg(feature = "memory")]
mod memory_backend {
    use super::*;
    use crate::storage::InMemoryStore;

    impl AppState {
        /// Creates AppState with in-memory storage.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let store = Arc::new(InMemoryStore::new());

            Self::with_store(store, config).await
        }
    }
}

#[cfg(feature = "dynamodb")]
mod dynamodb_backend {
    use super::*;
    use crate::storage::DynamoDbStore;
    use newsletter_core::storage::StoreError;

    impl AppState {
        /// Creates AppState with DynamoDB storage.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            if config.table_name.is_empty() {
                return Err(StoreError::Configuration("TABLE_NAME is not set".to_string()).into());
            }

            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_dynamodb::Client::new(&aws_config);
            let store = Arc::new(DynamoDbStore::new(client, config.table_name.clone()));

            Self::with_store(store, config).await
        }
    }
}

// ============================================================================
// Test support
// ============================================================================

#[cfg(all(test, feature = "memory"))]
mod test_support {
    use super::*;
    use crate::storage::InMemoryStore;

    impl Default for AppState {
        /// Creates an AppState over an empty in-memory store that accepts
        /// every challenge token. No notifier runs.
        fn default() -> Self {
            Self::build(Arc::new(InMemoryStore::new()), Arc::new(AllowAllVerifier))
        }
    }

    impl AppState {
        /// Creates an AppState over an empty in-memory store with the given
        /// challenge verifier.
        pub(crate) fn with_verifier(challenge: Arc<dyn ChallengeVerifier>) -> Self {
            Self::build(Arc::new(InMemoryStore::new()), challenge)
        }
    }
}
