//! Background reactions to committed writes.
//!
//! A spawned task consumes the change feed and turns subscription writes into
//! outbound email: inserting an unconfirmed subscription sends the reader a
//! confirmation email and then marks the subscription confirmed, removing a
//! subscription sends the admin a notice. Failed reactions are logged and
//! dropped; the write they reacted to has already committed.

use std::sync::Arc;

use askama::Template;
use tokio::sync::broadcast;

use newsletter_core::feed::{ChangeKind, ChangeRecord};
use newsletter_core::item::{FromAttributes, ItemType};
use newsletter_core::storage::ItemStore;
use newsletter_core::subscription::{self, Subscription};

use crate::config::Config;
use crate::notify::{
    EmailMessage, EmailQueue, ReaderUnsubscribedEmail, SubscriptionConfirmationEmail,
    SUBJECT_READER_UNSUBSCRIBED, SUBJECT_SUBSCRIPTION_CONFIRMATION,
};

/// Spawns the background task that reacts to change records.
///
/// The task runs until the feed closes or a shutdown signal arrives. A lagged
/// receiver only misses records, it never stops the task.
pub fn spawn_notifier(
    mut records: broadcast::Receiver<ChangeRecord>,
    store: Arc<dyn ItemStore>,
    email_queue: Arc<dyn EmailQueue>,
    config: Config,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Notifier started");

        loop {
            tokio::select! {
                result = records.recv() => {
                    match result {
                        Ok(record) => {
                            handle_record(&record, store.as_ref(), email_queue.as_ref(), &config)
                                .await;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "Notifier lagged behind the change feed");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Change feed closed");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Notifier shutting down");
                    break;
                }
            }
        }
    })
}

async fn handle_record(
    record: &ChangeRecord,
    store: &dyn ItemStore,
    email_queue: &dyn EmailQueue,
    config: &Config,
) {
    if record.item_type != ItemType::Subscription {
        return;
    }

    let outcome = match record.kind {
        ChangeKind::Insert => confirm_new_subscription(record, store, email_queue, config).await,
        ChangeKind::Remove => notify_admin_unsubscribed(record, email_queue, config).await,
        ChangeKind::Modify => Ok(()),
    };

    if let Err(err) = outcome {
        tracing::warn!(
            partition_key = %record.partition_key,
            error = %err,
            "Failed to react to change record"
        );
    }
}

/// Sends the confirmation email for a freshly created subscription, then
/// marks the subscription confirmed so a replayed insert cannot send twice.
async fn confirm_new_subscription(
    record: &ChangeRecord,
    store: &dyn ItemStore,
    email_queue: &dyn EmailQueue,
    config: &Config,
) -> anyhow::Result<()> {
    let image = record
        .new_image
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Insert record has no image"))?;
    let mut sub = Subscription::from_attributes(image)?;
    if sub.is_confirmed {
        return Ok(());
    }

    let body = SubscriptionConfirmationEmail {
        website_domain: &config.website_domain,
        api_domain: &config.api_domain,
        subscription_id: sub.id.to_string(),
        email_address: &sub.email_address,
    }
    .render()?;

    let message_id = email_queue
        .enqueue(&EmailMessage::html(
            sub.email_address.clone(),
            config.from_address.clone(),
            SUBJECT_SUBSCRIPTION_CONFIRMATION,
            body,
        ))
        .await?;

    subscription::confirm(store, &mut sub).await?;

    tracing::info!(
        %message_id,
        email_address = %sub.email_address,
        "Confirmation email enqueued"
    );

    Ok(())
}

/// Tells the admin a reader unsubscribed. The removal record carries no
/// image, so the email address is recovered from the partition key.
async fn notify_admin_unsubscribed(
    record: &ChangeRecord,
    email_queue: &dyn EmailQueue,
    config: &Config,
) -> anyhow::Result<()> {
    let email_address = subscription::email_from_partition_key(&record.partition_key)
        .unwrap_or(&record.partition_key);

    let body = ReaderUnsubscribedEmail { email_address }.render()?;

    let message_id = email_queue
        .enqueue(&EmailMessage::html(
            config.admin_address.clone(),
            config.from_address.clone(),
            SUBJECT_READER_UNSUBSCRIBED,
            body,
        ))
        .await?;

    tracing::info!(%message_id, %email_address, "Unsubscribe notice enqueued");

    Ok(())
}
