//! Background email dispatcher backed by a bounded channel.
//!
//! Requests hand messages to the channel and move on; a worker task drains
//! it and delivers through the configured [`EmailService`]. Delivery
//! failures are logged and never surface to the request that queued the
//! message.

use std::sync::Arc;

use async_trait::async_trait;
use rolegrid_application::{EmailDispatcher, EmailMessage, EmailService};
use rolegrid_core::{AppError, AppResult};
use tokio::sync::mpsc;
use tracing::{error, info};

const QUEUE_CAPACITY: usize = 256;

/// Email dispatcher that queues messages for a background worker task.
#[derive(Clone)]
pub struct ChannelEmailDispatcher {
    sender: mpsc::Sender<EmailMessage>,
}

impl ChannelEmailDispatcher {
    /// Spawns the delivery worker and returns the dispatcher handle.
    #[must_use]
    pub fn spawn(service: Arc<dyn EmailService>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<EmailMessage>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match service.send(&message).await {
                    Ok(()) => info!(to = message.to, "email delivered"),
                    Err(err) => error!(to = message.to, error = %err, "email delivery failed"),
                }
            }
        });

        Self { sender }
    }
}

#[async_trait]
impl EmailDispatcher for ChannelEmailDispatcher {
    async fn enqueue(&self, message: EmailMessage) -> AppResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| AppError::Internal("email queue is closed".to_owned()))
    }
}
